//! Common on-chain structures.

use std::str::FromStr;

use crate::cell::{Cell, CellBuilder, CellSlice, Load, Store};
use crate::error::{Error, ParseAddrError};

pub mod jetton;

/// Standard internal address (`addr_std$10`, no anycast).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct StdAddr {
    /// Workchain id.
    pub workchain: i8,
    /// Account id within the workchain.
    pub address: [u8; 32],
}

impl StdAddr {
    pub const fn new(workchain: i8, address: [u8; 32]) -> Self {
        Self {
            workchain,
            address,
        }
    }

    /// Formats the address as the 48-character user-friendly base64 form.
    #[cfg(feature = "base64")]
    pub fn to_base64(&self, bounceable: bool) -> String {
        use base64::Engine;

        let mut bytes = [0u8; 36];
        bytes[0] = if bounceable { 0x11 } else { 0x51 };
        bytes[1] = self.workchain as u8;
        bytes[2..34].copy_from_slice(&self.address);

        let checksum = crate::util::crc_16(&bytes[..34]);
        bytes[34..36].copy_from_slice(&checksum.to_be_bytes());

        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    #[cfg(feature = "base64")]
    fn from_base64(s: &str) -> Result<Self, ParseAddrError> {
        use base64::Engine;

        let mut bytes = [0u8; 36];
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode_slice(s, &mut bytes)
            .or_else(|_| {
                base64::engine::general_purpose::STANDARD_NO_PAD.decode_slice(s, &mut bytes)
            });
        match decoded {
            Ok(36) => {}
            _ => return Err(ParseAddrError::BadFormat),
        }

        // Strip the testnet flag before checking the tag.
        match bytes[0] & !0x80 {
            0x11 | 0x51 => {}
            _ => return Err(ParseAddrError::BadFormat),
        }

        let checksum = crate::util::crc_16(&bytes[..34]);
        if bytes[34..36] != checksum.to_be_bytes() {
            return Err(ParseAddrError::InvalidChecksum);
        }

        let mut address = [0u8; 32];
        address.copy_from_slice(&bytes[2..34]);
        Ok(Self::new(bytes[1] as i8, address))
    }
}

impl Store for StdAddr {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        // addr_std$10 tag and an empty anycast.
        ok!(builder.store_small_uint(0b100, 3));
        ok!(builder.store_u8(self.workchain as u8));
        builder.store_u256(&self.address)
    }
}

impl<'a> Load<'a> for StdAddr {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        if ok!(slice.load_small_uint(2)) != 0b10 {
            return Err(Error::InvalidTag);
        }
        if ok!(slice.load_bit()) {
            // Anycast is deprecated and never produced by this crate.
            return Err(Error::InvalidData);
        }
        Ok(Self {
            workchain: ok!(slice.load_u8()) as i8,
            address: ok!(slice.load_u256()),
        })
    }
}

impl FromStr for StdAddr {
    type Err = ParseAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseAddrError::Empty);
        }

        if let Some((workchain, account)) = s.split_once(':') {
            let workchain = match workchain.parse::<i32>() {
                Ok(workchain) if i8::try_from(workchain).is_ok() => workchain as i8,
                Ok(_) => return Err(ParseAddrError::InvalidWorkchain),
                Err(_) => return Err(ParseAddrError::InvalidWorkchain),
            };

            if account.len() != 64 {
                return Err(ParseAddrError::InvalidAccountId);
            }
            let mut address = [0u8; 32];
            if hex::decode_to_slice(account, &mut address).is_err() {
                return Err(ParseAddrError::InvalidAccountId);
            }

            return Ok(Self::new(workchain, address));
        }

        #[cfg(feature = "base64")]
        if s.len() == 48 {
            return Self::from_base64(s);
        }

        Err(ParseAddrError::BadFormat)
    }
}

impl std::fmt::Display for StdAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}:{}",
            self.workchain,
            hex::encode(self.address)
        ))
    }
}

/// Tick-tock transaction flags of a special account.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TickTock {
    pub tick: bool,
    pub tock: bool,
}

impl Store for TickTock {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_small_uint(((self.tick as u8) << 1) | self.tock as u8, 2)
    }
}

impl<'a> Load<'a> for TickTock {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        let flags = ok!(slice.load_small_uint(2));
        Ok(Self {
            tick: flags & 0b10 != 0,
            tock: flags & 0b01 != 0,
        })
    }
}

/// Deployed program state: code and data cells with optional flags.
///
/// Used both in deployment messages and in code/data upgrade flows.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StateInit {
    pub split_depth: Option<u8>,
    pub special: Option<TickTock>,
    pub code: Option<Cell>,
    pub data: Option<Cell>,
    pub libraries: Option<Cell>,
}

impl StateInit {
    pub fn with_code_and_data(code: Cell, data: Cell) -> Self {
        Self {
            split_depth: None,
            special: None,
            code: Some(code),
            data: Some(data),
            libraries: None,
        }
    }
}

impl Store for StateInit {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        match self.split_depth {
            Some(depth) => {
                if depth >= 32 {
                    return Err(Error::IntOverflow);
                }
                ok!(builder.store_bit(true));
                ok!(builder.store_small_uint(depth, 5));
            }
            None => ok!(builder.store_bit(false)),
        }
        ok!(self.special.store_into(builder));
        ok!(self.code.store_into(builder));
        ok!(self.data.store_into(builder));
        self.libraries.store_into(builder)
    }
}

impl<'a> Load<'a> for StateInit {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        let split_depth = if ok!(slice.load_bit()) {
            Some(ok!(slice.load_small_uint(5)))
        } else {
            None
        };
        Ok(Self {
            split_depth,
            special: ok!(Option::<TickTock>::load_from(slice)),
            code: ok!(Option::<Cell>::load_from(slice)),
            data: ok!(Option::<Cell>::load_from(slice)),
            libraries: ok!(Option::<Cell>::load_from(slice)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_addr() -> StdAddr {
        let mut address = [0u8; 32];
        address[0] = 0x84;
        address[31] = 0x33;
        StdAddr::new(0, address)
    }

    #[test]
    fn addr_cell_round_trip() {
        let addr = sample_addr();

        let mut builder = CellBuilder::new();
        addr.store_into(&mut builder).unwrap();
        let cell = builder.build();
        assert_eq!(cell.bit_len(), 3 + 8 + 256);

        let mut slice = cell.as_slice();
        assert_eq!(StdAddr::load_from(&mut slice).unwrap(), addr);
        assert!(slice.is_data_empty());
    }

    #[test]
    fn addr_raw_string_round_trip() {
        let addr = sample_addr();
        let s = addr.to_string();
        assert_eq!(
            s,
            "0:8400000000000000000000000000000000000000000000000000000000000033"
        );
        assert_eq!(s.parse::<StdAddr>().unwrap(), addr);

        assert_eq!("".parse::<StdAddr>(), Err(ParseAddrError::Empty));
        assert_eq!(
            "0:12".parse::<StdAddr>(),
            Err(ParseAddrError::InvalidAccountId)
        );
        assert_eq!(
            "300:8400000000000000000000000000000000000000000000000000000000000033"
                .parse::<StdAddr>(),
            Err(ParseAddrError::InvalidWorkchain)
        );
    }

    #[cfg(feature = "base64")]
    #[test]
    fn addr_base64_round_trip() {
        let addr = sample_addr();
        for bounceable in [false, true] {
            let s = addr.to_base64(bounceable);
            assert_eq!(s.len(), 48);
            assert_eq!(s.parse::<StdAddr>().unwrap(), addr);
        }

        // Corrupt a checksum character.
        let mut s = addr.to_base64(true).into_bytes();
        let last = *s.last().unwrap();
        *s.last_mut().unwrap() = if last == b'A' { b'B' } else { b'A' };
        let s = String::from_utf8(s).unwrap();
        assert_eq!(s.parse::<StdAddr>(), Err(ParseAddrError::InvalidChecksum));
    }

    #[test]
    fn state_init_round_trip() {
        let code = {
            let mut builder = CellBuilder::new();
            builder.store_u32(0xc0de).unwrap();
            builder.build()
        };
        let data = {
            let mut builder = CellBuilder::new();
            builder.store_u64(42).unwrap();
            builder.build()
        };

        let state_init = StateInit::with_code_and_data(code, data);

        let mut builder = CellBuilder::new();
        state_init.store_into(&mut builder).unwrap();
        let cell = builder.build();

        // maybe split_depth + maybe special + 2 x maybe ref + maybe libraries.
        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.reference_count(), 2);

        let mut slice = cell.as_slice();
        assert_eq!(StateInit::load_from(&mut slice).unwrap(), state_init);
    }
}
