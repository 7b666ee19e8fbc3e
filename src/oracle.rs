//! Cell packing for signed off-chain price data.
//!
//! Data providers sign price payloads with secp256k1 keys identified by
//! their Ethereum-style addresses. The on-chain consumer receives the
//! authorized signer set and the signed packages as chained-cell tuples.

use std::str::FromStr;

use crate::cell::{Cell, CellBuilder, CellSlice, Load, Store};
use crate::error::{Error, ParseAddrError};
use crate::tuple;

/// A 160-bit Ethereum-style signer address.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EthAddress(pub [u8; 20]);

impl Store for EthAddress {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_raw(&self.0, 160)
    }
}

impl<'a> Load<'a> for EthAddress {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        let mut bytes = [0u8; 20];
        ok!(slice.load_raw(&mut bytes, 160));
        Ok(Self(bytes))
    }
}

impl FromStr for EthAddress {
    type Err = ParseAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseAddrError::Empty);
        }
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 40 {
            return Err(ParseAddrError::InvalidAccountId);
        }
        let mut bytes = [0u8; 20];
        if hex::decode_to_slice(s, &mut bytes).is_err() {
            return Err(ParseAddrError::InvalidAccountId);
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("0x{}", hex::encode(self.0)))
    }
}

/// Data feed identifier.
///
/// Wire form is a 256-bit big-endian integer whose bytes are the UTF-8
/// name, right-aligned (so `"BTC"` becomes `0x425443`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FeedId(pub [u8; 32]);

impl FeedId {
    pub fn new(name: &str) -> Result<Self, Error> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(Error::InvalidData);
        }
        let mut res = [0u8; 32];
        res[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(res))
    }

    /// Recovers the feed name, if the id holds valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        let start = self.0.iter().position(|byte| *byte != 0)?;
        std::str::from_utf8(&self.0[start..]).ok()
    }
}

impl Store for FeedId {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_u256(&self.0)
    }
}

impl<'a> Load<'a> for FeedId {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        slice.load_u256().map(Self)
    }
}

impl std::fmt::Display for FeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.write_fmt(format_args!("0x{}", hex::encode(self.0))),
        }
    }
}

/// A recoverable secp256k1 signature in its r/s/v split form.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_param: u8,
}

impl Store for EcdsaSignature {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        ok!(builder.store_u256(&self.r));
        ok!(builder.store_u256(&self.s));
        builder.store_u8(self.recovery_param)
    }
}

impl<'a> Load<'a> for EcdsaSignature {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        Ok(Self {
            r: ok!(slice.load_u256()),
            s: ok!(slice.load_u256()),
            recovery_param: ok!(slice.load_small_uint(8)),
        })
    }
}

/// One signed data package: the signer's position in the authorized set,
/// the signature and the raw signed payload.
///
/// The payload lives in its own referenced cell so the record stays small
/// enough to share a chunk with the tuple chain reference.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignedDataPackage {
    pub index: u16,
    pub signature: EcdsaSignature,
    pub data: Vec<u8>,
}

impl Store for SignedDataPackage {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        ok!(builder.store_u16(self.index));
        ok!(self.signature.store_into(builder));

        let mut payload = CellBuilder::new();
        ok!(payload.store_bytes(&self.data));
        builder.store_reference(payload.build())
    }
}

impl<'a> Load<'a> for SignedDataPackage {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        let index = ok!(slice.load_u16());
        let signature = ok!(EcdsaSignature::load_from(slice));

        let payload = ok!(slice.load_reference());
        if payload.bit_len() % 8 != 0 {
            return Err(Error::InvalidData);
        }
        Ok(Self {
            index,
            signature,
            data: payload.data().to_vec(),
        })
    }
}

/// Packs the authorized signer set into a chained-cell tuple.
pub fn serialize_signers(signers: &[EthAddress]) -> Result<Cell, Error> {
    tuple::serialize_tuple_items(signers)
}

/// Unpacks an authorized signer set.
pub fn deserialize_signers(cell: &Cell) -> Result<Vec<EthAddress>, Error> {
    tuple::deserialize_tuple_items(cell)
}

/// Packs signed data packages into a chained-cell tuple.
pub fn serialize_data_packages(packages: &[SignedDataPackage]) -> Result<Cell, Error> {
    tuple::serialize_tuple_items(packages)
}

/// Unpacks signed data packages.
pub fn deserialize_data_packages(cell: &Cell) -> Result<Vec<SignedDataPackage>, Error> {
    tuple::deserialize_tuple_items(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eth_address_parsing() {
        let s = "0x12470f7aba85c8b81d63137dd5925d6ee114952b";
        let addr = s.parse::<EthAddress>().unwrap();
        assert_eq!(addr.to_string(), s);

        // The prefix is optional.
        assert_eq!(
            "12470f7aba85c8b81d63137dd5925d6ee114952b".parse::<EthAddress>(),
            Ok(addr)
        );

        assert_eq!("".parse::<EthAddress>(), Err(ParseAddrError::Empty));
        assert_eq!(
            "0x1234".parse::<EthAddress>(),
            Err(ParseAddrError::InvalidAccountId)
        );
        assert_eq!(
            "0xzz470f7aba85c8b81d63137dd5925d6ee114952b".parse::<EthAddress>(),
            Err(ParseAddrError::InvalidAccountId)
        );
    }

    #[test]
    fn feed_id_layout() {
        let feed = FeedId::new("BTC").unwrap();
        let mut expected = [0u8; 32];
        expected[29..].copy_from_slice(b"BTC");
        assert_eq!(feed.0, expected);
        assert_eq!(feed.name(), Some("BTC"));
        assert_eq!(feed.to_string(), "BTC");

        assert_eq!(FeedId::new(""), Err(Error::InvalidData));
        assert!(FeedId::new("X".repeat(33).as_str()).is_err());
    }

    #[test]
    fn signers_tuple_round_trip() {
        let signers: Vec<EthAddress> = [
            "0x109b4a318a4f5ddcbca6349b45f881b4137deafb",
            "0x12470f7aba85c8b81d63137dd5925d6ee114952b",
            "0x1ea62d73edf8ac05dfbc8c7d2eb80999aa89b16a",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();

        let cell = serialize_signers(&signers).unwrap();
        assert_eq!(cell.data(), &[0x00, 0x03]);

        // Each chunk holds exactly one 160-bit address.
        let head = cell.reference(0).unwrap();
        assert_eq!(head.bit_len(), 160);

        assert_eq!(deserialize_signers(&cell).unwrap(), signers);
    }

    #[test]
    fn data_packages_round_trip() {
        let packages: Vec<SignedDataPackage> = (0..3)
            .map(|i| SignedDataPackage {
                index: i,
                signature: EcdsaSignature {
                    r: [i as u8 + 1; 32],
                    s: [i as u8 + 2; 32],
                    recovery_param: (i % 2) as u8,
                },
                data: vec![0xab; 16 + i as usize],
            })
            .collect();

        let cell = serialize_data_packages(&packages).unwrap();
        assert_eq!(deserialize_data_packages(&cell).unwrap(), packages);
    }

    #[test]
    fn package_payload_must_be_byte_aligned() {
        let payload = {
            let mut builder = CellBuilder::new();
            builder.store_uint(0b101, 3).unwrap();
            builder.build()
        };
        let record = {
            let mut builder = CellBuilder::new();
            builder.store_u16(0).unwrap();
            EcdsaSignature {
                r: [0; 32],
                s: [0; 32],
                recovery_param: 0,
            }
            .store_into(&mut builder)
            .unwrap();
            builder.store_reference(payload).unwrap();
            builder.build()
        };

        let mut slice = record.as_slice();
        assert_eq!(
            SignedDataPackage::load_from(&mut slice),
            Err(Error::InvalidData)
        );
    }
}
