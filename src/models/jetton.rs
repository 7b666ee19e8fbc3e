//! Standard jetton wallet message bodies.

use crate::cell::{Cell, CellBuilder, CellSlice, Load, Store};
use crate::error::Error;
use crate::models::StdAddr;

/// Stores an `Either X ^X` payload: inline when absent, as a reference
/// otherwise.
fn store_either_payload(payload: &Option<Cell>, builder: &mut CellBuilder) -> Result<(), Error> {
    match payload {
        Some(cell) => {
            ok!(builder.store_bit(true));
            builder.store_reference(cell.clone())
        }
        None => builder.store_bit(false),
    }
}

/// Loads an `Either X ^X` payload, wrapping an inline remainder into its
/// own cell.
fn load_either_payload(slice: &mut CellSlice<'_>) -> Result<Option<Cell>, Error> {
    if ok!(slice.load_bit()) {
        return slice.load_reference_cloned().map(Some);
    }
    let rest = slice.load_remaining();
    if rest.is_empty() {
        return Ok(None);
    }
    let mut builder = CellBuilder::new();
    ok!(builder.store_slice(rest));
    Ok(Some(builder.build()))
}

/// `transfer#0f8a7ea5` request to a jetton wallet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JettonTransfer {
    pub query_id: u64,
    pub amount: u128,
    pub destination: StdAddr,
    pub response_destination: StdAddr,
    pub custom_payload: Option<Cell>,
    pub forward_ton_amount: u128,
    pub forward_payload: Option<Cell>,
}

impl JettonTransfer {
    pub const TAG: u32 = 0x0f8a7ea5;
}

impl Store for JettonTransfer {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        ok!(builder.store_u32(Self::TAG));
        ok!(builder.store_u64(self.query_id));
        ok!(builder.store_coins(self.amount));
        ok!(self.destination.store_into(builder));
        ok!(self.response_destination.store_into(builder));
        ok!(self.custom_payload.store_into(builder));
        ok!(builder.store_coins(self.forward_ton_amount));
        store_either_payload(&self.forward_payload, builder)
    }
}

impl<'a> Load<'a> for JettonTransfer {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        if ok!(slice.load_u32()) != Self::TAG {
            return Err(Error::InvalidTag);
        }
        Ok(Self {
            query_id: ok!(slice.load_u64()),
            amount: ok!(slice.load_coins()),
            destination: ok!(StdAddr::load_from(slice)),
            response_destination: ok!(StdAddr::load_from(slice)),
            custom_payload: ok!(Option::<Cell>::load_from(slice)),
            forward_ton_amount: ok!(slice.load_coins()),
            forward_payload: ok!(load_either_payload(slice)),
        })
    }
}

/// `transfer_notification#7362d09c` sent to the new owner.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JettonTransferNotification {
    pub query_id: u64,
    pub amount: u128,
    pub sender: StdAddr,
    pub forward_payload: Option<Cell>,
}

impl JettonTransferNotification {
    pub const TAG: u32 = 0x7362d09c;
}

impl Store for JettonTransferNotification {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        ok!(builder.store_u32(Self::TAG));
        ok!(builder.store_u64(self.query_id));
        ok!(builder.store_coins(self.amount));
        ok!(self.sender.store_into(builder));
        store_either_payload(&self.forward_payload, builder)
    }
}

impl<'a> Load<'a> for JettonTransferNotification {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        if ok!(slice.load_u32()) != Self::TAG {
            return Err(Error::InvalidTag);
        }
        Ok(Self {
            query_id: ok!(slice.load_u64()),
            amount: ok!(slice.load_coins()),
            sender: ok!(StdAddr::load_from(slice)),
            forward_payload: ok!(load_either_payload(slice)),
        })
    }
}

/// `burn#595f07bc` request to a jetton wallet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JettonBurn {
    pub query_id: u64,
    pub amount: u128,
    pub response_destination: StdAddr,
    pub custom_payload: Option<Cell>,
}

impl JettonBurn {
    pub const TAG: u32 = 0x595f07bc;
}

impl Store for JettonBurn {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        ok!(builder.store_u32(Self::TAG));
        ok!(builder.store_u64(self.query_id));
        ok!(builder.store_coins(self.amount));
        ok!(self.response_destination.store_into(builder));
        self.custom_payload.store_into(builder)
    }
}

impl<'a> Load<'a> for JettonBurn {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        if ok!(slice.load_u32()) != Self::TAG {
            return Err(Error::InvalidTag);
        }
        Ok(Self {
            query_id: ok!(slice.load_u64()),
            amount: ok!(slice.load_coins()),
            response_destination: ok!(StdAddr::load_from(slice)),
            custom_payload: ok!(Option::<Cell>::load_from(slice)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> StdAddr {
        StdAddr::new(0, [byte; 32])
    }

    fn build_cell<T: Store>(value: &T) -> Cell {
        let mut builder = CellBuilder::new();
        value.store_into(&mut builder).unwrap();
        builder.build()
    }

    #[test]
    fn transfer_round_trip() {
        let comment = {
            let mut builder = CellBuilder::new();
            builder.store_u32(0).unwrap();
            builder.store_bytes(b"hi").unwrap();
            builder.build()
        };

        let transfer = JettonTransfer {
            query_id: 0x0123_4567,
            amount: 1_000_000_000,
            destination: addr(0x11),
            response_destination: addr(0x22),
            custom_payload: None,
            forward_ton_amount: 1,
            forward_payload: Some(comment),
        };

        let cell = build_cell(&transfer);
        assert_eq!(cell.reference_count(), 1);

        let mut slice = cell.as_slice();
        assert_eq!(JettonTransfer::load_from(&mut slice).unwrap(), transfer);
        assert!(slice.is_empty());
    }

    #[test]
    fn transfer_rejects_wrong_tag() {
        let burn = JettonBurn {
            query_id: 1,
            amount: 2,
            response_destination: addr(0x33),
            custom_payload: None,
        };

        let cell = build_cell(&burn);
        let mut slice = cell.as_slice();
        assert_eq!(
            JettonTransfer::load_from(&mut slice),
            Err(Error::InvalidTag)
        );
    }

    #[test]
    fn notification_round_trip() {
        let notification = JettonTransferNotification {
            query_id: 7,
            amount: 500,
            sender: addr(0x44),
            forward_payload: None,
        };

        let cell = build_cell(&notification);
        let mut slice = cell.as_slice();
        assert_eq!(
            JettonTransferNotification::load_from(&mut slice).unwrap(),
            notification
        );
    }

    #[test]
    fn burn_round_trip() {
        let burn = JettonBurn {
            query_id: 99,
            amount: u64::MAX as u128 + 1,
            response_destination: addr(0x55),
            custom_payload: Some(Cell::empty()),
        };

        let cell = build_cell(&burn);
        let mut slice = cell.as_slice();
        assert_eq!(JettonBurn::load_from(&mut slice).unwrap(), burn);
    }
}
