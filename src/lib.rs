//! Cell serialization primitives and message-packing utilities for the TON blockchain.
//!
//! The crate is built around three layers:
//!
//! - [`cell`] — the base serialization primitive: an immutable binary container
//!   with up to 1023 bits of data and up to 4 child references, together with a
//!   [`CellBuilder`] for incremental construction and a [`CellSlice`] read cursor.
//! - [`boc`] — the standard "bag of cells" byte representation used to ship
//!   finalized cell trees over the wire.
//! - domain layers on top: the [`tuple`] codec for bounded sequences packed as
//!   chained cells, [`models`] with common on-chain structures (addresses,
//!   state init, jetton message bodies) and [`oracle`] with off-chain price
//!   attestation packing.

macro_rules! ok {
    ($e:expr $(,)?) => {
        match $e {
            core::result::Result::Ok(val) => val,
            core::result::Result::Err(err) => return core::result::Result::Err(err),
        }
    };
}

pub use self::boc::Boc;
pub use self::cell::{
    Cell, CellBuilder, CellHash, CellSlice, Load, Store, MAX_BIT_LEN, MAX_REF_COUNT,
};
pub use self::error::{Error, ParseAddrError};

pub mod boc;
pub mod cell;
pub mod error;
pub mod models;
pub mod oracle;
pub mod prelude;
pub mod tuple;

mod util;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn packed_signers_survive_the_wire() -> anyhow::Result<()> {
        use crate::oracle::{deserialize_signers, serialize_signers, EthAddress};

        let signers = [
            "0x8bb8f32df04c8b654987daaed53d6b6091e3b774".parse::<EthAddress>()?,
            "0xdeb22f54738d54976c4c0fe5ce6d408e40d88499".parse::<EthAddress>()?,
            "0x51ce04be4b3e32572c4ec9135221d0691ba7d202".parse::<EthAddress>()?,
        ];

        let root = serialize_signers(&signers)?;
        let bytes = Boc::encode(&root);

        let decoded = Boc::decode(bytes)?;
        assert_eq!(decoded, root);

        let parsed = deserialize_signers(&decoded)?;
        assert_eq!(parsed, signers);
        Ok(())
    }

    #[cfg(feature = "base64")]
    #[test]
    fn base64_round_trip() -> anyhow::Result<()> {
        let mut builder = CellBuilder::new();
        builder.store_u32(0xdeadbeef)?;
        builder.store_reference(Cell::empty())?;
        let cell = builder.build();

        let encoded = Boc::encode_base64(&cell);
        let decoded = Boc::decode_base64(encoded)?;
        assert_eq!(decoded, cell);
        Ok(())
    }
}
