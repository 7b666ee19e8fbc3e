//! The crate prelude.

pub use crate::boc::Boc;
pub use crate::cell::{
    Cell, CellBuilder, CellHash, CellSlice, Load, Store, MAX_BIT_LEN, MAX_REF_COUNT,
};
pub use crate::error::{Error, ParseAddrError};
pub use crate::models::{StateInit, StdAddr};
pub use crate::oracle::{EcdsaSignature, EthAddress, FeedId, SignedDataPackage};
pub use crate::tuple::{
    deserialize_tuple, deserialize_tuple_items, serialize_tuple, serialize_tuple_items,
    MAX_TUPLE_LEN,
};
