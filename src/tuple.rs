//! Compact codec for short tuples packed as chained cells.
//!
//! A tuple of up to [`MAX_TUPLE_LEN`] homogeneous records is stored as a
//! root cell with a 16-bit length followed by a singly linked chain of
//! chunk cells. Each chunk carries one record inline (its bits and its own
//! references) plus a single trailing reference to the next chunk, so a
//! record may still use up to three references of its own.
//!
//! The layout interoperates bit-exactly with the on-chain consumer; the
//! 7-element cap is a protocol constant and must not be changed.

use crate::cell::{Cell, CellBuilder, CellSlice, Load, Store};
use crate::error::Error;

/// Hard cap on the number of tuple elements.
pub const MAX_TUPLE_LEN: usize = 7;

/// Packs an ordered sequence of records into a chained-cell tuple.
///
/// `serialize_item` must produce a self-contained cell for one record.
/// Fails with [`Error::OutOfRange`] if there are more than
/// [`MAX_TUPLE_LEN`] items; no truncation is performed.
///
/// The chain is assembled tail-first: cells are immutable once built, so
/// each chunk must embed the reference to its successor before it is
/// finalized.
pub fn serialize_tuple<T, F>(items: &[T], mut serialize_item: F) -> Result<Cell, Error>
where
    F: FnMut(&T) -> Result<Cell, Error>,
{
    if items.len() > MAX_TUPLE_LEN {
        return Err(Error::OutOfRange);
    }

    let mut next_chunk = None;
    for item in items.iter().rev() {
        let item_cell = ok!(serialize_item(item));

        let mut builder = CellBuilder::new();
        ok!(builder.store_slice(item_cell.as_slice()));
        if let Some(chunk) = next_chunk.take() {
            ok!(builder.store_reference(chunk));
        }
        next_chunk = Some(builder.build());
    }

    let mut builder = CellBuilder::new();
    ok!(builder.store_u16(items.len() as u16));
    if let Some(chunk) = next_chunk {
        ok!(builder.store_reference(chunk));
    }
    Ok(builder.build())
}

/// Unpacks a chained-cell tuple produced by [`serialize_tuple`].
///
/// `load_item` must consume exactly the bits and references one record
/// occupies; the chain reference is consumed by this function, not by the
/// item codec. Fails with [`Error::OutOfRange`] if the declared length
/// exceeds [`MAX_TUPLE_LEN`] and with [`Error::MalformedData`] if the
/// chain is shorter than the declared length.
pub fn deserialize_tuple<T, F>(cell: &Cell, mut load_item: F) -> Result<Vec<T>, Error>
where
    F: FnMut(&mut CellSlice<'_>) -> Result<T, Error>,
{
    let mut slice = cell.as_slice();
    let len = ok!(slice.load_u16()) as usize;
    if len > MAX_TUPLE_LEN {
        return Err(Error::OutOfRange);
    }

    let mut items = Vec::with_capacity(len);
    if len == 0 {
        return Ok(items);
    }

    let mut chunk = match slice.load_reference_cloned() {
        Ok(cell) => cell,
        Err(_) => return Err(Error::MalformedData),
    };
    for index in 0..len {
        let mut slice = chunk.as_slice();
        items.push(ok!(load_item(&mut slice)));

        if index + 1 < len {
            chunk = match slice.load_reference_cloned() {
                Ok(cell) => cell,
                Err(_) => return Err(Error::MalformedData),
            };
        }
    }
    Ok(items)
}

/// [`serialize_tuple`] for records with a [`Store`] implementation.
pub fn serialize_tuple_items<T: Store>(items: &[T]) -> Result<Cell, Error> {
    serialize_tuple(items, |item| {
        let mut builder = CellBuilder::new();
        ok!(item.store_into(&mut builder));
        Ok(builder.build())
    })
}

/// [`deserialize_tuple`] for records with a [`Load`] implementation.
pub fn deserialize_tuple_items<T>(cell: &Cell) -> Result<Vec<T>, Error>
where
    for<'a> T: Load<'a>,
{
    deserialize_tuple(cell, |slice| T::load_from(slice))
}
