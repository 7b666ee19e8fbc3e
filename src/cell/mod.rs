//! Cell — the base serialization primitive.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use smallvec::SmallVec;

pub use self::builder::CellBuilder;
pub use self::slice::CellSlice;

use crate::error::Error;

pub mod builder;
pub mod slice;

/// Maximum data length of a single cell in bits.
pub const MAX_BIT_LEN: u16 = 1023;
/// Maximum number of child cell references.
pub const MAX_REF_COUNT: usize = 4;

/// Cell representation hash.
pub type CellHash = [u8; 32];

pub(crate) type CellRefs = SmallVec<[Cell; MAX_REF_COUNT]>;

/// An immutable binary container with up to 1023 bits of data and
/// up to 4 child references.
///
/// Cells are cheap to clone (`Arc`-backed) and content-addressed:
/// equality and hashing follow the representation hash, which is
/// computed once at finalization.
#[derive(Clone)]
pub struct Cell(Arc<CellInner>);

struct CellInner {
    bit_len: u16,
    depth: u16,
    descriptor: CellDescriptor,
    data: Vec<u8>,
    references: CellRefs,
    hash: CellHash,
}

impl Cell {
    /// Creates an empty ordinary cell.
    pub fn empty() -> Self {
        CellBuilder::new().build()
    }

    /// Assembles a finalized cell from its raw parts, computing the
    /// representation hash and depth.
    ///
    /// `data` must already carry the completion tag in its last partial byte
    /// and span exactly `(bit_len + 7) / 8` bytes.
    pub(crate) fn from_parts(data: &[u8], bit_len: u16, references: CellRefs) -> Self {
        debug_assert!(bit_len <= MAX_BIT_LEN);
        debug_assert!(references.len() <= MAX_REF_COUNT);
        debug_assert_eq!(data.len(), ((bit_len + 7) / 8) as usize);

        let descriptor = CellDescriptor {
            d1: references.len() as u8,
            d2: ((bit_len >> 3) + ((bit_len + 7) >> 3)) as u8,
        };

        let mut depth = 0;
        let mut hasher = Sha256::new();
        hasher.update([descriptor.d1, descriptor.d2]);
        hasher.update(data);
        for child in references.iter() {
            depth = std::cmp::max(depth, child.depth().saturating_add(1));
            hasher.update(child.depth().to_be_bytes());
        }
        for child in references.iter() {
            hasher.update(child.repr_hash());
        }

        Self(Arc::new(CellInner {
            bit_len,
            depth,
            descriptor,
            data: data.to_vec(),
            references,
            hash: hasher.finalize().into(),
        }))
    }

    /// Returns the data size of this cell in bits.
    #[inline]
    pub fn bit_len(&self) -> u16 {
        self.0.bit_len
    }

    /// Returns the underlying data bytes, including the completion tag
    /// in the last partial byte.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    /// Returns the cell descriptor bytes.
    #[inline]
    pub fn descriptor(&self) -> CellDescriptor {
        self.0.descriptor
    }

    /// Returns the number of child cells.
    #[inline]
    pub fn reference_count(&self) -> u8 {
        self.0.references.len() as u8
    }

    /// Returns a reference to the Nth child cell.
    pub fn reference(&self, index: u8) -> Option<&Cell> {
        self.0.references.get(index as usize)
    }

    /// Returns the Nth child cell.
    pub fn reference_cloned(&self, index: u8) -> Option<Cell> {
        self.0.references.get(index as usize).cloned()
    }

    /// Returns all child cells.
    #[inline]
    pub fn references(&self) -> &[Cell] {
        &self.0.references
    }

    /// Returns the representation hash of this cell.
    #[inline]
    pub fn repr_hash(&self) -> &CellHash {
        &self.0.hash
    }

    /// Returns the depth of the subtree rooted at this cell.
    #[inline]
    pub fn depth(&self) -> u16 {
        self.0.depth
    }

    /// Begins reading this cell's data and references.
    #[inline]
    pub fn as_slice(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }

    pub fn display_root(&self) -> DisplayCellRoot<'_> {
        DisplayCellRoot(self)
    }

    pub fn display_tree(&self) -> DisplayCellTree<'_> {
        DisplayCellTree(self)
    }
}

impl PartialEq for Cell {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.hash == other.0.hash
    }
}

impl Eq for Cell {}

impl std::hash::Hash for Cell {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write(&self.0.hash);
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("hash", &hex::encode(self.repr_hash()))
            .field("bit_len", &self.bit_len())
            .field("refs", &self.reference_count())
            .finish()
    }
}

/// Two descriptor bytes of the standard cell representation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CellDescriptor {
    pub d1: u8,
    pub d2: u8,
}

impl CellDescriptor {
    #[inline(always)]
    pub const fn new(bytes: [u8; 2]) -> Self {
        Self {
            d1: bytes[0],
            d2: bytes[1],
        }
    }

    #[inline(always)]
    pub const fn reference_count(&self) -> usize {
        (self.d1 & 0b111) as usize
    }

    #[inline(always)]
    pub const fn is_exotic(&self) -> bool {
        self.d1 & 0b1000 != 0
    }

    #[inline(always)]
    pub const fn is_aligned(&self) -> bool {
        self.d2 & 1 == 0
    }

    #[inline(always)]
    pub const fn byte_len(&self) -> u8 {
        (self.d2 & 1) + (self.d2 >> 1)
    }
}

/// A type that can write itself into a cell builder.
pub trait Store {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error>;
}

/// A type that can read itself from a cell slice.
pub trait Load<'a>: Sized {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error>;
}

impl<T: Store + ?Sized> Store for &T {
    #[inline]
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        T::store_into(self, builder)
    }
}

impl Store for bool {
    #[inline]
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_bit(*self)
    }
}

impl<'a> Load<'a> for bool {
    #[inline]
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        slice.load_bit()
    }
}

macro_rules! impl_primitive_store_load {
    ($($ty:ty => ($store:ident, $load:ident)),*$(,)?) => {$(
        impl Store for $ty {
            #[inline]
            fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
                builder.$store(*self)
            }
        }

        impl<'a> Load<'a> for $ty {
            #[inline]
            fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
                slice.$load()
            }
        }
    )*};
}

impl_primitive_store_load! {
    u8 => (store_u8, load_u8),
    u16 => (store_u16, load_u16),
    u32 => (store_u32, load_u32),
    u64 => (store_u64, load_u64),
    u128 => (store_u128, load_u128),
}

impl Store for [u8; 32] {
    #[inline]
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_u256(self)
    }
}

impl<'a> Load<'a> for [u8; 32] {
    #[inline]
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        slice.load_u256()
    }
}

/// Cells are stored as a child reference.
impl Store for Cell {
    #[inline]
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        builder.store_reference(self.clone())
    }
}

impl<'a> Load<'a> for Cell {
    #[inline]
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        slice.load_reference_cloned()
    }
}

/// `Maybe X`: a single presence bit followed by the value itself.
impl<T: Store> Store for Option<T> {
    fn store_into(&self, builder: &mut CellBuilder) -> Result<(), Error> {
        match self {
            Some(value) => {
                ok!(builder.store_bit(true));
                value.store_into(builder)
            }
            None => builder.store_bit(false),
        }
    }
}

impl<'a, T: Load<'a>> Load<'a> for Option<T> {
    fn load_from(slice: &mut CellSlice<'a>) -> Result<Self, Error> {
        if ok!(slice.load_bit()) {
            Ok(Some(ok!(T::load_from(slice))))
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy)]
pub struct DisplayCellRoot<'a>(&'a Cell);

impl std::fmt::Display for DisplayCellRoot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = hex::encode(self.0.data());

        if f.alternate() {
            std::fmt::Display::fmt(&data, f)
        } else {
            f.write_fmt(format_args!(
                "{data}\nbits: {:>4}, refs: {}, hash: {}",
                self.0.bit_len(),
                self.0.reference_count(),
                hex::encode(self.0.repr_hash()),
            ))
        }
    }
}

#[derive(Clone, Copy)]
pub struct DisplayCellTree<'a>(&'a Cell);

impl std::fmt::Display for DisplayCellTree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![(0, self.0)];

        while let Some((level, cell)) = stack.pop() {
            f.write_fmt(format_args!("{:level$}{}\n", "", cell.display_root()))?;

            for child in cell.references().iter().rev() {
                stack.push((level + 1, child));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cell_hash() {
        let cell = Cell::empty();
        assert_eq!(cell.bit_len(), 0);
        assert_eq!(cell.reference_count(), 0);
        assert_eq!(cell.depth(), 0);

        // SHA-256 over the two descriptor bytes of an empty cell.
        let expected: CellHash = Sha256::digest([0u8, 0u8]).into();
        assert_eq!(cell.repr_hash(), &expected);
    }

    #[test]
    fn content_addressing() {
        let make = |value: u32| {
            let mut builder = CellBuilder::new();
            builder.store_u32(value).unwrap();
            builder.build()
        };

        assert_eq!(make(123), make(123));
        assert_ne!(make(123), make(321));
    }

    #[test]
    fn depth_follows_children() {
        let leaf = Cell::empty();

        let mut builder = CellBuilder::new();
        builder.store_reference(leaf.clone()).unwrap();
        let mid = builder.build();

        let mut builder = CellBuilder::new();
        builder.store_reference(leaf).unwrap();
        builder.store_reference(mid.clone()).unwrap();
        let root = builder.build();

        assert_eq!(mid.depth(), 1);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn maybe_round_trip() {
        let mut builder = CellBuilder::new();
        Some(0xaau8).store_into(&mut builder).unwrap();
        None::<u8>.store_into(&mut builder).unwrap();
        let cell = builder.build();

        let mut slice = cell.as_slice();
        assert_eq!(Option::<u8>::load_from(&mut slice).unwrap(), Some(0xaa));
        assert_eq!(Option::<u8>::load_from(&mut slice).unwrap(), None);
        assert!(slice.is_data_empty());
    }
}
