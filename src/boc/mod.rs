//! BOC (Bag Of Cells) implementation for the `Cell` type.

use crate::cell::Cell;
use crate::error::Error;

mod de;
mod ser;

/// BOC file magic.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BocTag {
    Indexed,
    IndexedCrc32,
    Generic,
}

impl BocTag {
    const INDEXED: [u8; 4] = [0x68, 0xff, 0x65, 0xf3];
    const INDEXED_CRC32: [u8; 4] = [0xac, 0xc3, 0xa7, 0x28];
    const GENERIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

    pub const fn from_bytes(data: [u8; 4]) -> Option<Self> {
        match data {
            Self::GENERIC => Some(Self::Generic),
            Self::INDEXED_CRC32 => Some(Self::IndexedCrc32),
            Self::INDEXED => Some(Self::Indexed),
            _ => None,
        }
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        match self {
            Self::Indexed => Self::INDEXED,
            Self::IndexedCrc32 => Self::INDEXED_CRC32,
            Self::Generic => Self::GENERIC,
        }
    }
}

/// Converter between cell trees and the standard byte representation.
pub struct Boc;

impl Boc {
    /// Encodes the cell tree into bytes using the generic BOC format
    /// without a checksum.
    pub fn encode(cell: &Cell) -> Vec<u8> {
        Self::encode_ext(cell, false)
    }

    /// Encodes the cell tree into bytes, optionally appending a CRC32-C
    /// checksum.
    pub fn encode_ext(cell: &Cell, include_crc: bool) -> Vec<u8> {
        let mut res = Vec::new();
        ser::BocHeader::new(cell)
            .with_crc(include_crc)
            .encode(&mut res);
        res
    }

    /// Encodes the cell tree as base64 encoded bytes.
    #[cfg(feature = "base64")]
    pub fn encode_base64(cell: &Cell) -> String {
        crate::util::encode_base64(Self::encode(cell))
    }

    /// Decodes the root cell from bytes.
    pub fn decode<T: AsRef<[u8]>>(data: T) -> Result<Cell, Error> {
        de::decode(data.as_ref())
    }

    /// Decodes the root cell from base64 encoded bytes.
    #[cfg(feature = "base64")]
    pub fn decode_base64<T: AsRef<[u8]>>(data: T) -> Result<Cell, Error> {
        match crate::util::decode_base64(data) {
            Ok(data) => de::decode(&data),
            Err(_) => Err(Error::InvalidData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellBuilder;

    #[test]
    fn empty_cell_well_known_form() {
        let encoded = Boc::encode(&Cell::empty());
        assert_eq!(
            encoded,
            [0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, 0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00]
        );

        let decoded = Boc::decode(&encoded).unwrap();
        assert_eq!(decoded, Cell::empty());
    }

    #[cfg(feature = "base64")]
    #[test]
    fn empty_cell_base64() {
        assert_eq!(Boc::encode_base64(&Cell::empty()), "te6ccgEBAQEAAgAAAA==");
    }

    #[test]
    fn tree_round_trip() {
        let leaf = {
            let mut builder = CellBuilder::new();
            builder.store_u64(0x0102_0304_0506_0708).unwrap();
            builder.build()
        };

        let branch = {
            let mut builder = CellBuilder::new();
            builder.store_uint(0b101, 3).unwrap();
            builder.store_reference(leaf.clone()).unwrap();
            builder.build()
        };

        // The leaf is shared: the encoder must deduplicate it.
        let root = {
            let mut builder = CellBuilder::new();
            builder.store_u16(0xffff).unwrap();
            builder.store_reference(branch).unwrap();
            builder.store_reference(leaf).unwrap();
            builder.build()
        };

        let encoded = Boc::encode(&root);
        let decoded = Boc::decode(&encoded).unwrap();
        assert_eq!(decoded, root);
        assert_eq!(decoded.repr_hash(), root.repr_hash());
    }

    #[test]
    fn crc_round_trip() {
        let mut builder = CellBuilder::new();
        builder.store_u32(42).unwrap();
        let cell = builder.build();

        let encoded = Boc::encode_ext(&cell, true);
        assert_eq!(Boc::decode(&encoded).unwrap(), cell);

        // Flipping a payload byte must break the checksum.
        let mut corrupted = encoded;
        let index = corrupted.len() - 6;
        corrupted[index] ^= 0xff;
        assert!(Boc::decode(&corrupted).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(Boc::decode([0u8; 4]), Err(Error::InvalidData));
        assert_eq!(Boc::decode([]), Err(Error::InvalidData));
        assert!(Boc::decode([0xb5, 0xee, 0x9c, 0x72, 0x01]).is_err());
    }

    #[test]
    fn decode_rejects_oversized_header_counts() {
        // A 23-byte input declaring 2^32-1 cells over 2^34 bytes. The
        // declared sizes must be checked against the input length before
        // any of them backs an allocation.
        let encoded = [
            0xb5, 0xee, 0x9c, 0x72, // tag
            0x04, 0x05, // ref_size 4, offset_size 5
            0xff, 0xff, 0xff, 0xff, // cell count
            0x00, 0x00, 0x00, 0x01, // root count
            0x00, 0x00, 0x00, 0x00, // absent count
            0x04, 0x00, 0x00, 0x00, 0x00, // total cells size
        ];
        assert_eq!(Boc::decode(encoded), Err(Error::InvalidData));
    }

    #[test]
    fn decode_rejects_noncanonical_padding() {
        // d2 = 3 declares two unaligned data bytes, but the completion
        // tag sits in the first byte, leaving a whole byte of padding.
        let encoded = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, // header
            0x01, 0x01, 0x00, 0x04, 0x00, // counts, size, root index
            0x00, 0x03, 0x80, 0x80, // cell
        ];
        assert_eq!(Boc::decode(encoded), Err(Error::InvalidCell));

        // An unaligned cell whose last byte carries no completion tag.
        let encoded = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, // header
            0x01, 0x01, 0x00, 0x03, 0x00, // counts, size, root index
            0x00, 0x01, 0x00, // cell
        ];
        assert_eq!(Boc::decode(encoded), Err(Error::InvalidCell));
    }

    #[test]
    fn decode_rejects_backward_reference() {
        // The second cell points back at the first; references must only
        // go forward.
        let encoded = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, // header
            0x02, 0x01, 0x00, 0x05, 0x00, // counts, size, root index
            0x00, 0x00, // first cell
            0x01, 0x00, 0x00, // second cell, ref -> 0
        ];
        assert_eq!(Boc::decode(encoded), Err(Error::InvalidCell));
    }

    #[test]
    fn decode_rejects_cells_size_mismatch() {
        // One empty cell (2 bytes) under a declared size of 3.
        let encoded = [
            0xb5, 0xee, 0x9c, 0x72, 0x01, 0x01, // header
            0x01, 0x01, 0x00, 0x03, 0x00, // counts, size, root index
            0x00, 0x00, // cell
            0x00, // stray trailing byte
        ];
        assert_eq!(Boc::decode(encoded), Err(Error::InvalidData));
    }
}
