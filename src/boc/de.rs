use smallvec::SmallVec;

use super::BocTag;
use crate::cell::{Cell, CellRefs, MAX_REF_COUNT};
use crate::error::Error;
use crate::util::read_be_uint;

/// Parsed but not yet linked cell.
struct IntermediateCell<'a> {
    bit_len: u16,
    data: &'a [u8],
    references: SmallVec<[u32; MAX_REF_COUNT]>,
}

struct Reader<'a> {
    src: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn require(&self, len: usize) -> Result<(), Error> {
        if self.offset + len <= self.src.len() {
            Ok(())
        } else {
            Err(Error::InvalidData)
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        ok!(self.require(len));
        let res = &self.src[self.offset..self.offset + len];
        self.offset += len;
        Ok(res)
    }

    fn read_uint(&mut self, size: usize) -> Result<u64, Error> {
        ok!(self.require(size));
        let res = read_be_uint(&self.src[self.offset..], size);
        self.offset += size;
        Ok(res)
    }
}

pub(crate) fn decode(src: &[u8]) -> Result<Cell, Error> {
    let mut reader = Reader { src, offset: 0 };

    ok!(reader.require(6));
    let tag_bytes: [u8; 4] = ok!(reader.read_bytes(4)).try_into().unwrap_or_default();
    let flags = src[4];
    let offset_size = src[5] as usize;

    let has_index;
    let has_crc;
    let ref_size;
    let has_root_list;
    match BocTag::from_bytes(tag_bytes) {
        Some(BocTag::Indexed) => {
            has_index = true;
            has_crc = false;
            ref_size = flags as usize;
            has_root_list = false;
        }
        Some(BocTag::IndexedCrc32) => {
            has_index = true;
            has_crc = true;
            ref_size = flags as usize;
            has_root_list = false;
        }
        Some(BocTag::Generic) => {
            has_index = flags & 0b1000_0000 != 0;
            has_crc = flags & 0b0100_0000 != 0;
            ref_size = (flags & 0b0000_0111) as usize;
            has_root_list = true;
        }
        None => return Err(Error::InvalidData),
    }
    if !(1..=4).contains(&ref_size) || !(1..=8).contains(&offset_size) {
        return Err(Error::InvalidData);
    }
    reader.offset = 6;

    let cell_count = ok!(reader.read_uint(ref_size)) as usize;
    let root_count = ok!(reader.read_uint(ref_size)) as usize;
    let absent_count = ok!(reader.read_uint(ref_size)) as usize;
    let total_cells_size = ok!(reader.read_uint(offset_size));

    if cell_count == 0 || root_count == 0 || absent_count != 0 {
        return Err(Error::InvalidData);
    }
    if root_count > cell_count {
        return Err(Error::InvalidData);
    }

    // Each cell occupies at least its two descriptor bytes and at most
    // a full data payload plus maximum-width references.
    let min_cell_size = 2u64;
    let max_cell_size = 2 + 128 + (MAX_REF_COUNT * ref_size) as u64;
    if total_cells_size < min_cell_size * cell_count as u64
        || total_cells_size > max_cell_size * cell_count as u64
    {
        return Err(Error::InvalidData);
    }

    // Everything the header declares must already be present in the
    // input, before any count is trusted for allocation.
    let root_list_size = u64::from(has_root_list) * root_count as u64 * ref_size as u64;
    let index_size = u64::from(has_index) * cell_count as u64 * offset_size as u64;
    let required =
        root_list_size + index_size + total_cells_size + u64::from(has_crc) * 4;
    if required > (src.len() - reader.offset) as u64 {
        return Err(Error::InvalidData);
    }

    let root_index = if has_root_list {
        let first = ok!(reader.read_uint(ref_size)) as usize;
        for _ in 1..root_count {
            ok!(reader.read_uint(ref_size));
        }
        first
    } else {
        0
    };
    if root_index >= cell_count {
        return Err(Error::InvalidData);
    }

    if has_index {
        ok!(reader.read_bytes(cell_count * offset_size));
    }

    let cells_start = reader.offset;
    let mut intermediate = Vec::with_capacity(cell_count);
    for index in 0..cell_count {
        let [d1, d2] = match ok!(reader.read_bytes(2)) {
            &[d1, d2] => [d1, d2],
            _ => return Err(Error::InvalidData),
        };
        if d1 == 0b0000_1111 {
            // Absent cells are not supported.
            return Err(Error::InvalidCell);
        }
        if d1 & 0b1111_1000 != 0 {
            // Only ordinary zero-level cells can appear here.
            return Err(Error::InvalidCell);
        }

        let ref_count = (d1 & 0b111) as usize;
        let data_len = ((d2 >> 1) + (d2 & 1)) as usize;
        let data = ok!(reader.read_bytes(data_len));

        let bit_len = if d2 & 1 == 0 {
            data_len as u16 * 8
        } else {
            match compute_bit_len(data) {
                // Non-canonical padding (a whole trailing byte of it) is rejected.
                Some(bit_len) if ((bit_len + 7) / 8) as usize == data_len => bit_len,
                _ => return Err(Error::InvalidCell),
            }
        };

        let mut references = SmallVec::new();
        for _ in 0..ref_count {
            let child = ok!(reader.read_uint(ref_size)) as usize;
            // References must be topologically ordered.
            if child <= index || child >= cell_count {
                return Err(Error::InvalidCell);
            }
            references.push(child as u32);
        }

        intermediate.push(IntermediateCell {
            bit_len,
            data,
            references,
        });
    }

    if reader.offset - cells_start != total_cells_size as usize {
        return Err(Error::InvalidData);
    }

    if has_crc {
        let checksum_offset = reader.offset;
        let stored: [u8; 4] = ok!(reader.read_bytes(4)).try_into().unwrap_or_default();
        if crc32c::crc32c(&src[..checksum_offset]) != u32::from_le_bytes(stored) {
            return Err(Error::InvalidData);
        }
    }

    let mut cells: Vec<Option<Cell>> = vec![None; cell_count];
    for (index, parsed) in intermediate.iter().enumerate().rev() {
        let mut references = CellRefs::new();
        for child in &parsed.references {
            match &cells[*child as usize] {
                Some(cell) => references.push(cell.clone()),
                None => return Err(Error::InvalidCell),
            }
        }
        cells[index] = Some(Cell::from_parts(parsed.data, parsed.bit_len, references));
    }

    match cells.into_iter().nth(root_index).flatten() {
        Some(root) => Ok(root),
        None => Err(Error::InvalidCell),
    }
}

/// Computes the data length in bits from tag-padded bytes.
///
/// Returns `None` if the completion tag is missing from the last byte.
fn compute_bit_len(data: &[u8]) -> Option<u16> {
    let last = *data.last()?;
    if last == 0 {
        return None;
    }
    Some(data.len() as u16 * 8 - 1 - last.trailing_zeros() as u16)
}
