use ahash::AHashMap;

use super::BocTag;
use crate::cell::{Cell, CellHash};

/// Intermediate BOC encoder state.
///
/// Cells are collected in reverse topological order (children first) and
/// deduplicated by representation hash, so a shared subtree is stored
/// once.
pub(crate) struct BocHeader<'a> {
    root_rev_index: u32,
    rev_indices: AHashMap<&'a CellHash, u32>,
    rev_cells: Vec<&'a Cell>,
    total_data_size: u64,
    reference_count: u64,
    cell_count: u32,
    include_crc: bool,
}

impl<'a> BocHeader<'a> {
    pub fn new(root: &'a Cell) -> Self {
        let mut res = Self {
            root_rev_index: 0,
            rev_indices: Default::default(),
            rev_cells: Default::default(),
            total_data_size: 0,
            reference_count: 0,
            cell_count: 0,
            include_crc: false,
        };
        res.root_rev_index = res.fill(root);
        res
    }

    #[inline]
    pub fn with_crc(mut self, include_crc: bool) -> Self {
        self.include_crc = include_crc;
        self
    }

    pub fn encode(self, target: &mut Vec<u8>) {
        let ref_size = number_of_bytes_to_fit(self.cell_count as u64);
        let total_cells_size: u64 = self.total_data_size
            + (self.cell_count as u64 * 2) // all descriptor bytes
            + (ref_size as u64 * self.reference_count);
        let offset_size = number_of_bytes_to_fit(total_cells_size);

        debug_assert!((1..=4).contains(&ref_size));
        debug_assert!((1..=8).contains(&offset_size));

        let flags = (ref_size as u8) | (u8::from(self.include_crc) * 0b0100_0000);

        // 4 bytes - BOC tag
        // 1 byte - flags
        // 1 byte - offset size
        // {ref_size} - cell count
        // {ref_size} - root count
        // {ref_size} - absent cell count
        // {offset_size} - total cells size
        // {ref_size} - root index
        // {total_cells_size} - cells
        // include_crc * 4 - optional CRC32
        let total_size = 4
            + 2
            + (ref_size as u64) * 4
            + (offset_size as u64)
            + total_cells_size
            + u64::from(self.include_crc) * 4;
        target.reserve(total_size as usize);

        target.extend_from_slice(&BocTag::Generic.to_bytes());
        target.extend_from_slice(&[flags, offset_size as u8]);
        target.extend_from_slice(&self.cell_count.to_be_bytes()[4 - ref_size..]);
        target.extend_from_slice(&1u32.to_be_bytes()[4 - ref_size..]);
        target.extend_from_slice(&[0; 4][4 - ref_size..]);
        target.extend_from_slice(&total_cells_size.to_be_bytes()[8 - offset_size..]);

        let root_index = self.cell_count - self.root_rev_index - 1;
        target.extend_from_slice(&root_index.to_be_bytes()[4 - ref_size..]);

        for cell in self.rev_cells.into_iter().rev() {
            let descriptor = cell.descriptor();
            target.extend_from_slice(&[descriptor.d1, descriptor.d2]);
            target.extend_from_slice(cell.data());
            for child in cell.references() {
                // Filled during the traversal, so the child is always present.
                if let Some(rev_index) = self.rev_indices.get(child.repr_hash()) {
                    let child_index = self.cell_count - *rev_index - 1;
                    target.extend_from_slice(&child_index.to_be_bytes()[4 - ref_size..]);
                }
            }
        }

        if self.include_crc {
            let checksum = crc32c::crc32c(target);
            target.extend_from_slice(&checksum.to_le_bytes());
        }
    }

    fn fill(&mut self, cell: &'a Cell) -> u32 {
        if let Some(index) = self.rev_indices.get(cell.repr_hash()) {
            return *index;
        }

        for child in cell.references() {
            self.fill(child);
        }

        let index = self.cell_count;
        self.rev_indices.insert(cell.repr_hash(), index);
        self.rev_cells.push(cell);

        let descriptor = cell.descriptor();
        self.total_data_size += descriptor.byte_len() as u64;
        self.reference_count += descriptor.reference_count() as u64;
        self.cell_count += 1;

        index
    }
}

fn number_of_bytes_to_fit(l: u64) -> usize {
    std::cmp::max(1, 8 - l.leading_zeros() as usize / 8)
}
