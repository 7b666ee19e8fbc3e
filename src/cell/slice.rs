use crate::cell::Cell;
use crate::error::Error;

/// A read cursor over a finalized cell.
///
/// Tracks independent windows for data bits and references; every `load_*`
/// consumes from the start of its window. Reads past the end fail with
/// [`Error::CellUnderflow`] and consume nothing.
#[derive(Debug, Clone, Copy)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bits_window_start: u16,
    bits_window_end: u16,
    refs_window_start: u8,
    refs_window_end: u8,
}

impl<'a> CellSlice<'a> {
    /// Constructs a new cell slice over the whole cell.
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            bits_window_start: 0,
            bits_window_end: cell.bit_len(),
            refs_window_start: 0,
            refs_window_end: cell.reference_count(),
            cell,
        }
    }

    /// Returns the underlying cell.
    #[inline]
    pub fn cell(&self) -> &'a Cell {
        self.cell
    }

    /// Returns whether there are no bits of data left.
    pub fn is_data_empty(&self) -> bool {
        self.bits_window_start >= self.bits_window_end
    }

    /// Returns whether there are no references left.
    pub fn is_refs_empty(&self) -> bool {
        self.refs_window_start >= self.refs_window_end
    }

    /// Returns whether both data and references are exhausted.
    pub fn is_empty(&self) -> bool {
        self.is_data_empty() && self.is_refs_empty()
    }

    /// Returns the number of remaining bits of data in the slice.
    pub fn remaining_bits(&self) -> u16 {
        self.bits_window_end.saturating_sub(self.bits_window_start)
    }

    /// Returns the number of remaining references in the slice.
    pub fn remaining_refs(&self) -> u8 {
        self.refs_window_end.saturating_sub(self.refs_window_start)
    }

    /// Advances the start of the data window.
    pub fn skip_bits(&mut self, bits: u16) -> Result<(), Error> {
        if bits <= self.remaining_bits() {
            self.bits_window_start += bits;
            Ok(())
        } else {
            Err(Error::CellUnderflow)
        }
    }

    /// Reads the bit at the specified offset without consuming it.
    pub fn get_bit(&self, offset: u16) -> Result<bool, Error> {
        if offset < self.remaining_bits() {
            let index = self.bits_window_start + offset;
            let byte = self.cell.data()[(index / 8) as usize];
            Ok((byte >> (7 - index % 8)) & 1 != 0)
        } else {
            Err(Error::CellUnderflow)
        }
    }

    /// Reads the next bit.
    pub fn load_bit(&mut self) -> Result<bool, Error> {
        let bit = ok!(self.get_bit(0));
        self.bits_window_start += 1;
        Ok(bit)
    }

    /// Reads up to 8 bits at the specified offset without consuming them.
    pub fn get_small_uint(&self, offset: u16, bits: u16) -> Result<u8, Error> {
        if bits == 0 {
            return Ok(0);
        }
        if bits > 8 {
            return Err(Error::IntOverflow);
        }
        if bits > self.remaining_bits() || offset > self.remaining_bits() - bits {
            return Err(Error::CellUnderflow);
        }

        let index = self.bits_window_start + offset;
        let data = self.cell.data();
        let q = (index / 8) as usize;
        let r = index % 8;
        let byte = data[q];

        if r == 0 {
            // xxx_____ -> _____xxx
            Ok(byte >> (8 - bits))
        } else if bits <= 8 - r {
            // __xxx___ -> _____xxx
            Ok((byte >> (8 - r - bits)) & (0xffu16 >> (8 - bits)) as u8)
        } else {
            // ______xx|y_______ -> _____xxy
            let next = data.get(q + 1).copied().unwrap_or_default();
            let window = ((byte as u16) << 8) | next as u16;
            Ok(((window >> (8 - r)) as u8) >> (8 - bits))
        }
    }

    /// Reads the next small unsigned integer of up to 8 bits.
    pub fn load_small_uint(&mut self, bits: u16) -> Result<u8, Error> {
        let res = ok!(self.get_small_uint(0, bits));
        self.bits_window_start += bits;
        Ok(res)
    }

    /// Reads the next unsigned integer of up to 64 bits (big-endian).
    pub fn load_uint(&mut self, bits: u16) -> Result<u64, Error> {
        if bits > 64 {
            return Err(Error::IntOverflow);
        }
        if self.remaining_bits() < bits {
            return Err(Error::CellUnderflow);
        }
        let mut res = 0u64;
        let mut offset = 0;
        while offset < bits {
            let take = std::cmp::min(8, bits - offset);
            let chunk = ok!(self.get_small_uint(offset, take));
            res = (res << take) | chunk as u64;
            offset += take;
        }
        self.bits_window_start += bits;
        Ok(res)
    }

    #[inline]
    pub fn load_u8(&mut self) -> Result<u8, Error> {
        self.load_uint(8).map(|value| value as u8)
    }

    #[inline]
    pub fn load_u16(&mut self) -> Result<u16, Error> {
        self.load_uint(16).map(|value| value as u16)
    }

    #[inline]
    pub fn load_u32(&mut self) -> Result<u32, Error> {
        self.load_uint(32).map(|value| value as u32)
    }

    #[inline]
    pub fn load_u64(&mut self) -> Result<u64, Error> {
        self.load_uint(64)
    }

    pub fn load_u128(&mut self) -> Result<u128, Error> {
        if self.remaining_bits() < 128 {
            return Err(Error::CellUnderflow);
        }
        let hi = ok!(self.load_uint(64));
        let lo = ok!(self.load_uint(64));
        Ok(((hi as u128) << 64) | lo as u128)
    }

    pub fn load_u256(&mut self) -> Result<[u8; 32], Error> {
        let mut res = [0; 32];
        ok!(self.load_raw(&mut res, 256));
        Ok(res)
    }

    /// Reads the next `bits` bits into the beginning of `target`.
    ///
    /// Bits are packed MSB-first; a trailing partial byte ends up in the
    /// high bits of the last written byte.
    pub fn load_raw(&mut self, target: &mut [u8], bits: u16) -> Result<(), Error> {
        if self.remaining_bits() < bits {
            return Err(Error::CellUnderflow);
        }
        if target.len() < ((bits + 7) / 8) as usize {
            return Err(Error::InvalidData);
        }
        let mut offset = 0;
        let mut index = 0;
        while offset < bits {
            let take = std::cmp::min(8, bits - offset);
            let chunk = ok!(self.get_small_uint(offset, take));
            target[index] = chunk << (8 - take);
            offset += take;
            index += 1;
        }
        self.bits_window_start += bits;
        Ok(())
    }

    /// Reads a coin amount stored as `VarUInteger 16`.
    pub fn load_coins(&mut self) -> Result<u128, Error> {
        let byte_len = ok!(self.load_small_uint(4)) as u16;
        if self.remaining_bits() < byte_len * 8 {
            return Err(Error::CellUnderflow);
        }
        let mut res = 0u128;
        for _ in 0..byte_len {
            res = (res << 8) | ok!(self.load_small_uint(8)) as u128;
        }
        Ok(res)
    }

    /// Returns a reference to the Nth child cell (relative to this slice's
    /// refs window) without consuming it.
    pub fn reference(&self, index: u8) -> Option<&'a Cell> {
        if self.refs_window_start + index < self.refs_window_end {
            self.cell.reference(self.refs_window_start + index)
        } else {
            None
        }
    }

    /// Returns the Nth child cell (relative to this slice's refs window)
    /// without consuming it.
    pub fn reference_cloned(&self, index: u8) -> Option<Cell> {
        if self.refs_window_start + index < self.refs_window_end {
            self.cell.reference_cloned(self.refs_window_start + index)
        } else {
            None
        }
    }

    /// Reads the next child cell, advancing the refs window.
    pub fn load_reference(&mut self) -> Result<&'a Cell, Error> {
        if self.refs_window_start < self.refs_window_end {
            match self.cell.reference(self.refs_window_start) {
                Some(cell) => {
                    self.refs_window_start += 1;
                    Ok(cell)
                }
                None => Err(Error::CellUnderflow),
            }
        } else {
            Err(Error::CellUnderflow)
        }
    }

    /// Reads the next child cell, advancing the refs window.
    pub fn load_reference_cloned(&mut self) -> Result<Cell, Error> {
        self.load_reference().cloned()
    }

    /// Consumes the rest of the slice, returning it as a new slice.
    pub fn load_remaining(&mut self) -> CellSlice<'a> {
        let res = *self;
        self.bits_window_start = self.bits_window_end;
        self.refs_window_start = self.refs_window_end;
        res
    }
}
