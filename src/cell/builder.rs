use crate::cell::{Cell, CellRefs, CellSlice, MAX_BIT_LEN, MAX_REF_COUNT};
use crate::error::Error;

/// Builder for constructing cells.
///
/// Accumulates data bits and child references, then produces a finalized
/// [`Cell`] with `build`. All stores fail with [`Error::CellOverflow`]
/// once the 1023-bit or 4-reference capacity is exhausted; nothing is
/// truncated.
#[derive(Clone)]
pub struct CellBuilder {
    data: [u8; 128],
    bit_len: u16,
    references: CellRefs,
}

impl Default for CellBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl CellBuilder {
    pub fn new() -> Self {
        Self {
            data: [0; 128],
            bit_len: 0,
            references: Default::default(),
        }
    }

    /// Returns the data size of this cell in bits.
    #[inline]
    pub fn bit_len(&self) -> u16 {
        self.bit_len
    }

    #[inline]
    pub fn spare_bits_capacity(&self) -> u16 {
        MAX_BIT_LEN - self.bit_len
    }

    #[inline]
    pub fn spare_refs_capacity(&self) -> u8 {
        (MAX_REF_COUNT - self.references.len()) as u8
    }

    #[inline]
    pub fn references(&self) -> &[Cell] {
        &self.references
    }

    /// Writes up to 8 bits at the current cursor.
    ///
    /// The cursor only moves forward, so ORing into the pre-zeroed buffer
    /// never clobbers previously written bits.
    fn write_small(&mut self, value: u8, bits: u16) {
        debug_assert!((1..=8).contains(&bits));
        debug_assert!(self.bit_len + bits <= MAX_BIT_LEN);

        let q = (self.bit_len / 8) as usize;
        let r = self.bit_len % 8;
        let value = value & (0xffu16 >> (8 - bits)) as u8;
        if r + bits <= 8 {
            self.data[q] |= value << (8 - r - bits);
        } else {
            let spread = (value as u16) << (16 - r - bits);
            self.data[q] |= (spread >> 8) as u8;
            self.data[q + 1] |= spread as u8;
        }
        self.bit_len += bits;
    }

    /// Stores a single bit.
    pub fn store_bit(&mut self, bit: bool) -> Result<(), Error> {
        if self.bit_len < MAX_BIT_LEN {
            self.write_small(bit as u8, 1);
            Ok(())
        } else {
            Err(Error::CellOverflow)
        }
    }

    /// Stores the specified number of zero bits.
    pub fn store_zeros(&mut self, bits: u16) -> Result<(), Error> {
        if bits <= self.spare_bits_capacity() {
            self.bit_len += bits;
            Ok(())
        } else {
            Err(Error::CellOverflow)
        }
    }

    /// Stores a small unsigned integer of up to 8 bits.
    pub fn store_small_uint(&mut self, value: u8, bits: u16) -> Result<(), Error> {
        if bits == 0 {
            return Ok(());
        }
        if bits > 8 {
            return Err(Error::IntOverflow);
        }
        if self.bit_len + bits > MAX_BIT_LEN {
            return Err(Error::CellOverflow);
        }
        self.write_small(value, bits);
        Ok(())
    }

    /// Stores an unsigned integer of up to 64 bits (big-endian).
    ///
    /// Only the lowest `bits` bits of `value` are stored.
    pub fn store_uint(&mut self, value: u64, bits: u16) -> Result<(), Error> {
        if bits > 64 {
            return Err(Error::IntOverflow);
        }
        if self.bit_len + bits > MAX_BIT_LEN {
            return Err(Error::CellOverflow);
        }
        let mut rem = bits;
        while rem > 0 {
            let take = std::cmp::min(rem, 8);
            self.write_small((value >> (rem - take)) as u8, take);
            rem -= take;
        }
        Ok(())
    }

    #[inline]
    pub fn store_u8(&mut self, value: u8) -> Result<(), Error> {
        self.store_uint(value as u64, 8)
    }

    #[inline]
    pub fn store_u16(&mut self, value: u16) -> Result<(), Error> {
        self.store_uint(value as u64, 16)
    }

    #[inline]
    pub fn store_u32(&mut self, value: u32) -> Result<(), Error> {
        self.store_uint(value as u64, 32)
    }

    #[inline]
    pub fn store_u64(&mut self, value: u64) -> Result<(), Error> {
        self.store_uint(value, 64)
    }

    pub fn store_u128(&mut self, value: u128) -> Result<(), Error> {
        if self.bit_len + 128 > MAX_BIT_LEN {
            return Err(Error::CellOverflow);
        }
        ok!(self.store_uint((value >> 64) as u64, 64));
        self.store_uint(value as u64, 64)
    }

    #[inline]
    pub fn store_u256(&mut self, value: &[u8; 32]) -> Result<(), Error> {
        self.store_raw(value, 256)
    }

    /// Stores `bits` bits taken from the beginning of `data`.
    ///
    /// Bits are read MSB-first; a trailing partial byte contributes its
    /// high bits.
    pub fn store_raw(&mut self, data: &[u8], bits: u16) -> Result<(), Error> {
        if bits > self.spare_bits_capacity() {
            return Err(Error::CellOverflow);
        }
        if data.len() < ((bits + 7) / 8) as usize {
            return Err(Error::InvalidData);
        }
        let mut rem = bits;
        let mut index = 0;
        while rem > 0 {
            let take = std::cmp::min(rem, 8);
            self.write_small(data[index] >> (8 - take), take);
            rem -= take;
            index += 1;
        }
        Ok(())
    }

    /// Stores whole bytes.
    #[inline]
    pub fn store_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        if data.len() > (MAX_BIT_LEN / 8) as usize {
            return Err(Error::CellOverflow);
        }
        self.store_raw(data, data.len() as u16 * 8)
    }

    /// Stores a coin amount as `VarUInteger 16`: a 4-bit byte length
    /// followed by that many value bytes.
    pub fn store_coins(&mut self, value: u128) -> Result<(), Error> {
        let bits = 128 - value.leading_zeros() as u16;
        let byte_len = (bits + 7) / 8;
        if byte_len > 15 {
            return Err(Error::IntOverflow);
        }
        if self.bit_len + 4 + byte_len * 8 > MAX_BIT_LEN {
            return Err(Error::CellOverflow);
        }
        self.write_small(byte_len as u8, 4);
        let bytes = value.to_be_bytes();
        self.store_raw(&bytes[16 - byte_len as usize..], byte_len * 8)
    }

    /// Stores all remaining bits and references of the slice.
    pub fn store_slice(&mut self, slice: CellSlice<'_>) -> Result<(), Error> {
        let bits = slice.remaining_bits();
        let refs = slice.remaining_refs();
        if self.bit_len + bits > MAX_BIT_LEN
            || self.references.len() + refs as usize > MAX_REF_COUNT
        {
            return Err(Error::CellOverflow);
        }

        let mut offset = 0;
        while offset < bits {
            let take = std::cmp::min(8, bits - offset);
            let chunk = ok!(slice.get_small_uint(offset, take));
            self.write_small(chunk, take);
            offset += take;
        }

        for index in 0..refs {
            match slice.reference_cloned(index) {
                Some(cell) => self.references.push(cell),
                None => return Err(Error::CellUnderflow),
            }
        }
        Ok(())
    }

    /// Stores a reference to the child cell.
    pub fn store_reference(&mut self, cell: Cell) -> Result<(), Error> {
        if self.references.len() < MAX_REF_COUNT {
            self.references.push(cell);
            Ok(())
        } else {
            Err(Error::CellOverflow)
        }
    }

    /// Finalizes the cell, appending the completion tag to a partial
    /// last byte.
    pub fn build(mut self) -> Cell {
        debug_assert!(self.bit_len <= MAX_BIT_LEN);
        debug_assert!(self.references.len() <= MAX_REF_COUNT);

        let byte_len = ((self.bit_len + 7) / 8) as usize;
        let rem = self.bit_len % 8;
        if rem > 0 {
            self.data[byte_len - 1] |= 1 << (7 - rem);
        }
        Cell::from_parts(&self.data[..byte_len], self.bit_len, self.references)
    }
}

impl std::fmt::Debug for CellBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellBuilder")
            .field("data", &hex::encode(&self.data[..((self.bit_len + 7) / 8) as usize]))
            .field("bit_len", &self.bit_len)
            .field("refs", &self.references.len())
            .finish()
    }
}
