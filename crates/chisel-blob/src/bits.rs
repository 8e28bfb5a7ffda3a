//! LSB-first bit packing and LEB128 varints shared by the blob and share
//! formats.

use crate::error::BlobError;

#[inline]
fn mask(width: u32) -> u64 {
    (1u64 << width) - 1
}

/// Minimum number of bits able to represent `max`. Zero for `max == 0`.
#[inline]
pub fn width_for(max: u32) -> u32 {
    32 - max.leading_zeros()
}

#[inline]
pub fn packed_len(cells: usize, width: u32) -> usize {
    (cells * width as usize).div_ceil(8)
}

pub struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    acc: u64,
    bits: u32,
}

impl<'a> BitWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out, acc: 0, bits: 0 }
    }

    #[inline]
    pub fn push(&mut self, value: u32, width: u32) {
        debug_assert!(width <= 32);
        if width == 0 {
            return;
        }
        self.acc |= (value as u64 & mask(width)) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.bits -= 8;
        }
    }

    pub fn finish(self) {
        if self.bits > 0 {
            self.out.push(self.acc as u8);
        }
    }
}

pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u64,
    bits: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    /// Bytes consumed so far; a partly read byte counts as consumed.
    pub fn byte_pos(&self) -> usize {
        self.pos
    }

    /// `None` once the input runs out.
    #[inline]
    pub fn read(&mut self, width: u32) -> Option<u32> {
        if width == 0 {
            return Some(0);
        }
        while self.bits < width {
            let b = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc |= (b as u64) << self.bits;
            self.bits += 8;
        }
        let v = (self.acc & mask(width)) as u32;
        self.acc >>= width;
        self.bits -= width;
        Some(v)
    }
}

pub fn write_varint(out: &mut Vec<u8>, mut v: u32) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn read_varint(data: &[u8], pos: &mut usize) -> Result<u32, BlobError> {
    let mut value: u64 = 0;
    for shift in (0..35).step_by(7) {
        let b = *data
            .get(*pos)
            .ok_or_else(|| BlobError::malformed("truncated varint"))?;
        *pos += 1;
        value |= ((b & 0x7f) as u64) << shift;
        if b & 0x80 == 0 {
            return u32::try_from(value).map_err(|_| BlobError::malformed("varint overflows u32"));
        }
    }
    Err(BlobError::malformed("varint longer than 5 bytes"))
}
