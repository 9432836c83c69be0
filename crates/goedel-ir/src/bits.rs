//! Packed bit buffer and cursor for the wire codec.

use goedel_core::{Error, Result};

/// Growable MSB-first bit buffer. Bit 0 is the most significant bit of the
/// first byte; the final byte is padded with zeros on the right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitVec {
    data: Vec<u8>,
    len: usize,
}

impl BitVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Left-aligned backing bytes (the last byte may be partially used).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn push(&mut self, bit: bool) {
        let byte = self.len / 8;
        if byte == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[byte] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Append the low `width` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, width: usize) {
        debug_assert!(width <= 64);
        for shift in (0..width).rev() {
            self.push((value >> shift) & 1 == 1);
        }
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.data[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    pub fn reader(&self) -> BitReader<'_> {
        BitReader { bits: self, pos: 0 }
    }
}

/// Borrowing cursor over a [`BitVec`]. Reads past the end are
/// [`Error::MalformedStream`], never a panic: a truncated stream must abort
/// the decode that hit it.
#[derive(Debug)]
pub struct BitReader<'a> {
    bits: &'a BitVec,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        let bit = self
            .bits
            .get(self.pos)
            .ok_or_else(|| Error::MalformedStream(format!("bitstream exhausted at bit {}", self.pos)))?;
        self.pos += 1;
        Ok(bit)
    }

    /// Read `width` bits, most significant first.
    pub fn read_bits(&mut self, width: usize) -> Result<u64> {
        debug_assert!(width <= 64);
        if self.remaining() < width {
            return Err(Error::MalformedStream(format!(
                "bitstream exhausted: wanted {} bits at bit {}, {} left",
                width,
                self.pos,
                self.remaining()
            )));
        }
        let mut value = 0u64;
        for _ in 0..width {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }
}
