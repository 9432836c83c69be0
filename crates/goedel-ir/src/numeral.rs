//! Arbitrary-precision non-negative integer used as the wire format.
//!
//! The codec's output is "a number", but nothing here needs bignum
//! arithmetic beyond radix conversion, so the numeral is an owned big-endian
//! byte buffer rather than a bigint dependency. The invariant is that the
//! buffer never starts with a zero byte; zero itself is the empty buffer.

use crate::bits::BitVec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Numeral {
    bytes: Vec<u8>,
}

impl Numeral {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Big-endian bytes without leading zeros; empty for zero.
    pub fn to_be_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self {
            bytes: bytes[first..].to_vec(),
        }
    }

    /// Number of significant bits (0 for zero).
    pub fn bit_len(&self) -> usize {
        match self.bytes.first() {
            None => 0,
            Some(first) => self.bytes.len() * 8 - first.leading_zeros() as usize,
        }
    }

    /// Interpret a left-aligned bit buffer as a big-endian integer, i.e.
    /// the buffer's first bit becomes the numeral's most significant bit.
    pub fn from_bits(bits: &BitVec) -> Self {
        let len = bits.len();
        if len == 0 {
            return Self::zero();
        }
        let data = bits.as_bytes();
        let nbytes = (len + 7) / 8;
        let pad = nbytes * 8 - len;
        let mut out = vec![0u8; nbytes];
        if pad == 0 {
            out.copy_from_slice(&data[..nbytes]);
        } else {
            out[0] = data[0] >> pad;
            for i in 1..nbytes {
                out[i] = (data[i - 1] << (8 - pad)) | (data[i] >> pad);
            }
        }
        Self::from_be_bytes(&out)
    }

    /// The significant bits of the numeral, most significant first.
    pub fn to_bits(&self) -> BitVec {
        let mut bits = BitVec::new();
        let total = self.bit_len();
        let pad = self.bytes.len() * 8 - total;
        for i in 0..total {
            let pos = pad + i;
            let bit = self.bytes[pos / 8] & (0x80 >> (pos % 8)) != 0;
            bits.push(bit);
        }
        bits
    }

    fn mul_add_small(&mut self, mul: u32, add: u32) {
        let mut carry = add as u64;
        for b in self.bytes.iter_mut().rev() {
            let v = *b as u64 * mul as u64 + carry;
            *b = v as u8;
            carry = v >> 8;
        }
        while carry > 0 {
            self.bytes.insert(0, carry as u8);
            carry >>= 8;
        }
    }

    /// Divide in place by a small divisor, returning the remainder.
    fn divmod_small(&mut self, div: u32) -> u32 {
        let mut rem = 0u64;
        for b in self.bytes.iter_mut() {
            let v = (rem << 8) | *b as u64;
            *b = (v / div as u64) as u8;
            rem = v % div as u64;
        }
        while self.bytes.first() == Some(&0) {
            self.bytes.remove(0);
        }
        rem as u32
    }
}

impl From<u64> for Numeral {
    fn from(value: u64) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }
}

impl Ord for Numeral {
    fn cmp(&self, other: &Self) -> Ordering {
        // Normalized buffers make numeric order length-then-lexicographic.
        self.bytes
            .len()
            .cmp(&other.bytes.len())
            .then_with(|| self.bytes.cmp(&other.bytes))
    }
}

impl PartialOrd for Numeral {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut scratch = self.clone();
        let mut digits = Vec::new();
        while !scratch.is_zero() {
            digits.push(b'0' + scratch.divmod_small(10) as u8);
        }
        digits.reverse();
        write!(f, "{}", std::str::from_utf8(&digits).expect("ascii digits"))
    }
}

impl FromStr for Numeral {
    type Err = goedel_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(goedel_core::Error::Parse("empty numeral".to_string()));
        }
        let mut out = Numeral::zero();
        for c in s.chars() {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| goedel_core::Error::Parse(format!("invalid digit {c:?}")))?;
            out.mul_add_small(10, digit);
        }
        Ok(out)
    }
}
