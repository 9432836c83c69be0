//! Wire format descriptors and the bitstream header.
//!
//! The header is tiny: a leading one-bit (so the integer never silently
//! sheds leading zero bits), a 2-bit mode tag, and 4 bits of `m - 1` for
//! the Golomb divisor. Compact modes follow it with their presence bitmap,
//! which [`crate::codec`] reads and writes alongside the header.

use crate::alphabet::{Symbol, GENERIC_TABLE, SHORT_TABLE};
use crate::bits::{BitReader, BitVec};
use crate::varint::MAX_DIVISOR;
use goedel_core::{Error, Result};

/// One candidate wire format: alphabet axis plus Golomb divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Fixed 4-bit opcodes, 8-bit length prefixes, 8-bit operands.
    FixedPrefixed,
    /// Fixed 4-bit opcodes, sentinel-terminated bodies, Golomb operands.
    FixedSentinel { m: u32 },
    /// Derived minimal alphabet over the 15 opcodes.
    CompactSentinel { m: u32 },
    /// Derived alphabet extended with short-immediate symbols.
    CompactShort { m: u32 },
}

impl Format {
    /// Every combination the selector tries: the prefixed layout plus each
    /// sentinel mode for every divisor in `1..=16`.
    pub fn all() -> Vec<Format> {
        let mut formats = vec![Format::FixedPrefixed];
        for m in 1..=MAX_DIVISOR {
            formats.push(Format::FixedSentinel { m });
            formats.push(Format::CompactSentinel { m });
            formats.push(Format::CompactShort { m });
        }
        formats
    }

    fn mode(&self) -> u64 {
        match self {
            Format::FixedPrefixed => 0,
            Format::FixedSentinel { .. } => 1,
            Format::CompactSentinel { .. } => 2,
            Format::CompactShort { .. } => 3,
        }
    }

    /// Golomb divisor, for the modes that have one.
    pub fn divisor(&self) -> Option<u32> {
        match self {
            Format::FixedPrefixed => None,
            Format::FixedSentinel { m }
            | Format::CompactSentinel { m }
            | Format::CompactShort { m } => Some(*m),
        }
    }

    /// Canonical symbol table, for the compact modes.
    pub fn table(&self) -> Option<&'static [Symbol]> {
        match self {
            Format::CompactSentinel { .. } => Some(&GENERIC_TABLE),
            Format::CompactShort { .. } => Some(&SHORT_TABLE),
            _ => None,
        }
    }

    /// Emit the leading one-bit and the fixed-width header fields.
    pub fn write_header(&self, bits: &mut BitVec) {
        bits.push(true);
        bits.push_bits(self.mode(), 2);
        bits.push_bits(self.divisor().unwrap_or(1) as u64 - 1, 4);
    }

    /// Parse the header, including the leading one-bit.
    pub fn parse_header(r: &mut BitReader<'_>) -> Result<Format> {
        if !r.read_bit().map_err(|_| {
            Error::MalformedStream("integer too small to hold a header".to_string())
        })? {
            return Err(Error::MalformedStream(
                "missing leading one-bit".to_string(),
            ));
        }
        let mode = r
            .read_bits(2)
            .map_err(|_| Error::MalformedStream("truncated header".to_string()))?;
        let m = r
            .read_bits(4)
            .map_err(|_| Error::MalformedStream("truncated header".to_string()))? as u32
            + 1;
        Ok(match mode {
            // The prefixed mode has no divisor; the field is written as
            // zero and ignored here.
            0 => Format::FixedPrefixed,
            1 => Format::FixedSentinel { m },
            2 => Format::CompactSentinel { m },
            _ => Format::CompactShort { m },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_count() {
        let all = Format::all();
        assert_eq!(all.len(), 49);
        assert_eq!(all.iter().filter(|f| f.divisor().is_none()).count(), 1);
    }

    #[test]
    fn test_header_round_trip() {
        for format in Format::all() {
            let mut bits = BitVec::new();
            format.write_header(&mut bits);
            assert_eq!(bits.len(), 7);

            let mut r = bits.reader();
            assert_eq!(Format::parse_header(&mut r).unwrap(), format);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_truncated_header() {
        let mut bits = BitVec::new();
        bits.push_bits(0b10_11, 4);
        let mut r = bits.reader();
        assert!(Format::parse_header(&mut r).is_err());

        let empty = BitVec::new();
        let mut r = empty.reader();
        assert!(Format::parse_header(&mut r).is_err());
    }
}
