//! Format selection: encode to the smallest integer, decode from its header.
//!
//! Encoding is an exhaustive search over [`Format::all`]: every candidate is
//! encoded independently and the numerically smallest result wins. Each
//! candidate is a pure function of the program, so the reduction order does
//! not matter. Decoding parses the header once and runs a single block
//! decode in that configuration.

use crate::alphabet::Alphabet;
use crate::bits::BitVec;
use crate::block::{decode_toplevel, encode_block, Layout};
use crate::format::Format;
use crate::numeral::Numeral;
use crate::program::Program;
use goedel_core::{Error, Result};

/// Encode under one fixed format. Public so callers (and the optimality
/// tests) can pin a configuration; [`encode`] is the usual entry point.
pub fn encode_with(program: &Program, format: &Format) -> Result<Numeral> {
    let mut bits = BitVec::new();
    format.write_header(&mut bits);

    let layout = match format {
        Format::FixedPrefixed => Layout::FixedPrefixed,
        Format::FixedSentinel { m } => Layout::FixedSentinel { m: *m },
        Format::CompactSentinel { m } | Format::CompactShort { m } => {
            let table = format.table().expect("compact format has a table");
            let alphabet = Alphabet::derive(program.instructions(), table);
            alphabet.write_bitmap(&mut bits, table);
            Layout::Compact { alphabet, m: *m }
        }
    };

    encode_block(&mut bits, program.instructions(), &layout)?;
    Ok(Numeral::from_bits(&bits))
}

/// Encode a program as the smallest integer any supported format produces.
///
/// Candidates that cannot represent the program (range-limited operands or
/// oversized bodies) are skipped; the call fails only if every candidate
/// does.
pub fn encode(program: &Program) -> Result<Numeral> {
    let mut best: Option<(Format, Numeral)> = None;
    let mut last_err = None;

    for format in Format::all() {
        match encode_with(program, &format) {
            Ok(n) => {
                if best.as_ref().map_or(true, |(_, b)| n < *b) {
                    best = Some((format, n));
                }
            }
            Err(err) => last_err = Some(err),
        }
    }

    match best {
        Some((format, n)) => {
            tracing::debug!(?format, bits = n.bit_len(), "selected winning format");
            Ok(n)
        }
        None => Err(last_err
            .unwrap_or_else(|| Error::Range("no candidate format".to_string()))),
    }
}

/// Decode an integer back into the exact instruction tree it encodes.
pub fn decode(n: &Numeral) -> Result<Program> {
    if n.is_zero() {
        return Err(Error::MalformedStream(
            "zero has no leading one-bit".to_string(),
        ));
    }
    let bits = n.to_bits();
    let mut r = bits.reader();
    let format = Format::parse_header(&mut r)?;

    let layout = match format {
        Format::FixedPrefixed => Layout::FixedPrefixed,
        Format::FixedSentinel { m } => Layout::FixedSentinel { m },
        Format::CompactSentinel { m } | Format::CompactShort { m } => {
            let table = format.table().expect("compact format has a table");
            let alphabet = Alphabet::read_bitmap(&mut r, table)?;
            Layout::Compact { alphabet, m }
        }
    };

    let instructions = decode_toplevel(&mut r, &layout)?;
    Ok(Program::with_instructions(instructions))
}
