//! Recursive block codec: instruction sequences to and from bit runs.
//!
//! Every call threads an explicit [`Layout`]; there is no global codec
//! state. The layout fixes the two axes of the wire format: how opcodes are
//! spelled (fixed 4-bit codes vs. a derived compact alphabet) and how a
//! body ends (8-bit length prefix vs. in-band sentinel). The outermost
//! sequence is never terminated: decoding it simply consumes the stream to
//! the end.

use crate::alphabet::{unknown_code, Alphabet};
use crate::bits::{BitReader, BitVec};
use crate::instruction::{Instruction, Opcode};
use crate::varint::{read_golomb, write_golomb, zigzag_decode, zigzag_encode};
use goedel_core::{Error, Result};

/// Fixed-alphabet opcode width.
const OPCODE_BITS: usize = 4;
/// End-of-block code of the fixed sentinel layout (all ones).
const FIXED_SENTINEL: u64 = 15;
/// Body length field width of the prefixed layout.
const LEN_BITS: usize = 8;

/// Wire layout threaded through every encode/decode call.
#[derive(Debug, Clone)]
pub enum Layout {
    /// 4-bit opcodes, 8-bit body length prefixes, fixed 8-bit zigzag
    /// operands in -128..=127.
    FixedPrefixed,
    /// 4-bit opcodes, sentinel-terminated bodies, Golomb-coded operands.
    FixedSentinel { m: u32 },
    /// Derived alphabet, sentinel-terminated bodies, Golomb-coded operands.
    Compact { alphabet: Alphabet, m: u32 },
}

/// Append the encoding of an instruction sequence.
pub fn encode_block(bits: &mut BitVec, block: &[Instruction], layout: &Layout) -> Result<()> {
    for inst in block {
        encode_instruction(bits, inst, layout)?;
    }
    Ok(())
}

fn encode_instruction(bits: &mut BitVec, inst: &Instruction, layout: &Layout) -> Result<()> {
    let opcode = inst.opcode();
    let mut operand = inst.operand();

    match layout {
        Layout::FixedPrefixed | Layout::FixedSentinel { .. } => {
            bits.push_bits(opcode.code() as u64, OPCODE_BITS);
        }
        Layout::Compact { alphabet, .. } => {
            let (code, symbol) = alphabet.symbol_for(inst).ok_or_else(|| {
                Error::Range(format!("alphabet cannot express {opcode:?}"))
            })?;
            bits.push_bits(code, alphabet.width());
            if symbol.imm.is_some() {
                // Short symbol: the immediate is implied by the code.
                operand = None;
            }
        }
    }

    if let Some(k) = operand {
        match layout {
            Layout::FixedPrefixed => {
                if !(-128..=127).contains(&k) {
                    return Err(Error::Range(format!(
                        "operand {k} outside -128..=127 for {opcode:?}"
                    )));
                }
                bits.push_bits(zigzag_encode(k), LEN_BITS);
            }
            Layout::FixedSentinel { m } | Layout::Compact { m, .. } => {
                write_golomb(bits, k, *m)?;
            }
        }
    }

    if let Some(body) = inst.body() {
        match layout {
            Layout::FixedPrefixed => {
                if body.len() > 255 {
                    return Err(Error::Range(format!(
                        "{opcode:?} body of {} instructions exceeds the 8-bit length prefix",
                        body.len()
                    )));
                }
                bits.push_bits(body.len() as u64, LEN_BITS);
                encode_block(bits, body, layout)?;
            }
            Layout::FixedSentinel { .. } => {
                encode_block(bits, body, layout)?;
                bits.push_bits(FIXED_SENTINEL, OPCODE_BITS);
            }
            Layout::Compact { alphabet, .. } => {
                encode_block(bits, body, layout)?;
                // derive() reserves a sentinel whenever a body opcode is
                // present, so this cannot miss for encoder-built alphabets.
                let sentinel = alphabet.sentinel().ok_or_else(|| {
                    Error::Range("alphabet has no end-of-block sentinel".to_string())
                })?;
                bits.push_bits(sentinel, alphabet.width());
            }
        }
    }

    Ok(())
}

/// Decode the outermost instruction sequence, consuming the reader to the
/// end of the stream.
pub fn decode_toplevel(r: &mut BitReader<'_>, layout: &Layout) -> Result<Vec<Instruction>> {
    let mut block = Vec::new();
    while !r.is_empty() {
        match decode_instruction(r, layout)? {
            Some(inst) => block.push(inst),
            None => {
                return Err(Error::MalformedStream(
                    "end-of-block sentinel outside a body".to_string(),
                ))
            }
        }
    }
    Ok(block)
}

/// Decode one body, consuming its terminator.
fn decode_body(r: &mut BitReader<'_>, layout: &Layout) -> Result<Vec<Instruction>> {
    let mut body = Vec::new();
    match layout {
        Layout::FixedPrefixed => {
            let len = r.read_bits(LEN_BITS)?;
            for _ in 0..len {
                match decode_instruction(r, layout)? {
                    Some(inst) => body.push(inst),
                    None => unreachable!("prefixed layout has no sentinel"),
                }
            }
        }
        Layout::FixedSentinel { .. } | Layout::Compact { .. } => loop {
            match decode_instruction(r, layout)? {
                Some(inst) => body.push(inst),
                None => break,
            }
        },
    }
    Ok(body)
}

/// Decode one instruction. `Ok(None)` is an end-of-block sentinel.
fn decode_instruction(r: &mut BitReader<'_>, layout: &Layout) -> Result<Option<Instruction>> {
    let (opcode, short_imm) = match layout {
        Layout::FixedPrefixed => {
            let code = r.read_bits(OPCODE_BITS)?;
            match Opcode::from_code(code as u8) {
                Some(opcode) => (opcode, None),
                None => return Err(unknown_code(code, OPCODE_BITS)),
            }
        }
        Layout::FixedSentinel { .. } => {
            let code = r.read_bits(OPCODE_BITS)?;
            if code == FIXED_SENTINEL {
                return Ok(None);
            }
            match Opcode::from_code(code as u8) {
                Some(opcode) => (opcode, None),
                None => return Err(unknown_code(code, OPCODE_BITS)),
            }
        }
        Layout::Compact { alphabet, .. } => {
            let code = r.read_bits(alphabet.width())?;
            if alphabet.sentinel() == Some(code) {
                return Ok(None);
            }
            match alphabet.symbol_at(code) {
                Some(symbol) => (symbol.opcode, symbol.imm),
                None => return Err(unknown_code(code, alphabet.width())),
            }
        }
    };

    let operand = if opcode.has_operand() {
        Some(match short_imm {
            Some(k) => k,
            None => match layout {
                Layout::FixedPrefixed => zigzag_decode(r.read_bits(LEN_BITS)?),
                Layout::FixedSentinel { m } | Layout::Compact { m, .. } => read_golomb(r, *m)?,
            },
        })
    } else {
        None
    };

    let body = if opcode.has_body() {
        Some(decode_body(r, layout)?)
    } else {
        None
    };

    Instruction::from_parts(opcode, operand, body)
        .ok_or_else(|| Error::MalformedStream(format!("payload shape mismatch for {opcode:?}")))
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{GENERIC_TABLE, SHORT_TABLE};

    fn round_trip(block: &[Instruction], layout: &Layout) -> Vec<Instruction> {
        let mut bits = BitVec::new();
        encode_block(&mut bits, block, layout).unwrap();
        let mut r = bits.reader();
        let decoded = decode_toplevel(&mut r, layout).unwrap();
        assert!(r.is_empty());
        decoded
    }

    fn sample_program() -> Vec<Instruction> {
        vec![
            Instruction::In,
            Instruction::MoveBy(1),
            Instruction::SetConst(1),
            Instruction::MoveBy(-1),
            Instruction::Loop(vec![
                Instruction::MoveBy(1),
                Instruction::MulFrom(-1),
                Instruction::MoveBy(-1),
                Instruction::AddConst(-1),
            ]),
            Instruction::IfZero(vec![Instruction::Out]),
            Instruction::MoveBy(1),
            Instruction::Out,
        ]
    }

    fn compact_layout(block: &[Instruction], table: &'static [crate::alphabet::Symbol], m: u32) -> Layout {
        Layout::Compact {
            alphabet: Alphabet::derive(block, table),
            m,
        }
    }

    #[test]
    fn test_fixed_prefixed_round_trip() {
        let prog = sample_program();
        assert_eq!(round_trip(&prog, &Layout::FixedPrefixed), prog);
    }

    #[test]
    fn test_fixed_prefixed_matches_reference_layout() {
        // AddConst(72) Out: 0001 10010000 0011 -> opcode 1, zigzag(72)=144,
        // opcode 3, exactly as the 4-bit/8-bit reference layout spells it.
        let prog = vec![Instruction::AddConst(72), Instruction::Out];
        let mut bits = BitVec::new();
        encode_block(&mut bits, &prog, &Layout::FixedPrefixed).unwrap();
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.as_bytes(), &[0b0001_1001, 0b0000_0011]);
    }

    #[test]
    fn test_fixed_sentinel_round_trip_all_divisors() {
        let prog = sample_program();
        for m in 1..=16 {
            assert_eq!(round_trip(&prog, &Layout::FixedSentinel { m }), prog, "m={m}");
        }
    }

    #[test]
    fn test_compact_round_trip_both_tables() {
        let prog = sample_program();
        for m in 1..=16 {
            assert_eq!(round_trip(&prog, &compact_layout(&prog, &GENERIC_TABLE, m)), prog);
            assert_eq!(round_trip(&prog, &compact_layout(&prog, &SHORT_TABLE, m)), prog);
        }
    }

    #[test]
    fn test_empty_bodies() {
        let prog = vec![
            Instruction::Loop(vec![]),
            Instruction::IfZero(vec![Instruction::Loop(vec![])]),
        ];
        assert_eq!(round_trip(&prog, &Layout::FixedPrefixed), prog);
        assert_eq!(round_trip(&prog, &Layout::FixedSentinel { m: 4 }), prog);
        assert_eq!(round_trip(&prog, &compact_layout(&prog, &SHORT_TABLE, 4)), prog);
    }

    #[test]
    fn test_deep_nesting() {
        let mut prog = vec![Instruction::AddConst(1)];
        for _ in 0..40 {
            prog = vec![Instruction::Loop(prog)];
        }
        assert_eq!(round_trip(&prog, &Layout::FixedSentinel { m: 2 }), prog);
        assert_eq!(round_trip(&prog, &compact_layout(&prog, &GENERIC_TABLE, 2)), prog);
    }

    #[test]
    fn test_prefixed_operand_range() {
        for k in [-128, -1, 0, 127] {
            let prog = vec![Instruction::AddConst(k)];
            assert_eq!(round_trip(&prog, &Layout::FixedPrefixed), prog);
        }
        for k in [-129i64, 128, 100_000] {
            let mut bits = BitVec::new();
            let err =
                encode_block(&mut bits, &[Instruction::AddConst(k)], &Layout::FixedPrefixed)
                    .unwrap_err();
            assert!(matches!(err, Error::Range(_)), "k={k}");
        }
        // Sentinel layouts take the same operands in stride.
        let prog = vec![Instruction::AddConst(100_000)];
        assert_eq!(round_trip(&prog, &Layout::FixedSentinel { m: 16 }), prog);
    }

    #[test]
    fn test_prefixed_body_limit() {
        let body = vec![Instruction::AddConst(1); 256];
        let prog = vec![Instruction::Loop(body)];

        let mut bits = BitVec::new();
        let err = encode_block(&mut bits, &prog, &Layout::FixedPrefixed).unwrap_err();
        assert!(matches!(err, Error::Range(_)));

        // No limit once the body is sentinel-terminated.
        assert_eq!(round_trip(&prog, &Layout::FixedSentinel { m: 1 }), prog);
        assert_eq!(round_trip(&prog, &compact_layout(&prog, &SHORT_TABLE, 1)), prog);
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let prog = sample_program();
        let layout = Layout::FixedSentinel { m: 3 };
        let mut bits = BitVec::new();
        encode_block(&mut bits, &prog, &layout).unwrap();

        let mut truncated = BitVec::new();
        for i in 0..bits.len() - 9 {
            truncated.push(bits.get(i).unwrap());
        }
        let mut r = truncated.reader();
        assert!(decode_toplevel(&mut r, &layout).is_err());
    }

    #[test]
    fn test_unterminated_body_is_malformed() {
        // A Loop opcode with its body's sentinel missing.
        let layout = Layout::FixedSentinel { m: 1 };
        let mut bits = BitVec::new();
        bits.push_bits(Opcode::Loop.code() as u64, 4);
        bits.push_bits(Opcode::Out.code() as u64, 4);
        let mut r = bits.reader();
        assert!(decode_toplevel(&mut r, &layout).is_err());
    }
}
