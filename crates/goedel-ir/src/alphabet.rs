//! Derived opcode alphabets for the compact wire formats.
//!
//! A compact format does not spend 4 bits per opcode. The encoder scans the
//! whole program for the symbols it actually uses, announces them in a
//! presence bitmap right after the header, and then assigns each present
//! symbol the shortest code width that fits. If any body-bearing opcode is
//! present, one extra trailing code is reserved as the end-of-block
//! sentinel.

use crate::bits::{BitReader, BitVec};
use crate::instruction::{Instruction, Opcode};
use goedel_core::{Error, Result};

/// One alphabet entry: an opcode, optionally specialized to a fixed
/// immediate. Specialized ("short") symbols carry no operand bits on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub opcode: Opcode,
    pub imm: Option<i64>,
}

const fn sym(opcode: Opcode) -> Symbol {
    Symbol { opcode, imm: None }
}

const fn imm(opcode: Opcode, k: i64) -> Symbol {
    Symbol {
        opcode,
        imm: Some(k),
    }
}

/// Canonical symbol table of the plain compact format: the 15 opcodes.
pub static GENERIC_TABLE: [Symbol; 15] = [
    sym(Opcode::MoveBy),
    sym(Opcode::AddConst),
    sym(Opcode::In),
    sym(Opcode::Out),
    sym(Opcode::Loop),
    sym(Opcode::CopyTo),
    sym(Opcode::SetConst),
    sym(Opcode::MulFrom),
    sym(Opcode::DivFrom),
    sym(Opcode::AddFrom),
    sym(Opcode::SubFrom),
    sym(Opcode::SwapWith),
    sym(Opcode::IfZero),
    sym(Opcode::MulConst),
    sym(Opcode::DivConst),
];

/// Canonical table of the short-immediates format: the 15 opcodes plus a
/// static, hand-tuned list of the immediates that dominate real programs
/// (pointer steps and small constant adjustments).
pub static SHORT_TABLE: [Symbol; 33] = [
    sym(Opcode::MoveBy),
    sym(Opcode::AddConst),
    sym(Opcode::In),
    sym(Opcode::Out),
    sym(Opcode::Loop),
    sym(Opcode::CopyTo),
    sym(Opcode::SetConst),
    sym(Opcode::MulFrom),
    sym(Opcode::DivFrom),
    sym(Opcode::AddFrom),
    sym(Opcode::SubFrom),
    sym(Opcode::SwapWith),
    sym(Opcode::IfZero),
    sym(Opcode::MulConst),
    sym(Opcode::DivConst),
    imm(Opcode::MoveBy, 1),
    imm(Opcode::MoveBy, -1),
    imm(Opcode::MoveBy, 2),
    imm(Opcode::MoveBy, -2),
    imm(Opcode::AddConst, 1),
    imm(Opcode::AddConst, -1),
    imm(Opcode::AddConst, 2),
    imm(Opcode::AddConst, -2),
    imm(Opcode::AddConst, 3),
    imm(Opcode::AddConst, -3),
    imm(Opcode::CopyTo, 1),
    imm(Opcode::CopyTo, -1),
    imm(Opcode::AddFrom, 1),
    imm(Opcode::AddFrom, -1),
    imm(Opcode::SubFrom, 1),
    imm(Opcode::SubFrom, -1),
    imm(Opcode::SwapWith, 1),
    imm(Opcode::SwapWith, -1),
];

/// A concrete alphabet: the present symbols of one canonical table, in
/// canonical order, plus the derived sentinel and code width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<Symbol>,
    sentinel: Option<u64>,
    width: usize,
}

impl Alphabet {
    /// Derive the alphabet a program needs, scanning bodies recursively.
    pub fn derive(block: &[Instruction], table: &'static [Symbol]) -> Self {
        let mut used = vec![false; table.len()];
        mark_used(block, table, &mut used);
        Self::from_presence(table, &used)
    }

    fn from_presence(table: &'static [Symbol], used: &[bool]) -> Self {
        let symbols: Vec<Symbol> = table
            .iter()
            .zip(used)
            .filter_map(|(s, &u)| u.then_some(*s))
            .collect();
        let needs_sentinel = symbols.iter().any(|s| s.opcode.has_body());
        let sentinel = needs_sentinel.then_some(symbols.len() as u64);
        let count = symbols.len() + needs_sentinel as usize;
        let width = code_width(count);
        Self {
            symbols,
            sentinel,
            width,
        }
    }

    /// Emit the presence bitmap, one bit per canonical table entry.
    pub fn write_bitmap(&self, bits: &mut BitVec, table: &'static [Symbol]) {
        for entry in table {
            bits.push(self.symbols.contains(entry));
        }
    }

    /// Rebuild an alphabet from a presence bitmap.
    pub fn read_bitmap(r: &mut BitReader<'_>, table: &'static [Symbol]) -> Result<Self> {
        let mut used = vec![false; table.len()];
        for u in used.iter_mut() {
            *u = r.read_bit()?;
        }
        Ok(Self::from_presence(table, &used))
    }

    /// Code width in bits. At least 1, so a one-symbol alphabet still
    /// advances the cursor.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn sentinel(&self) -> Option<u64> {
        self.sentinel
    }

    /// The code and entry for an instruction, preferring a short symbol
    /// when one matches exactly. `None` when the alphabet cannot express
    /// the instruction (a decode-side alphabet fed a foreign program).
    pub fn symbol_for(&self, inst: &Instruction) -> Option<(u64, Symbol)> {
        let opcode = inst.opcode();
        if let Some(k) = inst.operand() {
            if let Some(found) = self.position(Symbol {
                opcode,
                imm: Some(k),
            }) {
                return Some(found);
            }
        }
        self.position(sym(opcode))
    }

    pub fn symbol_at(&self, code: u64) -> Option<Symbol> {
        self.symbols.get(code as usize).copied()
    }

    fn position(&self, symbol: Symbol) -> Option<(u64, Symbol)> {
        self.symbols
            .iter()
            .position(|s| *s == symbol)
            .map(|i| (i as u64, symbol))
    }
}

fn code_width(count: usize) -> usize {
    if count <= 2 {
        return 1;
    }
    (usize::BITS - (count - 1).leading_zeros()) as usize
}

fn mark_used(block: &[Instruction], table: &'static [Symbol], used: &mut [bool]) {
    for inst in block {
        let opcode = inst.opcode();
        let preferred = inst
            .operand()
            .and_then(|k| {
                table.iter().position(|s| {
                    *s == Symbol {
                        opcode,
                        imm: Some(k),
                    }
                })
            })
            .or_else(|| table.iter().position(|s| *s == sym(opcode)));
        if let Some(idx) = preferred {
            used[idx] = true;
        }
        if let Some(body) = inst.body() {
            mark_used(body, table, used);
        }
    }
}

/// Presence-bitmap error helper shared by the block codec.
pub fn unknown_code(code: u64, width: usize) -> Error {
    Error::MalformedStream(format!("code {code} out of range for {width}-bit alphabet"))
}
