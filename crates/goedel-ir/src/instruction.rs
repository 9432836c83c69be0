//! Instruction set for the tape language.

use serde::{Deserialize, Serialize};

/// Instruction kind, without payload.
///
/// The declaration order is canonical: it fixes the 4-bit opcodes of the
/// fixed-alphabet wire formats and the bit order of compact-alphabet
/// presence bitmaps. Code 15 is reserved as the end-of-block sentinel and
/// never names an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    MoveBy,
    AddConst,
    In,
    Out,
    Loop,
    CopyTo,
    SetConst,
    MulFrom,
    DivFrom,
    AddFrom,
    SubFrom,
    SwapWith,
    IfZero,
    MulConst,
    DivConst,
}

impl Opcode {
    /// Every opcode, in canonical order.
    pub const ALL: [Opcode; 15] = [
        Opcode::MoveBy,
        Opcode::AddConst,
        Opcode::In,
        Opcode::Out,
        Opcode::Loop,
        Opcode::CopyTo,
        Opcode::SetConst,
        Opcode::MulFrom,
        Opcode::DivFrom,
        Opcode::AddFrom,
        Opcode::SubFrom,
        Opcode::SwapWith,
        Opcode::IfZero,
        Opcode::MulConst,
        Opcode::DivConst,
    ];

    /// Fixed-alphabet code (0..=14).
    pub fn code(&self) -> u8 {
        Opcode::ALL.iter().position(|op| op == self).unwrap() as u8
    }

    pub fn from_code(code: u8) -> Option<Opcode> {
        Opcode::ALL.get(code as usize).copied()
    }

    /// Returns true if this opcode carries a child instruction sequence.
    pub fn has_body(&self) -> bool {
        matches!(self, Opcode::Loop | Opcode::IfZero)
    }

    /// Returns true if this opcode carries a signed scalar operand.
    pub fn has_operand(&self) -> bool {
        !self.has_body() && !matches!(self, Opcode::In | Opcode::Out)
    }
}

/// A single instruction in the tree.
///
/// Each variant carries either nothing, one signed operand `k`, or an owned
/// child sequence, never both. Offsets are relative to the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Shift the pointer by `k`.
    MoveBy(i64),
    /// cell += k
    AddConst(i64),
    /// Read one input token into the cell.
    In,
    /// Emit the cell.
    Out,
    /// Repeat the body while the cell is nonzero.
    Loop(Vec<Instruction>),
    /// cell-at-offset-k = cell
    CopyTo(i64),
    /// cell = k
    SetConst(i64),
    /// cell *= cell-at-offset-k
    MulFrom(i64),
    /// cell /= cell-at-offset-k (floor division, fails on zero)
    DivFrom(i64),
    /// cell += cell-at-offset-k
    AddFrom(i64),
    /// cell -= cell-at-offset-k
    SubFrom(i64),
    /// Exchange the cell with cell-at-offset-k.
    SwapWith(i64),
    /// Run the body once if the cell is zero.
    IfZero(Vec<Instruction>),
    /// cell *= k
    MulConst(i64),
    /// cell /= k (floor division, fails when k = 0)
    DivConst(i64),
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::MoveBy(_) => Opcode::MoveBy,
            Instruction::AddConst(_) => Opcode::AddConst,
            Instruction::In => Opcode::In,
            Instruction::Out => Opcode::Out,
            Instruction::Loop(_) => Opcode::Loop,
            Instruction::CopyTo(_) => Opcode::CopyTo,
            Instruction::SetConst(_) => Opcode::SetConst,
            Instruction::MulFrom(_) => Opcode::MulFrom,
            Instruction::DivFrom(_) => Opcode::DivFrom,
            Instruction::AddFrom(_) => Opcode::AddFrom,
            Instruction::SubFrom(_) => Opcode::SubFrom,
            Instruction::SwapWith(_) => Opcode::SwapWith,
            Instruction::IfZero(_) => Opcode::IfZero,
            Instruction::MulConst(_) => Opcode::MulConst,
            Instruction::DivConst(_) => Opcode::DivConst,
        }
    }

    /// The scalar operand, for kinds that carry one.
    pub fn operand(&self) -> Option<i64> {
        match self {
            Instruction::MoveBy(k)
            | Instruction::AddConst(k)
            | Instruction::CopyTo(k)
            | Instruction::SetConst(k)
            | Instruction::MulFrom(k)
            | Instruction::DivFrom(k)
            | Instruction::AddFrom(k)
            | Instruction::SubFrom(k)
            | Instruction::SwapWith(k)
            | Instruction::MulConst(k)
            | Instruction::DivConst(k) => Some(*k),
            _ => None,
        }
    }

    /// The child sequence, for `Loop` and `IfZero`.
    pub fn body(&self) -> Option<&[Instruction]> {
        match self {
            Instruction::Loop(body) | Instruction::IfZero(body) => Some(body),
            _ => None,
        }
    }

    /// Rebuild an instruction from its parts. `None` if the payload does not
    /// match the opcode's shape.
    pub fn from_parts(opcode: Opcode, operand: Option<i64>, body: Option<Vec<Instruction>>) -> Option<Instruction> {
        match (opcode, operand, body) {
            (Opcode::MoveBy, Some(k), None) => Some(Instruction::MoveBy(k)),
            (Opcode::AddConst, Some(k), None) => Some(Instruction::AddConst(k)),
            (Opcode::In, None, None) => Some(Instruction::In),
            (Opcode::Out, None, None) => Some(Instruction::Out),
            (Opcode::Loop, None, Some(body)) => Some(Instruction::Loop(body)),
            (Opcode::CopyTo, Some(k), None) => Some(Instruction::CopyTo(k)),
            (Opcode::SetConst, Some(k), None) => Some(Instruction::SetConst(k)),
            (Opcode::MulFrom, Some(k), None) => Some(Instruction::MulFrom(k)),
            (Opcode::DivFrom, Some(k), None) => Some(Instruction::DivFrom(k)),
            (Opcode::AddFrom, Some(k), None) => Some(Instruction::AddFrom(k)),
            (Opcode::SubFrom, Some(k), None) => Some(Instruction::SubFrom(k)),
            (Opcode::SwapWith, Some(k), None) => Some(Instruction::SwapWith(k)),
            (Opcode::IfZero, None, Some(body)) => Some(Instruction::IfZero(body)),
            (Opcode::MulConst, Some(k), None) => Some(Instruction::MulConst(k)),
            (Opcode::DivConst, Some(k), None) => Some(Instruction::DivConst(k)),
            _ => None,
        }
    }
}
