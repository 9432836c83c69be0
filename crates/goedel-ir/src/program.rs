//! Program structure: an ordered top-level instruction sequence.

use crate::instruction::Instruction;
use crate::numeral::Numeral;
use goedel_core::Result;
use serde::{Deserialize, Serialize};

/// A complete program. The wire format has no wrapper around the top-level
/// sequence; this type only carries the tree and its conveniences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Count instructions in the whole tree, bodies included.
    pub fn instruction_count(&self) -> usize {
        fn count(block: &[Instruction]) -> usize {
            block
                .iter()
                .map(|inst| 1 + inst.body().map_or(0, count))
                .sum()
        }
        count(&self.instructions)
    }

    /// Encode as the smallest integer any supported format produces.
    pub fn encode(&self) -> Result<Numeral> {
        crate::codec::encode(self)
    }

    /// Decode an integer back into its program.
    pub fn decode(n: &Numeral) -> Result<Self> {
        crate::codec::decode(n)
    }

    /// Parse classic eight-symbol source text.
    pub fn parse(source: &str) -> Result<Self> {
        crate::text::parse(source)
    }

    /// Render back to source text, if the program stays within the
    /// eight-symbol subset.
    pub fn render(&self) -> Result<String> {
        crate::text::render(self)
    }

    /// Serialize the program to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a program from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::with_instructions(instructions)
    }
}
