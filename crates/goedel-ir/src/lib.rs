//! Instruction model and integer codec for goedel programs.
//!
//! A program is an ordered tree of tape instructions. The codec turns that
//! tree into a single arbitrary-precision non-negative integer and back:
//! the encoder brute-forces a small space of bitstream formats (opcode
//! alphabet x Golomb divisor) and keeps the smallest result, prefixed by a
//! short header that tells the decoder which format won.

pub mod alphabet;
pub mod bits;
pub mod block;
pub mod codec;
pub mod format;
pub mod instruction;
pub mod numeral;
pub mod program;
pub mod text;
pub mod varint;

pub use codec::{decode, encode, encode_with};
pub use format::Format;
pub use instruction::{Instruction, Opcode};
pub use numeral::Numeral;
pub use program::Program;
