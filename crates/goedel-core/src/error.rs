//! Error types for encoding, decoding, and execution.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// An operand or body length is outside the active format's
    /// representable range. Raised at encode time only.
    #[error("Out of range: {0}")]
    Range(String),

    /// The bitstream ended mid-instruction, or a header/opcode combination
    /// is not a supported one. Raised at decode time only.
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// `DivFrom`/`DivConst` hit a zero divisor while executing.
    #[error("Division by zero")]
    DivisionByZero,

    /// The machine's step budget ran out before the program finished.
    #[error("Fuel exhausted: {0}")]
    Fuel(String),

    /// Source text could not be parsed, or a program has no source form.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
