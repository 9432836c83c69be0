//! Core error types shared by the goedel codec and runtime crates.

pub mod error;

pub use error::{Error, Result};
