//! Tree-walking execution engine for goedel programs.
//!
//! The machine owns a sparse integer tape and a single pointer, consumes
//! newline-delimited input tokens, and emits minimal-length signed
//! big-endian output. Non-termination is legitimate program behavior, so
//! the engine imposes no budget of its own; callers that need one set
//! [`MachineConfig::max_steps`] and get a fuel-style cutoff.

pub mod machine;

pub use machine::{execute, Machine};

use serde::{Deserialize, Serialize};

/// Machine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Maximum instruction dispatches per run; `None` runs unbounded.
    pub max_steps: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { max_steps: None }
    }
}
