//! Error types for morph_core

use thiserror::Error;

/// Outcome of a mutation that did not run to completion
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// A newer mutation on the same target took over
    #[error("mutation cancelled by a newer mutation on the same target")]
    Cancelled,

    /// A running mutation with a higher priority refused to yield
    #[error("mutation rejected: a higher-priority mutation is running")]
    Rejected,
}
