//! Errors raised while building or advancing a strategy.
//!
//! Routine exhaustion is not an error: it is [`Step::Finished`](crate::Step).
//! An interval without artifacts is not an error either: it becomes an
//! unavailability gap.

use regress_kernel::{OracleError, RangeError};

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Range(#[from] RangeError),

    /// No artifact exists anywhere near one end of the requested range.
    #[error("no available artifact for the {side} boundary of [{first}, {last}]")]
    BoundaryUnavailable {
        side: &'static str,
        first: u64,
        last: u64,
    },

    #[error("availability probe for index {index} timed out after {timeout_ms} ms")]
    ProbeTimeout { index: u64, timeout_ms: u64 },

    /// A probe task panicked or was cancelled by the runtime.
    #[error("availability probe task failed: {0}")]
    ProbeTask(String),
}
