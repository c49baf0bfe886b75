//! Error types for kernel operations.

/// Failures reported by a [`StateOracle`](crate::StateOracle) or one of its
/// capabilities.
///
/// A missing capability is never one of these: capabilities are queried and
/// come back as `None` when unsupported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The backing service (artifact index, result storage) could not be reached.
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    /// Result storage returned something unusable.
    #[error("storage error: {0}")]
    Storage(String),

    /// A release number has no known commit counterpart.
    #[error("unknown release: {0}")]
    UnknownRelease(u64),
}

/// A requested evaluation range that cannot be turned into boundary states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The lower bound lies after the upper bound.
    #[error("inverted range: first {first} > last {last}")]
    Inverted { first: u64, last: u64 },

    /// Release-only evaluation was requested over a commit range.
    #[error("release-only evaluation requires a release range, got commits [{first}, {last}]")]
    ReleaseOnlyWithCommits { first: u64, last: u64 },

    /// A release range must be translated to commits, but the oracle has no
    /// release catalog.
    #[error("oracle cannot translate releases to commit numbers")]
    NoReleaseCatalog,

    /// The oracle failed while translating the range.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
