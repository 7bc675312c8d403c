//! Run-level errors. Per-candidate failures never show up here: they are
//! recorded as negative [`ProbeOutcome`](crate::types::ProbeOutcome)s.

use thiserror::Error;

/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that abort a run before any probe is launched.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The candidate specification (CIDR, target, URL) could not be parsed.
    #[error("invalid specification: {0}")]
    InvalidSpecification(String),

    /// Enumeration would produce more candidates than the configured cap.
    #[error("too many candidates ({count}); at most {limit} allowed")]
    ResourceExhaustion { count: u128, limit: usize },

    /// Enumeration produced nothing to probe.
    #[error("no candidates to probe for {0}")]
    EmptyCandidateSet(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client setup error.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
