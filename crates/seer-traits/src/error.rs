//! Error types for trait operations.

use thiserror::Error;

/// Common error type for store and provider operations.
///
/// Covers the full taxonomy a [`KeyValueStore`](crate::KeyValueStore)
/// or [`DataProvider`](crate::DataProvider) implementation may need to
/// report. The access layer itself only produces a subset; the
/// remaining variants (`AuthenticationFailed`, `RateLimited`,
/// `PermissionDenied`, `ParseError`, `Internal`) exist for external
/// backend implementations.
#[derive(Debug, Error)]
pub enum SeerError {
    /// Authentication failed (bad, missing, or unresolvable credential)
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Caller is over quota
    #[error("rate limited")]
    RateLimited,

    /// Caller's tier does not include the requested feature
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Infrastructure failure in the backing store
    #[error("storage error: {0}")]
    Storage(String),

    /// Requested resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Data source not available
    #[error("source not available: {0}")]
    SourceNotAvailable(String),

    /// Parse/deserialization error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SeerError {
    fn from(e: std::io::Error) -> Self {
        SeerError::Storage(e.to_string())
    }
}
