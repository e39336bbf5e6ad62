//! Access control error types.

use thiserror::Error;

/// Errors from credential resolution and account creation.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The presented API key is not known to the credential store.
    #[error("invalid API key")]
    InvalidApiKey,

    /// The key resolved to an email but the account record is missing.
    #[error("user not found")]
    UserNotFound,

    /// The credential store itself failed (network, timeout, ...).
    ///
    /// Never admits a request: the facade surfaces this as an
    /// authentication failure without leaking infrastructure detail.
    #[error("storage error: {0}")]
    Storage(String),
}
