//! Key-value store trait for persistent shared state.
//!
//! Credentials and quota counters live in an external durable store
//! reached over the network. The access layer only sees this trait;
//! concrete backends (in-memory, Redis, ...) are EXTENSIONS.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SeerError;

/// Durable key-value store with TTL support and atomic counters.
///
/// Every call is a potential network round-trip: implementations may
/// block, time out, or fail, and callers must not hold in-process locks
/// across these operations.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a string value. `Ok(None)` means the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, SeerError>;

    /// Get several string values in a single batched round-trip.
    ///
    /// The result has the same length and order as `keys`. Missing keys
    /// come back as `None`, not as errors.
    async fn get_batch(&self, keys: &[String]) -> Result<Vec<Option<String>>, SeerError>;

    /// Set a string value. `ttl = None` means no expiration.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), SeerError>;

    /// Read a string-map record (e.g. a subscription record).
    ///
    /// `Ok(None)` means the record does not exist.
    async fn fields(&self, key: &str) -> Result<Option<HashMap<String, String>>, SeerError>;

    /// Atomically increment a counter and refresh its TTL, returning the
    /// new value. A missing counter starts at 0 before the increment.
    ///
    /// Atomicity is the storage layer's responsibility: two concurrent
    /// increments must both be applied (no read-modify-write races).
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, SeerError>;
}
