//! # Seer Ext Memory
//!
//! In-memory [`KeyValueStore`] backend.
//!
//! Backs tests and storeless local deployments. Entries are TTL-aware
//! and counters increment atomically under the map's per-entry locking,
//! so the store honors the same contract the access layer expects from
//! a remote backend. State is process-local and lost on restart.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use seer_traits::{KeyValueStore, SeerError};

#[derive(Clone)]
enum Value {
    Str(String),
    Map(HashMap<String, String>),
    Counter(i64),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// In-memory TTL-aware key-value store.
///
/// Time can be advanced artificially via [`advance`](Self::advance) so
/// expiry behavior is testable without sleeping.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    skew_ms: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            skew_ms: AtomicU64::new(0),
        }
    }

    fn now(&self) -> Instant {
        Instant::now() + Duration::from_millis(self.skew_ms.load(Ordering::Relaxed))
    }

    /// Advance the store's clock (testing helper for TTL behavior).
    pub fn advance(&self, by: Duration) {
        self.skew_ms
            .fetch_add(by.as_millis() as u64, Ordering::Relaxed);
    }

    /// Store a string-map record directly (seeding helper; the account
    /// records the access layer reads are written by an external system
    /// in production).
    pub fn set_fields(
        &self,
        key: &str,
        fields: HashMap<String, String>,
        ttl: Option<Duration>,
    ) {
        let now = self.now();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Map(fields),
                expires_at: ttl.map(|t| now + t),
            },
        );
    }

    fn live_value(&self, key: &str) -> Option<Value> {
        let now = self.now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(entry.value.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SeerError> {
        Ok(match self.live_value(key) {
            Some(Value::Str(s)) => Some(s),
            Some(Value::Counter(n)) => Some(n.to_string()),
            Some(Value::Map(_)) => None,
            None => None,
        })
    }

    async fn get_batch(&self, keys: &[String]) -> Result<Vec<Option<String>>, SeerError> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            out.push(self.get(key).await?);
        }
        Ok(out)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), SeerError> {
        let now = self.now();
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|t| now + t),
            },
        );
        Ok(())
    }

    async fn fields(&self, key: &str) -> Result<Option<HashMap<String, String>>, SeerError> {
        Ok(match self.live_value(key) {
            Some(Value::Map(m)) => Some(m),
            _ => None,
        })
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, SeerError> {
        let now = self.now();
        // The entry guard holds the shard lock, making the whole
        // read-bump-restamp sequence atomic per key.
        let mut guard = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: Value::Counter(0),
                expires_at: None,
            });
        let entry = &mut *guard;

        if entry.is_expired(now) {
            entry.value = Value::Counter(0);
        }

        match &mut entry.value {
            Value::Counter(n) => {
                *n += 1;
                let result = *n;
                entry.expires_at = Some(now + ttl);
                Ok(result)
            }
            _ => Err(SeerError::InvalidInput(format!(
                "key {key} holds a non-counter value"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_get_round_trip() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn ttl_expires_values() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(store.get("k").await.unwrap().is_some());

        store.advance(Duration::from_secs(61));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_batch_preserves_order_and_gaps() {
        let store = MemoryStore::new();
        store.set("a", "1", None).await.unwrap();
        store.set("c", "3", None).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = store.get_batch(&keys).await.unwrap();
        assert_eq!(
            values,
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[tokio::test]
    async fn increment_starts_at_one_and_reads_as_string() {
        let store = MemoryStore::new();
        let n = store.increment("c", Duration::from_secs(60)).await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn increment_refreshes_ttl() {
        let store = MemoryStore::new();
        store.increment("c", Duration::from_secs(60)).await.unwrap();

        // Half the TTL passes, then another hit restamps it.
        store.advance(Duration::from_secs(40));
        store.increment("c", Duration::from_secs(60)).await.unwrap();

        // 40 + 50 > 60, but only 50 since the refresh: still alive.
        store.advance(Duration::from_secs(50));
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("2"));

        store.advance(Duration::from_secs(11));
        assert!(store.get("c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_counter_restarts_at_zero() {
        let store = MemoryStore::new();
        store.increment("c", Duration::from_secs(10)).await.unwrap();
        store.advance(Duration::from_secs(11));
        let n = store.increment("c", Duration::from_secs(10)).await.unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn concurrent_increments_all_land() {
        let store = Arc::new(MemoryStore::new());
        let mut tasks = Vec::new();
        for _ in 0..100 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.increment("hot", Duration::from_secs(60)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(store.get("hot").await.unwrap().as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn fields_round_trip() {
        let store = MemoryStore::new();
        let mut record = HashMap::new();
        record.insert("is_premium".to_string(), "true".to_string());
        store.set_fields("email:a@b.com", record.clone(), None);

        let read = store.fields("email:a@b.com").await.unwrap().unwrap();
        assert_eq!(read, record);
        assert!(store.fields("email:missing").await.unwrap().is_none());
    }
}
