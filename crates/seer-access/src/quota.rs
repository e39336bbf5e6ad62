//! Persistent time-windowed usage counters.
//!
//! Counters are keyed by `(caller key, window, UTC bucket)` and live in
//! the shared store:
//!
//! - `rate_limit:hourly:<key>:<YYYYMMDDHH>`, TTL 1 hour
//! - `rate_limit:daily:<key>:<YYYYMMDD>`, TTL 24 hours
//!
//! The TTL is refreshed on every increment (expiry measured from the
//! last hit, not from the bucket start). Under sustained traffic a
//! counter can therefore outlive its nominal bucket boundary slightly;
//! since the bucket label changes at the boundary anyway, the stale
//! counter just expires unread. Counters never decrease and are retired
//! by expiry, never deleted.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use seer_traits::{KeyValueStore, SeerError};

/// Quota accounting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// UTC hour bucket
    Hourly,
    /// UTC day bucket
    Daily,
}

impl Window {
    /// Bucket label for the instant `now`.
    pub fn bucket(&self, now: DateTime<Utc>) -> String {
        match self {
            Window::Hourly => now.format("%Y%m%d%H").to_string(),
            Window::Daily => now.format("%Y%m%d").to_string(),
        }
    }

    /// Counter lifetime, one full window length.
    pub fn ttl(&self) -> Duration {
        match self {
            Window::Hourly => Duration::from_secs(3_600),
            Window::Daily => Duration::from_secs(86_400),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Window::Hourly => "hourly",
            Window::Daily => "daily",
        }
    }

    /// Storage key for the counter of `caller_key` in the current bucket.
    pub fn counter_key(&self, caller_key: &str, now: DateTime<Utc>) -> String {
        format!("rate_limit:{}:{}:{}", self.label(), caller_key, self.bucket(now))
    }
}

/// What to do when a usage read fails.
///
/// The default is `Open`: unreadable counters count as zero
/// usage and the request is admitted. That favors availability over
/// enforcement - a store outage effectively lifts all quotas. `Closed`
/// rejects instead, trading availability for enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaFailPolicy {
    /// Unreadable counters read as zero usage (the default)
    Open,
    /// Unreadable counters reject the request
    Closed,
}

/// Usage snapshot for one caller, read in a single batched round-trip.
///
/// The two counters are independent storage entries with independent
/// expiry; the batch only guarantees both reads back one admission
/// decision, not cross-counter atomicity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// Requests spent in the current hour bucket
    pub hourly: i64,
    /// Requests spent in the current day bucket
    pub daily: i64,
}

/// Persistent quota counter ledger.
#[derive(Clone)]
pub struct QuotaLedger {
    store: Arc<dyn KeyValueStore>,
    fail_policy: QuotaFailPolicy,
}

impl QuotaLedger {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>, fail_policy: QuotaFailPolicy) -> Self {
        Self { store, fail_policy }
    }

    /// Read both window counters for `caller_key` at instant `now`.
    ///
    /// Missing counters read as 0. On a store failure the configured
    /// [`QuotaFailPolicy`] decides between zero usage and an error.
    pub async fn read_usage(
        &self,
        caller_key: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageSnapshot, SeerError> {
        let keys = vec![
            Window::Hourly.counter_key(caller_key, now),
            Window::Daily.counter_key(caller_key, now),
        ];

        let values = match self.store.get_batch(&keys).await {
            Ok(values) => values,
            Err(e) => match self.fail_policy {
                QuotaFailPolicy::Open => {
                    warn!(error = %e, "quota read failed, admitting with zero usage");
                    return Ok(UsageSnapshot::default());
                }
                QuotaFailPolicy::Closed => return Err(e),
            },
        };

        let parse = |v: &Option<String>| {
            v.as_deref()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0)
        };

        Ok(UsageSnapshot {
            hourly: values.first().map(parse).unwrap_or(0),
            daily: values.get(1).map(parse).unwrap_or(0),
        })
    }

    /// Spend one request: increment both window counters.
    ///
    /// Best-effort by contract - the request is already admitted, so a
    /// failed increment is logged and swallowed, never propagated. The
    /// two increments are issued concurrently to keep the added latency
    /// to one round-trip.
    pub async fn record(&self, caller_key: &str, now: DateTime<Utc>) {
        let hour_key = Window::Hourly.counter_key(caller_key, now);
        let day_key = Window::Daily.counter_key(caller_key, now);

        let (hourly, daily) = tokio::join!(
            self.store.increment(&hour_key, Window::Hourly.ttl()),
            self.store.increment(&day_key, Window::Daily.ttl()),
        );

        if let Err(e) = hourly {
            warn!(error = %e, key = %hour_key, "hourly quota increment failed");
        }
        if let Err(e) = daily {
            warn!(error = %e, key = %day_key, "daily quota increment failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use seer_ext_memory::MemoryStore;
    use std::collections::HashMap;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 45).unwrap()
    }

    #[test]
    fn bucket_labels_are_utc_aligned() {
        let now = noon();
        assert_eq!(Window::Hourly.bucket(now), "2025061512");
        assert_eq!(Window::Daily.bucket(now), "20250615");
    }

    #[test]
    fn counter_key_layout() {
        let key = Window::Hourly.counter_key("sk-shareseer-ab", noon());
        assert_eq!(key, "rate_limit:hourly:sk-shareseer-ab:2025061512");
        let key = Window::Daily.counter_key("anonymous", noon());
        assert_eq!(key, "rate_limit:daily:anonymous:20250615");
    }

    #[tokio::test]
    async fn missing_counters_read_zero() {
        let ledger = QuotaLedger::new(Arc::new(MemoryStore::new()), QuotaFailPolicy::Open);
        let usage = ledger.read_usage("nobody", noon()).await.unwrap();
        assert_eq!(usage, UsageSnapshot::default());
    }

    #[tokio::test]
    async fn record_then_read_round_trip() {
        let ledger = QuotaLedger::new(Arc::new(MemoryStore::new()), QuotaFailPolicy::Open);
        let now = noon();
        ledger.record("k", now).await;
        ledger.record("k", now).await;
        let usage = ledger.read_usage("k", now).await.unwrap();
        assert_eq!(usage.hourly, 2);
        assert_eq!(usage.daily, 2);
    }

    #[tokio::test]
    async fn hourly_and_daily_buckets_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let ledger = QuotaLedger::new(store, QuotaFailPolicy::Open);
        let now = noon();
        ledger.record("k", now).await;

        // One hour later: new hourly bucket, same daily bucket.
        let later = now + chrono::Duration::hours(1);
        let usage = ledger.read_usage("k", later).await.unwrap();
        assert_eq!(usage.hourly, 0);
        assert_eq!(usage.daily, 1);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let ledger = QuotaLedger::new(Arc::new(MemoryStore::new()), QuotaFailPolicy::Open);
        let now = noon();

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger.record("hot-key", now).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let usage = ledger.read_usage("hot-key", now).await.unwrap();
        assert_eq!(usage.hourly, 50);
        assert_eq!(usage.daily, 50);
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _: &str) -> Result<Option<String>, SeerError> {
            Err(SeerError::Storage("down".into()))
        }
        async fn get_batch(&self, _: &[String]) -> Result<Vec<Option<String>>, SeerError> {
            Err(SeerError::Storage("down".into()))
        }
        async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), SeerError> {
            Err(SeerError::Storage("down".into()))
        }
        async fn fields(&self, _: &str) -> Result<Option<HashMap<String, String>>, SeerError> {
            Err(SeerError::Storage("down".into()))
        }
        async fn increment(&self, _: &str, _: Duration) -> Result<i64, SeerError> {
            Err(SeerError::Storage("down".into()))
        }
    }

    #[tokio::test]
    async fn fail_open_reads_zero_on_store_error() {
        let ledger = QuotaLedger::new(Arc::new(BrokenStore), QuotaFailPolicy::Open);
        let usage = ledger.read_usage("k", noon()).await.unwrap();
        assert_eq!(usage, UsageSnapshot::default());
    }

    #[tokio::test]
    async fn fail_closed_propagates_store_error() {
        let ledger = QuotaLedger::new(Arc::new(BrokenStore), QuotaFailPolicy::Closed);
        assert!(ledger.read_usage("k", noon()).await.is_err());
    }

    #[tokio::test]
    async fn record_swallows_store_errors() {
        let ledger = QuotaLedger::new(Arc::new(BrokenStore), QuotaFailPolicy::Open);
        // Must not panic or propagate.
        ledger.record("k", noon()).await;
    }
}
