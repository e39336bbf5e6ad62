//! In-process token-bucket limiter.
//!
//! Alternate rate-limiting backend for deployments without a shared
//! store. State is process-local and resets on restart, so it only
//! approximates the persistent limiter; which backend is active comes
//! from configuration.

use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::limits::LimitsConfig;
use crate::tier::Tier;

/// Burst capacity for every bucket.
const BURST: f64 = 10.0;

struct TokenBucket {
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(refill_per_sec: f64, now: Instant) -> Self {
        Self {
            tokens: BURST,
            refill_per_sec,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(BURST);
        self.last_refill = now;
    }

    fn has_token(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= 1.0
    }

    fn take(&mut self, now: Instant) {
        self.refill(now);
        // May dip below zero when a racing request took the last token
        // between check and spend; the deficit throttles later requests.
        self.tokens -= 1.0;
    }
}

/// Token-bucket limiter keyed by `(caller key, tier)`.
///
/// Buckets live in a concurrent map with per-entry locks, so unrelated
/// callers never serialize behind one global lock. Refill rate is the
/// tier's hourly limit spread over the hour; burst capacity is fixed.
pub struct LocalRateLimiter {
    buckets: DashMap<String, Mutex<TokenBucket>>,
    limits: LimitsConfig,
}

impl LocalRateLimiter {
    /// Create a limiter with the given tier limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            limits,
        }
    }

    fn with_bucket<R>(&self, caller_key: &str, tier: Tier, f: impl FnOnce(&mut TokenBucket) -> R) -> R {
        let key = format!("{caller_key}:{tier}");
        let now = Instant::now();
        let rate = self.limits.for_tier(tier).requests_per_hour as f64 / 3_600.0;
        let entry = self
            .buckets
            .entry(key)
            .or_insert_with(|| Mutex::new(TokenBucket::new(rate, now)));
        let mut bucket = entry.lock();
        f(&mut bucket)
    }

    /// Whether one request would currently be admitted. Does not spend.
    pub fn check(&self, caller_key: &str, tier: Tier) -> bool {
        self.with_bucket(caller_key, tier, |b| b.has_token(Instant::now()))
    }

    /// Spend one token. Called once per authorized request.
    pub fn spend(&self, caller_key: &str, tier: Tier) {
        self.with_bucket(caller_key, tier, |b| b.take(Instant::now()));
    }
}
