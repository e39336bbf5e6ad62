//! Admission decisions against tier limits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::limits::LimitsConfig;
use crate::quota::{QuotaLedger, UsageSnapshot};
use crate::tier::Tier;

const HOUR_SECS: i64 = 3_600;
const DAY_SECS: i64 = 86_400;

/// Quota metadata attached to every admission decision.
///
/// `*_remaining` is not clamped and goes negative when usage exceeds
/// the limit (possible under racing increments); display code clamps.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitInfo {
    /// Hourly request limit for the caller's tier
    pub hourly_limit: i64,
    /// Daily request limit for the caller's tier
    pub daily_limit: i64,
    /// Requests spent in the current hour bucket
    pub hourly_used: i64,
    /// Requests spent in the current day bucket
    pub daily_used: i64,
    /// Hourly limit minus usage (may be negative)
    pub hourly_remaining: i64,
    /// Daily limit minus usage (may be negative)
    pub daily_remaining: i64,
    /// Epoch seconds of the next UTC hour boundary
    pub reset_hour: i64,
    /// Epoch seconds of the next UTC day boundary
    pub reset_day: i64,
}

/// Start of the next UTC hour, as epoch seconds.
fn next_hour_epoch(now: DateTime<Utc>) -> i64 {
    let secs = now.timestamp();
    secs - secs.rem_euclid(HOUR_SECS) + HOUR_SECS
}

/// Start of the next UTC day, as epoch seconds.
fn next_day_epoch(now: DateTime<Utc>) -> i64 {
    let secs = now.timestamp();
    secs - secs.rem_euclid(DAY_SECS) + DAY_SECS
}

/// Rate limiter over the persistent quota ledger.
#[derive(Clone)]
pub struct RateLimiter {
    ledger: QuotaLedger,
    limits: LimitsConfig,
}

impl RateLimiter {
    /// Create a limiter over the given ledger and limit table.
    pub fn new(ledger: QuotaLedger, limits: LimitsConfig) -> Self {
        Self { ledger, limits }
    }

    /// Decide whether to admit one request for `caller_key` at `tier`.
    ///
    /// Admission requires strict `used < limit` on both windows: the
    /// request that brings usage up to the limit is the last one in.
    /// This checks only - the caller spends the quota via [`record`]
    /// after the request is fully authorized; rejected requests never
    /// increment.
    ///
    /// A ledger read failure under the fail-closed policy rejects with
    /// zero remaining quota rather than admitting on error.
    ///
    /// [`record`]: RateLimiter::record
    pub async fn admit(&self, caller_key: &str, tier: Tier) -> (bool, RateLimitInfo) {
        let now = Utc::now();
        let limits = self.limits.for_tier(tier);

        let (usage, readable) = match self.ledger.read_usage(caller_key, now).await {
            Ok(usage) => (usage, true),
            Err(e) => {
                warn!(error = %e, %tier, "quota unreadable, rejecting (fail-closed)");
                // Present the quota as fully spent.
                let exhausted = UsageSnapshot {
                    hourly: limits.requests_per_hour,
                    daily: limits.requests_per_day,
                };
                (exhausted, false)
            }
        };

        let info = RateLimitInfo {
            hourly_limit: limits.requests_per_hour,
            daily_limit: limits.requests_per_day,
            hourly_used: usage.hourly,
            daily_used: usage.daily,
            hourly_remaining: limits.requests_per_hour - usage.hourly,
            daily_remaining: limits.requests_per_day - usage.daily,
            reset_hour: next_hour_epoch(now),
            reset_day: next_day_epoch(now),
        };

        let allowed = readable
            && usage.hourly < limits.requests_per_hour
            && usage.daily < limits.requests_per_day;

        (allowed, info)
    }

    /// Spend one request for `caller_key`. Called exactly once per
    /// admitted and authorized request.
    pub async fn record(&self, caller_key: &str) {
        self.ledger.record(caller_key, Utc::now()).await;
    }
}
