//! Tier quota limits, loaded once at startup and immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Request quotas for one tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierLimits {
    /// Requests admitted per UTC hour window
    pub requests_per_hour: i64,
    /// Requests admitted per UTC day window
    pub requests_per_day: i64,
}

/// Static tier -> limits table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Free tier quotas (also applied to anonymous callers)
    pub free: TierLimits,
    /// Premium tier quotas
    pub premium: TierLimits,
    /// Pro tier quotas
    pub pro: TierLimits,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free: TierLimits {
                requests_per_hour: 10,
                requests_per_day: 100,
            },
            premium: TierLimits {
                requests_per_hour: 100,
                requests_per_day: 1_000,
            },
            pro: TierLimits {
                requests_per_hour: 1_000,
                requests_per_day: 10_000,
            },
        }
    }
}

impl LimitsConfig {
    /// Quotas for the given tier.
    pub fn for_tier(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Free => self.free,
            Tier::Premium => self.premium,
            Tier::Pro => self.pro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ordered_by_tier() {
        let limits = LimitsConfig::default();
        assert!(limits.free.requests_per_hour < limits.premium.requests_per_hour);
        assert!(limits.premium.requests_per_hour < limits.pro.requests_per_hour);
        assert!(limits.free.requests_per_day < limits.premium.requests_per_day);
    }

    #[test]
    fn lookup_by_tier() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.for_tier(Tier::Premium).requests_per_hour, 100);
        assert_eq!(limits.for_tier(Tier::Pro).requests_per_day, 10_000);
    }
}
