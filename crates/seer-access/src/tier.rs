//! Subscription tiers and the tier resolver.
//!
//! A tier is never stored on the identity: it is recomputed from the
//! raw subscription attributes on every lookup, so an expired
//! subscription downgrades immediately.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expiration timestamp layout: ISO-8601 UTC, second precision,
/// literal `Z` suffix (e.g. `2025-03-01T00:00:00Z`).
const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Subscription tier, controlling quotas and feature access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Default tier, also used for anonymous callers
    Free,
    /// Paid tier with higher quotas and full tool access
    Premium,
    /// Top tier, assigned via an explicit plan code
    Pro,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

/// Raw subscription attributes, owned by the external account system
/// and read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    /// Premium flag as recorded by the billing system
    pub is_premium: bool,
    /// Expiration timestamp (see [`EXPIRY_FORMAT`]); absent or malformed
    /// values force the free tier
    pub expires_at: Option<String>,
    /// Optional plan code; `"pro"` upgrades an active subscription
    pub plan: Option<String>,
}

impl Subscription {
    /// Build from a raw account record. Missing fields default safely.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            is_premium: fields.get("is_premium").map(|v| v == "true").unwrap_or(false),
            expires_at: fields.get("exp_date").filter(|v| !v.is_empty()).cloned(),
            plan: fields.get("plan").filter(|v| !v.is_empty()).cloned(),
        }
    }

    /// Resolve the effective tier at instant `now`.
    ///
    /// `Premium` requires the premium flag plus an expiration timestamp
    /// that parses and lies strictly in the future; any other
    /// combination (including a malformed timestamp) degrades to
    /// `Free`. `Pro` additionally requires the `"pro"` plan code on an
    /// otherwise active subscription - the flag alone never yields it.
    pub fn resolve_tier(&self, now: DateTime<Utc>) -> Tier {
        if !self.is_premium {
            return Tier::Free;
        }

        let Some(raw) = self.expires_at.as_deref() else {
            return Tier::Free;
        };

        let expiry = match NaiveDateTime::parse_from_str(raw, EXPIRY_FORMAT) {
            Ok(naive) => naive.and_utc(),
            Err(_) => return Tier::Free, // malformed timestamp, expired by policy
        };

        if expiry <= now {
            return Tier::Free;
        }

        match self.plan.as_deref() {
            Some("pro") => Tier::Pro,
            _ => Tier::Premium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sub(is_premium: bool, expires_at: Option<&str>) -> Subscription {
        Subscription {
            is_premium,
            expires_at: expires_at.map(String::from),
            plan: None,
        }
    }

    #[test]
    fn active_subscription_is_premium() {
        let s = sub(true, Some("2030-01-01T00:00:00Z"));
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Premium);
    }

    #[test]
    fn expired_subscription_is_free() {
        let s = sub(true, Some("2020-01-01T00:00:00Z"));
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Free);
    }

    #[test]
    fn expiry_at_exactly_now_is_free() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let s = sub(true, Some("2025-03-01T00:00:00Z"));
        assert_eq!(s.resolve_tier(now), Tier::Free);
    }

    #[test]
    fn flag_without_expiry_is_free() {
        assert_eq!(sub(true, None).resolve_tier(at(2025, 6, 1)), Tier::Free);
    }

    #[test]
    fn no_flag_is_free_even_with_future_expiry() {
        let s = sub(false, Some("2030-01-01T00:00:00Z"));
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Free);
    }

    #[test]
    fn malformed_expiry_is_free() {
        for bad in ["not-a-date", "2030-01-01", "2030-01-01 00:00:00", ""] {
            let s = sub(true, Some(bad));
            assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Free, "input {bad:?}");
        }
    }

    #[test]
    fn pro_plan_on_active_subscription() {
        let s = Subscription {
            is_premium: true,
            expires_at: Some("2030-01-01T00:00:00Z".to_string()),
            plan: Some("pro".to_string()),
        };
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Pro);
    }

    #[test]
    fn pro_plan_on_expired_subscription_is_free() {
        let s = Subscription {
            is_premium: true,
            expires_at: Some("2020-01-01T00:00:00Z".to_string()),
            plan: Some("pro".to_string()),
        };
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Free);
    }

    #[test]
    fn from_fields_defaults() {
        let fields = HashMap::new();
        let s = Subscription::from_fields(&fields);
        assert!(!s.is_premium);
        assert!(s.expires_at.is_none());
        assert!(s.plan.is_none());
    }

    #[test]
    fn from_fields_reads_account_record() {
        let mut fields = HashMap::new();
        fields.insert("is_premium".to_string(), "true".to_string());
        fields.insert("exp_date".to_string(), "2030-01-01T00:00:00Z".to_string());
        let s = Subscription::from_fields(&fields);
        assert!(s.is_premium);
        assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Premium);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Arbitrary expiry strings must never panic, and anything
            // that is not a well-formed future timestamp resolves free.
            #[test]
            fn resolver_never_panics(raw in ".{0,64}") {
                let s = Subscription {
                    is_premium: true,
                    expires_at: Some(raw),
                    plan: None,
                };
                let tier = s.resolve_tier(at(2025, 6, 1));
                prop_assert!(tier == Tier::Free || tier == Tier::Premium);
            }

            #[test]
            fn without_flag_always_free(raw in ".{0,64}", plan in ".{0,16}") {
                let s = Subscription {
                    is_premium: false,
                    expires_at: Some(raw),
                    plan: Some(plan),
                };
                prop_assert_eq!(s.resolve_tier(at(2025, 6, 1)), Tier::Free);
            }
        }
    }
}
