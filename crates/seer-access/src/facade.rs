//! The access-control checkpoint every tool invocation passes through.

use std::sync::Arc;

use tracing::{debug, warn};

use seer_traits::KeyValueStore;

use crate::bucket::LocalRateLimiter;
use crate::credentials::CredentialStore;
use crate::error::AccessError;
use crate::gate::FeatureGate;
use crate::identity::Caller;
use crate::limiter::{RateLimitInfo, RateLimiter};
use crate::limits::LimitsConfig;
use crate::quota::{QuotaFailPolicy, QuotaLedger};
use crate::tier::Tier;

/// Outcome of the access-control checkpoint.
#[derive(Debug)]
pub enum AuthzResult {
    /// Request cleared identity, rate limit, and feature gate;
    /// forward to the data provider.
    Authorized {
        /// The resolved caller
        caller: Caller,
        /// Quota metadata, when the shared limiter backend is active
        quota: Option<RateLimitInfo>,
    },
    /// Authentication failed; request stops here.
    Unauthenticated {
        /// User-facing reason
        message: String,
    },
    /// Caller is over quota; request stops here, nothing incremented.
    RateLimited {
        /// The caller's tier, for the rejection message
        tier: Tier,
        /// Quota metadata, when the shared limiter backend is active
        info: Option<RateLimitInfo>,
    },
    /// Caller's tier does not include the requested tool.
    Forbidden {
        /// The caller's tier
        tier: Tier,
        /// The blocked tool name
        feature: String,
    },
}

/// Which rate-limiting backend is active.
///
/// `Shared` enforces quotas in the durable store and is the normal
/// deployment mode. `Local` is the in-process token-bucket fallback for
/// setups without a shared store; its state resets on restart.
pub enum LimiterBackend {
    /// Persistent dual-window limiter over the shared store
    Shared(RateLimiter),
    /// Process-local token buckets
    Local(LocalRateLimiter),
}

impl LimiterBackend {
    /// Shared backend over `store` with the given limits and policy.
    pub fn shared(
        store: Arc<dyn KeyValueStore>,
        limits: LimitsConfig,
        fail_policy: QuotaFailPolicy,
    ) -> Self {
        LimiterBackend::Shared(RateLimiter::new(QuotaLedger::new(store, fail_policy), limits))
    }

    /// Local token-bucket backend with the given limits.
    pub fn local(limits: LimitsConfig) -> Self {
        LimiterBackend::Local(LocalRateLimiter::new(limits))
    }
}

/// Access control facade.
///
/// Evaluation order per request is fixed: identity resolution (with
/// anonymous fallback), rate-limit admission, feature gate. The order
/// is load-bearing - an over-quota caller must hear about quota, not
/// about tier restrictions, even when both would reject.
///
/// Quota is spent exactly once per request that clears all three steps,
/// before the provider runs; a later provider failure does not refund it.
pub struct AccessController {
    credentials: CredentialStore,
    limiter: LimiterBackend,
    gate: FeatureGate,
}

impl AccessController {
    /// Assemble the checkpoint.
    pub fn new(credentials: CredentialStore, limiter: LimiterBackend, gate: FeatureGate) -> Self {
        Self {
            credentials,
            limiter,
            gate,
        }
    }

    /// The underlying credential store (account registration lives there).
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Run the checkpoint for one tool invocation.
    pub async fn authorize(&self, raw_api_key: Option<&str>, tool: &str) -> AuthzResult {
        // Step 1: identity. An absent or empty key is a valid anonymous
        // caller at the free tier, not an error.
        let caller = match raw_api_key.filter(|k| !k.is_empty()) {
            None => Caller::Anonymous,
            Some(key) => match self.credentials.resolve(key).await {
                Ok(identity) => Caller::Authenticated(identity),
                Err(AccessError::Storage(e)) => {
                    // Infrastructure detail stays out of the response,
                    // but a failed lookup never admits.
                    warn!(error = %e, "identity resolution unavailable");
                    return AuthzResult::Unauthenticated {
                        message: "authentication service unavailable, try again later".to_string(),
                    };
                }
                Err(e) => {
                    return AuthzResult::Unauthenticated {
                        message: e.to_string(),
                    };
                }
            },
        };

        let tier = caller.tier();
        let quota_key = caller.quota_key().to_string();

        // Step 2: rate-limit admission. Short-circuits before the gate.
        let quota = match &self.limiter {
            LimiterBackend::Shared(limiter) => {
                let (allowed, info) = limiter.admit(&quota_key, tier).await;
                if !allowed {
                    debug!(%tier, key = %quota_key, "rate limited");
                    return AuthzResult::RateLimited {
                        tier,
                        info: Some(info),
                    };
                }
                Some(info)
            }
            LimiterBackend::Local(limiter) => {
                if !limiter.check(&quota_key, tier) {
                    debug!(%tier, key = %quota_key, "rate limited (local)");
                    return AuthzResult::RateLimited { tier, info: None };
                }
                None
            }
        };

        // Step 3: feature gate.
        if !self.gate.is_allowed(tier, tool) {
            debug!(%tier, tool, "tool not in tier allow-list");
            return AuthzResult::Forbidden {
                tier,
                feature: tool.to_string(),
            };
        }

        // Step 4: authorized. Spend the quota - exactly once, regardless
        // of what the provider returns afterwards.
        match &self.limiter {
            LimiterBackend::Shared(limiter) => limiter.record(&quota_key).await,
            LimiterBackend::Local(limiter) => limiter.spend(&quota_key, tier),
        }

        AuthzResult::Authorized { caller, quota }
    }
}
