//! Callers, identities, and API key minting.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;

use crate::tier::Tier;

/// Prefix for every issued API key.
pub const API_KEY_PREFIX: &str = "sk-shareseer-";

/// Quota key used for callers that present no API key. All anonymous
/// traffic shares one set of free-tier counters.
pub const ANONYMOUS_KEY: &str = "anonymous";

/// A resolved account identity.
///
/// This is an in-memory projection built per request and discarded when
/// the request completes; the credential store is the source of truth.
/// The tier is recomputed on every lookup, never persisted here.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    /// Account identifier (the account email, used verbatim)
    pub id: String,
    /// The bearer credential the caller presented
    pub api_key: String,
    /// Effective tier at resolution time
    pub tier: Tier,
    /// Account email
    pub email: String,
}

/// The caller of a tool invocation.
///
/// Anonymous callers are a distinct variant, not a sentinel identity:
/// they participate fully in rate limiting and feature gating at the
/// free tier.
#[derive(Debug, Clone)]
pub enum Caller {
    /// No API key presented
    Anonymous,
    /// A resolved account
    Authenticated(Identity),
}

impl Caller {
    /// Effective tier for this caller.
    pub fn tier(&self) -> Tier {
        match self {
            Caller::Anonymous => Tier::Free,
            Caller::Authenticated(identity) => identity.tier,
        }
    }

    /// Key under which this caller's quota counters are kept.
    pub fn quota_key(&self) -> &str {
        match self {
            Caller::Anonymous => ANONYMOUS_KEY,
            Caller::Authenticated(identity) => &identity.api_key,
        }
    }

    /// The resolved identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(identity) => Some(identity),
        }
    }
}

/// Mint a new API key: the fixed prefix plus 32 lowercase hex chars
/// from 16 bytes of OS randomness.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        let suffix = &key[API_KEY_PREFIX.len()..];
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn keys_are_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
    }

    #[test]
    fn anonymous_caller_is_free_tier() {
        let caller = Caller::Anonymous;
        assert_eq!(caller.tier(), Tier::Free);
        assert_eq!(caller.quota_key(), ANONYMOUS_KEY);
        assert!(caller.identity().is_none());
    }

    #[test]
    fn authenticated_caller_exposes_identity() {
        let caller = Caller::Authenticated(Identity {
            id: "a@b.com".to_string(),
            api_key: "sk-shareseer-0".to_string(),
            tier: Tier::Premium,
            email: "a@b.com".to_string(),
        });
        assert_eq!(caller.tier(), Tier::Premium);
        assert_eq!(caller.quota_key(), "sk-shareseer-0");
    }
}
