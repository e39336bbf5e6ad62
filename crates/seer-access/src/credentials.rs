//! API key resolution and account creation over the credential store.
//!
//! Persisted layout, managed mostly by the external account system:
//!
//! - `api_key:<key>` -> account email (no expiry, written here)
//! - `email:<email>` -> subscription record (read-only here)

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use seer_traits::KeyValueStore;

use crate::error::AccessError;
use crate::identity::{generate_api_key, Identity};
use crate::tier::{Subscription, Tier};

const API_KEY_NS: &str = "api_key:";
const ACCOUNT_NS: &str = "email:";

/// Attempts at minting a collision-free key before giving up. With a
/// 128-bit random key a single retry should never be needed.
const MINT_ATTEMPTS: usize = 3;

/// Credential store facade: key lookup, tier resolution, registration.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    /// Create a credential store over the given backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Resolve a non-empty API key to an identity.
    ///
    /// The tier is computed fresh from the subscription record on every
    /// call. A store failure is reported as [`AccessError::Storage`];
    /// it must never admit the caller.
    pub async fn resolve(&self, api_key: &str) -> Result<Identity, AccessError> {
        let lookup = format!("{API_KEY_NS}{api_key}");
        let email = match self.store.get(&lookup).await {
            Ok(Some(email)) => email,
            Ok(None) => return Err(AccessError::InvalidApiKey),
            Err(e) => {
                warn!(error = %e, "credential store unavailable during key lookup");
                return Err(AccessError::Storage(e.to_string()));
            }
        };

        let account_key = format!("{ACCOUNT_NS}{email}");
        let fields = match self.store.fields(&account_key).await {
            Ok(Some(fields)) => fields,
            Ok(None) => return Err(AccessError::UserNotFound),
            Err(e) => {
                warn!(error = %e, "credential store unavailable during account read");
                return Err(AccessError::Storage(e.to_string()));
            }
        };

        let tier = Subscription::from_fields(&fields).resolve_tier(Utc::now());

        Ok(Identity {
            id: email.clone(),
            api_key: api_key.to_string(),
            tier,
            email,
        })
    }

    /// Register an account: mint a fresh API key, verify it is unused,
    /// and persist the key -> email association with no expiration.
    ///
    /// The returned identity defaults to the free tier; the external
    /// account system owns any subsequent subscription record.
    pub async fn create_account(&self, email: &str) -> Result<Identity, AccessError> {
        let mut minted = None;
        for _ in 0..MINT_ATTEMPTS {
            let candidate = generate_api_key();
            let lookup = format!("{API_KEY_NS}{candidate}");
            match self.store.get(&lookup).await {
                Ok(None) => {
                    minted = Some(candidate);
                    break;
                }
                Ok(Some(_)) => continue, // astronomically unlikely collision
                Err(e) => return Err(AccessError::Storage(e.to_string())),
            }
        }
        let api_key = minted
            .ok_or_else(|| AccessError::Storage("could not mint a unique API key".to_string()))?;

        let lookup = format!("{API_KEY_NS}{api_key}");
        self.store
            .set(&lookup, email, None)
            .await
            .map_err(|e| AccessError::Storage(e.to_string()))?;

        Ok(Identity {
            id: email.to_string(),
            api_key,
            tier: Tier::Free,
            email: email.to_string(),
        })
    }
}
