//! # Seer Access
//!
//! Tiered access control for the Seer tool API.
//!
//! Every tool invocation passes through a single checkpoint, in a fixed
//! order: identity resolution (with anonymous fallback), rate-limit
//! admission, then feature gating. Only a request that clears all three
//! spends quota and reaches the data provider.
//!
//! ## Module Structure
//!
//! - [`tier`]: Subscription tiers and the tier resolver
//! - [`identity`]: Callers, identities, and API key minting
//! - [`credentials`]: API key lookup and account creation
//! - [`quota`]: Persistent hourly/daily usage counters
//! - [`limiter`]: Admission decisions against tier limits
//! - [`bucket`]: In-process token-bucket fallback limiter
//! - [`gate`]: Per-tier tool allow-lists
//! - [`shaping`]: Tier-sensitive query clamping
//! - [`facade`]: The [`AccessController`] checkpoint
//!
//! ## Usage
//!
//! ```ignore
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let access = AccessController::new(
//!     CredentialStore::new(store.clone()),
//!     LimiterBackend::shared(store, LimitsConfig::default(), QuotaFailPolicy::Open),
//!     FeatureGate::new(&ToolAccessConfig::default()),
//! );
//!
//! match access.authorize(Some("sk-shareseer-..."), "get_company_filings").await {
//!     AuthzResult::Authorized { caller, .. } => { /* call the provider */ }
//!     rejection => { /* render the rejection */ }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod gate;
pub mod identity;
pub mod limiter;
pub mod limits;
pub mod quota;
pub mod shaping;
pub mod tier;

pub use bucket::LocalRateLimiter;
pub use credentials::CredentialStore;
pub use error::AccessError;
pub use facade::{AccessController, AuthzResult, LimiterBackend};
pub use gate::{FeatureGate, ToolAccessConfig};
pub use identity::{Caller, Identity};
pub use limiter::{RateLimitInfo, RateLimiter};
pub use limits::{LimitsConfig, TierLimits};
pub use quota::{QuotaFailPolicy, QuotaLedger};
pub use shaping::QueryShape;
pub use tier::{Subscription, Tier};
