//! # Seer Traits
//!
//! Trait definitions for the Seer access layer.
//!
//! This crate contains ONLY trait definitions with minimal dependencies.
//! All implementations are in separate extension crates.
//!
//! ## Module Structure
//!
//! - [`store`]: Trait for the external durable key-value store (credentials
//!   and quota counters live behind it)
//! - [`provider`]: Trait for the financial data collaborator (companies,
//!   filings, insider transactions)
//! - [`error`]: Shared error type for trait operations
//!
//! ## Dependency Injection
//!
//! The access layer consumes these traits via injection:
//!
//! ```ignore
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let access = AccessController::new(
//!     CredentialStore::new(store.clone()),
//!     LimiterBackend::shared(store, limits, fail_policy),
//!     FeatureGate::new(&tools),
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod provider;
pub mod store;

// Re-export commonly used types
pub use error::SeerError;
pub use provider::{DataProvider, Record, WeekWindow};
pub use store::KeyValueStore;
