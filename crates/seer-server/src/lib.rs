//! # Seer Server
//!
//! HTTP tool-calling server for ShareSeer financial data.
//!
//! ## Features
//!
//! - Tool-calling API over plain JSON (`/mcp/tools/call`)
//! - Tiered access control: API keys, rate limits, per-tier tool lists
//! - Account registration endpoint that mints API keys
//! - Health and service-info endpoints
//! - Configuration via TOML file
//!
//! ## Usage
//!
//! ```ignore
//! use seer_server::Server;
//!
//! let server = Server::new(config, store, provider);
//! server.start().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod handlers;
pub mod provider;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use seer_access::{AccessController, CredentialStore, FeatureGate, LimiterBackend};
use seer_traits::{DataProvider, KeyValueStore};

use crate::handlers::AppState;

pub use config::Config;
pub use provider::UnavailableProvider;

/// Assemble the shared application state from configuration.
pub fn build_state(
    config: Config,
    store: Arc<dyn KeyValueStore>,
    provider: Arc<dyn DataProvider>,
) -> Arc<AppState> {
    let limiter = match config.limiter_backend {
        config::LimiterBackendKind::Shared => LimiterBackend::shared(
            store.clone(),
            config.rate_limiting.clone(),
            config.quota_fail_policy.0,
        ),
        config::LimiterBackendKind::Local => {
            LimiterBackend::local(config.rate_limiting.clone())
        }
    };

    let access = AccessController::new(
        CredentialStore::new(store),
        limiter,
        FeatureGate::new(&config.tiers),
    );

    Arc::new(AppState {
        access,
        provider,
        config,
    })
}

/// The Seer server.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new server over the given store and data provider.
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn DataProvider>,
    ) -> Self {
        Self {
            state: build_state(config, store, provider),
        }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::create_router(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Start the server. Runs until a shutdown signal arrives.
    pub async fn start(&self) -> Result<(), std::io::Error> {
        let addr = SocketAddr::new(
            self.state
                .config
                .server
                .host
                .parse()
                .unwrap_or([0, 0, 0, 0].into()),
            self.state.config.server.port,
        );

        info!("Starting Seer server on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
