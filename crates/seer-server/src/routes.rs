//! Route definitions.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, AppState};

/// Create the API router.
///
/// # Arguments
/// * `state` - Shared application state (access controller + provider)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))
        // MCP surface
        .route("/mcp/info", get(handlers::mcp_info))
        .route("/mcp/tools/call", post(handlers::call_tool))
        // Account registration
        .route("/api/users", post(handlers::create_user))
        // State
        .with_state(state)
}
