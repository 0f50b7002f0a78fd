//! HTTP route handlers for the relay.
//!
//! # Route Structure
//!
//! ```text
//! POST /webhook  - Kiwify event intake
//! GET  /health   - Liveness check
//! *              - 200 "OK" (generic acknowledgement)
//! ```

pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the relay.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::receive))
        .route("/health", get(health))
        .fallback(acknowledge)
        .method_not_allowed_fallback(acknowledge)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Generic acknowledgement for any other path or method.
///
/// Kiwify probes relays with requests outside the webhook contract; those
/// must not be reported as delivery failures.
async fn acknowledge() -> &'static str {
    "OK"
}
