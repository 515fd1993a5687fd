//! Diagnostic HTTP surface.
//!
//! # Routes
//! - `GET /health`: process liveness and version
//! - `GET /health/cache`: memoized distributed-cache snapshot
//! - `GET /status`: resolved execution target and identity address

pub mod handlers;

use axum::{http::StatusCode, routing::get, Router};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::handlers::*;
use crate::lifecycle::Connectivity;

pub fn setup_admin_router(state: Connectivity, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/cache", get(get_cache_health))
        .route("/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .with_state(state)
}
