// src/routes/health.rs
//! Liveness endpoint.
//!
//! Exports a subrouter with `GET /health`, merged by the gateway (`mod.rs`).
//! The handler never touches the store, so it answers even when the
//! database is unreachable.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway router
/// whatever the state type is.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
