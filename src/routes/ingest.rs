// src/routes/ingest.rs
//! Ingest endpoint.
//!
//! Exports a subrouter with `POST /api/ingest`, merged by the gateway
//! (`mod.rs`). Validation and writes live in `crate::ingest`; this file only
//! maps the outcome to the HTTP response.

use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use serde::Serialize;
use tracing::{info, warn};

use super::SharedStore;
use crate::ingest;

// ---

pub const INGEST_OK: &str = "Record is inserted successfully";

#[derive(Serialize)]
struct IngestResponse {
    message: &'static str,
}

pub fn router() -> Router<SharedStore> {
    // ---
    Router::new().route("/api/ingest", post(handler))
}

/// Handle `POST /api/ingest`.
///
/// The body is read as raw bytes rather than through `Json` so that every
/// decoding failure is answered with the same `400 {"error": ...}` shape.
async fn handler(State(store): State<SharedStore>, body: Bytes) -> impl IntoResponse {
    // ---
    match ingest::ingest(store.as_ref(), &body).await {
        Ok(record) => {
            info!(
                "POST /api/ingest - stored record {} for {}",
                record.id, record.datalogger_id
            );
            (
                StatusCode::OK,
                Json(IngestResponse {
                    message: INGEST_OK,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("POST /api/ingest - rejected: {}", e);
            e.into_response()
        }
    }
}
