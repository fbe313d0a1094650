// src/routes/data.rs
//! Raw readings endpoint.
//!
//! Exports a subrouter with `GET /api/data`, merged by the gateway (`mod.rs`).
//! Returns one `{label, measured_at, value}` row per stored measurement of
//! the requested datalogger, optionally bounded by `since` / `before`.

use axum::{
    extract::{rejection::QueryRejection, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use super::{QueryPairs, ReadParams, SharedStore};
use crate::error::ApiError;
use crate::models::RawRow;
use crate::query;

// ---

pub fn router() -> Router<SharedStore> {
    // ---
    Router::new().route("/api/data", get(handler))
}

/// Handle `GET /api/data?datalogger=<id>&since=<ts>&before=<ts>`.
async fn handler(
    State(store): State<SharedStore>,
    params: Result<QueryPairs, QueryRejection>,
) -> Result<Json<Vec<RawRow>>, ApiError> {
    // ---
    let params = ReadParams::extract(params)?;
    debug!("GET /api/data - {:?}", params);

    let (logger_id, window) = params.resolve()?;
    let rows = query::get_raw_data(store.as_ref(), logger_id, &window).await?;

    info!("GET /api/data - returning {} rows for {}", rows.len(), logger_id);
    Ok(Json(rows))
}
