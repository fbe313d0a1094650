// src/routes/summary.rs
//! Summary endpoint.
//!
//! Exports a subrouter with `GET /api/summary`, merged by the gateway
//! (`mod.rs`). Dispatches to hour/day aggregation when `span` is recognised,
//! otherwise to the same raw rows as `/api/data`.

use axum::{
    extract::{rejection::QueryRejection, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use super::{QueryPairs, ReadParams, SharedStore};
use crate::aggregate::{self, Span};
use crate::error::ApiError;
use crate::query;

// ---

pub fn router() -> Router<SharedStore> {
    // ---
    Router::new().route("/api/summary", get(handler))
}

/// Handle `GET /api/summary?datalogger=<id>&since=<ts>&before=<ts>&span=hour|day`.
///
/// A recognised `span` yields aggregated rows; anything else (absent,
/// empty, or unknown) yields exactly what `/api/data` would return.
async fn handler(
    State(store): State<SharedStore>,
    params: Result<QueryPairs, QueryRejection>,
) -> Result<Response, ApiError> {
    // ---
    let params = ReadParams::extract(params)?;
    debug!("GET /api/summary - {:?}", params);

    let (logger_id, window) = params.resolve()?;
    let span = params.span.as_deref().and_then(|s| s.parse::<Span>().ok());

    let response = match span {
        Some(span) => {
            let rows =
                aggregate::get_aggregate_data(store.as_ref(), logger_id, &window, span).await?;
            info!(
                "GET /api/summary - returning {} {:?} buckets for {}",
                rows.len(),
                span,
                logger_id
            );
            Json(rows).into_response()
        }
        None => {
            let rows = query::get_raw_data(store.as_ref(), logger_id, &window).await?;
            info!(
                "GET /api/summary - no usable span, returning {} raw rows for {}",
                rows.len(),
                logger_id
            );
            Json(rows).into_response()
        }
    };
    Ok(response)
}
