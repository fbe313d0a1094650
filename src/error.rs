//! Error types surfaced by the HTTP handlers.
//!
//! Every failure is answered with `400 {"error": "<message>"}`; nothing here
//! is fatal to the process.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

use crate::models::Label;
use crate::store::StoreError;

// ---

#[derive(Debug, Error)]
pub enum ApiError {
    // ---
    /// Body is not JSON, or a value has the wrong type.
    #[error("{0}")]
    MalformedPayload(String),

    /// Required key absent from the ingest body.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// First measurement outside its accepted band.
    #[error("{0} is out of range")]
    RangeViolation(Label),

    /// Read request without a datalogger identifier.
    #[error("Missing required values.")]
    MissingQueryParameter,

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid datalogger identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        if let ApiError::Storage(ref e) = self {
            tracing::error!("Storage operation failed: {}", e);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
