//! Route gateway: merges every endpoint subrouter and attaches the store.

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Query};
use axum::Router;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::parse_logger_id;
use crate::query::TimeWindow;
use crate::store::Store;

mod data;
mod health;
mod ingest;
mod summary;

// ---

/// Application state shared by every handler.
pub type SharedStore = Arc<dyn Store>;

pub fn router(store: SharedStore) -> Router {
    // ---
    Router::new()
        .merge(ingest::router())
        .merge(data::router())
        .merge(summary::router())
        .merge(health::router())
        .with_state(store)
}

/// Query string accepted by `/api/data` and `/api/summary`.
///
/// Extracted as raw pairs so a repeated key keeps its last value instead of
/// failing deserialization.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReadParams {
    // ---
    datalogger: Option<String>,
    since: Option<String>,
    before: Option<String>,
    span: Option<String>,
}

/// Raw query-string pairs, in request order.
pub(crate) type QueryPairs = Query<Vec<(String, String)>>;

impl ReadParams {
    // ---
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        // ---
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "datalogger" => &mut params.datalogger,
                "since" => &mut params.since,
                "before" => &mut params.before,
                "span" => &mut params.span,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }

    /// Unwrap the extractor result, folding a rejection into `ApiError`.
    fn extract(pairs: Result<QueryPairs, QueryRejection>) -> Result<Self, ApiError> {
        pairs
            .map(|Query(p)| Self::from_pairs(p))
            .map_err(|e| ApiError::MalformedPayload(e.body_text()))
    }

    /// Logger id and time window. The id is checked first so that a request
    /// without it never reaches timestamp parsing or storage.
    fn resolve(&self) -> Result<(Uuid, TimeWindow), ApiError> {
        // ---
        let raw_id = self
            .datalogger
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ApiError::MissingQueryParameter)?;
        let logger_id = parse_logger_id(raw_id)?;
        let window = TimeWindow::parse(self.since.as_deref(), self.before.as_deref())?;
        Ok((logger_id, window))
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        // ---
        let params = ReadParams::from_pairs(pairs(&[
            ("datalogger", "x"),
            ("span", "day"),
            ("datalogger", "c2a61e2e-068d-4670-a97c-72bfa5e2a58a"),
            ("span", "hour"),
        ]));
        assert_eq!(
            params.datalogger.as_deref(),
            Some("c2a61e2e-068d-4670-a97c-72bfa5e2a58a")
        );
        assert_eq!(params.span.as_deref(), Some("hour"));
        assert!(params.resolve().is_ok());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        // ---
        let params = ReadParams::from_pairs(pairs(&[("limit", "5"), ("since", "")]));
        assert_eq!(params.datalogger, None);
        assert_eq!(params.since.as_deref(), Some(""));
        assert!(matches!(
            params.resolve(),
            Err(ApiError::MissingQueryParameter)
        ));
    }
}
