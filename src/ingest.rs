//! Ingest validation: turns an inbound JSON body into one stored record.
//!
//! The full payload is checked before anything is written, in this order:
//! datalogger, location, measurements (input order, stop at the first
//! out-of-range value), timestamp. A rejected payload leaves the store
//! untouched.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{parse_logger_id, parse_timestamp, DataRecord, Label};
use crate::store::Store;

// ---

/// Inbound body of `POST /api/ingest`.
///
/// Every key is optional at the serde level so that absence is reported as
/// [`ApiError::MissingField`] rather than as a generic parse error.
#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    // ---
    pub at: Option<String>,
    pub datalogger: Option<String>,
    pub location: Option<LocationPayload>,
    pub measurements: Option<Vec<MeasurementPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct LocationPayload {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MeasurementPayload {
    pub label: Option<Label>,
    pub value: Option<f64>,
}

/// A payload that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    // ---
    pub at: DateTime<Utc>,
    pub datalogger: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub measurements: Vec<(Label, f64)>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ApiError> {
    value.ok_or(ApiError::MissingField(field))
}

impl IngestPayload {
    // ---
    /// Decode a request body. Syntax and type errors are `MalformedPayload`.
    pub fn from_slice(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedPayload(e.to_string()))
    }

    pub fn validate(self) -> Result<Reading, ApiError> {
        // ---
        let datalogger = parse_logger_id(&required(self.datalogger, "datalogger")?)?;

        let location = required(self.location, "location")?;
        let lat = required(location.lat, "location.lat")?;
        let lng = required(location.lng, "location.lng")?;

        let mut measurements = Vec::new();
        for m in required(self.measurements, "measurements")? {
            let label = required(m.label, "measurements.label")?;
            let value = required(m.value, "measurements.value")?;
            if !label.valid_range().contains(&value) {
                return Err(ApiError::RangeViolation(label));
            }
            measurements.push((label, value));
        }

        let at = parse_timestamp(&required(self.at, "at")?)?;

        Ok(Reading {
            at,
            datalogger,
            lat,
            lng,
            measurements,
        })
    }
}

/// Write a validated reading: logger (get-or-create), a fresh location, one
/// row per measurement, then the record linking them.
pub async fn store_reading(store: &dyn Store, reading: &Reading) -> Result<DataRecord, ApiError> {
    // ---
    let logger = store.create_logger_if_absent(reading.datalogger).await?;
    let location = store.create_location(reading.lat, reading.lng).await?;

    let mut measurement_ids = Vec::with_capacity(reading.measurements.len());
    for (label, value) in &reading.measurements {
        let measurement = store.create_measurement(*label, *value).await?;
        measurement_ids.push(measurement.id);
    }

    let record = store
        .create_record(reading.at, logger.id, location.id, &measurement_ids)
        .await?;
    Ok(record)
}

/// Decode, validate and store one ingest body.
pub async fn ingest(store: &dyn Store, body: &[u8]) -> Result<DataRecord, ApiError> {
    // ---
    let reading = IngestPayload::from_slice(body)?.validate()?;
    tracing::debug!(
        "Validated reading for {} at {} with {} measurements",
        reading.datalogger,
        reading.at,
        reading.measurements.len()
    );
    store_reading(store, &reading).await
}
