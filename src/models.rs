//! Data models for datalogger readings.
//!
//! Persisted entities (`Datalogger`, `Location`, `Measurement`, `DataRecord`)
//! plus the row shapes returned by the read endpoints.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ---

/// Kind of reading carried by a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    // ---
    Temp,
    Rain,
    Hum,
}

impl Label {
    // ---
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Temp => "temp",
            Label::Rain => "rain",
            Label::Hum => "hum",
        }
    }

    /// Accepted value band, bounds included.
    pub fn valid_range(self) -> RangeInclusive<f64> {
        match self {
            Label::Temp => -20.0..=40.0,
            Label::Rain => 0.0..=2.0,
            Label::Hum => 20.0..=100.0,
        }
    }

    /// Reduce the values of one aggregation bucket.
    ///
    /// Rain accumulates, everything else is averaged. `values` is never
    /// empty for a bucket that exists.
    pub fn reduce(self, values: &[f64]) -> f64 {
        // ---
        let sum: f64 = values.iter().sum();
        match self {
            Label::Rain => sum,
            Label::Temp | Label::Hum => sum / values.len() as f64,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temp" => Ok(Label::Temp),
            "rain" => Ok(Label::Rain),
            "hum" => Ok(Label::Hum),
            other => Err(format!("unknown measurement label {other:?}")),
        }
    }
}

/// A sensor unit, known only by its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datalogger {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: i64,
    pub label: Label,
    pub value: f64,
}

/// One ingested sample event. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub id: i64,
    pub at: DateTime<Utc>,
    pub datalogger_id: Uuid,
    pub location_id: i64,
}

/// Row emitted by `/api/data` and by `/api/summary` without a usable span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    pub label: Label,
    pub measured_at: DateTime<Utc>,
    pub value: f64,
}

/// Row emitted by `/api/summary` when a span is given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub label: Label,
    pub time_slot: DateTime<Utc>,
    pub value: f64,
}

// ---

/// `%#z` takes `Z`, `+01`, `+0100` and `+01:00`; numeric fields may be
/// a single digit.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp into UTC.
///
/// Offsets are honoured and normalised to UTC; timestamps without an offset
/// are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    // ---
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Some(ts) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::InvalidTimestamp(raw.to_string()))
}

/// Parse a datalogger identifier.
pub fn parse_logger_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidIdentifier(raw.to_string()))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_range_boundaries_are_inclusive() {
        // ---
        assert!(Label::Temp.valid_range().contains(&-20.0));
        assert!(Label::Temp.valid_range().contains(&40.0));
        assert!(!Label::Temp.valid_range().contains(&-20.01));
        assert!(!Label::Temp.valid_range().contains(&40.01));

        assert!(Label::Hum.valid_range().contains(&20.0));
        assert!(Label::Hum.valid_range().contains(&100.0));
        assert!(!Label::Hum.valid_range().contains(&19.99));
        assert!(!Label::Hum.valid_range().contains(&100.01));

        assert!(Label::Rain.valid_range().contains(&0.0));
        assert!(Label::Rain.valid_range().contains(&2.0));
        assert!(!Label::Rain.valid_range().contains(&-0.01));
        assert!(!Label::Rain.valid_range().contains(&2.01));
    }

    #[test]
    fn test_reducers() {
        // ---
        assert_eq!(Label::Rain.reduce(&[1.2, 0.8]), 2.0);
        assert_eq!(Label::Temp.reduce(&[22.5, 25.0]), 23.75);
        assert_eq!(Label::Hum.reduce(&[40.0, 60.0, 80.0]), 60.0);
        assert_eq!(Label::Temp.reduce(&[18.0]), 18.0);
    }

    #[test]
    fn test_label_serde_is_lowercase() {
        // ---
        assert_eq!(serde_json::to_string(&Label::Hum).unwrap(), "\"hum\"");
        let label: Label = serde_json::from_str("\"rain\"").unwrap();
        assert_eq!(label, Label::Rain);
        assert!(serde_json::from_str::<Label>("\"wind\"").is_err());
        assert_eq!("temp".parse::<Label>().unwrap(), Label::Temp);
        assert!("TEMP".parse::<Label>().is_err());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        // ---
        let expected = Utc.with_ymd_and_hms(2024, 12, 24, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-12-24T12:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24T13:00:00+01:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24T12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24 12:00").unwrap(), expected);

        // Minute precision with a zone, compact and hour-only offsets
        assert_eq!(parse_timestamp("2024-12-24T12:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24T13:00+01:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24T13:00:00+0100").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24T13:00:00+01").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-12-24 10:30:00-0130").unwrap(), expected);

        // Single-digit fields
        assert_eq!(
            parse_timestamp("2024-1-5T1:02:03Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 5, 1, 2, 3).unwrap()
        );

        let fractional = parse_timestamp("2021-01-02T05:46:22.250Z").unwrap();
        assert_eq!(fractional.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        // ---
        let err = parse_timestamp("invalid-date").unwrap_err();
        assert!(matches!(err, ApiError::InvalidTimestamp(ref s) if s == "invalid-date"));
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-13-40T00:00:00Z").is_err());
    }

    #[test]
    fn test_parse_logger_id() {
        // ---
        let id = parse_logger_id("c2a61e2e-068d-4670-a97c-72bfa5e2a58a").unwrap();
        assert_eq!(id.to_string(), "c2a61e2e-068d-4670-a97c-72bfa5e2a58a");
        assert!(matches!(
            parse_logger_id("logger-1"),
            Err(ApiError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_rows_serialize_with_utc_suffix() {
        // ---
        let row = AggregateRow {
            label: Label::Temp,
            time_slot: Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap(),
            value: 23.75,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["label"], "temp");
        assert_eq!(json["time_slot"], "2024-12-24T00:00:00Z");
        assert_eq!(json["value"], 23.75);
    }
}
