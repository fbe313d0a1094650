//! Raw retrieval: one row per (record, measurement) for a datalogger.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{parse_timestamp, RawRow};
use crate::store::{RecordWithMeasurements, Store};

// ---

/// Optional inclusive time bounds on `DataRecord.at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl TimeWindow {
    // ---
    /// Build a window from query-string values. Empty strings count as absent.
    pub fn parse(since: Option<&str>, before: Option<&str>) -> Result<Self, ApiError> {
        // ---
        let bound = |raw: Option<&str>| {
            raw.filter(|s| !s.is_empty())
                .map(parse_timestamp)
                .transpose()
        };

        Ok(Self {
            since: bound(since)?,
            before: bound(before)?,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| at >= since) && self.before.map_or(true, |before| at <= before)
    }
}

/// Flatten records into rows, keeping record order then measurement order.
pub fn flatten(records: &[RecordWithMeasurements]) -> Vec<RawRow> {
    // ---
    records
        .iter()
        .flat_map(|(record, measurements)| {
            measurements.iter().map(move |m| RawRow {
                label: m.label,
                measured_at: record.at,
                value: m.value,
            })
        })
        .collect()
}

pub async fn get_raw_data(
    store: &dyn Store,
    logger_id: Uuid,
    window: &TimeWindow,
) -> Result<Vec<RawRow>, ApiError> {
    // ---
    let records = store.find_records(logger_id, window).await?;
    Ok(flatten(&records))
}
