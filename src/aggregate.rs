//! Time-bucketed aggregation of datalogger readings.
//!
//! Each (record, measurement) pair is assigned a time slot by truncating the
//! record timestamp to the span, grouped by `(label, slot)`, and reduced with
//! the label's reducer (rain sums, temperature and humidity average).
//! Groups come out in the order their key was first seen.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AggregateRow, Label};
use crate::query::TimeWindow;
use crate::store::{RecordWithMeasurements, Store};

// ---

/// Bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Hour,
    Day,
}

impl Span {
    // ---
    /// Start of the bucket containing `at`, on the same UTC date.
    pub fn truncate(self, at: DateTime<Utc>) -> DateTime<Utc> {
        // ---
        let time = match self {
            Span::Day => NaiveTime::MIN,
            Span::Hour => NaiveTime::MIN + TimeDelta::hours(i64::from(at.hour())),
        };
        at.date_naive().and_time(time).and_utc()
    }
}

impl FromStr for Span {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Span::Hour),
            "day" => Ok(Span::Day),
            other => Err(format!("unsupported span {other:?}")),
        }
    }
}

/// Group and reduce already-fetched records.
pub fn aggregate(records: &[RecordWithMeasurements], span: Span) -> Vec<AggregateRow> {
    // ---
    let mut index: HashMap<(Label, DateTime<Utc>), usize> = HashMap::new();
    let mut groups: Vec<(Label, DateTime<Utc>, Vec<f64>)> = Vec::new();

    for (record, measurements) in records {
        let slot = span.truncate(record.at);
        for m in measurements {
            let key = (m.label, slot);
            let pos = *index.entry(key).or_insert_with(|| {
                groups.push((m.label, slot, Vec::new()));
                groups.len() - 1
            });
            groups[pos].2.push(m.value);
        }
    }

    groups
        .into_iter()
        .map(|(label, time_slot, values)| AggregateRow {
            label,
            time_slot,
            value: label.reduce(&values),
        })
        .collect()
}

pub async fn get_aggregate_data(
    store: &dyn Store,
    logger_id: Uuid,
    window: &TimeWindow,
    span: Span,
) -> Result<Vec<AggregateRow>, ApiError> {
    // ---
    let records = store.find_records(logger_id, window).await?;
    let rows = aggregate(&records, span);
    tracing::debug!(
        "Aggregated {} records into {} {:?} buckets",
        records.len(),
        rows.len(),
        span
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{parse_timestamp, DataRecord, Measurement};
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, day, hour, min, 0).unwrap()
    }

    fn record(id: i64, at: DateTime<Utc>, values: &[(Label, f64)]) -> RecordWithMeasurements {
        // ---
        let record = DataRecord {
            id,
            at,
            datalogger_id: Uuid::nil(),
            location_id: id,
        };
        let measurements = values
            .iter()
            .map(|(label, value)| Measurement {
                id,
                label: *label,
                value: *value,
            })
            .collect();
        (record, measurements)
    }

    /// Same layout as the summary fixtures: two records on the 24th, one on the 23rd.
    fn fixtures() -> Vec<RecordWithMeasurements> {
        vec![
            record(1, ts(24, 12, 0), &[(Label::Temp, 22.5), (Label::Rain, 1.2)]),
            record(2, ts(24, 13, 0), &[(Label::Temp, 25.0), (Label::Rain, 0.8)]),
            record(3, ts(23, 10, 0), &[(Label::Temp, 18.0), (Label::Rain, 1.5)]),
        ]
    }

    #[test]
    fn test_span_parse() {
        // ---
        assert_eq!("hour".parse::<Span>().unwrap(), Span::Hour);
        assert_eq!("day".parse::<Span>().unwrap(), Span::Day);
        assert!("week".parse::<Span>().is_err());
        assert!("Day".parse::<Span>().is_err());
    }

    #[test]
    fn test_truncate() {
        // ---
        let at = Utc
            .with_ymd_and_hms(2024, 12, 24, 13, 47, 12)
            .unwrap()
            .with_nanosecond(123_000_000)
            .unwrap();
        assert_eq!(Span::Hour.truncate(at), ts(24, 13, 0));
        assert_eq!(Span::Day.truncate(at), ts(24, 0, 0));
        assert_eq!(Span::Hour.truncate(ts(24, 23, 59)), ts(24, 23, 0));
    }

    #[test]
    fn test_hour_span_keeps_distinct_hours_apart() {
        // ---
        let rows = aggregate(&fixtures()[..2], Span::Hour);

        let got: Vec<_> = rows.iter().map(|r| (r.label, r.time_slot, r.value)).collect();
        assert_eq!(
            got,
            vec![
                (Label::Temp, ts(24, 12, 0), 22.5),
                (Label::Rain, ts(24, 12, 0), 1.2),
                (Label::Temp, ts(24, 13, 0), 25.0),
                (Label::Rain, ts(24, 13, 0), 0.8),
            ]
        );
    }

    #[test]
    fn test_day_span_means_temp_and_sums_rain() {
        // ---
        let rows = aggregate(&fixtures(), Span::Day);

        assert_eq!(rows.len(), 4);
        assert_eq!(
            (rows[0].label, rows[0].time_slot, rows[0].value),
            (Label::Temp, ts(24, 0, 0), 23.75)
        );
        assert_eq!(
            (rows[1].label, rows[1].time_slot, rows[1].value),
            (Label::Rain, ts(24, 0, 0), 2.0)
        );
        assert_eq!((rows[2].label, rows[2].value), (Label::Temp, 18.0));
        assert_eq!((rows[3].label, rows[3].value), (Label::Rain, 1.5));
    }

    #[test]
    fn test_same_hour_readings_are_merged() {
        // ---
        let records = vec![
            record(1, ts(24, 12, 5), &[(Label::Hum, 40.0)]),
            record(2, ts(24, 12, 55), &[(Label::Hum, 60.0), (Label::Rain, 0.5)]),
            record(3, ts(24, 12, 30), &[(Label::Rain, 0.25)]),
        ];
        let rows = aggregate(&records, Span::Hour);

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].label, rows[0].value), (Label::Hum, 50.0));
        assert_eq!((rows[1].label, rows[1].value), (Label::Rain, 0.75));
    }

    #[test]
    fn test_offset_timestamps_bucket_by_utc_day() {
        // ---
        // 00:30 at +02:00 is 22:30 UTC on the previous day
        let local = parse_timestamp("2024-12-24T00:30:00+02:00").unwrap();
        let records = vec![
            record(1, local, &[(Label::Rain, 0.4)]),
            record(2, ts(23, 18, 0), &[(Label::Rain, 0.6)]),
            record(3, ts(24, 6, 0), &[(Label::Rain, 1.0)]),
        ];
        let rows = aggregate(&records, Span::Day);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time_slot, ts(23, 0, 0));
        assert_eq!(rows[0].value, 1.0);
        assert_eq!(rows[1].time_slot, ts(24, 0, 0));
        assert_eq!(rows[1].value, 1.0);

        let hourly = aggregate(&records[..1], Span::Hour);
        assert_eq!(hourly[0].time_slot, ts(23, 22, 0));
    }

    #[test]
    fn test_no_records_no_rows() {
        assert!(aggregate(&[], Span::Day).is_empty());
    }
}
