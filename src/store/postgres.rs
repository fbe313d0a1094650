//! PostgreSQL storage backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RecordWithMeasurements, Store, StoreError};
use crate::models::{DataRecord, Datalogger, Label, Location, Measurement};
use crate::query::TimeWindow;

// ---

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of the record/measurement join used by `find_records`.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    // ---
    record_id: i64,
    at: DateTime<Utc>,
    datalogger_id: Uuid,
    location_id: i64,
    measurement_id: Option<i64>,
    label: Option<String>,
    value: Option<f64>,
}

fn parse_label(raw: &str) -> Result<Label, StoreError> {
    raw.parse().map_err(StoreError::Corrupt)
}

#[async_trait]
impl Store for PgStore {
    // ---
    async fn create_logger_if_absent(&self, id: Uuid) -> Result<Datalogger, StoreError> {
        // ---
        sqlx::query("INSERT INTO dataloggers (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Datalogger { id })
    }

    async fn create_location(&self, lat: f64, lng: f64) -> Result<Location, StoreError> {
        // ---
        let id: i64 = sqlx::query_scalar("INSERT INTO locations (lat, lng) VALUES ($1, $2) RETURNING id")
            .bind(lat)
            .bind(lng)
            .fetch_one(&self.pool)
            .await?;

        Ok(Location { id, lat, lng })
    }

    async fn create_measurement(
        &self,
        label: Label,
        value: f64,
    ) -> Result<Measurement, StoreError> {
        // ---
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO measurements (label, value) VALUES ($1, $2) RETURNING id",
        )
        .bind(label.as_str())
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(Measurement { id, label, value })
    }

    async fn create_record(
        &self,
        at: DateTime<Utc>,
        logger_id: Uuid,
        location_id: i64,
        measurement_ids: &[i64],
    ) -> Result<DataRecord, StoreError> {
        // ---
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO data_records (at, datalogger_id, location_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(at)
        .bind(logger_id)
        .bind(location_id)
        .fetch_one(&mut *tx)
        .await?;

        for measurement_id in measurement_ids {
            sqlx::query(
                r#"
                INSERT INTO data_record_measurements (data_record_id, measurement_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(id)
            .bind(measurement_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(DataRecord {
            id,
            at,
            datalogger_id: logger_id,
            location_id,
        })
    }

    async fn find_records(
        &self,
        logger_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<RecordWithMeasurements>, StoreError> {
        // ---
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT r.id            AS record_id,
                   r.at            AS at,
                   r.datalogger_id AS datalogger_id,
                   r.location_id   AS location_id,
                   m.id            AS measurement_id,
                   m.label         AS label,
                   m.value         AS value
              FROM data_records r
              LEFT JOIN data_record_measurements rm ON rm.data_record_id = r.id
              LEFT JOIN measurements m ON m.id = rm.measurement_id
             WHERE r.datalogger_id = $1
               AND ($2::timestamptz IS NULL OR r.at >= $2)
               AND ($3::timestamptz IS NULL OR r.at <= $3)
             ORDER BY r.id, rm.id
            "#,
        )
        .bind(logger_id)
        .bind(window.since)
        .bind(window.before)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("find_records({}) fetched {} joined rows", logger_id, rows.len());

        // Rows arrive grouped by record id; fold them back into records.
        let mut records: Vec<RecordWithMeasurements> = Vec::new();
        for row in rows {
            let is_new = records.last().map_or(true, |(r, _)| r.id != row.record_id);
            if is_new {
                let record = DataRecord {
                    id: row.record_id,
                    at: row.at,
                    datalogger_id: row.datalogger_id,
                    location_id: row.location_id,
                };
                records.push((record, Vec::new()));
            }

            if let (Some(id), Some(label), Some(value)) = (row.measurement_id, row.label, row.value)
            {
                let measurement = Measurement {
                    id,
                    label: parse_label(&label)?,
                    value,
                };
                if let Some((_, measurements)) = records.last_mut() {
                    measurements.push(measurement);
                }
            }
        }

        Ok(records)
    }
}
