//! Storage collaborator for dataloggers, locations, measurements and records.
//!
//! The core only needs create operations plus one filtered read, so the
//! boundary is a small trait with two backends:
//! - `PgStore`: PostgreSQL via `sqlx` (see `schema` for the tables)
//! - `MemoryStore`: in-process arenas, used without a database and in tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{DataRecord, Datalogger, Label, Location, Measurement};
use crate::query::TimeWindow;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

#[derive(Debug, Error)]
pub enum StoreError {
    // ---
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("datalogger {0} does not exist")]
    UnknownLogger(Uuid),

    #[error("location {0} does not exist")]
    UnknownLocation(i64),

    #[error("measurement {0} does not exist")]
    UnknownMeasurement(i64),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// A stored record together with its measurements, in insertion order.
pub type RecordWithMeasurements = (DataRecord, Vec<Measurement>);

#[async_trait]
pub trait Store: Send + Sync + 'static {
    // ---
    /// Return the logger with `id`, creating it on first sight.
    async fn create_logger_if_absent(&self, id: Uuid) -> Result<Datalogger, StoreError>;

    async fn create_location(&self, lat: f64, lng: f64) -> Result<Location, StoreError>;

    async fn create_measurement(&self, label: Label, value: f64)
        -> Result<Measurement, StoreError>;

    /// Link an existing logger, location and measurements into a new record.
    async fn create_record(
        &self,
        at: DateTime<Utc>,
        logger_id: Uuid,
        location_id: i64,
        measurement_ids: &[i64],
    ) -> Result<DataRecord, StoreError>;

    /// Records of `logger_id` inside `window` (both bounds inclusive), in
    /// insertion order, each with its measurements in insertion order.
    async fn find_records(
        &self,
        logger_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<RecordWithMeasurements>, StoreError>;
}
