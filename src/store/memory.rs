//! In-process storage backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordWithMeasurements, Store, StoreError};
use crate::models::{DataRecord, Datalogger, Label, Location, Measurement};
use crate::query::TimeWindow;

// ---

#[derive(Debug, Default)]
struct Tables {
    // ---
    loggers: Vec<Datalogger>,
    locations: Vec<Location>,
    measurements: Vec<Measurement>,
    records: Vec<DataRecord>,
    /// record id -> measurement ids, in link order
    links: HashMap<i64, Vec<i64>>,
}

/// Arena-backed store. Ids are 1-based positions in their table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn logger_count(&self) -> usize {
        self.tables.read().await.loggers.len()
    }

    pub async fn location_count(&self) -> usize {
        self.tables.read().await.locations.len()
    }

    pub async fn measurement_count(&self) -> usize {
        self.tables.read().await.measurements.len()
    }

    pub async fn record_count(&self) -> usize {
        self.tables.read().await.records.len()
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

fn lookup<T>(table: &[T], id: i64) -> Option<&T> {
    usize::try_from(id - 1).ok().and_then(|idx| table.get(idx))
}

#[async_trait]
impl Store for MemoryStore {
    // ---
    async fn create_logger_if_absent(&self, id: Uuid) -> Result<Datalogger, StoreError> {
        // ---
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.loggers.iter().find(|l| l.id == id) {
            return Ok(*existing);
        }
        let logger = Datalogger { id };
        tables.loggers.push(logger);
        Ok(logger)
    }

    async fn create_location(&self, lat: f64, lng: f64) -> Result<Location, StoreError> {
        // ---
        let mut tables = self.tables.write().await;
        let location = Location {
            id: next_id(tables.locations.len()),
            lat,
            lng,
        };
        tables.locations.push(location.clone());
        Ok(location)
    }

    async fn create_measurement(
        &self,
        label: Label,
        value: f64,
    ) -> Result<Measurement, StoreError> {
        // ---
        let mut tables = self.tables.write().await;
        let measurement = Measurement {
            id: next_id(tables.measurements.len()),
            label,
            value,
        };
        tables.measurements.push(measurement.clone());
        Ok(measurement)
    }

    async fn create_record(
        &self,
        at: DateTime<Utc>,
        logger_id: Uuid,
        location_id: i64,
        measurement_ids: &[i64],
    ) -> Result<DataRecord, StoreError> {
        // ---
        let mut tables = self.tables.write().await;

        if !tables.loggers.iter().any(|l| l.id == logger_id) {
            return Err(StoreError::UnknownLogger(logger_id));
        }
        if lookup(&tables.locations, location_id).is_none() {
            return Err(StoreError::UnknownLocation(location_id));
        }
        if let Some(missing) = measurement_ids
            .iter()
            .find(|id| lookup(&tables.measurements, **id).is_none())
        {
            return Err(StoreError::UnknownMeasurement(*missing));
        }

        let record = DataRecord {
            id: next_id(tables.records.len()),
            at,
            datalogger_id: logger_id,
            location_id,
        };
        tables.records.push(record.clone());
        tables.links.insert(record.id, measurement_ids.to_vec());
        Ok(record)
    }

    async fn find_records(
        &self,
        logger_id: Uuid,
        window: &TimeWindow,
    ) -> Result<Vec<RecordWithMeasurements>, StoreError> {
        // ---
        let tables = self.tables.read().await;

        let mut found = Vec::new();
        for record in tables
            .records
            .iter()
            .filter(|r| r.datalogger_id == logger_id && window.contains(r.at))
        {
            let ids = tables.links.get(&record.id).map(Vec::as_slice).unwrap_or(&[]);
            let measurements = ids
                .iter()
                .map(|id| {
                    lookup(&tables.measurements, *id)
                        .cloned()
                        .ok_or(StoreError::UnknownMeasurement(*id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            found.push((record.clone(), measurements));
        }
        Ok(found)
    }
}
