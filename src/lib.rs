//! `datalogger-api`: ingest and query service for field datalogger readings.
//!
//! Loggers post time-stamped temperature, rain and humidity readings with
//! their position; clients read them back raw or bucketed by hour or day.
//!
//! Module boundaries:
//! - `ingest`    : payload decoding, range validation, record creation
//! - `query`     : raw retrieval within an optional time window
//! - `aggregate` : hour/day bucketing with per-label reducers
//! - `store`     : storage trait with PostgreSQL and in-memory backends
//! - `routes`    : HTTP gateway (`/api/ingest`, `/api/data`, `/api/summary`, `/health`)
//! - `config`, `schema`, `error`, `models` : supporting pieces

pub mod aggregate;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod query;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::Config;
pub use error::ApiError;
pub use models::{AggregateRow, Label, RawRow};
pub use store::{MemoryStore, PgStore, Store, StoreError};
