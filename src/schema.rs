//! Database schema management for `datalogger-api`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` when a database is configured.

use anyhow::Result;
use sqlx::PgPool;

// ---

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS dataloggers (
        id UUID PRIMARY KEY
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id  BIGSERIAL        PRIMARY KEY,
        lat DOUBLE PRECISION NOT NULL,
        lng DOUBLE PRECISION NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS measurements (
        id    BIGSERIAL        PRIMARY KEY,
        label VARCHAR(4)       NOT NULL CHECK (label IN ('temp', 'rain', 'hum')),
        value DOUBLE PRECISION NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS data_records (
        id            BIGSERIAL   PRIMARY KEY,
        at            TIMESTAMPTZ NOT NULL,
        datalogger_id UUID        NOT NULL REFERENCES dataloggers (id) ON DELETE CASCADE,
        location_id   BIGINT      NOT NULL REFERENCES locations (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS data_record_measurements (
        id             BIGSERIAL PRIMARY KEY,
        data_record_id BIGINT    NOT NULL REFERENCES data_records (id) ON DELETE CASCADE,
        measurement_id BIGINT    NOT NULL REFERENCES measurements (id) ON DELETE CASCADE,
        UNIQUE (data_record_id, measurement_id)
    );
    "#,
    // Every read filters by logger and optionally by time
    r#"
    CREATE INDEX IF NOT EXISTS idx_data_records_logger_at
        ON data_records (datalogger_id, at);
    "#,
];

/// Create the database schema (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist.
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    for statement in STATEMENTS {
        sqlx::query(*statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::info!("Database schema ready ({} statements)", STATEMENTS.len());
    Ok(())
}
