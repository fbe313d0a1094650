//! Round trip through `PgStore`.
//!
//! Runs only when `TEST_DATABASE_URL` points at a scratch PostgreSQL
//! database; otherwise the test returns early.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use datalogger_api::query::TimeWindow;
use datalogger_api::{aggregate, query, schema, Label, PgStore, Store};

#[tokio::test]
async fn pg_store_round_trip() -> Result<()> {
    // ---
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return Ok(());
    };

    let pool = PgPoolOptions::new().max_connections(2).connect(&url).await?;
    schema::create_schema(&pool).await?;
    // Second call must be a no-op
    schema::create_schema(&pool).await?;

    let store = PgStore::new(pool);
    let logger = Uuid::new_v4();

    for (hour, temp, rain) in [(12, 22.5, 1.2), (13, 25.0, 0.8)] {
        store.create_logger_if_absent(logger).await?;
        let location = store.create_location(47.56321, 1.524568).await?;
        let t = store.create_measurement(Label::Temp, temp).await?;
        let r = store.create_measurement(Label::Rain, rain).await?;
        let at = Utc.with_ymd_and_hms(2024, 12, 24, hour, 0, 0).unwrap();
        store
            .create_record(at, logger, location.id, &[t.id, r.id])
            .await?;
    }

    let window = TimeWindow::default();
    let rows = query::get_raw_data(&store, logger, &window).await?;
    let labels: Vec<_> = rows.iter().map(|r| (r.label, r.value)).collect();
    assert_eq!(
        labels,
        vec![
            (Label::Temp, 22.5),
            (Label::Rain, 1.2),
            (Label::Temp, 25.0),
            (Label::Rain, 0.8)
        ]
    );

    let daily = aggregate::get_aggregate_data(&store, logger, &window, aggregate::Span::Day).await?;
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].value, 23.75);
    assert_eq!(daily[1].value, 2.0);

    let window = TimeWindow {
        since: Some(Utc.with_ymd_and_hms(2024, 12, 24, 13, 0, 0).unwrap()),
        before: None,
    };
    let late = query::get_raw_data(&store, logger, &window).await?;
    assert_eq!(late.len(), 2);

    Ok(())
}
