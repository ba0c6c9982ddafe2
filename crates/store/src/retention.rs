use chrono::{DateTime, NaiveDate, Utc};
use stats_core::Result;
use telemetry::metrics;
use tracing::info;

use crate::client::SqliteStore;
use crate::store_err;

/// Deletes raw events older than `cutoff`. Returns rows removed.
pub async fn sweep_events(store: &SqliteStore, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM events WHERE timestamp < ?")
        .bind(cutoff.timestamp_millis())
        .execute(store.pool())
        .await
        .map_err(store_err)?;
    let deleted = result.rows_affected();
    if deleted > 0 {
        metrics().events_swept.inc_by(deleted);
        info!(deleted, %cutoff, "swept expired events");
    }
    Ok(deleted)
}

/// Deletes rollup rows dated before `cutoff_date`. Returns rows removed.
pub async fn sweep_stats(store: &SqliteStore, cutoff_date: NaiveDate) -> Result<u64> {
    let result = sqlx::query("DELETE FROM stats WHERE stat_date < ?")
        .bind(cutoff_date)
        .execute(store.pool())
        .await
        .map_err(store_err)?;
    let deleted = result.rows_affected();
    if deleted > 0 {
        metrics().stats_swept.inc_by(deleted);
        info!(deleted, %cutoff_date, "swept expired stats");
    }
    Ok(deleted)
}
