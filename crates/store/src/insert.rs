use sqlx::QueryBuilder;
use stats_core::{EventRecord, Result};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

use crate::client::SqliteStore;
use crate::store_err;

/// Rows per multi-row INSERT. Nine bound columns per row keeps each
/// statement well under SQLite's bind parameter limit.
const CHUNK_ROWS: usize = 80;

/// Inserts a batch of events inside a single transaction. Either every
/// row lands or none do; callers rely on that to re-buffer on failure.
pub async fn insert_batch(store: &SqliteStore, events: &[EventRecord]) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }
    let started = Instant::now();

    // Serialize meta up front so a bad record fails before the transaction opens.
    let mut meta_json = Vec::with_capacity(events.len());
    for event in events {
        meta_json.push(event.meta_json()?);
    }

    let mut tx = store.pool().begin().await.map_err(store_err)?;
    for (chunk_idx, chunk) in events.chunks(CHUNK_ROWS).enumerate() {
        let offset = chunk_idx * CHUNK_ROWS;
        let mut qb = QueryBuilder::<sqlx::Sqlite>::new(
            "INSERT INTO events (event_type, object_id, object_type, session_id, \
             timestamp, value, referrer_domain, user_agent_hash, meta_data) ",
        );
        qb.push_values(chunk.iter().enumerate(), |mut b, (i, event)| {
            b.push_bind(&event.event_type)
                .push_bind(event.object_id)
                .push_bind(&event.object_type)
                .push_bind(&event.session_id)
                .push_bind(event.timestamp_millis())
                .push_bind(event.value)
                .push_bind(&event.referrer_domain)
                .push_bind(&event.user_agent_hash)
                .push_bind(&meta_json[offset + i]);
        });
        qb.build().execute(&mut *tx).await.map_err(store_err)?;
    }
    tx.commit().await.map_err(store_err)?;

    metrics().events_inserted.inc_by(events.len() as u64);
    metrics()
        .flush_latency_ms
        .observe(started.elapsed().as_millis() as u64);
    debug!(count = events.len(), "inserted event batch");
    Ok(events.len())
}
