use stats_core::Result;
use tracing::info;

use crate::client::SqliteStore;
use crate::store_err;

/// Raw events, one row per accepted event. `timestamp` is epoch millis UTC.
const CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type      TEXT    NOT NULL,
    object_id       INTEGER NOT NULL DEFAULT 0,
    object_type     TEXT    NOT NULL DEFAULT 'post',
    session_id      TEXT    NOT NULL,
    timestamp       INTEGER NOT NULL,
    value           REAL,
    referrer_domain TEXT,
    user_agent_hash TEXT,
    meta_data       TEXT
)
"#;

/// Rollup rows keyed by (date, hour slot, object, metric, period).
/// `stat_hour = -1` marks a whole-day row; SQLite treats NULLs as
/// distinct in unique indexes, which would break upsert idempotence.
const CREATE_STATS: &str = r#"
CREATE TABLE IF NOT EXISTS stats (
    stat_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    stat_date    TEXT    NOT NULL,
    stat_hour    INTEGER NOT NULL DEFAULT -1,
    object_id    INTEGER NOT NULL DEFAULT 0,
    object_type  TEXT    NOT NULL DEFAULT 'post',
    metric_name  TEXT    NOT NULL,
    metric_value INTEGER NOT NULL DEFAULT 0,
    period_type  TEXT    NOT NULL DEFAULT 'daily'
)
"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_events_type_object ON events (event_type, object_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events (timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_events_session ON events (session_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_stats_unique \
     ON stats (stat_date, stat_hour, object_id, metric_name, period_type)",
    "CREATE INDEX IF NOT EXISTS idx_stats_date_metric ON stats (stat_date, metric_name)",
    "CREATE INDEX IF NOT EXISTS idx_stats_object ON stats (object_id, object_type)",
];

/// Creates tables and indexes if they do not exist. Safe to run on every boot.
pub async fn init_schema(store: &SqliteStore) -> Result<()> {
    sqlx::query(CREATE_EVENTS)
        .execute(store.pool())
        .await
        .map_err(store_err)?;
    sqlx::query(CREATE_STATS)
        .execute(store.pool())
        .await
        .map_err(store_err)?;
    for ddl in INDEXES {
        sqlx::query(ddl)
            .execute(store.pool())
            .await
            .map_err(store_err)?;
    }
    info!("database schema initialized");
    Ok(())
}
