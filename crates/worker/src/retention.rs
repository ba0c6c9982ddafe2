use chrono::{Duration, Utc};
use stats_core::Result;
use store::retention::{sweep_events, sweep_stats};
use store::SqliteStore;
use tracing::info;

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub events_deleted: u64,
    pub stats_deleted: u64,
}

/// Deletes raw events and rollup rows older than the retention window.
pub struct RetentionSweeper {
    store: SqliteStore,
    retention_days: u32,
}

impl RetentionSweeper {
    pub fn new(store: SqliteStore, retention_days: u32) -> Self {
        Self {
            store,
            retention_days,
        }
    }

    pub async fn sweep(&self) -> Result<SweepOutcome> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let outcome = SweepOutcome {
            events_deleted: sweep_events(&self.store, cutoff).await?,
            stats_deleted: sweep_stats(&self.store, cutoff.date_naive()).await?,
        };
        info!(
            retention_days = self.retention_days,
            events = outcome.events_deleted,
            stats = outcome.stats_deleted,
            "retention sweep complete"
        );
        Ok(outcome)
    }
}
