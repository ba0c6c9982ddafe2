use async_trait::async_trait;
use stats_core::{EventRecord, Result};
use store::SqliteStore;

/// Destination for flushed event batches. The insert must be atomic:
/// on error the caller assumes no rows landed and re-buffers the batch.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    async fn insert_batch(&self, events: &[EventRecord]) -> Result<usize>;
}

#[async_trait]
impl EventSink for SqliteStore {
    async fn insert_batch(&self, events: &[EventRecord]) -> Result<usize> {
        store::insert::insert_batch(self, events).await
    }
}
