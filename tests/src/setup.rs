//! Common test setup functions.

use std::sync::Arc;

use api::{router, AppState};
use axum::Router;
use pipeline::Ingestor;
use stats_core::AnalyticsConfig;
use store::schema::init_schema;
use store::{SqliteStore, StoreConfig};

/// Test context with an in-memory SQLite store behind the real router.
///
/// The store config pins the pool to a single connection so every
/// handler sees the same in-memory database. All middleware and
/// production code paths are exercised; only the storage medium
/// differs from a deployed instance.
pub struct TestContext {
    pub store: SqliteStore,
    pub ingestor: Arc<Ingestor<SqliteStore>>,
    pub router: Router,
    pub config: AnalyticsConfig,
}

impl TestContext {
    /// Context with `batch_size = 1`, so every tracked event is
    /// flushed to the store immediately.
    pub async fn new() -> Self {
        Self::with_config(AnalyticsConfig {
            batch_size: 1,
            ..AnalyticsConfig::default()
        })
        .await
    }

    pub async fn with_config(config: AnalyticsConfig) -> Self {
        let store = SqliteStore::connect(&StoreConfig::in_memory())
            .await
            .expect("Failed to open in-memory store");
        init_schema(&store).await.expect("Failed to init schema");

        let ingestor = Arc::new(Ingestor::new(Arc::new(store.clone()), &config, 0));
        let state = AppState::new(ingestor.clone(), store.clone(), config.clone());
        let router = router(state);

        Self {
            store,
            ingestor,
            router,
            config,
        }
    }

    pub async fn count_events(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(self.store.pool())
            .await
            .expect("count query failed")
    }

    pub async fn count_stats(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM stats")
            .fetch_one(self.store.pool())
            .await
            .expect("count query failed")
    }

    /// Value of one rollup row, if present.
    pub async fn stat_value(
        &self,
        metric_name: &str,
        object_id: i64,
        stat_hour: i64,
    ) -> Option<i64> {
        sqlx::query_scalar(
            "SELECT metric_value FROM stats \
             WHERE metric_name = ? AND object_id = ? AND stat_hour = ?",
        )
        .bind(metric_name)
        .bind(object_id)
        .bind(stat_hour)
        .fetch_optional(self.store.pool())
        .await
        .expect("stat query failed")
    }
}
