//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pipeline::Ingestor;
use stats_core::AnalyticsConfig;
use store::{QuickStats, SqliteStore};

/// Dashboard headline numbers are recomputed at most once a minute.
const QUICK_STATS_TTL: Duration = Duration::from_secs(60);

/// Range queries (charts, top lists) are heavier; cache for 5 minutes.
const RANGE_CACHE_TTL: Duration = Duration::from_secs(300);

const RANGE_CACHE_MAX_CAPACITY: u64 = 1_000;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor<SqliteStore>>,
    pub store: SqliteStore,
    pub config: AnalyticsConfig,
    /// Single-entry cache for the quick-stats endpoint.
    pub quick_cache: Cache<(), QuickStats>,
    /// Keyed by endpoint + query parameters.
    pub range_cache: Cache<String, serde_json::Value>,
}

impl AppState {
    pub fn new(
        ingestor: Arc<Ingestor<SqliteStore>>,
        store: SqliteStore,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            ingestor,
            store,
            config,
            quick_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(QUICK_STATS_TTL)
                .build(),
            range_cache: Cache::builder()
                .max_capacity(RANGE_CACHE_MAX_CAPACITY)
                .time_to_live(RANGE_CACHE_TTL)
                .build(),
        }
    }
}
