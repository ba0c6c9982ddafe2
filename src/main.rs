//! Bandstats analytics service
//!
//! Self-contained event analytics pipeline:
//! - Tracking endpoint with privacy-reduced provenance and sampling
//! - Batched buffered writes into SQLite
//! - Hourly/daily rollups and retention sweeps in the background
//! - Reporting endpoints for dashboards

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use api::{router, AppState};
use pipeline::Ingestor;
use stats_core::AnalyticsConfig;
use store::{schema, SqliteStore, StoreConfig};
use telemetry::{health, init_tracing_from_env};
use worker::{AggregationWorker, RetentionSweeper, WorkerConfig, WorkerScheduler};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    database: StoreConfig,

    #[serde(default)]
    analytics: AnalyticsConfig,

    #[serde(default)]
    worker: WorkerConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: StoreConfig::default(),
            analytics: AnalyticsConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing_from_env();

    info!("Starting bandstats v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config
        .analytics
        .validate()
        .context("Invalid analytics configuration")?;

    // Connect to the store and make sure the schema exists
    let store = SqliteStore::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    schema::init_schema(&store)
        .await
        .context("Failed to initialize schema")?;
    health().store.set_healthy();
    info!("Store connection: healthy");

    // Seed the sampling counter with what already landed today, so a
    // restart mid-day does not reopen the sampling gate
    let initial_volume = store::query::today_pageviews(&store).await.unwrap_or(0);

    let ingestor = Arc::new(Ingestor::new(
        Arc::new(store.clone()),
        &config.analytics,
        initial_volume,
    ));
    // ticks faster than the residency limit so aged events are never
    // stuck much past realtime_timeout_secs
    let _flush_handle = ingestor.start_flush_task(std::time::Duration::from_secs(1));

    // Start background rollup and retention jobs
    let scheduler = WorkerScheduler::new(
        AggregationWorker::new(store.clone()),
        RetentionSweeper::new(store.clone(), config.analytics.retention_days),
        config.worker.clone(),
    );
    let _worker_handles = scheduler.start();

    let state = AppState::new(ingestor.clone(), store.clone(), config.analytics.clone());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    // Flush whatever is still buffered before the process exits
    if let Err(e) = ingestor.flush().await {
        error!("Failed to flush event buffer: {}", e);
    }
    store.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. BANDSTATS_DATABASE__URL
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("BANDSTATS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual override for the most commonly set value; nested env
    // parsing is unreliable for underscored field names
    if let Ok(url) = std::env::var("BANDSTATS_DATABASE_URL") {
        config.database.url = url;
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
