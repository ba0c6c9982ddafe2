use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::aggregation::AggregationWorker;
use crate::retention::RetentionSweeper;

/// Tick intervals for the background jobs, all in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_hourly_secs")]
    pub hourly_interval_secs: u64,
    #[serde(default = "default_daily_secs")]
    pub daily_interval_secs: u64,
    #[serde(default = "default_retention_secs")]
    pub retention_interval_secs: u64,
}

fn default_hourly_secs() -> u64 {
    3_600
}

fn default_daily_secs() -> u64 {
    86_400
}

fn default_retention_secs() -> u64 {
    86_400
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            hourly_interval_secs: default_hourly_secs(),
            daily_interval_secs: default_daily_secs(),
            retention_interval_secs: default_retention_secs(),
        }
    }
}

/// Owns the background job loops. Each loop logs failures and keeps
/// ticking; a broken pass never takes the scheduler down.
pub struct WorkerScheduler {
    aggregation: AggregationWorker,
    sweeper: RetentionSweeper,
    config: WorkerConfig,
}

impl WorkerScheduler {
    pub fn new(
        aggregation: AggregationWorker,
        sweeper: RetentionSweeper,
        config: WorkerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            aggregation,
            sweeper,
            config,
        })
    }

    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        info!(
            hourly_secs = self.config.hourly_interval_secs,
            daily_secs = self.config.daily_interval_secs,
            retention_secs = self.config.retention_interval_secs,
            "worker scheduler starting"
        );
        vec![
            self.spawn_hourly_loop(),
            self.spawn_daily_loop(),
            self.spawn_retention_loop(),
        ]
    }

    fn spawn_hourly_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval(scheduler.config.hourly_interval_secs);
            loop {
                tick.tick().await;
                if let Err(e) = scheduler.aggregation.run_hourly().await {
                    error!(error = %e, "hourly rollup failed");
                }
            }
        })
    }

    fn spawn_daily_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval(scheduler.config.daily_interval_secs);
            loop {
                tick.tick().await;
                if let Err(e) = scheduler.aggregation.run_daily().await {
                    error!(error = %e, "daily rollup failed");
                }
            }
        })
    }

    fn spawn_retention_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval(scheduler.config.retention_interval_secs);
            loop {
                tick.tick().await;
                if let Err(e) = scheduler.sweeper.sweep().await {
                    error!(error = %e, "retention sweep failed");
                }
            }
        })
    }
}

fn interval(secs: u64) -> tokio::time::Interval {
    let mut tick = tokio::time::interval(Duration::from_secs(secs));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the immediate first tick would rerun every job at boot
    tick.reset();
    tick
}
