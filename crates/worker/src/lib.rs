//! Background jobs: hourly and daily rollups, plus retention sweeps.

pub mod aggregation;
pub mod retention;
pub mod scheduler;

pub use aggregation::AggregationWorker;
pub use retention::{RetentionSweeper, SweepOutcome};
pub use scheduler::{WorkerConfig, WorkerScheduler};
