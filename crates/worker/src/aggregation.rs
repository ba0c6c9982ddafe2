use chrono::{DateTime, Duration, TimeDelta, Utc};
use stats_core::Result;
use store::aggregate::{aggregate_day, aggregate_hour, default_daily_metrics, AggregateOutcome};
use store::SqliteStore;
use tracing::info;

/// Runs the rollup passes against closed windows only. The hourly pass
/// covers the most recently completed hour, the daily pass yesterday.
pub struct AggregationWorker {
    store: SqliteStore,
}

impl AggregationWorker {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Start of the last fully elapsed UTC hour.
    fn previous_hour_start(now: DateTime<Utc>) -> DateTime<Utc> {
        let ms = now.timestamp_millis();
        let floored = ms - ms.rem_euclid(3_600_000);
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(floored - 3_600_000)
    }

    pub async fn run_hourly(&self) -> Result<AggregateOutcome> {
        let hour_start = Self::previous_hour_start(Utc::now());
        let outcome = aggregate_hour(&self.store, hour_start).await?;
        info!(
            hour = %hour_start,
            upserted = outcome.upserted,
            failures = outcome.failures,
            "hourly rollup complete"
        );
        Ok(outcome)
    }

    pub async fn run_daily(&self) -> Result<AggregateOutcome> {
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let outcome = aggregate_day(&self.store, yesterday, &default_daily_metrics()).await?;
        info!(
            day = %yesterday,
            upserted = outcome.upserted,
            failures = outcome.failures,
            "daily rollup complete"
        );
        Ok(outcome)
    }
}
