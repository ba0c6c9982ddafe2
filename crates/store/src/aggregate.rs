//! Rollup maintenance. Aggregation reads raw events for a closed window,
//! then upserts one `stats` row per (object, metric). Re-running a window
//! replaces each metric value rather than adding to it, so reruns after a
//! partial failure converge on the same totals.

use chrono::{DateTime, NaiveDate, TimeDelta, Timelike, Utc};
use std::time::Instant;
use stats_core::{AggregateStat, PeriodType, Result};
use telemetry::metrics;
use tracing::{debug, warn};

use crate::client::SqliteStore;
use crate::query::day_bounds_millis;
use crate::store_err;

/// A rollup metric and the raw event type it counts.
#[derive(Debug, Clone)]
pub struct MetricSpec {
    pub metric_name: &'static str,
    pub event_type: &'static str,
}

/// Metrics maintained by the daily rollup pass.
pub fn default_daily_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec {
            metric_name: "pageviews",
            event_type: "pageview",
        },
        MetricSpec {
            metric_name: "music_plays",
            event_type: "music_play",
        },
    ]
}

/// Result of one aggregation pass. A pass that hits per-row upsert
/// failures still reports the rows it did land.
#[derive(Debug, Default)]
pub struct AggregateOutcome {
    pub upserted: usize,
    pub failures: usize,
}

impl AggregateOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures == 0
    }
}

/// Writes or replaces a single rollup row.
pub async fn upsert_stat(store: &SqliteStore, stat: &AggregateStat) -> Result<()> {
    sqlx::query(
        "INSERT INTO stats (stat_date, stat_hour, object_id, object_type, \
         metric_name, metric_value, period_type) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (stat_date, stat_hour, object_id, metric_name, period_type) \
         DO UPDATE SET metric_value = excluded.metric_value, \
                       object_type = excluded.object_type",
    )
    .bind(stat.stat_date)
    .bind(stat.stat_hour.map(i64::from).unwrap_or(-1))
    .bind(stat.object_id)
    .bind(&stat.object_type)
    .bind(&stat.metric_name)
    .bind(stat.metric_value as i64)
    .bind(stat.period_type.as_str())
    .execute(store.pool())
    .await
    .map_err(store_err)?;
    Ok(())
}

async fn grouped_counts(
    store: &SqliteStore,
    event_type: &str,
    start_millis: i64,
    end_millis: i64,
) -> Result<Vec<(i64, String, i64)>> {
    sqlx::query_as(
        "SELECT object_id, object_type, COUNT(*) FROM events \
         WHERE event_type = ? AND timestamp >= ? AND timestamp < ? \
         GROUP BY object_id, object_type",
    )
    .bind(event_type)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(store.pool())
    .await
    .map_err(store_err)
}

async fn upsert_rows(
    store: &SqliteStore,
    rows: Vec<(i64, String, i64)>,
    stat_date: NaiveDate,
    stat_hour: Option<u8>,
    metric_name: &str,
    period_type: PeriodType,
    outcome: &mut AggregateOutcome,
) {
    for (object_id, object_type, count) in rows {
        let stat = AggregateStat {
            stat_date,
            stat_hour,
            object_id,
            object_type,
            metric_name: metric_name.to_string(),
            metric_value: count.max(0) as u64,
            period_type,
        };
        match upsert_stat(store, &stat).await {
            Ok(()) => outcome.upserted += 1,
            Err(e) => {
                outcome.failures += 1;
                metrics().stats_upsert_errors.inc();
                warn!(
                    object_id,
                    metric = metric_name,
                    error = %e,
                    "stat upsert failed, pass will continue"
                );
            }
        }
    }
}

/// Rolls up pageviews for one closed UTC hour. `hour_start` is floored
/// to the hour boundary before use.
pub async fn aggregate_hour(
    store: &SqliteStore,
    hour_start: DateTime<Utc>,
) -> Result<AggregateOutcome> {
    let floored_millis = {
        let ms = hour_start.timestamp_millis();
        ms - ms.rem_euclid(3_600_000)
    };
    let hour_start = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::milliseconds(floored_millis);
    let end_millis = floored_millis + 3_600_000;
    let started = Instant::now();

    let rows = grouped_counts(store, "pageview", floored_millis, end_millis).await?;
    let mut outcome = AggregateOutcome::default();
    upsert_rows(
        store,
        rows,
        hour_start.date_naive(),
        Some(hour_start.hour() as u8),
        "pageviews",
        PeriodType::Hourly,
        &mut outcome,
    )
    .await;

    metrics().stats_upserted.inc_by(outcome.upserted as u64);
    metrics()
        .aggregate_latency_ms
        .observe(started.elapsed().as_millis() as u64);
    debug!(
        hour = %hour_start,
        upserted = outcome.upserted,
        failures = outcome.failures,
        "hourly aggregation pass finished"
    );
    Ok(outcome)
}

/// Rolls up one UTC calendar day: per-object rows for each metric in
/// `metrics_spec`, plus a site-wide pageview total under object 0.
pub async fn aggregate_day(
    store: &SqliteStore,
    day: NaiveDate,
    metrics_spec: &[MetricSpec],
) -> Result<AggregateOutcome> {
    let (start_millis, end_millis) = day_bounds_millis(day);
    let started = Instant::now();
    let mut outcome = AggregateOutcome::default();

    for spec in metrics_spec {
        let rows = grouped_counts(store, spec.event_type, start_millis, end_millis).await?;
        upsert_rows(
            store,
            rows,
            day,
            None,
            spec.metric_name,
            PeriodType::Daily,
            &mut outcome,
        )
        .await;
    }

    let site_total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events \
         WHERE event_type = 'pageview' AND timestamp >= ? AND timestamp < ?",
    )
    .bind(start_millis)
    .bind(end_millis)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;
    let site_stat = AggregateStat {
        stat_date: day,
        stat_hour: None,
        object_id: 0,
        object_type: "site".to_string(),
        metric_name: "total_pageviews".to_string(),
        metric_value: site_total.max(0) as u64,
        period_type: PeriodType::Daily,
    };
    match upsert_stat(store, &site_stat).await {
        Ok(()) => outcome.upserted += 1,
        Err(e) => {
            outcome.failures += 1;
            metrics().stats_upsert_errors.inc();
            warn!(error = %e, "site-wide stat upsert failed");
        }
    }

    metrics().stats_upserted.inc_by(outcome.upserted as u64);
    metrics()
        .aggregate_latency_ms
        .observe(started.elapsed().as_millis() as u64);
    debug!(
        %day,
        upserted = outcome.upserted,
        failures = outcome.failures,
        "daily aggregation pass finished"
    );
    Ok(outcome)
}
