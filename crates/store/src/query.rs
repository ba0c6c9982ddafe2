use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use stats_core::{ObjectCount, Result, StatPoint};

use crate::client::SqliteStore;
use crate::store_err;

/// Millisecond bounds `[start, end)` of a UTC calendar day.
pub(crate) fn day_bounds_millis(day: NaiveDate) -> (i64, i64) {
    let start = day.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + 86_400_000)
}

/// Counts events of one type on one UTC day.
pub async fn count_by_type_and_date(
    store: &SqliteStore,
    event_type: &str,
    day: NaiveDate,
) -> Result<u64> {
    let (start, end) = day_bounds_millis(day);
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE event_type = ? AND timestamp >= ? AND timestamp < ?",
    )
    .bind(event_type)
    .bind(start)
    .bind(end)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;
    Ok(count as u64)
}

pub async fn today_pageviews(store: &SqliteStore) -> Result<u64> {
    count_by_type_and_date(store, "pageview", Utc::now().date_naive()).await
}

/// Distinct sessions seen strictly after `since`.
pub async fn distinct_sessions_since(store: &SqliteStore, since: DateTime<Utc>) -> Result<u64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM events WHERE timestamp > ?")
            .bind(since.timestamp_millis())
            .fetch_one(store.pool())
            .await
            .map_err(store_err)?;
    Ok(count as u64)
}

async fn distinct_sessions_on_day(store: &SqliteStore, day: NaiveDate) -> Result<u64> {
    let (start, end) = day_bounds_millis(day);
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT session_id) FROM events WHERE timestamp >= ? AND timestamp < ?",
    )
    .bind(start)
    .bind(end)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;
    Ok(count as u64)
}

/// Headline numbers for the dashboard, all read live from `events`.
#[derive(Debug, Clone, Serialize)]
pub struct QuickStats {
    pub today_views: u64,
    pub yesterday_views: u64,
    pub today_visitors: u64,
    pub active_users: u64,
}

pub async fn quick_stats(store: &SqliteStore, active_window_minutes: i64) -> Result<QuickStats> {
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);
    Ok(QuickStats {
        today_views: count_by_type_and_date(store, "pageview", today).await?,
        yesterday_views: count_by_type_and_date(store, "pageview", yesterday).await?,
        today_visitors: distinct_sessions_on_day(store, today).await?,
        active_users: distinct_sessions_since(
            store,
            Utc::now() - Duration::minutes(active_window_minutes),
        )
        .await?,
    })
}

/// Daily totals for one metric from the rollup table, inclusive date range.
pub async fn stats_range(
    store: &SqliteStore,
    start: NaiveDate,
    end: NaiveDate,
    metric_name: &str,
) -> Result<Vec<StatPoint>> {
    let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
        "SELECT stat_date, SUM(metric_value) FROM stats \
         WHERE stat_date >= ? AND stat_date <= ? AND metric_name = ? AND period_type = 'daily' \
         GROUP BY stat_date ORDER BY stat_date",
    )
    .bind(start)
    .bind(end)
    .bind(metric_name)
    .fetch_all(store.pool())
    .await
    .map_err(store_err)?;
    Ok(rows
        .into_iter()
        .map(|(stat_date, value)| StatPoint {
            stat_date,
            value: value.max(0) as u64,
        })
        .collect())
}

/// Per-object event counts of one type over `[start, end)`, highest
/// first. Reads raw events, not rollups.
pub async fn sum_by_type_in_range(
    store: &SqliteStore,
    event_type: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ObjectCount>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT object_id, COUNT(*) AS total FROM events \
         WHERE event_type = ? AND timestamp >= ? AND timestamp < ? \
         GROUP BY object_id ORDER BY total DESC",
    )
    .bind(event_type)
    .bind(start.timestamp_millis())
    .bind(end.timestamp_millis())
    .fetch_all(store.pool())
    .await
    .map_err(store_err)?;
    Ok(rows
        .into_iter()
        .map(|(object_id, count)| ObjectCount {
            object_id,
            count: count as u64,
        })
        .collect())
}

/// Lifetime pageview total for a single object, from daily rollups.
pub async fn object_views(store: &SqliteStore, object_id: i64) -> Result<u64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(metric_value), 0) FROM stats \
         WHERE object_id = ? AND metric_name = 'pageviews' AND period_type = 'daily'",
    )
    .bind(object_id)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;
    Ok(total.max(0) as u64)
}

/// Most-viewed objects over the trailing N days, live from `events`.
pub async fn top_objects(store: &SqliteStore, limit: u32, days: i64) -> Result<Vec<ObjectCount>> {
    let cutoff = (Utc::now() - Duration::days(days)).timestamp_millis();
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT object_id, COUNT(*) AS views FROM events \
         WHERE event_type = 'pageview' AND timestamp >= ? \
         GROUP BY object_id ORDER BY views DESC LIMIT ?",
    )
    .bind(cutoff)
    .bind(limit)
    .fetch_all(store.pool())
    .await
    .map_err(store_err)?;
    Ok(rows
        .into_iter()
        .map(|(object_id, count)| ObjectCount {
            object_id,
            count: count as u64,
        })
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct MusicStats {
    pub total_plays: u64,
    pub unique_tracks: u64,
    pub avg_duration_secs: f64,
}

/// Playback rollup over `[start, end]` UTC days inclusive.
pub async fn music_stats(
    store: &SqliteStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MusicStats> {
    let (range_start, _) = day_bounds_millis(start);
    let (_, range_end) = day_bounds_millis(end);

    let (total_plays, unique_tracks): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(DISTINCT object_id) FROM events \
         WHERE event_type = 'music_play' AND timestamp >= ? AND timestamp < ?",
    )
    .bind(range_start)
    .bind(range_end)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;

    let avg_duration: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(value) FROM events \
         WHERE event_type = 'music_duration' AND timestamp >= ? AND timestamp < ?",
    )
    .bind(range_start)
    .bind(range_end)
    .fetch_one(store.pool())
    .await
    .map_err(store_err)?;

    Ok(MusicStats {
        total_plays: total_plays as u64,
        unique_tracks: unique_tracks as u64,
        avg_duration_secs: avg_duration.unwrap_or(0.0),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    pub session_id: String,
    pub last_seen_millis: i64,
    pub event_count: u64,
}

/// Sessions with activity in the trailing window, most recent first.
pub async fn active_sessions(store: &SqliteStore, minutes: i64) -> Result<Vec<ActiveSession>> {
    let cutoff = (Utc::now() - Duration::minutes(minutes)).timestamp_millis();
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        "SELECT session_id, MAX(timestamp) AS last_seen, COUNT(*) FROM events \
         WHERE timestamp > ? GROUP BY session_id ORDER BY last_seen DESC",
    )
    .bind(cutoff)
    .fetch_all(store.pool())
    .await
    .map_err(store_err)?;
    Ok(rows
        .into_iter()
        .map(|(session_id, last_seen_millis, count)| ActiveSession {
            session_id,
            last_seen_millis,
            event_count: count as u64,
        })
        .collect())
}
