//! Reporting endpoints.
//!
//! Readers never see store trouble: every handler degrades to an empty
//! result with a warning rather than surfacing a 5xx to the dashboard.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stats_core::{ObjectCount, StatPoint};
use store::query::{self, MusicStats, QuickStats};
use tracing::warn;

use crate::response::ApiError;
use crate::state::AppState;

/// Sessions active within this many minutes count as "active users".
const ACTIVE_WINDOW_MINUTES: i64 = 5;

fn default_metric() -> String {
    "pageviews".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_metric")]
    pub metric: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub metric: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<StatPoint>,
}

/// GET /v1/stats - Daily totals for one metric over a date range.
/// Defaults to the trailing 30 days.
pub async fn stats_handler(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let end = q.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = q.start_date.unwrap_or(end - Duration::days(29));
    let key = format!("stats:{start}:{end}:{}", q.metric);
    if let Some(cached) = state.range_cache.get(&key).await {
        return Ok(Json(cached));
    }

    let points = query::stats_range(&state.store, start, end, &q.metric)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "stats range query failed, returning empty");
            Vec::new()
        });
    let response = StatsResponse {
        metric: q.metric,
        start,
        end,
        points,
    };
    cache_and_reply(&state, key, &response).await
}

/// GET /v1/quick-stats - Dashboard headline numbers, cached for a minute.
pub async fn quick_stats_handler(State(state): State<AppState>) -> Json<QuickStats> {
    if let Some(cached) = state.quick_cache.get(&()).await {
        return Json(cached);
    }
    let stats = query::quick_stats(&state.store, ACTIVE_WINDOW_MINUTES)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "quick stats query failed, returning zeros");
            QuickStats {
                today_views: 0,
                yesterday_views: 0,
                today_visitors: 0,
                active_users: 0,
            }
        });
    state.quick_cache.insert((), stats.clone()).await;
    Json(stats)
}

fn default_chart_days() -> i64 {
    7
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(default = "default_chart_days")]
    pub days: i64,
    #[serde(default = "default_metric")]
    pub metric: String,
}

#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: u64,
}

/// GET /v1/chart - Zero-filled daily series for the trailing N days,
/// so every day in the window appears even with no rollup row.
pub async fn chart_handler(
    State(state): State<AppState>,
    Query(q): Query<ChartQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let days = q.days.clamp(1, 365);
    let end = Utc::now().date_naive();
    let start = end - Duration::days(days - 1);
    let key = format!("chart:{days}:{}", q.metric);
    if let Some(cached) = state.range_cache.get(&key).await {
        return Ok(Json(cached));
    }

    let points = query::stats_range(&state.store, start, end, &q.metric)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "chart query failed, returning empty series");
            Vec::new()
        });
    let series: Vec<ChartPoint> = (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let value = points
                .iter()
                .find(|p| p.stat_date == date)
                .map(|p| p.value)
                .unwrap_or(0);
            ChartPoint { date, value }
        })
        .collect();
    cache_and_reply(&state, key, &series).await
}

fn default_top_limit() -> u32 {
    10
}

fn default_top_days() -> i64 {
    7
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    pub limit: u32,
    #[serde(default = "default_top_days")]
    pub days: i64,
}

/// GET /v1/top-posts - Most-viewed objects over the trailing N days.
pub async fn top_posts_handler(
    State(state): State<AppState>,
    Query(q): Query<TopQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = q.limit.clamp(1, 100);
    let days = q.days.clamp(1, 365);
    let key = format!("top:{limit}:{days}");
    if let Some(cached) = state.range_cache.get(&key).await {
        return Ok(Json(cached));
    }

    let top: Vec<ObjectCount> = query::top_objects(&state.store, limit, days)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "top posts query failed, returning empty");
            Vec::new()
        });
    cache_and_reply(&state, key, &top).await
}

/// GET /v1/top-tracks - Most-played tracks over the trailing N days,
/// counted from raw play events rather than rollups so same-day plays
/// show up immediately.
pub async fn top_tracks_handler(
    State(state): State<AppState>,
    Query(q): Query<TopQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = q.limit.clamp(1, 100) as usize;
    let days = q.days.clamp(1, 365);
    let key = format!("tracks:{limit}:{days}");
    if let Some(cached) = state.range_cache.get(&key).await {
        return Ok(Json(cached));
    }

    let end = Utc::now();
    let start = end - Duration::days(days);
    let mut plays: Vec<ObjectCount> =
        query::sum_by_type_in_range(&state.store, "music_play", start, end)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "top tracks query failed, returning empty");
                Vec::new()
            });
    plays.truncate(limit);
    cache_and_reply(&state, key, &plays).await
}

#[derive(Debug, Deserialize)]
pub struct MusicQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// GET /v1/music-stats - Playback rollup over a date range, defaulting
/// to the trailing 30 days.
pub async fn music_stats_handler(
    State(state): State<AppState>,
    Query(q): Query<MusicQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let end = q.end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = q.start_date.unwrap_or(end - Duration::days(29));
    let key = format!("music:{start}:{end}");
    if let Some(cached) = state.range_cache.get(&key).await {
        return Ok(Json(cached));
    }

    let stats: MusicStats = query::music_stats(&state.store, start, end)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "music stats query failed, returning zeros");
            MusicStats {
                total_plays: 0,
                unique_tracks: 0,
                avg_duration_secs: 0.0,
            }
        });
    cache_and_reply(&state, key, &stats).await
}

fn default_active_minutes() -> i64 {
    ACTIVE_WINDOW_MINUTES
}

#[derive(Debug, Deserialize)]
pub struct ActiveQuery {
    #[serde(default = "default_active_minutes")]
    pub minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct ActiveUsersResponse {
    pub count: usize,
    pub sessions: Vec<query::ActiveSession>,
}

/// GET /v1/active-users - Sessions with recent activity. Not cached:
/// the point of this endpoint is freshness.
pub async fn active_users_handler(
    State(state): State<AppState>,
    Query(q): Query<ActiveQuery>,
) -> Json<ActiveUsersResponse> {
    let minutes = q.minutes.clamp(1, 120);
    let sessions = query::active_sessions(&state.store, minutes)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "active sessions query failed, returning empty");
            Vec::new()
        });
    Json(ActiveUsersResponse {
        count: sessions.len(),
        sessions,
    })
}

async fn cache_and_reply<T: Serialize>(
    state: &AppState,
    key: String,
    value: &T,
) -> Result<Json<serde_json::Value>, ApiError> {
    let json = serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("response serialization failed: {e}")))?;
    state.range_cache.insert(key, json.clone()).await;
    Ok(Json(json))
}
