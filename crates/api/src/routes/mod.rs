//! API routes.

pub mod health;
pub mod stats;
pub mod track;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/track", post(track::track_handler))
        .route("/v1/stats", get(stats::stats_handler))
        .route("/v1/quick-stats", get(stats::quick_stats_handler))
        .route("/v1/chart", get(stats::chart_handler))
        .route("/v1/top-posts", get(stats::top_posts_handler))
        .route("/v1/top-tracks", get(stats::top_tracks_handler))
        .route("/v1/music-stats", get(stats::music_stats_handler))
        .route("/v1/active-users", get(stats::active_users_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
