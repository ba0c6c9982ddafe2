//! End-to-end tests for the tracking endpoint and reporting routes.
//!
//! Each test runs the real router against an in-memory SQLite store
//! with `batch_size = 1`, so tracked events are queryable immediately.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use stats_core::AnalyticsConfig;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

#[tokio::test]
async fn test_track_pageview_persists() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server
        .post("/v1/track")
        .json(&fixtures::track_payload("pageview", 7))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    let session = body["session_id"].as_str().expect("session_id missing");
    assert_eq!(session.len(), 32);
    assert!(session.chars().all(|c| c.is_ascii_hexdigit()));

    assert_eq!(ctx.count_events().await, 1);
}

#[tokio::test]
async fn test_track_echoes_offered_session() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);
    let token = fixtures::session_token();

    let response = server
        .post("/v1/track")
        .add_header("X-Session-Id", &token)
        .json(&fixtures::track_payload("pageview", 1))
        .await;

    let body: serde_json::Value = response.json();
    assert_eq!(body["session_id"], token.as_str());
}

#[tokio::test]
async fn test_track_mints_session_for_bad_token() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server
        .post("/v1/track")
        .add_header("X-Session-Id", "not-a-valid-token")
        .json(&fixtures::track_payload("pageview", 1))
        .await;

    let body: serde_json::Value = response.json();
    let session = body["session_id"].as_str().unwrap();
    assert_ne!(session, "not-a-valid-token");
    assert_eq!(session.len(), 32);
}

#[tokio::test]
async fn test_invalid_event_type_is_skipped_not_stored() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server
        .post("/v1/track")
        .json(&fixtures::track_payload("Page View!", 7))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(ctx.count_events().await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server
        .post("/v1/track")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_tracking_disabled_stores_nothing() {
    let ctx = TestContext::with_config(AnalyticsConfig {
        tracking_enabled: false,
        batch_size: 1,
        ..AnalyticsConfig::default()
    })
    .await;
    let server = server(&ctx);

    let response = server
        .post("/v1/track")
        .json(&fixtures::track_payload("pageview", 7))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(ctx.count_events().await, 0);
}

#[tokio::test]
async fn test_partial_batch_stays_buffered_until_flush() {
    let ctx = TestContext::with_config(AnalyticsConfig {
        batch_size: 10,
        ..AnalyticsConfig::default()
    })
    .await;
    let server = server(&ctx);

    for _ in 0..3 {
        server
            .post("/v1/track")
            .json(&fixtures::track_payload("pageview", 7))
            .await
            .assert_status_ok();
    }
    assert_eq!(ctx.count_events().await, 0);
    assert_eq!(ctx.ingestor.buffered(), 3);

    let written = ctx.ingestor.flush().await.expect("flush failed");
    assert_eq!(written, 3);
    assert_eq!(ctx.count_events().await, 3);
}

#[tokio::test]
async fn test_quick_stats_reflects_tracked_views() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    for object_id in [1, 2, 2] {
        server
            .post("/v1/track")
            .json(&fixtures::track_payload("pageview", object_id))
            .await
            .assert_status_ok();
    }

    let response = server.get("/v1/quick-stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["today_views"], 3);
}

#[tokio::test]
async fn test_chart_zero_fills_empty_days() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server.get("/v1/chart?days=3").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let series = body.as_array().expect("chart should be an array");
    assert_eq!(series.len(), 3);
    assert!(series.iter().all(|p| p["value"] == 0));
}

#[tokio::test]
async fn test_top_posts_orders_by_views() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    for object_id in [5, 9, 9, 9, 5] {
        server
            .post("/v1/track")
            .json(&fixtures::track_payload("pageview", object_id))
            .await
            .assert_status_ok();
    }

    let response = server.get("/v1/top-posts?limit=2&days=1").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let top = body.as_array().expect("top posts should be an array");
    assert_eq!(top[0]["object_id"], 9);
    assert_eq!(top[0]["count"], 3);
    assert_eq!(top[1]["object_id"], 5);
}

#[tokio::test]
async fn test_top_tracks_counts_plays() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    for track_id in [21, 40, 21, 21, 40, 33] {
        server
            .post("/v1/track")
            .json(&fixtures::track_payload("music_play", track_id))
            .await
            .assert_status_ok();
    }

    let response = server.get("/v1/top-tracks?limit=2&days=1").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let tracks = body.as_array().expect("top tracks should be an array");
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0]["object_id"], 21);
    assert_eq!(tracks[0]["count"], 3);
    assert_eq!(tracks[1]["object_id"], 40);
    assert_eq!(tracks[1]["count"], 2);
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;
    let server = server(&ctx);

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["store_connected"], true);
    // throughput snapshot rides along with the probe
    assert!(body["metrics"]["events_received"].is_u64());
    assert!(body["metrics"]["buffer_depth"].is_u64());

    server.get("/health/live").await.assert_status_ok();
    server.get("/health/ready").await.assert_status_ok();
}
