//! Retention sweeps: expired events and stats go, recent rows stay.

use chrono::{Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};
use stats_core::{AggregateStat, PeriodType};
use store::aggregate::upsert_stat;
use store::insert::insert_batch;
use worker::RetentionSweeper;

#[tokio::test]
async fn test_sweep_deletes_only_expired_events() {
    let ctx = TestContext::new().await;
    let now = Utc::now();

    insert_batch(
        &ctx.store,
        &[
            fixtures::record_at("pageview", 1, now - Duration::days(40)),
            fixtures::record_at("pageview", 2, now - Duration::days(1)),
            fixtures::record_at("music_play", 3, now),
        ],
    )
    .await
    .expect("seed insert failed");

    let sweeper = RetentionSweeper::new(ctx.store.clone(), 30);
    let outcome = sweeper.sweep().await.expect("sweep failed");

    assert_eq!(outcome.events_deleted, 1);
    assert_eq!(ctx.count_events().await, 2);
}

#[tokio::test]
async fn test_sweep_deletes_expired_stats() {
    let ctx = TestContext::new().await;
    let today = Utc::now().date_naive();

    for (days_ago, object_id) in [(45, 1), (2, 2)] {
        upsert_stat(
            &ctx.store,
            &AggregateStat {
                stat_date: today - Duration::days(days_ago),
                stat_hour: None,
                object_id,
                object_type: "post".to_string(),
                metric_name: "pageviews".to_string(),
                metric_value: 10,
                period_type: PeriodType::Daily,
            },
        )
        .await
        .expect("seed upsert failed");
    }

    let sweeper = RetentionSweeper::new(ctx.store.clone(), 30);
    let outcome = sweeper.sweep().await.expect("sweep failed");

    assert_eq!(outcome.stats_deleted, 1);
    assert_eq!(ctx.count_stats().await, 1);
    assert_eq!(ctx.stat_value("pageviews", 2, -1).await, Some(10));
}

#[tokio::test]
async fn test_sweep_on_empty_store_is_noop() {
    let ctx = TestContext::new().await;
    let sweeper = RetentionSweeper::new(ctx.store.clone(), 30);
    let outcome = sweeper.sweep().await.expect("sweep failed");
    assert_eq!(outcome.events_deleted, 0);
    assert_eq!(outcome.stats_deleted, 0);
}
