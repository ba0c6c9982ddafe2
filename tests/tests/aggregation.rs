//! Rollup correctness: hourly and daily passes over seeded events,
//! including idempotence when a pass is re-run.

use chrono::{NaiveDate, NaiveTime, Utc};
use integration_tests::{fixtures, setup::TestContext};
use store::aggregate::{aggregate_day, aggregate_hour, default_daily_metrics};
use store::insert::insert_batch;
use store::query;

fn hour(date: (i32, u32, u32), h: u32) -> chrono::DateTime<Utc> {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap())
        .and_utc()
}

#[tokio::test]
async fn test_hourly_rollup_counts_pageviews() {
    let ctx = TestContext::new().await;
    let window = hour((2026, 3, 10), 14);

    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(7, window, 3))
        .await
        .expect("seed insert failed");
    // outside the window, must not be counted
    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(7, hour((2026, 3, 10), 15), 2))
        .await
        .expect("seed insert failed");

    let outcome = aggregate_hour(&ctx.store, window).await.expect("pass failed");
    assert!(outcome.is_complete());

    assert_eq!(ctx.stat_value("pageviews", 7, 14).await, Some(3));
}

#[tokio::test]
async fn test_hourly_rollup_is_idempotent() {
    let ctx = TestContext::new().await;
    let window = hour((2026, 3, 10), 9);

    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(4, window, 5))
        .await
        .expect("seed insert failed");

    aggregate_hour(&ctx.store, window).await.expect("first pass failed");
    let rows_after_first = ctx.count_stats().await;

    aggregate_hour(&ctx.store, window).await.expect("second pass failed");
    assert_eq!(ctx.count_stats().await, rows_after_first);
    assert_eq!(ctx.stat_value("pageviews", 4, 9).await, Some(5));
}

#[tokio::test]
async fn test_hourly_rollup_converges_after_new_events() {
    let ctx = TestContext::new().await;
    let window = hour((2026, 3, 11), 6);

    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(2, window, 2))
        .await
        .expect("seed insert failed");
    aggregate_hour(&ctx.store, window).await.expect("pass failed");
    assert_eq!(ctx.stat_value("pageviews", 2, 6).await, Some(2));

    // late-arriving events for the same window, then re-run
    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(2, window, 4))
        .await
        .expect("seed insert failed");
    aggregate_hour(&ctx.store, window).await.expect("rerun failed");
    assert_eq!(ctx.stat_value("pageviews", 2, 6).await, Some(6));
}

#[tokio::test]
async fn test_daily_rollup_covers_metrics_and_site_total() {
    let ctx = TestContext::new().await;
    let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
    let morning = hour((2026, 4, 2), 8);
    let evening = hour((2026, 4, 2), 20);

    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(10, morning, 2))
        .await
        .expect("seed insert failed");
    insert_batch(&ctx.store, &fixtures::pageviews_in_hour(11, evening, 3))
        .await
        .expect("seed insert failed");
    insert_batch(&ctx.store, &[fixtures::record_at("music_play", 55, morning)])
        .await
        .expect("seed insert failed");

    // raw per-object counts before any rollup exists
    let raw = query::sum_by_type_in_range(&ctx.store, "pageview", hour((2026, 4, 2), 0), hour((2026, 4, 3), 0))
        .await
        .unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!((raw[0].object_id, raw[0].count), (11, 3));
    assert_eq!((raw[1].object_id, raw[1].count), (10, 2));

    let outcome = aggregate_day(&ctx.store, day, &default_daily_metrics())
        .await
        .expect("pass failed");
    assert!(outcome.is_complete());

    // per-object daily rows use the -1 hour slot
    assert_eq!(ctx.stat_value("pageviews", 10, -1).await, Some(2));
    assert_eq!(ctx.stat_value("pageviews", 11, -1).await, Some(3));
    assert_eq!(ctx.stat_value("music_plays", 55, -1).await, Some(1));
    assert_eq!(ctx.stat_value("total_pageviews", 0, -1).await, Some(5));

    // reporting reads see the rollups
    assert_eq!(query::object_views(&ctx.store, 10).await.unwrap(), 2);
    let points = query::stats_range(&ctx.store, day, day, "pageviews")
        .await
        .unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 5);
}
