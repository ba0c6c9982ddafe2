//! Batch insert transactionality against a real store: a batch either
//! lands whole or not at all, even when it spans several statements.

use chrono::{TimeZone, Utc};
use integration_tests::{fixtures, setup::TestContext};
use store::insert::insert_batch;

#[tokio::test]
async fn test_failed_statement_rolls_back_whole_batch() {
    let ctx = TestContext::new().await;
    // events carries no unique constraint of its own; add one so a
    // late statement in the batch can be made to fail.
    sqlx::query("CREATE UNIQUE INDEX one_hit_per_instant ON events (session_id, timestamp)")
        .execute(ctx.store.pool())
        .await
        .expect("index creation failed");

    let base = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    let mut events: Vec<_> = (0..100)
        .map(|i| fixtures::record_at("pageview", 1, base + chrono::Duration::seconds(i)))
        .collect();
    // collides with row 3, but only once the second statement runs,
    // after the first statement's rows are already in the transaction
    events[95].timestamp = events[3].timestamp;

    assert!(insert_batch(&ctx.store, &events).await.is_err());
    assert_eq!(ctx.count_events().await, 0);
}

#[tokio::test]
async fn test_clean_batch_spanning_statements_lands_fully() {
    let ctx = TestContext::new().await;
    let base = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    let events: Vec<_> = (0..100)
        .map(|i| fixtures::record_at("pageview", 1, base + chrono::Duration::seconds(i)))
        .collect();

    assert_eq!(insert_batch(&ctx.store, &events).await.unwrap(), 100);
    assert_eq!(ctx.count_events().await, 100);
}
