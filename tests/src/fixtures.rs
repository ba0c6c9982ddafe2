//! Test fixtures and event generators.

use chrono::{DateTime, Utc};
use stats_core::EventRecord;

/// Tracking payload as a client would send it.
pub fn track_payload(event_type: &str, object_id: i64) -> serde_json::Value {
    serde_json::json!({
        "event_type": event_type,
        "object_id": object_id,
    })
}

/// Playback payload carrying a duration value.
pub fn music_payload(track_id: i64, duration_secs: f64) -> serde_json::Value {
    serde_json::json!({
        "event_type": "music_duration",
        "object_id": track_id,
        "object_type": "track",
        "value": duration_secs,
    })
}

/// A well-formed session token a client might persist.
pub fn session_token() -> String {
    "0123456789abcdef0123456789abcdef".to_string()
}

/// A fully-formed event record with a controlled timestamp, for
/// seeding the store directly.
pub fn record_at(event_type: &str, object_id: i64, timestamp: DateTime<Utc>) -> EventRecord {
    EventRecord {
        event_type: event_type.to_string(),
        object_id,
        object_type: "post".to_string(),
        session_id: session_token(),
        timestamp,
        value: None,
        referrer_domain: None,
        user_agent_hash: None,
        meta: None,
    }
}

/// N pageview records for one object inside the given hour.
pub fn pageviews_in_hour(
    object_id: i64,
    hour_start: DateTime<Utc>,
    n: usize,
) -> Vec<EventRecord> {
    (0..n)
        .map(|i| {
            record_at(
                "pageview",
                object_id,
                hour_start + chrono::Duration::minutes(i as i64),
            )
        })
        .collect()
}
