//! Event and aggregate type definitions.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};
use crate::limits::{MAX_META_BYTES, SESSION_ID_LEN};

/// Event types the pipeline knows how to aggregate. The enum is open: any
/// well-formed tag is accepted and stored, these are just the ones with
/// dedicated metrics.
pub const KNOWN_EVENT_TYPES: &[&str] = &[
    "pageview",
    "music_play",
    "music_duration",
    "scroll",
    "user_login",
];

/// A scalar meta value. Nested structures are deliberately rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Ordered string-keyed meta payload for event-type-specific attributes.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// Checks an event type tag: non-empty, bounded, lowercase snake.
pub fn validate_event_type(tag: &str) -> Result<()> {
    if tag.is_empty() || tag.len() > crate::limits::MAX_EVENT_TYPE_LEN {
        return Err(Error::InvalidEventType(tag.to_string()));
    }
    if !tag
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(Error::InvalidEventType(tag.to_string()));
    }
    Ok(())
}

/// Validates serialized meta payload size.
fn validate_meta_size(meta: &MetaMap) -> std::result::Result<(), ValidationError> {
    let size = serde_json::to_vec(meta).map(|v| v.len()).unwrap_or(0);
    if size > MAX_META_BYTES {
        let mut err = ValidationError::new("meta_too_large");
        err.message = Some(
            format!(
                "meta {}KB exceeds {}KB limit",
                size / 1024,
                MAX_META_BYTES / 1024
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// An event as submitted by a tracking client.
///
/// Provenance (session, referrer, user agent) is filled in server-side; the
/// client only names what happened to which object.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IncomingEvent {
    /// Event category tag, e.g. "pageview" or "music_play".
    #[validate(length(min = 1, max = 50))]
    pub event_type: String,
    /// Tracked subject (post, track, user); 0 when none.
    #[serde(default)]
    pub object_id: i64,
    /// Subject classification.
    #[validate(length(max = 50))]
    pub object_type: Option<String>,
    /// Optional numeric payload (duration, scroll depth, ...).
    pub value: Option<f64>,
    /// Event-type-specific attributes (max 16KB serialized).
    #[validate(custom(function = "validate_meta_size"))]
    pub meta: Option<MetaMap>,
}

/// A single normalized analytics event, ready for buffering and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_type: String,
    pub object_id: i64,
    pub object_type: String,
    /// Pseudo-anonymous visitor correlator, 32 hex chars.
    pub session_id: String,
    /// Server-side receive time.
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub referrer_domain: Option<String>,
    pub user_agent_hash: Option<String>,
    pub meta: Option<MetaMap>,
}

impl EventRecord {
    /// Creates a minimal record with the current server time.
    pub fn new(event_type: impl Into<String>, object_id: i64, session_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            object_id,
            object_type: "post".to_string(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            value: None,
            referrer_domain: None,
            user_agent_hash: None,
            meta: None,
        }
    }

    /// Event time as epoch milliseconds (storage representation).
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Serialized meta payload, if any.
    pub fn meta_json(&self) -> Result<Option<String>> {
        match &self.meta {
            Some(meta) => Ok(Some(serde_json::to_string(meta)?)),
            None => Ok(None),
        }
    }
}

impl IncomingEvent {
    /// Normalizes into a storable record with server-derived provenance.
    pub fn into_record(
        self,
        session_id: String,
        referrer_domain: Option<String>,
        user_agent_hash: Option<String>,
    ) -> Result<EventRecord> {
        validate_event_type(&self.event_type)?;
        debug_assert_eq!(session_id.len(), SESSION_ID_LEN);

        Ok(EventRecord {
            event_type: self.event_type,
            object_id: self.object_id,
            object_type: self.object_type.unwrap_or_else(|| "post".to_string()),
            session_id,
            timestamp: Utc::now(),
            value: self.value,
            referrer_domain,
            user_agent_hash,
            meta: self.meta,
        })
    }
}

/// Aggregation period granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Hourly,
    Daily,
    Monthly,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Monthly => "monthly",
        }
    }
}

/// A pre-computed counter for one metric/object/period.
///
/// The identity tuple `(stat_date, stat_hour, object_id, metric_name,
/// period_type)` is unique; re-aggregating a window replaces
/// `metric_value` rather than accumulating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub stat_date: NaiveDate,
    /// Hour of day for hourly rows; `None` for daily/monthly.
    pub stat_hour: Option<u8>,
    pub object_id: i64,
    pub object_type: String,
    pub metric_name: String,
    pub metric_value: u64,
    pub period_type: PeriodType,
}

/// One daily data point in a reporting series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatPoint {
    pub stat_date: NaiveDate,
    pub value: u64,
}

/// Per-object event count for a range query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectCount {
    pub object_id: i64,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_validation() {
        assert!(validate_event_type("pageview").is_ok());
        assert!(validate_event_type("music_play").is_ok());
        assert!(validate_event_type("custom_99").is_ok());

        assert!(validate_event_type("").is_err());
        assert!(validate_event_type("Pageview").is_err());
        assert!(validate_event_type("page view").is_err());
        assert!(validate_event_type(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_incoming_event_defaults() {
        let incoming: IncomingEvent =
            serde_json::from_str(r#"{"event_type":"pageview"}"#).unwrap();
        assert_eq!(incoming.object_id, 0);
        assert!(incoming.object_type.is_none());

        let record = incoming
            .into_record("a".repeat(32), None, None)
            .unwrap();
        assert_eq!(record.object_type, "post");
        assert_eq!(record.object_id, 0);
    }

    #[test]
    fn test_meta_roundtrip() {
        let mut meta = MetaMap::new();
        meta.insert("track".into(), MetaValue::Str("intro.mp3".into()));
        meta.insert("duration".into(), MetaValue::Num(182.5));
        meta.insert("autoplay".into(), MetaValue::Bool(false));

        let mut record = EventRecord::new("music_play", 7, "b".repeat(32));
        record.meta = Some(meta.clone());

        let json = record.meta_json().unwrap().unwrap();
        let back: MetaMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_oversized_meta_rejected() {
        let mut meta = MetaMap::new();
        meta.insert("blob".into(), MetaValue::Str("x".repeat(17 * 1024)));
        let incoming = IncomingEvent {
            event_type: "custom".into(),
            object_id: 0,
            object_type: None,
            value: None,
            meta: Some(meta),
        };
        assert!(incoming.validate().is_err());
    }
}
