//! Size limits for ingested events.
//!
//! Limits bound per-request memory and keep stored rows small. The
//! `#[validate]` derive macro requires literal values in attributes, so
//! field limits are duplicated there. Keep both in sync when modifying.

/// Maximum event type tag length.
pub const MAX_EVENT_TYPE_LEN: usize = 50;

/// Maximum object type tag length.
pub const MAX_OBJECT_TYPE_LEN: usize = 50;

/// Session correlator length (32 lowercase hex chars).
pub const SESSION_ID_LEN: usize = 32;

/// Truncated hash length for user agents (hex chars).
pub const HASH_LEN: usize = 32;

/// Referrer URL max length before we refuse to parse it.
/// Matches the HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2048;

/// Maximum serialized meta payload size in bytes (16KB).
///
/// Most real-world meta payloads are well under 1KB.
pub const MAX_META_BYTES: usize = 16 * 1024;

/// Buffer capacity as a multiple of the configured batch size.
///
/// A failed flush restores its events for retry; past this cap the oldest
/// buffered events are dropped rather than growing without bound.
pub const BUFFER_CAP_FACTOR: usize = 10;
