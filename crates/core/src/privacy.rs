//! Privacy-preserving hashing and referrer reduction.
//!
//! Nothing directly identifying is stored: session correlators are opaque
//! random hashes, user agents are truncated digests, and referrers are
//! reduced to their host component before persistence.

use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::limits::{HASH_LEN, MAX_REFERRER_LEN, SESSION_ID_LEN};

/// SHA-256 digest truncated to 32 hex chars.
pub fn hash32(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Truncated digest of the raw user agent string.
pub fn hash_user_agent(user_agent: &str) -> Option<String> {
    if user_agent.is_empty() {
        return None;
    }
    Some(hash32(user_agent))
}

/// Mints a fresh pseudo-anonymous session correlator.
pub fn mint_session_id() -> String {
    hash32(&Uuid::new_v4().to_string())
}

/// Accepts a caller-supplied session id only if it looks like one of ours.
pub fn normalize_session_id(provided: &str) -> Option<String> {
    if provided.len() == SESSION_ID_LEN
        && provided
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        Some(provided.to_string())
    } else {
        None
    }
}

/// Reduces a referrer URL to its host component.
pub fn referrer_domain(referrer: &str) -> Option<String> {
    if referrer.is_empty() || referrer.len() > MAX_REFERRER_LEN {
        return None;
    }
    Url::parse(referrer)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}
