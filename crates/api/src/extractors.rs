//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use stats_core::{hash_user_agent, mint_session_id, normalize_session_id, referrer_domain};

/// Visitor session correlator. Taken from the `X-Session-Id` header
/// when it is a well-formed token; otherwise a fresh one is minted and
/// echoed back so the client can persist it.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let offered = parts
            .headers
            .get("X-Session-Id")
            .and_then(|h| h.to_str().ok())
            .and_then(normalize_session_id);
        Ok(SessionId(offered.unwrap_or_else(mint_session_id)))
    }
}

/// Privacy-reduced provenance: referrer collapsed to its domain, user
/// agent reduced to a truncated hash. Raw values are never stored.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub referrer_domain: Option<String>,
    pub user_agent_hash: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Provenance
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let referrer = parts
            .headers
            .get(header::REFERER)
            .and_then(|h| h.to_str().ok())
            .and_then(referrer_domain);
        let ua_hash = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .and_then(hash_user_agent);
        Ok(Provenance {
            referrer_domain: referrer,
            user_agent_hash: ua_hash,
        })
    }
}
