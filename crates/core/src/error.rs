//! Unified error type for the bandstats pipeline.
//!
//! The taxonomy follows the recovery path:
//! - `Store`: the backing database was unreachable or a statement failed —
//!   recoverable via buffer retention (ingestion) or the next scheduled run
//!   (aggregation, sweep).
//! - `Config`: invalid runtime configuration, fails fast at startup.
//! - `Validation` / `Serialization` / `InvalidEventType`: terminal for the
//!   offending event only.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Transient failure talking to the backing store.
    #[error("store error: {0}")]
    Store(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry on the next invocation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
