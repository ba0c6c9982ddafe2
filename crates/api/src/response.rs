//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Reply to a tracking call. `success: false` means the event was not
/// stored (tracking disabled, sampled out, or unprocessable) but the
/// client should not retry.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub success: bool,
    pub session_id: String,
}

impl TrackResponse {
    pub fn stored(session_id: String) -> Self {
        Self {
            success: true,
            session_id,
        }
    }

    pub fn skipped(session_id: String) -> Self {
        Self {
            success: false,
            session_id,
        }
    }
}

/// Health check response. Carries a metrics snapshot so a single
/// probe shows both liveness and pipeline throughput.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_connected: bool,
    pub buffered_events: usize,
    pub metrics: telemetry::metrics::MetricsSnapshot,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error with a stable machine-readable code.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse {
                error: msg.into(),
                code: code.into(),
            },
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "invalid_request", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<stats_core::Error> for ApiError {
    fn from(err: stats_core::Error) -> Self {
        use stats_core::Error;
        match &err {
            Error::Validation(msg) => ApiError::bad_request(msg.clone()),
            Error::InvalidEventType(tag) => {
                ApiError::bad_request(format!("invalid event type: {tag}"))
            }
            Error::Store(_) => ApiError::with_code(
                StatusCode::SERVICE_UNAVAILABLE,
                "storage_unavailable",
                err.to_string(),
            ),
            _ => ApiError::internal(err.to_string()),
        }
    }
}
