//! Tracking endpoint handler.

use axum::{extract::State, Json};
use stats_core::IncomingEvent;
use telemetry::metrics;
use tracing::{debug, warn};
use validator::Validate;

use crate::extractors::{Provenance, SessionId};
use crate::response::{ApiError, TrackResponse};
use crate::state::AppState;

/// POST /v1/track - Records one analytics event.
///
/// Always replies 200 to a parseable request. `success: false` tells
/// the client the event was not kept (tracking off, malformed fields,
/// sampled out) and that retrying is pointless. Store trouble is
/// deliberately invisible here: the event sits in the buffer and is
/// retried on the next flush.
pub async fn track_handler(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    provenance: Provenance,
    Json(payload): Json<IncomingEvent>,
) -> Result<Json<TrackResponse>, ApiError> {
    if let Err(e) = payload.validate() {
        metrics().events_rejected.inc();
        debug!(error = %e, "event rejected by validation");
        return Ok(Json(TrackResponse::skipped(session_id)));
    }

    // into_record enforces the event type charset on top of the
    // derive-level field checks
    let record = match payload.into_record(
        session_id.clone(),
        provenance.referrer_domain,
        provenance.user_agent_hash,
    ) {
        Ok(record) => record,
        Err(e) => {
            metrics().events_rejected.inc();
            debug!(error = %e, "event rejected by validation");
            return Ok(Json(TrackResponse::skipped(session_id)));
        }
    };

    use pipeline::RecordOutcome::{Disabled, Sampled};
    match state.ingestor.record(record).await {
        Ok(Sampled) | Ok(Disabled) => Ok(Json(TrackResponse::skipped(session_id))),
        Ok(_) => Ok(Json(TrackResponse::stored(session_id))),
        Err(e) => {
            // batch is re-buffered; acknowledge so the client moves on
            warn!(error = %e, "flush failed during track, event retained for retry");
            Ok(Json(TrackResponse::stored(session_id)))
        }
    }
}
