use axum::{Json, extract::State};
use arena_domain::event::{EventId, NewSystemEvent, Severity};

use crate::{ApiError, ApiState, schemas::SystemEventCreate};

#[derive(serde::Serialize)]
pub struct JsonEventResponse {
    event_id: EventId,
    event_type: String,
    severity: String,
    message: String,
}

pub async fn log_event(
    State(state): State<ApiState>,
    Json(body): Json<SystemEventCreate>,
) -> Result<Json<JsonEventResponse>, ApiError> {
    let created = state
        .app
        .event_service
        .log_event(NewSystemEvent {
            event_type: body.event_type,
            severity: Severity::parse_lossy(&body.severity),
            message: body.message,
            metadata: body.metadata.map(|m| m.to_string()),
        })
        .await?;
    Ok(Json(JsonEventResponse {
        event_id: created.id,
        event_type: created.event_type,
        severity: created.severity.as_str().to_string(),
        message: "Event logged successfully".to_string(),
    }))
}
