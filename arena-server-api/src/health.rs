use axum::{Json, extract::State};
use chrono::Utc;

use crate::ApiState;

#[derive(serde::Serialize)]
pub struct JsonHealthResponse {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

/// Always answers 200; an unreachable database is reported in the body.
pub async fn health_check(State(state): State<ApiState>) -> Json<JsonHealthResponse> {
    let response = match state.app.database_health.ping().await {
        Ok(()) => JsonHealthResponse {
            status: "healthy",
            database: "connected",
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        },
        Err(e) => JsonHealthResponse {
            status: "unhealthy",
            database: "disconnected",
            error: Some(e.to_string()),
            timestamp: Utc::now().to_rfc3339(),
        },
    };
    Json(response)
}
