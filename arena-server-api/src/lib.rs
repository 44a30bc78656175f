use std::sync::Arc;

use arena_domain::{ServiceError, app::AppState};
use axum::{
    Router,
    response::IntoResponse,
    routing::{get, post},
};
use log::info;

use crate::metrics::ApiMetrics;

pub mod events;
pub mod health;
pub mod matches;
pub mod metrics;
pub mod players;
pub mod schemas;
pub mod stats;
pub mod transactions;

#[derive(Clone)]
pub struct ApiState {
    pub app: AppState,
    pub metrics: Arc<ApiMetrics>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::exposition))
        .route("/api/stats/players", get(stats::player_stats))
        .route("/api/stats/matches", get(stats::match_stats))
        .route("/api/stats/revenue", get(stats::revenue_stats))
        .route("/api/leaderboard", get(stats::leaderboard))
        .route("/api/players/register", post(players::register))
        .route("/api/players/login", post(players::login))
        .route("/api/players/{id}", get(players::get_player))
        .route("/api/matches/start", post(matches::start_match))
        .route("/api/matches/complete", post(matches::complete_match))
        .route("/api/matches/crash", post(matches::crash_match))
        .route("/api/transactions/create", post(transactions::create_transaction))
        .route("/api/system/event", post(events::log_event))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics::track_requests,
        ))
        .with_state(state)
}

pub async fn run(
    state: ApiState,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) {
    let router = build_router(state);

    let port = std::env::var("ARENA_HTTP_PORT")
        .unwrap_or_else(|_| "8000".to_string())
        .parse::<u16>()
        .expect("ARENA_HTTP_PORT must be a valid u16");

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind HTTP listener");

    info!("API server listening on port {}", port);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .expect("HTTP server failed");

    info!("HTTP API shut down gracefully");
}

/// Maps domain errors onto HTTP statuses with a `{"detail": ...}` body.
pub struct ApiError(axum::http::StatusCode, String);

impl ApiError {
    /// The default mapping used by most endpoints.
    pub fn from_service(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => Self(axum::http::StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => Self(axum::http::StatusCode::NOT_FOUND, msg),
            ServiceError::Conflict(msg) => Self(axum::http::StatusCode::BAD_REQUEST, msg),
            ServiceError::Internal(msg) => {
                Self(axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }

    /// /api/matches/start historically reports every failure, including
    /// missing players and store errors, as 400.
    pub fn all_bad_request(err: ServiceError) -> Self {
        let msg = match err {
            ServiceError::InvalidInput(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::Conflict(msg) => msg,
            ServiceError::Internal(msg) => format!("Error starting match: {}", msg),
        };
        Self(axum::http::StatusCode::BAD_REQUEST, msg)
    }

    /// /api/transactions/create keeps 404 for a missing player but folds
    /// everything else into 400.
    pub fn bad_request_except_not_found(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self(axum::http::StatusCode::NOT_FOUND, msg),
            ServiceError::InvalidInput(msg) | ServiceError::Conflict(msg) => {
                Self(axum::http::StatusCode::BAD_REQUEST, msg)
            }
            ServiceError::Internal(msg) => Self(
                axum::http::StatusCode::BAD_REQUEST,
                format!("Error creating transaction: {}", msg),
            ),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(axum::http::StatusCode::BAD_REQUEST, msg.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        ApiError::from_service(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "detail": self.1 });
        (self.0, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests;
