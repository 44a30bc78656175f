use axum::{
    Json,
    extract::{Path, State},
};
use arena_domain::player::{NewPlayer, PlayerId};
use validator::Validate;

use crate::{
    ApiError, ApiState,
    schemas::{PlayerCreate, PlayerLogin},
};

#[derive(serde::Serialize)]
pub struct JsonRegisterResponse {
    player_id: PlayerId,
    username: String,
    message: String,
}

pub async fn register(
    State(state): State<ApiState>,
    Json(body): Json<PlayerCreate>,
) -> Result<Json<JsonRegisterResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let player = state
        .app
        .player_service
        .register(NewPlayer {
            username: body.username,
            email: Some(body.email),
            level: body.level,
        })
        .await?;
    Ok(Json(JsonRegisterResponse {
        player_id: player.id,
        username: player.username,
        message: "Player registered successfully".to_string(),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonLoginResponse {
    player_id: PlayerId,
    username: String,
    level: i64,
    last_login: Option<String>,
}

pub async fn login(
    State(state): State<ApiState>,
    Json(body): Json<PlayerLogin>,
) -> Result<Json<JsonLoginResponse>, ApiError> {
    let player = state.app.player_service.login(body.player_id).await?;
    Ok(Json(JsonLoginResponse {
        player_id: player.id,
        username: player.username,
        level: player.level,
        last_login: player.last_login.map(|t| t.to_rfc3339()),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonPlayerResponse {
    player_id: PlayerId,
    username: String,
    email: Option<String>,
    level: i64,
    total_points: i64,
    account_balance: f64,
    created_at: String,
    last_login: Option<String>,
    is_active: bool,
}

pub async fn get_player(
    State(state): State<ApiState>,
    Path(id): Path<PlayerId>,
) -> Result<Json<JsonPlayerResponse>, ApiError> {
    let player = state.app.player_service.get_player(id).await?;
    Ok(Json(JsonPlayerResponse {
        player_id: player.id,
        username: player.username,
        email: player.email,
        level: player.level,
        total_points: player.total_points,
        account_balance: player.account_balance,
        created_at: player.created_at.to_rfc3339(),
        last_login: player.last_login.map(|t| t.to_rfc3339()),
        is_active: player.is_active,
    }))
}
