use axum::{Json, extract::State};
use arena_domain::{
    matches::{MatchId, ParticipantStats},
    player::PlayerId,
};

use crate::{
    ApiError, ApiState,
    schemas::{MatchComplete, MatchCrash, MatchCreate},
};

#[derive(serde::Serialize)]
pub struct JsonMatchStartedResponse {
    match_id: MatchId,
    match_type: String,
    status: String,
    player_count: usize,
    server_region: String,
}

pub async fn start_match(
    State(state): State<ApiState>,
    Json(body): Json<MatchCreate>,
) -> Result<Json<JsonMatchStartedResponse>, ApiError> {
    let player_count = body.player_ids.len();
    let started = state
        .app
        .match_service
        .start_match(&body.match_type, body.player_ids, body.server_region)
        .await
        .map_err(ApiError::all_bad_request)?;
    Ok(Json(JsonMatchStartedResponse {
        match_id: started.id,
        match_type: started.match_type.as_str().to_string(),
        status: started.status.as_str().to_string(),
        player_count,
        server_region: started.server_region,
    }))
}

#[derive(serde::Serialize)]
pub struct JsonMatchCompletedResponse {
    match_id: MatchId,
    status: String,
    winner_id: PlayerId,
    duration_seconds: i64,
    message: String,
}

pub async fn complete_match(
    State(state): State<ApiState>,
    Json(body): Json<MatchComplete>,
) -> Result<Json<JsonMatchCompletedResponse>, ApiError> {
    let stats: Vec<ParticipantStats> = body
        .participant_stats
        .into_iter()
        .map(|s| ParticipantStats {
            player_id: s.player_id,
            score: s.score,
            kills: s.kills,
            deaths: s.deaths,
        })
        .collect();
    let completed = state
        .app
        .match_service
        .complete_match(body.match_id, body.winner_id, body.duration_seconds, stats)
        .await?;
    Ok(Json(JsonMatchCompletedResponse {
        match_id: completed.id,
        status: completed.status.as_str().to_string(),
        winner_id: body.winner_id,
        duration_seconds: body.duration_seconds,
        message: "Match completed successfully".to_string(),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonMatchCrashedResponse {
    match_id: MatchId,
    status: String,
    message: String,
}

pub async fn crash_match(
    State(state): State<ApiState>,
    Json(body): Json<MatchCrash>,
) -> Result<Json<JsonMatchCrashedResponse>, ApiError> {
    let crashed = state
        .app
        .match_service
        .crash_match(body.match_id, &body.error_message)
        .await?;
    Ok(Json(JsonMatchCrashedResponse {
        match_id: crashed.id,
        status: crashed.status.as_str().to_string(),
        message: "Match marked as crashed".to_string(),
    }))
}
