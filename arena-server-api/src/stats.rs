use axum::{
    Json,
    extract::{Query, State},
};
use arena_domain::player::PlayerId;
use chrono::Utc;

use crate::{ApiError, ApiState, schemas::LeaderboardQuery};

#[derive(serde::Serialize)]
pub struct JsonPlayerStatsResponse {
    total_players: i64,
    active_today: i64,
    active_now: i64,
    new_today: i64,
    timestamp: String,
}

pub async fn player_stats(
    State(state): State<ApiState>,
) -> Result<Json<JsonPlayerStatsResponse>, ApiError> {
    let stats = state.app.stats_service.player_stats().await?;
    Ok(Json(JsonPlayerStatsResponse {
        total_players: stats.total_players,
        active_today: stats.active_today,
        active_now: stats.active_now,
        new_today: stats.new_today,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonMatchStatsResponse {
    total_matches: i64,
    in_progress: i64,
    completed_today: i64,
    crashed_today: i64,
    crash_rate_percent: f64,
    avg_duration_seconds: i64,
    timestamp: String,
}

pub async fn match_stats(
    State(state): State<ApiState>,
) -> Result<Json<JsonMatchStatsResponse>, ApiError> {
    let stats = state.app.stats_service.match_stats().await?;
    Ok(Json(JsonMatchStatsResponse {
        total_matches: stats.total_matches,
        in_progress: stats.in_progress,
        completed_today: stats.completed_today,
        crashed_today: stats.crashed_today,
        crash_rate_percent: stats.crash_rate_percent,
        avg_duration_seconds: stats.avg_duration_seconds,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonRevenueStatsResponse {
    revenue_today: f64,
    revenue_month: f64,
    transactions_today: i64,
    failed_today: i64,
    timestamp: String,
}

pub async fn revenue_stats(
    State(state): State<ApiState>,
) -> Result<Json<JsonRevenueStatsResponse>, ApiError> {
    let stats = state.app.stats_service.revenue_stats().await?;
    Ok(Json(JsonRevenueStatsResponse {
        revenue_today: stats.revenue_today,
        revenue_month: stats.revenue_month,
        transactions_today: stats.transactions_today,
        failed_today: stats.failed_today,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(serde::Serialize)]
pub struct JsonLeaderboardEntry {
    rank: usize,
    player_id: PlayerId,
    username: String,
    level: i64,
    points: i64,
}

#[derive(serde::Serialize)]
pub struct JsonLeaderboardResponse {
    leaderboard: Vec<JsonLeaderboardEntry>,
}

pub async fn leaderboard(
    State(state): State<ApiState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<JsonLeaderboardResponse>, ApiError> {
    let entries = state.app.stats_service.leaderboard(query.limit).await?;
    Ok(Json(JsonLeaderboardResponse {
        leaderboard: entries
            .into_iter()
            .map(|e| JsonLeaderboardEntry {
                rank: e.rank,
                player_id: e.player_id,
                username: e.username,
                level: e.level,
                points: e.points,
            })
            .collect(),
    }))
}
