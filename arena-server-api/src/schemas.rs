use arena_domain::{matches::MatchId, player::PlayerId};
use serde::Deserialize;
use validator::Validate;

fn default_level() -> i64 {
    1
}

fn default_server_region() -> String {
    "us-east".to_string()
}

fn default_limit() -> i64 {
    arena_domain::stats::DEFAULT_LEADERBOARD_LIMIT
}

#[derive(Deserialize, Validate)]
pub struct PlayerCreate {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_level")]
    pub level: i64,
}

#[derive(Deserialize)]
pub struct PlayerLogin {
    pub player_id: PlayerId,
}

#[derive(Deserialize)]
pub struct MatchCreate {
    pub match_type: String,
    pub player_ids: Vec<PlayerId>,
    #[serde(default = "default_server_region")]
    pub server_region: String,
}

#[derive(Deserialize)]
pub struct ParticipantStat {
    pub player_id: PlayerId,
    pub score: i64,
    pub kills: i64,
    pub deaths: i64,
}

#[derive(Deserialize)]
pub struct MatchComplete {
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub duration_seconds: i64,
    pub participant_stats: Vec<ParticipantStat>,
}

#[derive(Deserialize)]
pub struct MatchCrash {
    pub match_id: MatchId,
    pub error_message: String,
}

#[derive(Deserialize)]
pub struct TransactionCreate {
    pub player_id: PlayerId,
    pub item_type: String,
    pub item_name: String,
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct SystemEventCreate {
    pub event_type: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}
