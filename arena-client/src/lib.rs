use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod simulator;

pub type PlayerId = i64;
pub type MatchId = i64;
pub type TransactionId = i64;
pub type EventId = i64;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Api { status: u16, detail: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.detail)
            .unwrap_or_else(|_| status.to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(response.json::<T>().await?)
}

#[derive(Serialize)]
pub struct RegisterPlayerRequest {
    pub username: String,
    pub email: String,
    pub level: i64,
}

#[derive(Deserialize, Debug)]
pub struct RegisterPlayerResponse {
    pub player_id: PlayerId,
    pub username: String,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    pub player_id: PlayerId,
    pub username: String,
    pub level: i64,
    pub last_login: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PlayerResponse {
    pub player_id: PlayerId,
    pub username: String,
    pub email: Option<String>,
    pub level: i64,
    pub total_points: i64,
    pub account_balance: f64,
    pub created_at: String,
    pub last_login: Option<String>,
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct StartMatchRequest {
    pub match_type: String,
    pub player_ids: Vec<PlayerId>,
    pub server_region: String,
}

#[derive(Deserialize, Debug)]
pub struct MatchStartedResponse {
    pub match_id: MatchId,
    pub match_type: String,
    pub status: String,
    pub player_count: usize,
    pub server_region: String,
}

#[derive(Serialize)]
pub struct ParticipantStat {
    pub player_id: PlayerId,
    pub score: i64,
    pub kills: i64,
    pub deaths: i64,
}

#[derive(Serialize)]
pub struct CompleteMatchRequest {
    pub match_id: MatchId,
    pub winner_id: PlayerId,
    pub duration_seconds: i64,
    pub participant_stats: Vec<ParticipantStat>,
}

#[derive(Deserialize, Debug)]
pub struct MatchCompletedResponse {
    pub match_id: MatchId,
    pub status: String,
    pub winner_id: PlayerId,
    pub duration_seconds: i64,
    pub message: String,
}

#[derive(Serialize)]
pub struct CrashMatchRequest {
    pub match_id: MatchId,
    pub error_message: String,
}

#[derive(Deserialize, Debug)]
pub struct MatchCrashedResponse {
    pub match_id: MatchId,
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct CreateTransactionRequest {
    pub player_id: PlayerId,
    pub item_type: String,
    pub item_name: String,
    pub amount: f64,
}

#[derive(Deserialize, Debug)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    pub player_id: PlayerId,
    pub item: String,
    pub amount: f64,
    pub status: String,
}

#[derive(Serialize)]
pub struct LogEventRequest {
    pub event_type: String,
    pub severity: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

#[derive(Deserialize, Debug)]
pub struct EventResponse {
    pub event_id: EventId,
    pub event_type: String,
    pub severity: String,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct PlayerStatsResponse {
    pub total_players: i64,
    pub active_today: i64,
    pub active_now: i64,
    pub new_today: i64,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct MatchStatsResponse {
    pub total_matches: i64,
    pub in_progress: i64,
    pub completed_today: i64,
    pub crashed_today: i64,
    pub crash_rate_percent: f64,
    pub avg_duration_seconds: i64,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct RevenueStatsResponse {
    pub revenue_today: f64,
    pub revenue_month: f64,
    pub transactions_today: i64,
    pub failed_today: i64,
    pub timestamp: String,
}

#[derive(Deserialize, Debug)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub username: String,
    pub level: i64,
    pub points: i64,
}

#[derive(Deserialize, Debug)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Typed HTTP client for the arena server API.
#[derive(Clone)]
pub struct ArenaClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ArenaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json("/health").await
    }

    pub async fn register_player(
        &self,
        request: &RegisterPlayerRequest,
    ) -> Result<RegisterPlayerResponse, ClientError> {
        self.post_json("/api/players/register", request).await
    }

    pub async fn login(&self, player_id: PlayerId) -> Result<LoginResponse, ClientError> {
        self.post_json(
            "/api/players/login",
            &serde_json::json!({ "player_id": player_id }),
        )
        .await
    }

    pub async fn get_player(&self, player_id: PlayerId) -> Result<PlayerResponse, ClientError> {
        self.get_json(&format!("/api/players/{}", player_id)).await
    }

    pub async fn start_match(
        &self,
        request: &StartMatchRequest,
    ) -> Result<MatchStartedResponse, ClientError> {
        self.post_json("/api/matches/start", request).await
    }

    pub async fn complete_match(
        &self,
        request: &CompleteMatchRequest,
    ) -> Result<MatchCompletedResponse, ClientError> {
        self.post_json("/api/matches/complete", request).await
    }

    pub async fn crash_match(
        &self,
        request: &CrashMatchRequest,
    ) -> Result<MatchCrashedResponse, ClientError> {
        self.post_json("/api/matches/crash", request).await
    }

    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<TransactionResponse, ClientError> {
        self.post_json("/api/transactions/create", request).await
    }

    pub async fn log_event(&self, request: &LogEventRequest) -> Result<EventResponse, ClientError> {
        self.post_json("/api/system/event", request).await
    }

    pub async fn player_stats(&self) -> Result<PlayerStatsResponse, ClientError> {
        self.get_json("/api/stats/players").await
    }

    pub async fn match_stats(&self) -> Result<MatchStatsResponse, ClientError> {
        self.get_json("/api/stats/matches").await
    }

    pub async fn revenue_stats(&self) -> Result<RevenueStatsResponse, ClientError> {
        self.get_json("/api/stats/revenue").await
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<LeaderboardResponse, ClientError> {
        self.get_json(&format!("/api/leaderboard?limit={}", limit))
            .await
    }
}
