use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::{
    ServiceResult,
    matches::{ArcMatchRepository, MatchStatus},
    player::{ArcPlayerRepository, PlayerId},
    transaction::ArcTransactionRepository,
};

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStats {
    pub total_players: i64,
    pub active_today: i64,
    pub active_now: i64,
    pub new_today: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchStats {
    pub total_matches: i64,
    pub in_progress: i64,
    pub completed_today: i64,
    pub crashed_today: i64,
    pub crash_rate_percent: f64,
    pub avg_duration_seconds: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RevenueStats {
    pub revenue_today: f64,
    pub revenue_month: f64,
    pub transactions_today: i64,
    pub failed_today: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: PlayerId,
    pub username: String,
    pub level: i64,
    pub points: i64,
}

pub type ArcStatsService = Arc<Box<dyn StatsService + Send + Sync + 'static>>;

/// Pure read operations; every query window is evaluated against wall-clock
/// time at execution.
#[async_trait::async_trait]
pub trait StatsService {
    async fn player_stats(&self) -> ServiceResult<PlayerStats>;
    async fn match_stats(&self) -> ServiceResult<MatchStats>;
    async fn revenue_stats(&self) -> ServiceResult<RevenueStats>;
    async fn leaderboard(&self, limit: i64) -> ServiceResult<Vec<LeaderboardEntry>>;
}

pub struct StatsServiceImpl {
    player_repository: ArcPlayerRepository,
    match_repository: ArcMatchRepository,
    transaction_repository: ArcTransactionRepository,
}

impl StatsServiceImpl {
    pub fn new(
        player_repository: ArcPlayerRepository,
        match_repository: ArcMatchRepository,
        transaction_repository: ArcTransactionRepository,
    ) -> Self {
        Self {
            player_repository,
            match_repository,
            transaction_repository,
        }
    }
}

fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    date.with_day0(0)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait::async_trait]
impl StatsService for StatsServiceImpl {
    async fn player_stats(&self) -> ServiceResult<PlayerStats> {
        let now = Utc::now();
        Ok(PlayerStats {
            total_players: self.player_repository.count_players().await?,
            active_today: self
                .player_repository
                .count_logins_since(now - Duration::hours(24))
                .await?,
            active_now: self
                .player_repository
                .count_logins_since(now - Duration::minutes(5))
                .await?,
            new_today: self
                .player_repository
                .count_created_since(day_start(now))
                .await?,
        })
    }

    async fn match_stats(&self) -> ServiceResult<MatchStats> {
        let now = Utc::now();
        let today = day_start(now);
        let completed_today = self
            .match_repository
            .count_with_status_started_since(MatchStatus::Completed, today)
            .await?;
        let crashed_today = self
            .match_repository
            .count_with_status_started_since(MatchStatus::Crashed, today)
            .await?;
        let crash_rate = if completed_today > 0 {
            crashed_today as f64 / completed_today as f64 * 100.0
        } else {
            0.0
        };
        let avg_duration = self.match_repository.avg_completed_duration().await?;
        Ok(MatchStats {
            total_matches: self.match_repository.count_matches().await?,
            in_progress: self
                .match_repository
                .count_with_status(MatchStatus::InProgress)
                .await?,
            completed_today,
            crashed_today,
            crash_rate_percent: round2(crash_rate),
            avg_duration_seconds: avg_duration.map(|d| d as i64).unwrap_or(0),
        })
    }

    async fn revenue_stats(&self) -> ServiceResult<RevenueStats> {
        let now = Utc::now();
        let today = day_start(now);
        Ok(RevenueStats {
            revenue_today: round2(
                self.transaction_repository
                    .sum_completed_since(today)
                    .await?,
            ),
            revenue_month: round2(
                self.transaction_repository
                    .sum_completed_since(month_start(now))
                    .await?,
            ),
            transactions_today: self.transaction_repository.count_since(today).await?,
            failed_today: self
                .transaction_repository
                .count_failed_since(today)
                .await?,
        })
    }

    async fn leaderboard(&self, limit: i64) -> ServiceResult<Vec<LeaderboardEntry>> {
        let players = self.player_repository.top_players(limit).await?;
        Ok(players
            .into_iter()
            .enumerate()
            .map(|(idx, p)| LeaderboardEntry {
                rank: idx + 1,
                player_id: p.id,
                username: p.username,
                level: p.level,
                points: p.total_points,
            })
            .collect())
    }
}
