use arena_domain::{
    ServiceError, ServiceResult,
    event::NewSystemEvent,
    matches::{
        Match, MatchId, MatchParticipant, MatchRepository, MatchStatus, NewMatch,
        ParticipantStats,
    },
    player::PlayerId,
};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::internal_error;

pub struct SqliteMatchRepository {
    pool: Pool<Sqlite>,
}

impl SqliteMatchRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn match_from_row(row: &SqliteRow) -> ServiceResult<Match> {
        let match_type: String = row.try_get("match_type").map_err(internal_error)?;
        let status: String = row.try_get("status").map_err(internal_error)?;
        Ok(Match {
            id: row.try_get("id").map_err(internal_error)?,
            match_type: arena_domain::matches::MatchType::parse(&match_type).ok_or_else(
                || ServiceError::Internal(format!("unknown match type in store: {}", match_type)),
            )?,
            status: MatchStatus::parse(&status).ok_or_else(|| {
                ServiceError::Internal(format!("unknown match status in store: {}", status))
            })?,
            start_time: row.try_get("start_time").map_err(internal_error)?,
            end_time: row.try_get("end_time").map_err(internal_error)?,
            winner_id: row.try_get("winner_id").map_err(internal_error)?,
            duration_seconds: row.try_get("duration_seconds").map_err(internal_error)?,
            server_region: row.try_get("server_region").map_err(internal_error)?,
        })
    }

    fn participant_from_row(row: &SqliteRow) -> sqlx::Result<MatchParticipant> {
        Ok(MatchParticipant {
            id: row.try_get("id")?,
            match_id: row.try_get("match_id")?,
            player_id: row.try_get("player_id")?,
            score: row.try_get("score")?,
            kills: row.try_get("kills")?,
            deaths: row.try_get("deaths")?,
            joined_at: row.try_get("joined_at")?,
            left_at: row.try_get("left_at")?,
        })
    }
}

#[async_trait::async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal_error)?;
        row.map(|r| Self::match_from_row(&r)).transpose()
    }

    async fn create_match(
        &self,
        new_match: &NewMatch,
        player_ids: &[PlayerId],
        now: DateTime<Utc>,
    ) -> ServiceResult<Match> {
        let mut tx = self.pool.begin().await.map_err(internal_error)?;
        let row = sqlx::query(
            "INSERT INTO matches (match_type, status, start_time, server_region) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(new_match.match_type.as_str())
        .bind(MatchStatus::InProgress.as_str())
        .bind(now)
        .bind(&new_match.server_region)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal_error)?;
        let created = Self::match_from_row(&row)?;

        // One row per entry, duplicates included.
        for player_id in player_ids {
            sqlx::query(
                "INSERT INTO match_participants (match_id, player_id, joined_at) \
                 VALUES (?, ?, ?)",
            )
            .bind(created.id)
            .bind(player_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(internal_error)?;
        }
        tx.commit().await.map_err(internal_error)?;
        Ok(created)
    }

    async fn complete_match(
        &self,
        id: MatchId,
        winner_id: PlayerId,
        duration_seconds: i64,
        stats: &[ParticipantStats],
        now: DateTime<Utc>,
    ) -> ServiceResult<Match> {
        let mut tx = self.pool.begin().await.map_err(internal_error)?;

        // Guarded transition: only one of two racing completions can see
        // status = in_progress here, the other rolls back with Conflict.
        let updated = sqlx::query(
            "UPDATE matches SET status = ?, end_time = ?, duration_seconds = ?, winner_id = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(MatchStatus::Completed.as_str())
        .bind(now)
        .bind(duration_seconds)
        .bind(winner_id)
        .bind(id)
        .bind(MatchStatus::InProgress.as_str())
        .execute(&mut *tx)
        .await
        .map_err(internal_error)?;
        if updated.rows_affected() == 0 {
            return ServiceError::conflict("Match is not in progress");
        }

        for stat in stats {
            let updated = sqlx::query(
                "UPDATE match_participants SET score = ?, kills = ?, deaths = ?, left_at = ? \
                 WHERE match_id = ? AND player_id = ?",
            )
            .bind(stat.score)
            .bind(stat.kills)
            .bind(stat.deaths)
            .bind(now)
            .bind(id)
            .bind(stat.player_id)
            .execute(&mut *tx)
            .await
            .map_err(internal_error)?;
            // Stats for players that never joined this match are skipped.
            if updated.rows_affected() > 0 {
                sqlx::query("UPDATE players SET total_points = total_points + ? WHERE id = ?")
                    .bind(stat.score)
                    .bind(stat.player_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(internal_error)?;
            }
        }

        let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(internal_error)?;
        tx.commit().await.map_err(internal_error)?;
        Self::match_from_row(&row)
    }

    async fn crash_match(
        &self,
        id: MatchId,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<Match> {
        let mut tx = self.pool.begin().await.map_err(internal_error)?;
        let row = sqlx::query(
            "UPDATE matches SET status = ?, end_time = ? WHERE id = ? RETURNING *",
        )
        .bind(MatchStatus::Crashed.as_str())
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal_error)?;
        let Some(row) = row else {
            return ServiceError::not_found("Match not found");
        };
        sqlx::query(
            "INSERT INTO system_events (event_type, severity, message, metadata, timestamp) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.event_type)
        .bind(event.severity.as_str())
        .bind(&event.message)
        .bind(&event.metadata)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(internal_error)?;
        tx.commit().await.map_err(internal_error)?;
        Self::match_from_row(&row)
    }

    async fn get_participants(&self, id: MatchId) -> ServiceResult<Vec<MatchParticipant>> {
        let rows = sqlx::query("SELECT * FROM match_participants WHERE match_id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(internal_error)?;
        rows.iter()
            .map(|r| Self::participant_from_row(r).map_err(internal_error))
            .collect()
    }

    async fn count_matches(&self) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn count_with_status(&self, status: MatchStatus) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn count_with_status_started_since(
        &self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE status = ? AND start_time >= ?")
            .bind(status.as_str())
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn avg_completed_duration(&self) -> ServiceResult<Option<f64>> {
        sqlx::query_scalar(
            "SELECT AVG(duration_seconds) FROM matches \
             WHERE status = ? AND duration_seconds IS NOT NULL",
        )
        .bind(MatchStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(internal_error)
    }
}
