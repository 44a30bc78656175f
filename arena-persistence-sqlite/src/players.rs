use arena_domain::{
    ServiceError, ServiceResult,
    event::NewSystemEvent,
    player::{NewPlayer, Player, PlayerId, PlayerRepository},
};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::internal_error;

pub struct SqlitePlayerRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePlayerRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn player_from_row(row: &SqliteRow) -> sqlx::Result<Player> {
        Ok(Player {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            level: row.try_get("level")?,
            total_points: row.try_get("total_points")?,
            account_balance: row.try_get("account_balance")?,
            created_at: row.try_get("created_at")?,
            last_login: row.try_get("last_login")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

#[async_trait::async_trait]
impl PlayerRepository for SqlitePlayerRepository {
    async fn get_player(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal_error)?;
        row.map(|r| Self::player_from_row(&r))
            .transpose()
            .map_err(internal_error)
    }

    async fn get_player_by_username(&self, username: &str) -> ServiceResult<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal_error)?;
        row.map(|r| Self::player_from_row(&r))
            .transpose()
            .map_err(internal_error)
    }

    async fn create_player(
        &self,
        player: &NewPlayer,
        now: DateTime<Utc>,
    ) -> ServiceResult<Player> {
        let row = sqlx::query(
            "INSERT INTO players (username, email, level, created_at, last_login) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&player.username)
        .bind(&player.email)
        .bind(player.level)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(internal_error)?;
        Self::player_from_row(&row).map_err(internal_error)
    }

    async fn record_login(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
        event: &NewSystemEvent,
    ) -> ServiceResult<Player> {
        let mut tx = self.pool.begin().await.map_err(internal_error)?;
        let row = sqlx::query("UPDATE players SET last_login = ? WHERE id = ? RETURNING *")
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal_error)?;
        let Some(row) = row else {
            return ServiceError::not_found("Player not found");
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
        Self::player_from_row(&row).map_err(internal_error)
    }

    async fn find_existing_ids(&self, ids: &[PlayerId]) -> ServiceResult<Vec<PlayerId>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT DISTINCT id FROM players WHERE id IN ({})",
            placeholders
        );
        let mut query = sqlx::query_scalar::<_, PlayerId>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        query.fetch_all(&self.pool).await.map_err(internal_error)
    }

    async fn count_players(&self) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM players")
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn count_logins_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE last_login >= ?")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn count_created_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE created_at >= ?")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn top_players(&self, limit: i64) -> ServiceResult<Vec<Player>> {
        let rows = sqlx::query(
            "SELECT * FROM players WHERE is_active = 1 \
             ORDER BY total_points DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(internal_error)?;
        rows.iter()
            .map(|r| Self::player_from_row(r).map_err(internal_error))
            .collect()
    }
}
