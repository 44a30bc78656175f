use arena_domain::{
    ServiceResult,
    event::{EventRepository, NewSystemEvent, Severity, SystemEvent},
};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::internal_error;

pub struct SqliteEventRepository {
    pool: Pool<Sqlite>,
}

impl SqliteEventRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn event_from_row(row: &SqliteRow) -> sqlx::Result<SystemEvent> {
        let severity: String = row.try_get("severity")?;
        Ok(SystemEvent {
            id: row.try_get("id")?,
            event_type: row.try_get("event_type")?,
            severity: Severity::parse_lossy(&severity),
            message: row.try_get("message")?,
            metadata: row.try_get("metadata")?,
            timestamp: row.try_get("timestamp")?,
        })
    }
}

#[async_trait::async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create_event(
        &self,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<SystemEvent> {
        let row = sqlx::query(
            "INSERT INTO system_events (event_type, severity, message, metadata, timestamp) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&event.event_type)
        .bind(event.severity.as_str())
        .bind(&event.message)
        .bind(&event.metadata)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(internal_error)?;
        Self::event_from_row(&row).map_err(internal_error)
    }
}
