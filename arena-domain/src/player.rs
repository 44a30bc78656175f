use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    ServiceError, ServiceResult,
    event::{NewSystemEvent, Severity},
    metrics::ArcMetricsSink,
};

pub type PlayerId = i64;

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub email: Option<String>,
    pub level: i64,
    pub total_points: i64,
    pub account_balance: f64,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

pub struct NewPlayer {
    pub username: String,
    pub email: Option<String>,
    pub level: i64,
}

pub type ArcPlayerRepository = Arc<Box<dyn PlayerRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerRepository {
    async fn get_player(&self, id: PlayerId) -> ServiceResult<Option<Player>>;
    async fn get_player_by_username(&self, username: &str) -> ServiceResult<Option<Player>>;
    async fn create_player(&self, player: &NewPlayer, now: DateTime<Utc>)
    -> ServiceResult<Player>;
    /// Sets last_login and appends the login event in one unit of work.
    async fn record_login(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
        event: &NewSystemEvent,
    ) -> ServiceResult<Player>;
    /// Which of the given ids exist, deduplicated.
    async fn find_existing_ids(&self, ids: &[PlayerId]) -> ServiceResult<Vec<PlayerId>>;

    async fn count_players(&self) -> ServiceResult<i64>;
    async fn count_logins_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64>;
    async fn count_created_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64>;
    /// Active players ordered by total_points descending, player id ascending
    /// on equal points.
    async fn top_players(&self, limit: i64) -> ServiceResult<Vec<Player>>;
}

pub type ArcPlayerService = Arc<Box<dyn PlayerService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerService {
    async fn register(&self, player: NewPlayer) -> ServiceResult<Player>;
    async fn login(&self, player_id: PlayerId) -> ServiceResult<Player>;
    async fn get_player(&self, player_id: PlayerId) -> ServiceResult<Player>;
}

pub struct PlayerServiceImpl {
    player_repository: ArcPlayerRepository,
    metrics: ArcMetricsSink,
}

impl PlayerServiceImpl {
    pub fn new(player_repository: ArcPlayerRepository, metrics: ArcMetricsSink) -> Self {
        Self {
            player_repository,
            metrics,
        }
    }
}

#[async_trait::async_trait]
impl PlayerService for PlayerServiceImpl {
    async fn register(&self, player: NewPlayer) -> ServiceResult<Player> {
        let existing = self
            .player_repository
            .get_player_by_username(&player.username)
            .await?;
        if existing.is_some() {
            return ServiceError::invalid_input("Username already exists");
        }
        let created = self
            .player_repository
            .create_player(&player, Utc::now())
            .await?;
        info!(
            "Registered player {} ({})",
            created.id, created.username
        );
        Ok(created)
    }

    async fn login(&self, player_id: PlayerId) -> ServiceResult<Player> {
        let Some(player) = self.player_repository.get_player(player_id).await? else {
            return ServiceError::not_found("Player not found");
        };
        let event = NewSystemEvent {
            event_type: "login".to_string(),
            severity: Severity::Info,
            message: format!("Player {} ({}) logged in", player.id, player.username),
            metadata: None,
        };
        let player = self
            .player_repository
            .record_login(player_id, Utc::now(), &event)
            .await?;
        self.metrics.login_recorded();
        Ok(player)
    }

    async fn get_player(&self, player_id: PlayerId) -> ServiceResult<Player> {
        match self.player_repository.get_player(player_id).await? {
            Some(player) => Ok(player),
            None => ServiceError::not_found("Player not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::NoopMetricsSink, mock::MockStore};

    fn service(store: &MockStore) -> PlayerServiceImpl {
        PlayerServiceImpl::new(
            Arc::new(Box::new(store.player_repository())),
            Arc::new(Box::new(NoopMetricsSink)),
        )
    }

    #[tokio::test]
    async fn test_register_and_duplicate_username() {
        let store = MockStore::new();
        let service = service(&store);

        let alice = service
            .register(NewPlayer {
                username: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
                level: 1,
            })
            .await
            .expect("registration should succeed");
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.total_points, 0);
        assert!(alice.is_active);

        let duplicate = service
            .register(NewPlayer {
                username: "alice".to_string(),
                email: None,
                level: 3,
            })
            .await;
        assert!(matches!(duplicate, Err(ServiceError::InvalidInput(..))));
    }

    #[tokio::test]
    async fn test_login_updates_last_login_and_logs_event() {
        let store = MockStore::new();
        let service = service(&store);

        let player = service
            .register(NewPlayer {
                username: "bob".to_string(),
                email: None,
                level: 2,
            })
            .await
            .unwrap();

        let logged_in = service.login(player.id).await.unwrap();
        assert!(logged_in.last_login.is_some());

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "login");
        assert_eq!(events[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_login_unknown_player() {
        let store = MockStore::new();
        let service = service(&store);

        assert!(matches!(
            service.login(99999).await,
            Err(ServiceError::NotFound(..))
        ));
        assert!(store.events().is_empty());
    }
}
