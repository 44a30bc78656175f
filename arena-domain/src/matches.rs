use std::{collections::BTreeSet, sync::Arc};

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    ServiceError, ServiceResult,
    event::{NewSystemEvent, Severity},
    metrics::ArcMetricsSink,
    player::{ArcPlayerRepository, PlayerId},
};

pub type MatchId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchType {
    Solo,
    Team,
    Tournament,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Solo => "solo",
            MatchType::Team => "team",
            MatchType::Tournament => "tournament",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "solo" => Some(MatchType::Solo),
            "team" => Some(MatchType::Team),
            "tournament" => Some(MatchType::Tournament),
            _ => None,
        }
    }
}

/// Match status state machine: in_progress is assigned at creation, and the
/// only legal transitions are in_progress -> completed and
/// in_progress -> crashed. Both targets are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    InProgress,
    Completed,
    Crashed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Crashed => "crashed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(MatchStatus::InProgress),
            "completed" => Some(MatchStatus::Completed),
            "crashed" => Some(MatchStatus::Crashed),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Match {
    pub id: MatchId,
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub winner_id: Option<PlayerId>,
    pub duration_seconds: Option<i64>,
    pub server_region: String,
}

#[derive(Clone, Debug)]
pub struct MatchParticipant {
    pub id: i64,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub score: i64,
    pub kills: i64,
    pub deaths: i64,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct ParticipantStats {
    pub player_id: PlayerId,
    pub score: i64,
    pub kills: i64,
    pub deaths: i64,
}

pub struct NewMatch {
    pub match_type: MatchType,
    pub server_region: String,
}

pub type ArcMatchRepository = Arc<Box<dyn MatchRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait MatchRepository {
    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>>;
    /// Creates the match row plus one participant row per entry in
    /// `player_ids` (duplicates included) in one unit of work.
    async fn create_match(
        &self,
        new_match: &NewMatch,
        player_ids: &[PlayerId],
        now: DateTime<Utc>,
    ) -> ServiceResult<Match>;
    /// Applies the in_progress -> completed transition with a guarded update;
    /// returns Conflict if the match is no longer in progress. Participant
    /// stats with no matching row are skipped; matched players gain `score`
    /// total_points. All of it commits together.
    async fn complete_match(
        &self,
        id: MatchId,
        winner_id: PlayerId,
        duration_seconds: i64,
        stats: &[ParticipantStats],
        now: DateTime<Utc>,
    ) -> ServiceResult<Match>;
    /// Unconditionally marks the match crashed and appends the crash event in
    /// the same unit of work.
    async fn crash_match(
        &self,
        id: MatchId,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<Match>;
    async fn get_participants(&self, id: MatchId) -> ServiceResult<Vec<MatchParticipant>>;

    async fn count_matches(&self) -> ServiceResult<i64>;
    async fn count_with_status(&self, status: MatchStatus) -> ServiceResult<i64>;
    async fn count_with_status_started_since(
        &self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> ServiceResult<i64>;
    /// Average duration over completed matches with a non-null duration.
    async fn avg_completed_duration(&self) -> ServiceResult<Option<f64>>;
}

pub type ArcMatchService = Arc<Box<dyn MatchService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait MatchService {
    async fn start_match(
        &self,
        match_type: &str,
        player_ids: Vec<PlayerId>,
        server_region: String,
    ) -> ServiceResult<Match>;
    async fn complete_match(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
        duration_seconds: i64,
        participant_stats: Vec<ParticipantStats>,
    ) -> ServiceResult<Match>;
    async fn crash_match(&self, match_id: MatchId, error_message: &str) -> ServiceResult<Match>;
}

pub struct MatchServiceImpl {
    match_repository: ArcMatchRepository,
    player_repository: ArcPlayerRepository,
    metrics: ArcMetricsSink,
}

impl MatchServiceImpl {
    pub fn new(
        match_repository: ArcMatchRepository,
        player_repository: ArcPlayerRepository,
        metrics: ArcMetricsSink,
    ) -> Self {
        Self {
            match_repository,
            player_repository,
            metrics,
        }
    }
}

#[async_trait::async_trait]
impl MatchService for MatchServiceImpl {
    async fn start_match(
        &self,
        match_type: &str,
        player_ids: Vec<PlayerId>,
        server_region: String,
    ) -> ServiceResult<Match> {
        if player_ids.is_empty() {
            return ServiceError::invalid_input("player_ids cannot be empty");
        }
        let Some(match_type) = MatchType::parse(match_type) else {
            return ServiceError::invalid_input(format!(
                "Invalid match type: {}. Must be 'solo', 'team', or 'tournament'",
                match_type
            ));
        };

        let distinct: BTreeSet<PlayerId> = player_ids.iter().copied().collect();
        let distinct: Vec<PlayerId> = distinct.into_iter().collect();
        let found = self.player_repository.find_existing_ids(&distinct).await?;
        if found.len() != distinct.len() {
            return ServiceError::not_found(format!(
                "Some players not found. Expected {} players, found {}",
                distinct.len(),
                found.len()
            ));
        }

        let created = self
            .match_repository
            .create_match(
                &NewMatch {
                    match_type,
                    server_region,
                },
                &player_ids,
                Utc::now(),
            )
            .await?;
        self.metrics.match_started(match_type);
        info!(
            "Started {} match {} with {} players in {}",
            match_type.as_str(),
            created.id,
            player_ids.len(),
            created.server_region
        );
        Ok(created)
    }

    async fn complete_match(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
        duration_seconds: i64,
        participant_stats: Vec<ParticipantStats>,
    ) -> ServiceResult<Match> {
        let Some(existing) = self.match_repository.get_match(match_id).await? else {
            return ServiceError::not_found("Match not found");
        };
        if existing.status != MatchStatus::InProgress {
            return ServiceError::conflict("Match is not in progress");
        }

        // The repository re-checks the status inside its transaction, so a
        // racing completion still resolves to exactly one winner.
        let completed = self
            .match_repository
            .complete_match(
                match_id,
                winner_id,
                duration_seconds,
                &participant_stats,
                Utc::now(),
            )
            .await?;
        info!(
            "Completed match {} after {}s, winner {}",
            match_id, duration_seconds, winner_id
        );
        Ok(completed)
    }

    async fn crash_match(&self, match_id: MatchId, error_message: &str) -> ServiceResult<Match> {
        let Some(existing) = self.match_repository.get_match(match_id).await? else {
            return ServiceError::not_found("Match not found");
        };
        // No status precondition: a match in any state can be crashed.
        let event = NewSystemEvent {
            event_type: "server_crash".to_string(),
            severity: Severity::Critical,
            message: format!("Match {} crashed: {}", existing.id, error_message),
            metadata: None,
        };
        let crashed = self
            .match_repository
            .crash_match(match_id, &event, Utc::now())
            .await?;
        info!("Match {} marked as crashed: {}", match_id, error_message);
        Ok(crashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::NoopMetricsSink,
        mock::MockStore,
        player::NewPlayer,
    };

    async fn seed_players(store: &MockStore, count: usize) -> Vec<PlayerId> {
        let repo = store.player_repository();
        let mut ids = Vec::new();
        for i in 0..count {
            let player = crate::player::PlayerRepository::create_player(
                &repo,
                &NewPlayer {
                    username: format!("player{}", i),
                    email: None,
                    level: 1,
                },
                Utc::now(),
            )
            .await
            .unwrap();
            ids.push(player.id);
        }
        ids
    }

    fn service(store: &MockStore) -> MatchServiceImpl {
        MatchServiceImpl::new(
            Arc::new(Box::new(store.match_repository())),
            Arc::new(Box::new(store.player_repository())),
            Arc::new(Box::new(NoopMetricsSink)),
        )
    }

    #[tokio::test]
    async fn test_start_match_creates_participants() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 3).await;

        let started = service
            .start_match("team", ids.clone(), "us-east".to_string())
            .await
            .unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
        assert_eq!(started.match_type, MatchType::Team);
        assert!(started.end_time.is_none());

        let participants = store
            .match_repository()
            .get_participants(started.id)
            .await
            .unwrap();
        assert_eq!(participants.len(), 3);
        assert!(participants.iter().all(|p| p.left_at.is_none()));
    }

    #[tokio::test]
    async fn test_start_match_duplicate_ids_each_get_a_row() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 2).await;

        let started = service
            .start_match(
                "solo",
                vec![ids[0], ids[0], ids[1]],
                "eu-west".to_string(),
            )
            .await
            .unwrap();
        let participants = store
            .match_repository()
            .get_participants(started.id)
            .await
            .unwrap();
        assert_eq!(participants.len(), 3);
        assert_eq!(
            participants
                .iter()
                .filter(|p| p.player_id == ids[0])
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_start_match_precondition_order() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 1).await;

        // Empty list wins over the bad match type.
        assert!(matches!(
            service
                .start_match("bogus", vec![], "us-east".to_string())
                .await,
            Err(ServiceError::InvalidInput(msg)) if msg.contains("empty")
        ));

        assert!(matches!(
            service
                .start_match("bogus", ids.clone(), "us-east".to_string())
                .await,
            Err(ServiceError::InvalidInput(msg)) if msg.contains("match type")
        ));

        let err = service
            .start_match("solo", vec![ids[0], 555, 556], "us-east".to_string())
            .await;
        assert!(matches!(
            err,
            Err(ServiceError::NotFound(msg)) if msg.contains("Expected 3 players, found 1")
        ));
        assert_eq!(store.matches().len(), 0);
    }

    #[tokio::test]
    async fn test_complete_match_updates_stats_and_points() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 3).await;

        let started = service
            .start_match("team", ids.clone(), "us-east".to_string())
            .await
            .unwrap();

        // Stats for only two of the three participants, plus one unknown
        // player id which must be silently skipped.
        let completed = service
            .complete_match(
                started.id,
                ids[0],
                120,
                vec![
                    ParticipantStats {
                        player_id: ids[0],
                        score: 1500,
                        kills: 10,
                        deaths: 2,
                    },
                    ParticipantStats {
                        player_id: ids[1],
                        score: 800,
                        kills: 4,
                        deaths: 7,
                    },
                    ParticipantStats {
                        player_id: 9999,
                        score: 1,
                        kills: 0,
                        deaths: 0,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(completed.status, MatchStatus::Completed);
        assert_eq!(completed.winner_id, Some(ids[0]));
        assert_eq!(completed.duration_seconds, Some(120));
        assert!(completed.end_time.is_some());

        let repo = store.player_repository();
        let p0 = crate::player::PlayerRepository::get_player(&repo, ids[0])
            .await
            .unwrap()
            .unwrap();
        let p1 = crate::player::PlayerRepository::get_player(&repo, ids[1])
            .await
            .unwrap()
            .unwrap();
        let p2 = crate::player::PlayerRepository::get_player(&repo, ids[2])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p0.total_points, 1500);
        assert_eq!(p1.total_points, 800);
        assert_eq!(p2.total_points, 0);

        let participants = store
            .match_repository()
            .get_participants(started.id)
            .await
            .unwrap();
        let third = participants
            .iter()
            .find(|p| p.player_id == ids[2])
            .unwrap();
        assert_eq!(third.score, 0);
        assert!(third.left_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_match_is_terminal() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 2).await;

        let started = service
            .start_match("solo", ids.clone(), "us-east".to_string())
            .await
            .unwrap();
        service
            .complete_match(started.id, ids[0], 60, vec![])
            .await
            .unwrap();

        let second = service
            .complete_match(
                started.id,
                ids[1],
                90,
                vec![ParticipantStats {
                    player_id: ids[1],
                    score: 500,
                    kills: 1,
                    deaths: 1,
                }],
            )
            .await;
        assert!(matches!(second, Err(ServiceError::Conflict(..))));

        // No state changed on the failed second attempt.
        let repo = store.player_repository();
        let p1 = crate::player::PlayerRepository::get_player(&repo, ids[1])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p1.total_points, 0);
        let again = store
            .match_repository()
            .get_match(started.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.winner_id, Some(ids[0]));
        assert_eq!(again.duration_seconds, Some(60));
    }

    #[tokio::test]
    async fn test_complete_match_not_found() {
        let store = MockStore::new();
        let service = service(&store);

        assert!(matches!(
            service.complete_match(42, 1, 10, vec![]).await,
            Err(ServiceError::NotFound(..))
        ));
    }

    #[tokio::test]
    async fn test_crash_match_ignores_current_status() {
        let store = MockStore::new();
        let service = service(&store);
        let ids = seed_players(&store, 2).await;

        let started = service
            .start_match("tournament", ids.clone(), "asia".to_string())
            .await
            .unwrap();
        service
            .complete_match(started.id, ids[0], 30, vec![])
            .await
            .unwrap();

        // Crashing an already-completed match is allowed.
        let crashed = service
            .crash_match(started.id, "Server timeout")
            .await
            .unwrap();
        assert_eq!(crashed.status, MatchStatus::Crashed);
        assert!(crashed.end_time.is_some());

        let events = store.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "server_crash");
        assert_eq!(events[0].severity, Severity::Critical);
        assert!(events[0].message.contains("Server timeout"));
        assert!(events[0].message.contains(&started.id.to_string()));
    }

    #[tokio::test]
    async fn test_crash_match_not_found() {
        let store = MockStore::new();
        let service = service(&store);

        assert!(matches!(
            service.crash_match(7, "boom").await,
            Err(ServiceError::NotFound(..))
        ));
        assert!(store.events().is_empty());
    }
}
