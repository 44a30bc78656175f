//! Shared in-memory store backing the mock repositories used by the unit
//! tests. Cross-entity effects (participant stats feeding total_points,
//! completed purchases crediting balances) go through the same store so the
//! mocks honor the same consistency rules as the real persistence layer.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::{
    ServiceError, ServiceResult,
    event::{EventRepository, NewSystemEvent, SystemEvent},
    matches::{
        Match, MatchId, MatchParticipant, MatchRepository, MatchStatus, NewMatch,
        ParticipantStats,
    },
    player::{NewPlayer, Player, PlayerId, PlayerRepository},
    transaction::{
        NewTransaction, Transaction, TransactionRepository, TransactionStatus, CURRENCY,
    },
};

#[derive(Default)]
struct StoreInner {
    players: Vec<Player>,
    matches: Vec<Match>,
    participants: Vec<MatchParticipant>,
    transactions: Vec<Transaction>,
    events: Vec<SystemEvent>,
    next_player_id: i64,
    next_match_id: i64,
    next_participant_id: i64,
    next_transaction_id: i64,
    next_event_id: i64,
}

impl StoreInner {
    fn push_event(&mut self, event: &NewSystemEvent, now: DateTime<Utc>) -> SystemEvent {
        self.next_event_id += 1;
        let created = SystemEvent {
            id: self.next_event_id,
            event_type: event.event_type.clone(),
            severity: event.severity,
            message: event.message.clone(),
            metadata: event.metadata.clone(),
            timestamp: now,
        };
        self.events.push(created.clone());
        created
    }
}

#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("mock store poisoned")
    }

    pub fn player_repository(&self) -> MockPlayerRepository {
        MockPlayerRepository {
            store: self.clone(),
        }
    }

    pub fn match_repository(&self) -> MockMatchRepository {
        MockMatchRepository {
            store: self.clone(),
        }
    }

    pub fn transaction_repository(&self) -> MockTransactionRepository {
        MockTransactionRepository {
            store: self.clone(),
        }
    }

    pub fn event_repository(&self) -> MockEventRepository {
        MockEventRepository {
            store: self.clone(),
        }
    }

    pub fn matches(&self) -> Vec<Match> {
        self.lock().matches.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    pub fn events(&self) -> Vec<SystemEvent> {
        self.lock().events.clone()
    }

    pub fn set_total_points(&self, id: PlayerId, points: i64) {
        let mut inner = self.lock();
        if let Some(player) = inner.players.iter_mut().find(|p| p.id == id) {
            player.total_points = points;
        }
    }

    pub fn set_active(&self, id: PlayerId, is_active: bool) {
        let mut inner = self.lock();
        if let Some(player) = inner.players.iter_mut().find(|p| p.id == id) {
            player.is_active = is_active;
        }
    }
}

#[derive(Clone)]
pub struct MockPlayerRepository {
    store: MockStore,
}

#[async_trait::async_trait]
impl PlayerRepository for MockPlayerRepository {
    async fn get_player(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        Ok(self
            .store
            .lock()
            .players
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn get_player_by_username(&self, username: &str) -> ServiceResult<Option<Player>> {
        Ok(self
            .store
            .lock()
            .players
            .iter()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn create_player(
        &self,
        player: &NewPlayer,
        now: DateTime<Utc>,
    ) -> ServiceResult<Player> {
        let mut inner = self.store.lock();
        inner.next_player_id += 1;
        let created = Player {
            id: inner.next_player_id,
            username: player.username.clone(),
            email: player.email.clone(),
            level: player.level,
            total_points: 0,
            account_balance: 0.0,
            created_at: now,
            last_login: Some(now),
            is_active: true,
        };
        inner.players.push(created.clone());
        Ok(created)
    }

    async fn record_login(
        &self,
        id: PlayerId,
        now: DateTime<Utc>,
        event: &NewSystemEvent,
    ) -> ServiceResult<Player> {
        let mut inner = self.store.lock();
        let Some(player) = inner.players.iter_mut().find(|p| p.id == id) else {
            return ServiceError::not_found("Player not found");
        };
        player.last_login = Some(now);
        let player = player.clone();
        inner.push_event(event, now);
        Ok(player)
    }

    async fn find_existing_ids(&self, ids: &[PlayerId]) -> ServiceResult<Vec<PlayerId>> {
        let inner = self.store.lock();
        let mut found: Vec<PlayerId> = ids
            .iter()
            .copied()
            .filter(|id| inner.players.iter().any(|p| p.id == *id))
            .collect();
        found.sort_unstable();
        found.dedup();
        Ok(found)
    }

    async fn count_players(&self) -> ServiceResult<i64> {
        Ok(self.store.lock().players.len() as i64)
    }

    async fn count_logins_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .players
            .iter()
            .filter(|p| p.last_login.is_some_and(|t| t >= cutoff))
            .count() as i64)
    }

    async fn count_created_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .players
            .iter()
            .filter(|p| p.created_at >= cutoff)
            .count() as i64)
    }

    async fn top_players(&self, limit: i64) -> ServiceResult<Vec<Player>> {
        let mut players: Vec<Player> = self
            .store
            .lock()
            .players
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        players.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.id.cmp(&b.id)));
        players.truncate(limit.max(0) as usize);
        Ok(players)
    }
}

#[derive(Clone)]
pub struct MockMatchRepository {
    store: MockStore,
}

#[async_trait::async_trait]
impl MatchRepository for MockMatchRepository {
    async fn get_match(&self, id: MatchId) -> ServiceResult<Option<Match>> {
        Ok(self
            .store
            .lock()
            .matches
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn create_match(
        &self,
        new_match: &NewMatch,
        player_ids: &[PlayerId],
        now: DateTime<Utc>,
    ) -> ServiceResult<Match> {
        let mut inner = self.store.lock();
        inner.next_match_id += 1;
        let created = Match {
            id: inner.next_match_id,
            match_type: new_match.match_type,
            status: MatchStatus::InProgress,
            start_time: now,
            end_time: None,
            winner_id: None,
            duration_seconds: None,
            server_region: new_match.server_region.clone(),
        };
        inner.matches.push(created.clone());
        for player_id in player_ids {
            inner.next_participant_id += 1;
            let participant = MatchParticipant {
                id: inner.next_participant_id,
                match_id: created.id,
                player_id: *player_id,
                score: 0,
                kills: 0,
                deaths: 0,
                joined_at: now,
                left_at: None,
            };
            inner.participants.push(participant);
        }
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
        let mut inner = self.store.lock();
        let Some(idx) = inner.matches.iter().position(|m| m.id == id) else {
            return ServiceError::not_found("Match not found");
        };
        if inner.matches[idx].status != MatchStatus::InProgress {
            return ServiceError::conflict("Match is not in progress");
        }
        inner.matches[idx].status = MatchStatus::Completed;
        inner.matches[idx].end_time = Some(now);
        inner.matches[idx].duration_seconds = Some(duration_seconds);
        inner.matches[idx].winner_id = Some(winner_id);
        let completed = inner.matches[idx].clone();

        for stat in stats {
            let mut matched = false;
            for participant in inner
                .participants
                .iter_mut()
                .filter(|p| p.match_id == id && p.player_id == stat.player_id)
            {
                participant.score = stat.score;
                participant.kills = stat.kills;
                participant.deaths = stat.deaths;
                participant.left_at = Some(now);
                matched = true;
            }
            if matched {
                if let Some(player) =
                    inner.players.iter_mut().find(|p| p.id == stat.player_id)
                {
                    player.total_points += stat.score;
                }
            }
        }
        Ok(completed)
    }

    async fn crash_match(
        &self,
        id: MatchId,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<Match> {
        let mut inner = self.store.lock();
        let Some(idx) = inner.matches.iter().position(|m| m.id == id) else {
            return ServiceError::not_found("Match not found");
        };
        inner.matches[idx].status = MatchStatus::Crashed;
        inner.matches[idx].end_time = Some(now);
        let crashed = inner.matches[idx].clone();
        inner.push_event(event, now);
        Ok(crashed)
    }

    async fn get_participants(&self, id: MatchId) -> ServiceResult<Vec<MatchParticipant>> {
        Ok(self
            .store
            .lock()
            .participants
            .iter()
            .filter(|p| p.match_id == id)
            .cloned()
            .collect())
    }

    async fn count_matches(&self) -> ServiceResult<i64> {
        Ok(self.store.lock().matches.len() as i64)
    }

    async fn count_with_status(&self, status: MatchStatus) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .matches
            .iter()
            .filter(|m| m.status == status)
            .count() as i64)
    }

    async fn count_with_status_started_since(
        &self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .matches
            .iter()
            .filter(|m| m.status == status && m.start_time >= cutoff)
            .count() as i64)
    }

    async fn avg_completed_duration(&self) -> ServiceResult<Option<f64>> {
        let inner = self.store.lock();
        let durations: Vec<i64> = inner
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .filter_map(|m| m.duration_seconds)
            .collect();
        if durations.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            durations.iter().sum::<i64>() as f64 / durations.len() as f64,
        ))
    }
}

#[derive(Clone)]
pub struct MockTransactionRepository {
    store: MockStore,
}

#[async_trait::async_trait]
impl TransactionRepository for MockTransactionRepository {
    async fn create_transaction(
        &self,
        transaction: &NewTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction> {
        let mut inner = self.store.lock();
        inner.next_transaction_id += 1;
        let created = Transaction {
            id: inner.next_transaction_id,
            player_id: transaction.player_id,
            item_type: transaction.item_type.clone(),
            item_name: transaction.item_name.clone(),
            amount: transaction.amount,
            currency: CURRENCY.to_string(),
            status: transaction.status,
            created_at: now,
        };
        inner.transactions.push(created.clone());
        if created.status == TransactionStatus::Completed {
            if let Some(player) = inner
                .players
                .iter_mut()
                .find(|p| p.id == transaction.player_id)
            {
                player.account_balance += transaction.amount;
            }
        }
        Ok(created)
    }

    async fn sum_completed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<f64> {
        Ok(self
            .store
            .lock()
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed && t.created_at >= cutoff)
            .map(|t| t.amount)
            .sum())
    }

    async fn count_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .transactions
            .iter()
            .filter(|t| t.created_at >= cutoff)
            .count() as i64)
    }

    async fn count_failed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        Ok(self
            .store
            .lock()
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Failed && t.created_at >= cutoff)
            .count() as i64)
    }
}

#[derive(Clone)]
pub struct MockEventRepository {
    store: MockStore,
}

#[async_trait::async_trait]
impl EventRepository for MockEventRepository {
    async fn create_event(
        &self,
        event: &NewSystemEvent,
        now: DateTime<Utc>,
    ) -> ServiceResult<SystemEvent> {
        Ok(self.store.lock().push_event(event, now))
    }
}
