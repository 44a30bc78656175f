use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

use crate::{
    ServiceError, ServiceResult,
    metrics::ArcMetricsSink,
    player::{ArcPlayerRepository, PlayerId},
};

pub type TransactionId = i64;

pub const CURRENCY: &str = "USD";

/// Fixed simulated payment failure rate; there is no real gateway behind
/// this.
pub const DEFAULT_FAILURE_RATE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// A purchase record. Immutable once created; the status is decided at
/// creation time, never updated later.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub id: TransactionId,
    pub player_id: PlayerId,
    pub item_type: String,
    pub item_name: String,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

pub struct NewTransaction {
    pub player_id: PlayerId,
    pub item_type: String,
    pub item_name: String,
    pub amount: f64,
    pub status: TransactionStatus,
}

pub type ArcTransactionRepository = Arc<Box<dyn TransactionRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TransactionRepository {
    /// Inserts the row and, iff status is completed, credits the player's
    /// account_balance by `amount` in the same unit of work.
    async fn create_transaction(
        &self,
        transaction: &NewTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction>;

    async fn sum_completed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<f64>;
    async fn count_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64>;
    async fn count_failed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64>;
}

pub type ArcTransactionService = Arc<Box<dyn TransactionService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait TransactionService {
    async fn create_transaction(
        &self,
        player_id: PlayerId,
        item_type: String,
        item_name: String,
        amount: f64,
    ) -> ServiceResult<Transaction>;
}

pub struct TransactionServiceImpl {
    transaction_repository: ArcTransactionRepository,
    player_repository: ArcPlayerRepository,
    metrics: ArcMetricsSink,
    failure_rate: f64,
}

impl TransactionServiceImpl {
    pub fn new(
        transaction_repository: ArcTransactionRepository,
        player_repository: ArcPlayerRepository,
        metrics: ArcMetricsSink,
    ) -> Self {
        Self::with_failure_rate(
            transaction_repository,
            player_repository,
            metrics,
            DEFAULT_FAILURE_RATE,
        )
    }

    pub fn with_failure_rate(
        transaction_repository: ArcTransactionRepository,
        player_repository: ArcPlayerRepository,
        metrics: ArcMetricsSink,
        failure_rate: f64,
    ) -> Self {
        Self {
            transaction_repository,
            player_repository,
            metrics,
            failure_rate,
        }
    }
}

#[async_trait::async_trait]
impl TransactionService for TransactionServiceImpl {
    async fn create_transaction(
        &self,
        player_id: PlayerId,
        item_type: String,
        item_name: String,
        amount: f64,
    ) -> ServiceResult<Transaction> {
        if self.player_repository.get_player(player_id).await?.is_none() {
            return ServiceError::not_found(format!(
                "Player not found with ID: {}",
                player_id
            ));
        }

        // The outcome is drawn exactly once, before the insert, so the
        // persisted status and the balance effect can never disagree.
        let status = if rand::random::<f64>() < self.failure_rate {
            TransactionStatus::Failed
        } else {
            TransactionStatus::Completed
        };

        let created = self
            .transaction_repository
            .create_transaction(
                &NewTransaction {
                    player_id,
                    item_type: item_type.clone(),
                    item_name,
                    amount,
                    status,
                },
                Utc::now(),
            )
            .await?;

        if created.status == TransactionStatus::Completed {
            self.metrics.revenue_recorded(&item_type, amount);
        }
        info!(
            "Transaction {} for player {}: {} {} ({})",
            created.id,
            player_id,
            created.amount,
            created.currency,
            created.status.as_str()
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::NoopMetricsSink, mock::MockStore, player::NewPlayer};

    async fn seed_player(store: &MockStore) -> PlayerId {
        let repo = store.player_repository();
        crate::player::PlayerRepository::create_player(
            &repo,
            &NewPlayer {
                username: "buyer".to_string(),
                email: None,
                level: 5,
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .id
    }

    fn service(store: &MockStore, failure_rate: f64) -> TransactionServiceImpl {
        TransactionServiceImpl::with_failure_rate(
            Arc::new(Box::new(store.transaction_repository())),
            Arc::new(Box::new(store.player_repository())),
            Arc::new(Box::new(NoopMetricsSink)),
            failure_rate,
        )
    }

    #[tokio::test]
    async fn test_completed_transaction_credits_balance() {
        let store = MockStore::new();
        let player_id = seed_player(&store).await;
        let service = service(&store, 0.0);

        let tx = service
            .create_transaction(
                player_id,
                "skin".to_string(),
                "Dragon Armor".to_string(),
                9.99,
            )
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.currency, CURRENCY);

        let repo = store.player_repository();
        let player = crate::player::PlayerRepository::get_player(&repo, player_id)
            .await
            .unwrap()
            .unwrap();
        assert!((player.account_balance - 9.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_balance_unchanged() {
        let store = MockStore::new();
        let player_id = seed_player(&store).await;
        let service = service(&store, 1.0);

        let tx = service
            .create_transaction(
                player_id,
                "weapon".to_string(),
                "Legendary Sword".to_string(),
                14.99,
            )
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);

        let repo = store.player_repository();
        let player = crate::player::PlayerRepository::get_player(&repo, player_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(player.account_balance, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_player_is_rejected_without_a_row() {
        let store = MockStore::new();
        let service = service(&store, 0.0);

        let err = service
            .create_transaction(
                99999,
                "currency".to_string(),
                "1000 Gold".to_string(),
                4.99,
            )
            .await;
        assert!(matches!(err, Err(ServiceError::NotFound(..))));
        assert!(store.transactions().is_empty());
    }
}
