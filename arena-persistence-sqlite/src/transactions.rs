use arena_domain::{
    ServiceError, ServiceResult,
    transaction::{
        NewTransaction, Transaction, TransactionRepository, TransactionStatus,
    },
};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::internal_error;

pub struct SqliteTransactionRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTransactionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn transaction_from_row(row: &SqliteRow) -> ServiceResult<Transaction> {
        let status: String = row.try_get("status").map_err(internal_error)?;
        Ok(Transaction {
            id: row.try_get("id").map_err(internal_error)?,
            player_id: row.try_get("player_id").map_err(internal_error)?,
            item_type: row.try_get("item_type").map_err(internal_error)?,
            item_name: row.try_get("item_name").map_err(internal_error)?,
            amount: row.try_get("amount").map_err(internal_error)?,
            currency: row.try_get("currency").map_err(internal_error)?,
            status: TransactionStatus::parse(&status).ok_or_else(|| {
                ServiceError::Internal(format!("unknown transaction status in store: {}", status))
            })?,
            created_at: row.try_get("created_at").map_err(internal_error)?,
        })
    }
}

#[async_trait::async_trait]
impl TransactionRepository for SqliteTransactionRepository {
    async fn create_transaction(
        &self,
        transaction: &NewTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction> {
        let mut tx = self.pool.begin().await.map_err(internal_error)?;
        let row = sqlx::query(
            "INSERT INTO transactions (player_id, item_type, item_name, amount, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(transaction.player_id)
        .bind(&transaction.item_type)
        .bind(&transaction.item_name)
        .bind(transaction.amount)
        .bind(transaction.status.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(internal_error)?;

        // Balance moves iff the row says completed; both are inside the same
        // transaction so they can never disagree.
        if transaction.status == TransactionStatus::Completed {
            sqlx::query("UPDATE players SET account_balance = account_balance + ? WHERE id = ?")
                .bind(transaction.amount)
                .bind(transaction.player_id)
                .execute(&mut *tx)
                .await
                .map_err(internal_error)?;
        }
        tx.commit().await.map_err(internal_error)?;
        Self::transaction_from_row(&row)
    }

    async fn sum_completed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<f64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0.0) FROM transactions \
             WHERE status = ? AND created_at >= ?",
        )
        .bind(TransactionStatus::Completed.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(internal_error)
    }

    async fn count_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE created_at >= ?")
            .bind(cutoff)
            .fetch_one(&self.pool)
            .await
            .map_err(internal_error)
    }

    async fn count_failed_since(&self, cutoff: DateTime<Utc>) -> ServiceResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE status = ? AND created_at >= ?",
        )
        .bind(TransactionStatus::Failed.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(internal_error)
    }
}
