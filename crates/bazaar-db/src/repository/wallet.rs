//! # Wallet Repository
//!
//! Wallet balance mutations and their audit trail.
//!
//! ## Guarded Debit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Why debit is a single guarded UPDATE                   │
//! │                                                                         │
//! │  UPDATE wallets                                                         │
//! │  SET balance_cents = balance_cents - ?amount                            │
//! │  WHERE user_id = ? AND balance_cents >= ?amount                         │
//! │                                                                         │
//! │  SQLite serializes writers, so the balance check and the subtraction   │
//! │  are atomic. rows_affected == 0 means the funds were not there -       │
//! │  mapped to DbError::InsufficientFunds, which the settlement layer      │
//! │  catches per escrow during refund clawbacks.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every credit/debit also appends a `wallet_transactions` row inside the
//! same transaction, so the ledger never disagrees with the balance.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bazaar_core::WalletTransactionType;

/// Repository for wallet balances and their transaction log.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    pool: SqlitePool,
}

impl WalletRepository {
    /// Creates a new WalletRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WalletRepository { pool }
    }

    /// Creates a zero-balance wallet for the user if none exists.
    pub async fn ensure_wallet(&self, user_id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance_cents, updated_at)
            VALUES (?1, 0, ?2)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the user's balance in cents. Missing wallet reads as zero.
    pub async fn balance(&self, user_id: &str) -> DbResult<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance_cents FROM wallets WHERE user_id = ?1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    /// Credits the user's wallet and records the ledger row.
    ///
    /// Creates the wallet on first credit. `amount_cents` must be positive.
    pub async fn credit(
        &self,
        user_id: &str,
        amount_cents: i64,
        transaction_type: WalletTransactionType,
        listing_id: Option<&str>,
    ) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.credit_with(&mut tx, user_id, amount_cents, transaction_type, listing_id)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Credit on a caller-supplied connection.
    ///
    /// Runs the balance upsert and the ledger insert without committing;
    /// the settlement layer puts these on the same transaction as the
    /// escrow transition being paid for.
    pub async fn credit_with(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        amount_cents: i64,
        transaction_type: WalletTransactionType,
        listing_id: Option<&str>,
    ) -> DbResult<()> {
        debug!(
            user_id = %user_id,
            amount = amount_cents,
            ?transaction_type,
            "Crediting wallet"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance_cents, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                balance_cents = balance_cents + excluded.balance_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (id, user_id, amount_cents, transaction_type, listing_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(amount_cents)
        .bind(transaction_type)
        .bind(listing_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Debits the user's wallet, failing if the balance is insufficient.
    ///
    /// The balance check and the subtraction are one guarded statement;
    /// zero rows affected means the funds were not there.
    pub async fn debit(
        &self,
        user_id: &str,
        amount_cents: i64,
        transaction_type: WalletTransactionType,
        listing_id: Option<&str>,
    ) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match self
            .debit_with(&mut tx, user_id, amount_cents, transaction_type, listing_id)
            .await
        {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                Ok(())
            }
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Guarded debit on a caller-supplied connection.
    ///
    /// Does not commit. An `InsufficientFunds` error writes nothing, so
    /// the caller's transaction can carry on with its other work.
    pub async fn debit_with(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
        amount_cents: i64,
        transaction_type: WalletTransactionType,
        listing_id: Option<&str>,
    ) -> DbResult<()> {
        debug!(
            user_id = %user_id,
            amount = amount_cents,
            ?transaction_type,
            "Debiting wallet"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE wallets SET
                balance_cents = balance_cents - ?2,
                updated_at = ?3
            WHERE user_id = ?1 AND balance_cents >= ?2
            "#,
        )
        .bind(user_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::insufficient_funds(user_id, amount_cents));
        }

        // Ledger rows record debits as negative amounts.
        sqlx::query(
            r#"
            INSERT INTO wallet_transactions (id, user_id, amount_cents, transaction_type, listing_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(-amount_cents)
        .bind(transaction_type)
        .bind(listing_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Returns whether the user's balance covers the amount.
    pub async fn has_sufficient_balance(&self, user_id: &str, amount_cents: i64) -> DbResult<bool> {
        Ok(self.balance(user_id).await? >= amount_cents)
    }

    /// Counts ledger rows for a user (audit/test helper).
    pub async fn transaction_count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wallet_transactions WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
