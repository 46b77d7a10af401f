//! # Escrow Repository
//!
//! Database operations for escrow custody records.
//!
//! ## Retry Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why every mutation here is guarded                         │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── INSERT ... ON CONFLICT(order_item_id) DO NOTHING               │
//! │         A retried checkout hits the conflict and creates nothing.      │
//! │                                                                         │
//! │  2. TRANSITION (compare-and-set)                                       │
//! │     └── UPDATE ... SET status = ?new WHERE id = ? AND status = ?from   │
//! │         rows_affected == 0 → someone already moved it; the caller      │
//! │         re-reads and consults the state machine instead of failing.    │
//! │                                                                         │
//! │  An external scheduled job may re-run any settlement batch after a     │
//! │  timeout; these guards make that harmless.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::{Escrow, EscrowStatus};

/// Repository for escrow database operations.
#[derive(Debug, Clone)]
pub struct EscrowRepository {
    pool: SqlitePool,
}

impl EscrowRepository {
    /// Creates a new EscrowRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EscrowRepository { pool }
    }

    /// Inserts a new escrow unless one already exists for the order item.
    ///
    /// ## Returns
    /// `true` when a row was created, `false` when the order item already
    /// had an escrow (retried checkout - not an error).
    pub async fn create_if_absent(&self, escrow: &Escrow) -> DbResult<bool> {
        debug!(
            escrow_id = %escrow.id,
            order_item_id = %escrow.order_item_id,
            amount = %escrow.amount_cents,
            "Inserting escrow"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO escrows (
                id, order_id, order_item_id, seller_id,
                amount_cents, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(order_item_id) DO NOTHING
            "#,
        )
        .bind(&escrow.id)
        .bind(&escrow.order_id)
        .bind(&escrow.order_item_id)
        .bind(&escrow.seller_id)
        .bind(escrow.amount_cents)
        .bind(escrow.status)
        .bind(escrow.created_at)
        .bind(escrow.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Gets an escrow by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>(
            r#"
            SELECT id, order_id, order_item_id, seller_id,
                   amount_cents, status, created_at, updated_at
            FROM escrows
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(escrow)
    }

    /// Gets all escrows for an order, in creation order.
    pub async fn get_by_order(&self, order_id: &str) -> DbResult<Vec<Escrow>> {
        let escrows = sqlx::query_as::<_, Escrow>(
            r#"
            SELECT id, order_id, order_item_id, seller_id,
                   amount_cents, status, created_at, updated_at
            FROM escrows
            WHERE order_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(escrows)
    }

    /// Gets the escrow custodying a specific order item, if any.
    pub async fn get_by_order_item(&self, order_item_id: &str) -> DbResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>(
            r#"
            SELECT id, order_id, order_item_id, seller_id,
                   amount_cents, status, created_at, updated_at
            FROM escrows
            WHERE order_item_id = ?1
            "#,
        )
        .bind(order_item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(escrow)
    }

    /// Compare-and-set status transition.
    ///
    /// Moves the escrow from `from` to `to` atomically. Returns `false`
    /// when the escrow was not in `from` (already transitioned by a
    /// concurrent or earlier run) - the caller re-reads and decides via
    /// the state machine whether that is an idempotent repeat.
    pub async fn transition(
        &self,
        escrow_id: &str,
        from: EscrowStatus,
        to: EscrowStatus,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        self.transition_with(&mut conn, escrow_id, from, to).await
    }

    /// Compare-and-set transition on a caller-supplied connection.
    ///
    /// The settlement layer runs this on the same transaction as the
    /// wallet movement it pays for, so the status flip and the money
    /// commit or roll back together.
    pub async fn transition_with(
        &self,
        conn: &mut SqliteConnection,
        escrow_id: &str,
        from: EscrowStatus,
        to: EscrowStatus,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE escrows SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(escrow_id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let moved = result.rows_affected() == 1;
        debug!(
            escrow_id = %escrow_id,
            from = from.as_str(),
            to = to.as_str(),
            moved,
            "Escrow transition"
        );

        Ok(moved)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
