//! # Settlement Service
//!
//! Drives escrows through their lifecycle and moves wallet money to match.
//!
//! ## Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_escrows_for_order(order)                                        │
//! │      one PENDING escrow per payable item                                │
//! │      (blank seller or zero total → item skipped, no escrow)            │
//! │                                                                         │
//! │  release_escrows_to_sellers(order_id)          [delivery confirmed]     │
//! │      per escrow: PENDING → COMPLETED, credit seller (item_sale)         │
//! │                                                                         │
//! │  cancel_escrows_and_refund_buyer(order_id, buyer)  [before release]     │
//! │      per escrow: PENDING → CANCELLED                                    │
//! │      one combined buyer credit (refund) for everything cancelled        │
//! │                                                                         │
//! │  refund_from_sellers_and_escrows(order_id, buyer)  [return approved]    │
//! │  refund_escrows(escrow_ids, buyer)                 [partial return]     │
//! │      PENDING   → REFUNDED  (money never left custody)                   │
//! │      COMPLETED → debit seller (refund_clawback), then → REFUNDED        │
//! │                  insufficient seller funds → escrow STAYS COMPLETED,    │
//! │                  recorded as a failure for targeted retry               │
//! │      one combined buyer credit (refund) for everything refunded         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Semantics
//! Every flow may be re-invoked by a scheduled job. The pure transition
//! table decides what a repeat means (AlreadySatisfied → skip) and the
//! repository's compare-and-set decides who wins a race; money only moves
//! for the invocation whose compare-and-set actually flipped the row.
//!
//! Each batch runs on a single database transaction: every status flip
//! and its wallet movement commit together, so a run that dies partway
//! leaves no flipped-but-unpaid escrow behind and the retry starts from
//! an unchanged ledger. The refund clawback additionally runs under a
//! savepoint, unwinding the seller debit when the row turns out to have
//! been refunded by a concurrent run.

use serde::Serialize;
use sqlx::{Acquire, Sqlite, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use bazaar_core::{
    transition, CoreError, Escrow, EscrowEvent, EscrowStatus, Order, Transition,
    WalletTransactionType,
};
use bazaar_db::{Database, DbError};

use crate::error::{SettlementError, SettlementResult};

fn tx_err(e: sqlx::Error) -> DbError {
    DbError::TransactionFailed(e.to_string())
}

// =============================================================================
// Reports
// =============================================================================

/// One escrow that could not be settled in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowFailure {
    pub escrow_id: String,
    pub seller_id: String,
    pub amount_cents: i64,
    pub reason: String,
}

/// Aggregate outcome of one settlement batch.
///
/// A batch never stops at the first bad escrow; each row is attempted and
/// the report says what happened. `failed > 0` with `applied > 0` is a
/// partial success - the failures list tells the operator what to retry.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    /// Order the batch ran against.
    pub order_id: String,

    /// Escrows this run actually transitioned (and moved money for).
    pub applied: usize,

    /// Escrows already in the target state (idempotent repeats).
    pub skipped: usize,

    /// Escrows that could not settle; see `failures`.
    pub failed: usize,

    /// Total credited to sellers by this run (cents).
    pub seller_credited_cents: i64,

    /// Total credited to the buyer by this run (cents).
    pub buyer_credited_cents: i64,

    /// Details for every failed escrow.
    pub failures: Vec<EscrowFailure>,
}

impl SettlementReport {
    fn new(order_id: &str) -> Self {
        SettlementReport {
            order_id: order_id.to_string(),
            applied: 0,
            skipped: 0,
            failed: 0,
            seller_credited_cents: 0,
            buyer_credited_cents: 0,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, escrow: &Escrow, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push(EscrowFailure {
            escrow_id: escrow.id.clone(),
            seller_id: escrow.seller_id.clone(),
            amount_cents: escrow.amount_cents,
            reason: reason.into(),
        });
    }

    fn reject(&mut self, escrow: &Escrow, event: EscrowEvent) {
        let err = CoreError::InvalidEscrowTransition {
            escrow_id: escrow.id.clone(),
            current_status: escrow.status.as_str().to_string(),
            event: event.as_str().to_string(),
        };
        self.fail(escrow, err.to_string());
    }

    /// True when every escrow either applied or was an idempotent repeat.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn total(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

// =============================================================================
// Service
// =============================================================================

/// Escrow lifecycle and wallet settlement operations.
#[derive(Debug, Clone)]
pub struct SettlementService {
    db: Database,
}

impl SettlementService {
    /// Creates a new settlement service.
    pub fn new(db: Database) -> Self {
        SettlementService { db }
    }

    /// Creates one PENDING escrow per payable item of a confirmed order.
    ///
    /// Items with a blank seller or a non-positive total get no escrow.
    /// Re-invocation is harmless: existing escrows are left untouched.
    /// Returns all escrows for the order, including pre-existing ones.
    pub async fn create_escrows_for_order(&self, order: &Order) -> SettlementResult<Vec<Escrow>> {
        let mut created = 0usize;

        for item in &order.items {
            if item.seller_id.is_empty() {
                warn!(
                    order_item_id = %item.id,
                    "Order item has no resolvable seller, skipping escrow"
                );
                continue;
            }
            if item.total_cents <= 0 {
                continue;
            }

            let escrow = Escrow {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                order_item_id: item.id.clone(),
                seller_id: item.seller_id.clone(),
                amount_cents: item.total_cents,
                status: EscrowStatus::Pending,
                created_at: order.created_at,
                updated_at: order.created_at,
            };

            if self.db.escrows().create_if_absent(&escrow).await? {
                created += 1;
            }
        }

        info!(order_id = %order.id, created, "Escrows created");

        Ok(self.db.escrows().get_by_order(&order.id).await?)
    }

    /// Releases an order's escrows to their sellers (delivery confirmed).
    ///
    /// Each escrow that moves PENDING → COMPLETED credits its seller's
    /// wallet with an `item_sale` transaction; the flip and the credit
    /// commit together. Already-completed escrows are skipped;
    /// cancelled/refunded ones are reported as failures.
    pub async fn release_escrows_to_sellers(
        &self,
        order_id: &str,
    ) -> SettlementResult<SettlementReport> {
        let escrows = self.load_batch(order_id).await?;
        let mut report = SettlementReport::new(order_id);
        let mut tx = self.begin().await?;

        for escrow in &escrows {
            match transition(escrow.status, EscrowEvent::Release) {
                Transition::Apply(to) => {
                    let moved = self
                        .db
                        .escrows()
                        .transition_with(&mut tx, &escrow.id, escrow.status, to)
                        .await?;

                    if moved {
                        self.db
                            .wallets()
                            .credit_with(
                                &mut tx,
                                &escrow.seller_id,
                                escrow.amount_cents,
                                WalletTransactionType::ItemSale,
                                None,
                            )
                            .await?;
                        report.applied += 1;
                        report.seller_credited_cents += escrow.amount_cents;
                    } else {
                        // Lost the compare-and-set; whoever won already
                        // handled the money.
                        report.skipped += 1;
                    }
                }
                Transition::AlreadySatisfied => report.skipped += 1,
                Transition::Rejected => report.reject(escrow, EscrowEvent::Release),
            }
        }

        Self::commit(tx).await?;
        self.finish(report, "release")
    }

    /// Cancels an order's escrows before release and refunds the buyer.
    ///
    /// Each PENDING escrow moves to CANCELLED; the buyer receives one
    /// combined `refund` credit covering every escrow this run cancelled.
    pub async fn cancel_escrows_and_refund_buyer(
        &self,
        order_id: &str,
        buyer_id: &str,
    ) -> SettlementResult<SettlementReport> {
        let escrows = self.load_batch(order_id).await?;
        let mut report = SettlementReport::new(order_id);
        let mut buyer_credit = 0i64;
        let mut tx = self.begin().await?;

        for escrow in &escrows {
            match transition(escrow.status, EscrowEvent::Cancel) {
                Transition::Apply(to) => {
                    let moved = self
                        .db
                        .escrows()
                        .transition_with(&mut tx, &escrow.id, escrow.status, to)
                        .await?;

                    if moved {
                        report.applied += 1;
                        buyer_credit += escrow.amount_cents;
                    } else {
                        report.skipped += 1;
                    }
                }
                Transition::AlreadySatisfied => report.skipped += 1,
                Transition::Rejected => {
                    warn!(
                        escrow_id = %escrow.id,
                        status = escrow.status.as_str(),
                        "Escrow not cancellable"
                    );
                    report.reject(escrow, EscrowEvent::Cancel);
                }
            }
        }

        if buyer_credit > 0 {
            self.db
                .wallets()
                .credit_with(&mut tx, buyer_id, buyer_credit, WalletTransactionType::Refund, None)
                .await?;
            report.buyer_credited_cents = buyer_credit;
        }

        Self::commit(tx).await?;
        self.finish(report, "cancel")
    }

    /// Refunds an entire order back to the buyer, before or after release.
    ///
    /// PENDING escrows simply move to REFUNDED - the money never left
    /// custody. COMPLETED escrows first claw the amount back from the
    /// seller's wallet (`refund_clawback`); a seller without sufficient
    /// balance leaves that escrow COMPLETED and recorded as a failure so
    /// a later run can retry exactly the escrows that are still owed.
    /// The buyer gets one combined `refund` credit for everything this
    /// run moved to REFUNDED.
    pub async fn refund_from_sellers_and_escrows(
        &self,
        order_id: &str,
        buyer_id: &str,
    ) -> SettlementResult<SettlementReport> {
        let escrows = self.load_batch(order_id).await?;
        self.refund_batch(order_id, escrows, buyer_id).await
    }

    /// Refunds specific escrows - the partial-item refund path.
    ///
    /// Same semantics as [`Self::refund_from_sellers_and_escrows`], but
    /// only the named escrows are touched; a return approved for two of
    /// an order's five items refunds exactly those two custody records.
    pub async fn refund_escrows(
        &self,
        escrow_ids: &[String],
        buyer_id: &str,
    ) -> SettlementResult<SettlementReport> {
        let mut escrows = Vec::with_capacity(escrow_ids.len());
        for id in escrow_ids {
            let escrow = self
                .db
                .escrows()
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Escrow", id.clone()))?;
            escrows.push(escrow);
        }

        let order_id = escrows
            .first()
            .map(|e| e.order_id.clone())
            .unwrap_or_default();
        self.refund_batch(&order_id, escrows, buyer_id).await
    }

    async fn refund_batch(
        &self,
        order_id: &str,
        escrows: Vec<Escrow>,
        buyer_id: &str,
    ) -> SettlementResult<SettlementReport> {
        let mut report = SettlementReport::new(order_id);
        let mut buyer_credit = 0i64;
        let mut tx = self.begin().await?;

        for escrow in &escrows {
            match transition(escrow.status, EscrowEvent::Refund) {
                Transition::Apply(to) => {
                    if escrow.status == EscrowStatus::Completed {
                        // Money already left custody; the clawback and
                        // the flip share a savepoint so neither lands
                        // without the other.
                        let mut sp = tx.begin().await.map_err(tx_err)?;

                        match self
                            .db
                            .wallets()
                            .debit_with(
                                &mut sp,
                                &escrow.seller_id,
                                escrow.amount_cents,
                                WalletTransactionType::RefundClawback,
                                None,
                            )
                            .await
                        {
                            Ok(()) => {
                                let moved = self
                                    .db
                                    .escrows()
                                    .transition_with(&mut sp, &escrow.id, escrow.status, to)
                                    .await?;

                                if moved {
                                    sp.commit().await.map_err(tx_err)?;
                                    report.applied += 1;
                                    buyer_credit += escrow.amount_cents;
                                } else {
                                    // A concurrent run already refunded
                                    // this one; unwind the debit and let
                                    // the winner's credit stand.
                                    sp.rollback().await.map_err(tx_err)?;
                                    report.skipped += 1;
                                }
                            }
                            Err(DbError::InsufficientFunds { .. }) => {
                                sp.rollback().await.map_err(tx_err)?;
                                warn!(
                                    escrow_id = %escrow.id,
                                    seller_id = %escrow.seller_id,
                                    amount = escrow.amount_cents,
                                    "Clawback failed: insufficient seller balance"
                                );
                                report.fail(escrow, "insufficient seller balance for clawback");
                            }
                            Err(e) => return Err(e.into()),
                        }
                    } else {
                        let moved = self
                            .db
                            .escrows()
                            .transition_with(&mut tx, &escrow.id, escrow.status, to)
                            .await?;

                        if moved {
                            report.applied += 1;
                            buyer_credit += escrow.amount_cents;
                        } else {
                            report.skipped += 1;
                        }
                    }
                }
                Transition::AlreadySatisfied => report.skipped += 1,
                Transition::Rejected => report.reject(escrow, EscrowEvent::Refund),
            }
        }

        if buyer_credit > 0 {
            self.db
                .wallets()
                .credit_with(&mut tx, buyer_id, buyer_credit, WalletTransactionType::Refund, None)
                .await?;
            report.buyer_credited_cents = buyer_credit;
        }

        Self::commit(tx).await?;
        self.finish(report, "refund")
    }

    /// Opens the transaction a batch runs on.
    async fn begin(&self) -> SettlementResult<Transaction<'static, Sqlite>> {
        Ok(self.db.pool().begin().await.map_err(tx_err)?)
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> SettlementResult<()> {
        Ok(tx.commit().await.map_err(tx_err)?)
    }

    /// Loads an order's escrows, rejecting orders that never had any.
    async fn load_batch(&self, order_id: &str) -> SettlementResult<Vec<Escrow>> {
        let escrows = self.db.escrows().get_by_order(order_id).await?;
        if escrows.is_empty() {
            return Err(SettlementError::NoEscrowsForOrder {
                order_id: order_id.to_string(),
            });
        }
        Ok(escrows)
    }

    /// Finalizes a batch: a non-empty batch where every escrow failed is
    /// an error; anything else (including partial failure) is a report.
    fn finish(
        &self,
        report: SettlementReport,
        operation: &str,
    ) -> SettlementResult<SettlementReport> {
        let total = report.total();
        if report.failed == total && total > 0 {
            return Err(SettlementError::BatchFailed {
                order_id: report.order_id,
                failed: report.failed,
                total,
            });
        }

        info!(
            order_id = %report.order_id,
            operation,
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            seller_credited = report.seller_credited_cents,
            buyer_credited = report.buyer_credited_cents,
            "Settlement batch finished"
        );

        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::OrderItem;
    use bazaar_db::DbConfig;
    use chrono::Utc;

    fn order(id: &str, buyer: &str, items: Vec<(&str, &str, i64)>) -> Order {
        Order {
            id: id.to_string(),
            buyer_id: buyer.to_string(),
            items: items
                .into_iter()
                .enumerate()
                .map(|(i, (seller, listing, total))| OrderItem {
                    id: format!("{id}-item-{i}"),
                    order_id: id.to_string(),
                    listing_id: listing.to_string(),
                    seller_id: seller.to_string(),
                    quantity: 1,
                    total_cents: total,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    async fn service() -> (Database, SettlementService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (db.clone(), SettlementService::new(db))
    }

    #[tokio::test]
    async fn test_create_skips_unpayable_items() {
        let (_, svc) = service().await;

        let order = order(
            "order-1",
            "buyer-1",
            vec![("seller-1", "l1", 5000), ("", "l2", 3000), ("seller-2", "l3", 0)],
        );
        let escrows = svc.create_escrows_for_order(&order).await.unwrap();

        assert_eq!(escrows.len(), 1);
        assert_eq!(escrows[0].seller_id, "seller-1");
        assert_eq!(escrows[0].amount_cents, 5000);
        assert_eq!(escrows[0].status, EscrowStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_is_retry_safe() {
        let (_, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);

        let first = svc.create_escrows_for_order(&order).await.unwrap();
        let second = svc.create_escrows_for_order(&order).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_release_credits_each_seller() {
        let (db, svc) = service().await;
        let order = order(
            "order-1",
            "buyer-1",
            vec![("seller-1", "l1", 5000), ("seller-2", "l2", 3000)],
        );
        svc.create_escrows_for_order(&order).await.unwrap();

        let report = svc.release_escrows_to_sellers("order-1").await.unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(report.seller_credited_cents, 8000);
        assert!(report.is_clean());

        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 5000);
        assert_eq!(db.wallets().balance("seller-2").await.unwrap(), 3000);
    }

    #[tokio::test]
    async fn test_release_twice_pays_once() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        svc.create_escrows_for_order(&order).await.unwrap();

        svc.release_escrows_to_sellers("order-1").await.unwrap();
        let replay = svc.release_escrows_to_sellers("order-1").await.unwrap();

        assert_eq!(replay.applied, 0);
        assert_eq!(replay.skipped, 1);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_release_run_dying_before_commit_loses_nothing() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 7500)]);
        let escrows = svc.create_escrows_for_order(&order).await.unwrap();

        // A release run that dies before its commit: the status flip and
        // the payout were on the same transaction, so both unwind.
        let mut tx = db.pool().begin().await.unwrap();
        assert!(db
            .escrows()
            .transition_with(&mut tx, &escrows[0].id, EscrowStatus::Pending, EscrowStatus::Completed)
            .await
            .unwrap());
        db.wallets()
            .credit_with(&mut tx, "seller-1", 7500, WalletTransactionType::ItemSale, None)
            .await
            .unwrap();
        drop(tx);

        let stored = db.escrows().get_by_id(&escrows[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, EscrowStatus::Pending);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 0);

        // The retry therefore still owes the seller and pays in full.
        let retry = svc.release_escrows_to_sellers("order-1").await.unwrap();
        assert!(retry.is_clean());
        assert_eq!(retry.applied, 1);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 7500);
    }

    #[tokio::test]
    async fn test_cancel_run_dying_before_commit_still_refunds_on_retry() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        let escrows = svc.create_escrows_for_order(&order).await.unwrap();

        // A cancel run that dies before crediting the buyer: the flip
        // unwinds with the transaction instead of stranding the refund.
        let mut tx = db.pool().begin().await.unwrap();
        assert!(db
            .escrows()
            .transition_with(&mut tx, &escrows[0].id, EscrowStatus::Pending, EscrowStatus::Cancelled)
            .await
            .unwrap());
        drop(tx);

        let retry = svc
            .cancel_escrows_and_refund_buyer("order-1", "buyer-1")
            .await
            .unwrap();
        assert!(retry.is_clean());
        assert_eq!(retry.applied, 1);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_cancel_refunds_buyer_in_one_credit() {
        let (db, svc) = service().await;
        let order = order(
            "order-1",
            "buyer-1",
            vec![("seller-1", "l1", 5000), ("seller-2", "l2", 3000)],
        );
        svc.create_escrows_for_order(&order).await.unwrap();

        let report = svc
            .cancel_escrows_and_refund_buyer("order-1", "buyer-1")
            .await
            .unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.buyer_credited_cents, 8000);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 8000);
        // Single combined credit, not one per escrow.
        assert_eq!(db.wallets().transaction_count("buyer-1").await.unwrap(), 1);
        // Sellers never saw the money.
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refund_after_release_claws_back_from_seller() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        svc.create_escrows_for_order(&order).await.unwrap();
        svc.release_escrows_to_sellers("order-1").await.unwrap();

        let report = svc
            .refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.buyer_credited_cents, 5000);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 0);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 5000);
    }

    #[tokio::test]
    async fn test_refund_before_release_skips_clawback() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        svc.create_escrows_for_order(&order).await.unwrap();

        let report = svc
            .refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 5000);
        // No seller ledger activity at all.
        assert_eq!(db.wallets().transaction_count("seller-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refund_twice_credits_buyer_once() {
        let (db, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        svc.create_escrows_for_order(&order).await.unwrap();
        svc.release_escrows_to_sellers("order-1").await.unwrap();

        svc.refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();
        let replay = svc
            .refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();

        assert_eq!(replay.applied, 0);
        assert_eq!(replay.skipped, 1);
        assert_eq!(replay.buyer_credited_cents, 0);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 5000);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broke_seller_leaves_escrow_completed() {
        let (db, svc) = service().await;
        let order = order(
            "order-1",
            "buyer-1",
            vec![("seller-1", "l1", 5000), ("seller-2", "l2", 3000)],
        );
        svc.create_escrows_for_order(&order).await.unwrap();
        svc.release_escrows_to_sellers("order-1").await.unwrap();

        // seller-1 withdraws everything before the refund lands.
        db.wallets()
            .debit("seller-1", 5000, WalletTransactionType::RefundClawback, None)
            .await
            .unwrap();

        let report = svc
            .refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();

        // seller-2's escrow refunds; seller-1's stays owed.
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.buyer_credited_cents, 3000);
        assert_eq!(report.failures[0].seller_id, "seller-1");

        let escrows = db.escrows().get_by_order("order-1").await.unwrap();
        let stuck = escrows.iter().find(|e| e.seller_id == "seller-1").unwrap();
        assert_eq!(stuck.status, EscrowStatus::Completed);

        // Once the seller is funded again, a retry settles only the
        // remaining escrow.
        db.wallets()
            .credit("seller-1", 5000, WalletTransactionType::ItemSale, None)
            .await
            .unwrap();
        let retry = svc
            .refund_from_sellers_and_escrows("order-1", "buyer-1")
            .await
            .unwrap();
        assert_eq!(retry.applied, 1);
        assert_eq!(retry.skipped, 1);
        assert_eq!(retry.buyer_credited_cents, 5000);
        assert_eq!(db.wallets().balance("buyer-1").await.unwrap(), 8000);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_refund_touches_only_named_escrows() {
        let (db, svc) = service().await;
        let order = order(
            "order-1",
            "buyer-1",
            vec![("seller-1", "l1", 5000), ("seller-2", "l2", 3000)],
        );
        let escrows = svc.create_escrows_for_order(&order).await.unwrap();
        svc.release_escrows_to_sellers("order-1").await.unwrap();

        let returned = escrows
            .iter()
            .find(|e| e.seller_id == "seller-2")
            .unwrap()
            .id
            .clone();
        let report = svc.refund_escrows(&[returned], "buyer-1").await.unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.buyer_credited_cents, 3000);
        assert_eq!(db.wallets().balance("seller-1").await.unwrap(), 5000);
        assert_eq!(db.wallets().balance("seller-2").await.unwrap(), 0);

        let rows = db.escrows().get_by_order("order-1").await.unwrap();
        let untouched = rows.iter().find(|e| e.seller_id == "seller-1").unwrap();
        assert_eq!(untouched.status, EscrowStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancel_after_release_is_rejected() {
        let (_, svc) = service().await;
        let order = order("order-1", "buyer-1", vec![("seller-1", "l1", 5000)]);
        svc.create_escrows_for_order(&order).await.unwrap();
        svc.release_escrows_to_sellers("order-1").await.unwrap();

        // Every escrow in the batch fails → hard error, not a report.
        let err = svc
            .cancel_escrows_and_refund_buyer("order-1", "buyer-1")
            .await
            .unwrap_err();
        assert!(matches!(err, SettlementError::BatchFailed { .. }));
    }

    #[tokio::test]
    async fn test_unknown_order_is_an_error() {
        let (_, svc) = service().await;

        let err = svc.release_escrows_to_sellers("nope").await.unwrap_err();
        assert!(matches!(err, SettlementError::NoEscrowsForOrder { .. }));
    }
}
