//! # Escrow State Machine
//!
//! Per-order-item custody record with a small terminal state machine.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Escrow Lifecycle                                    │
//! │                                                                         │
//! │                 ┌──────────┐                                            │
//! │     release ┌───│ PENDING  │───┐ cancel                                 │
//! │             │   └────┬─────┘   │                                        │
//! │             ▼        │refund   ▼                                        │
//! │      ┌───────────┐   │   ┌───────────┐                                  │
//! │      │ COMPLETED │   │   │ CANCELLED │ (terminal)                       │
//! │      └─────┬─────┘   │   └───────────┘                                  │
//! │            │refund   │                                                  │
//! │            ▼         ▼                                                  │
//! │        ┌──────────────┐                                                 │
//! │        │   REFUNDED   │ (terminal)                                      │
//! │        └──────────────┘                                                 │
//! │                                                                         │
//! │  Re-invoking a transition whose target state already holds is an       │
//! │  idempotent no-op, never an error. Everything else out of a terminal   │
//! │  state is rejected.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transition table lives here as pure logic; the database layer
//! additionally guards every UPDATE with the allowed source states so
//! concurrent retries cannot double-apply a transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Status & Events
// =============================================================================

/// Custody status of one escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Funds in custody, awaiting delivery confirmation or reversal.
    Pending,
    /// Funds released to the seller.
    Completed,
    /// Custody cancelled before release; buyer refunded.
    Cancelled,
    /// Funds returned to the buyer (before or after release).
    Refunded,
}

impl EscrowStatus {
    /// No transition ever leaves a terminal state.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, EscrowStatus::Cancelled | EscrowStatus::Refunded)
    }

    /// Stable string form, matching the database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EscrowStatus::Pending => "pending",
            EscrowStatus::Completed => "completed",
            EscrowStatus::Cancelled => "cancelled",
            EscrowStatus::Refunded => "refunded",
        }
    }
}

impl Default for EscrowStatus {
    fn default() -> Self {
        EscrowStatus::Pending
    }
}

/// Settlement event applied to an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowEvent {
    /// Delivery confirmed: pay the seller.
    Release,
    /// Order cancelled before release: refund the buyer.
    Cancel,
    /// Refund requested, before or after release.
    Refund,
}

impl EscrowEvent {
    /// Stable string form for error messages and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EscrowEvent::Release => "release",
            EscrowEvent::Cancel => "cancel",
            EscrowEvent::Refund => "refund",
        }
    }
}

/// Outcome of applying an event to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event moves the escrow to a new status.
    Apply(EscrowStatus),
    /// The escrow already satisfies the event; safe to skip under retry.
    AlreadySatisfied,
    /// The state machine forbids this event from the current status.
    Rejected,
}

/// The explicit transition table.
///
/// ```text
/// current    │ release           cancel            refund
/// ───────────┼──────────────────────────────────────────────────
/// pending    │ → completed       → cancelled       → refunded
/// completed  │ no-op             rejected          → refunded
/// cancelled  │ rejected          no-op             rejected
/// refunded   │ rejected          rejected          no-op
/// ```
pub const fn transition(current: EscrowStatus, event: EscrowEvent) -> Transition {
    match (current, event) {
        (EscrowStatus::Pending, EscrowEvent::Release) => Transition::Apply(EscrowStatus::Completed),
        (EscrowStatus::Pending, EscrowEvent::Cancel) => Transition::Apply(EscrowStatus::Cancelled),
        (EscrowStatus::Pending, EscrowEvent::Refund) => Transition::Apply(EscrowStatus::Refunded),
        (EscrowStatus::Completed, EscrowEvent::Refund) => {
            Transition::Apply(EscrowStatus::Refunded)
        }

        // Idempotent repeats: the event's target state already holds.
        (EscrowStatus::Completed, EscrowEvent::Release) => Transition::AlreadySatisfied,
        (EscrowStatus::Cancelled, EscrowEvent::Cancel) => Transition::AlreadySatisfied,
        (EscrowStatus::Refunded, EscrowEvent::Refund) => Transition::AlreadySatisfied,

        _ => Transition::Rejected,
    }
}

// =============================================================================
// Escrow
// =============================================================================

/// One custody record per order item.
///
/// The amount is fixed at creation and never mutated; only the status
/// moves, and only through the settlement layer. Rows are never deleted -
/// they form the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Escrow {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Order this escrow belongs to.
    pub order_id: String,

    /// Order item this escrow custodies. UNIQUE in the database, which is
    /// what makes escrow creation idempotent under checkout retries.
    pub order_item_id: String,

    /// Seller owed on release.
    pub seller_id: String,

    /// Custodied amount in cents. Immutable after creation.
    pub amount_cents: i64,

    /// Current custody status.
    pub status: EscrowStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Escrow {
    /// Returns the custodied amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert_eq!(
            transition(EscrowStatus::Pending, EscrowEvent::Release),
            Transition::Apply(EscrowStatus::Completed)
        );
        assert_eq!(
            transition(EscrowStatus::Pending, EscrowEvent::Cancel),
            Transition::Apply(EscrowStatus::Cancelled)
        );
        assert_eq!(
            transition(EscrowStatus::Pending, EscrowEvent::Refund),
            Transition::Apply(EscrowStatus::Refunded)
        );
    }

    #[test]
    fn test_completed_can_only_refund() {
        assert_eq!(
            transition(EscrowStatus::Completed, EscrowEvent::Refund),
            Transition::Apply(EscrowStatus::Refunded)
        );
        assert_eq!(
            transition(EscrowStatus::Completed, EscrowEvent::Cancel),
            Transition::Rejected
        );
    }

    #[test]
    fn test_idempotent_repeats_are_not_errors() {
        assert_eq!(
            transition(EscrowStatus::Completed, EscrowEvent::Release),
            Transition::AlreadySatisfied
        );
        assert_eq!(
            transition(EscrowStatus::Cancelled, EscrowEvent::Cancel),
            Transition::AlreadySatisfied
        );
        assert_eq!(
            transition(EscrowStatus::Refunded, EscrowEvent::Refund),
            Transition::AlreadySatisfied
        );
    }

    #[test]
    fn test_terminal_states_reject_everything_else() {
        for event in [EscrowEvent::Release, EscrowEvent::Refund] {
            assert_eq!(
                transition(EscrowStatus::Cancelled, event),
                Transition::Rejected
            );
        }
        for event in [EscrowEvent::Release, EscrowEvent::Cancel] {
            assert_eq!(
                transition(EscrowStatus::Refunded, event),
                Transition::Rejected
            );
        }
        assert!(EscrowStatus::Cancelled.is_terminal());
        assert!(EscrowStatus::Refunded.is_terminal());
        assert!(!EscrowStatus::Pending.is_terminal());
        assert!(!EscrowStatus::Completed.is_terminal());
    }
}
