//! # Service Error Types
//!
//! Errors surfaced by the checkout and settlement services.

use thiserror::Error;

use bazaar_core::CoreError;
use bazaar_db::DbError;

/// Errors from the checkout pricing flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Strict coupon policy: the entered code resolved to nothing.
    #[error("Coupon code not found: '{code}'")]
    CouponNotFound { code: String },

    /// Strict coupon policy: the coupon exists but cannot be used now
    /// (inactive, outside its window, or usage limits exhausted).
    #[error("Coupon '{code}' is not applicable: {reason}")]
    CouponNotApplicable { code: String, reason: String },

    /// Structurally invalid cart input, rejected by the pricing engine.
    #[error(transparent)]
    Pricing(#[from] CoreError),

    /// Database failure while loading campaigns or resolving the coupon.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Errors from the settlement flows.
///
/// Per-escrow business failures (insufficient clawback funds, already
/// transitioned) do NOT surface here - they are recorded in the batch
/// [`crate::settlement::SettlementReport`]. This type is for failures
/// that invalidate the whole operation.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// No escrow rows exist for the order being settled.
    #[error("No escrows found for order {order_id}")]
    NoEscrowsForOrder { order_id: String },

    /// Every escrow in a non-empty batch failed to settle.
    #[error("Settlement batch for order {order_id} failed entirely: {failed} of {total} escrows")]
    BatchFailed {
        order_id: String,
        failed: usize,
        total: usize,
    },

    /// Database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Result type for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;
