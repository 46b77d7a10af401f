//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bazaar-settlement errors (separate crate)                             │
//! │  ├── CheckoutError    - Pricing/coupon resolution failures             │
//! │  └── SettlementError  - Escrow/wallet settlement failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (listing id, coupon code, etc.)
//! 3. Errors are enum variants, never String
//! 4. Business non-applicability (coupon below threshold, campaign
//!    mismatch) is NOT an error - it prices as zero effect

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent structural failures of a pricing or settlement
/// computation. Rules that merely don't apply (an expired campaign, a
/// coupon under its threshold) never produce an error - they contribute
/// zero discount instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An escrow transition was requested that the state machine forbids.
    ///
    /// ## When This Occurs
    /// - Releasing a Cancelled escrow
    /// - Cancelling a Completed escrow
    /// - Any transition out of a terminal state
    ///
    /// Note: re-running an already-satisfied transition (e.g. releasing a
    /// Completed escrow) is NOT this error - it is an idempotent no-op.
    #[error("Escrow {escrow_id} is {current_status}, cannot apply {event}")]
    InvalidEscrowTransition {
        escrow_id: String,
        current_status: String,
        event: String,
    },

    /// An offer override referenced a listing that is not in the cart.
    #[error("Offer override targets listing {listing_id} which is not in the cart")]
    OverrideListingNotInCart { listing_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet structural
/// requirements. Used for early validation before business logic runs;
/// the calculators assume well-typed input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
