//! # bazaar-core: Pure Business Logic for Bazaar Checkout
//!
//! This crate is the **heart** of the checkout system. It contains all
//! pricing and escrow-lifecycle logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bazaar Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Order Service (external caller)                   │   │
//! │  │   checkout ──► order confirm ──► delivery / cancel / refund     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-settlement                            │   │
//! │  │    CheckoutService (pricing) + SettlementService (escrow)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │   │  money   │ │ campaign │ │  coupon  │ │     pricing      │ │   │
//! │  │   │  Money   │ │ selector │ │ discount │ │   price_cart     │ │   │
//! │  │   └──────────┘ └──────────┘ │ prorate  │ └──────────────────┘ │   │
//! │  │   ┌──────────┐ ┌──────────┐ └──────────┘                       │   │
//! │  │   │  types   │ │  escrow  │                                    │   │
//! │  │   │ Campaign │ │   FSM    │                                    │   │
//! │  │   │ Coupon   │ └──────────┘                                    │   │
//! │  │   └──────────┘                                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │        SQLite: escrows, wallets, campaigns, coupons             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Campaign, Coupon, CartLine, PricingResult...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`campaign`] - Best-campaign selection for one line
//! - [`coupon`] - Coupon discount computation and cross-seller proration
//! - [`pricing`] - The cart pricing engine
//! - [`escrow`] - Escrow custody record and its state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Structural input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same input = same output; time is a parameter
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are cents (i64), rounded
//!    half-up at every intermediate step
//! 4. **Explicit Errors**: Structural failures are typed; business
//!    non-applicability prices as zero effect, never an error
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//!
//! // $180.00 and $20.00 sellers splitting a $50.00 coupon
//! let discount = Money::from_cents(5000);
//! let total = Money::from_cents(20_000);
//! let share_a = discount.prorate(Money::from_cents(18_000), total);
//! assert_eq!(share_a.cents(), 4500);
//! // The allocation code gives the last seller the remaining $5.00,
//! // so the shares always sum to exactly $50.00.
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod campaign;
pub mod coupon;
pub mod error;
pub mod escrow;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bazaar_core::Money` instead of
// `use bazaar_core::money::Money`

pub use campaign::select_best_campaign;
pub use coupon::{allocate_across_sellers, allocate_shares, compute_discount};
pub use error::{CoreError, CoreResult, ValidationError};
pub use escrow::{transition, Escrow, EscrowEvent, EscrowStatus, Transition};
pub use money::Money;
pub use pricing::{price_cart, PricingRequest};
pub use types::*;
