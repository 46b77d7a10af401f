//! # bazaar-settlement: Checkout and Settlement Services
//!
//! The orchestration layer between the order subsystem and the pricing
//! math / settlement ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bazaar Service Layer                                │
//! │                                                                         │
//! │  Order subsystem (external)                                            │
//! │       │                                                                 │
//! │       ├── price this cart ──────────► CheckoutService                  │
//! │       │                                    │                            │
//! │       │                                    ├── bazaar-db: campaigns,   │
//! │       │                                    │   coupons, redemptions    │
//! │       │                                    └── bazaar-core::price_cart │
//! │       │                                                                 │
//! │       └── order confirmed / delivered / cancelled / returned           │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                       SettlementService                                 │
//! │                              │                                          │
//! │                              ├── bazaar-core: escrow state machine     │
//! │                              └── bazaar-db: guarded escrow + wallet    │
//! │                                  mutations                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`checkout`] - Cart pricing against live campaign/coupon state
//! - [`settlement`] - Escrow lifecycle and wallet settlement batches
//! - [`error`] - Service error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutConfig, CheckoutService, CouponPolicy};
pub use error::{CheckoutError, CheckoutResult, SettlementError, SettlementResult};
pub use settlement::{EscrowFailure, SettlementReport, SettlementService};
