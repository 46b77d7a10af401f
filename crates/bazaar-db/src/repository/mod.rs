//! # Repository Module
//!
//! Database repository implementations for the settlement ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Settlement service                                                    │
//! │       │                                                                 │
//! │       │  db.escrows().transition(id, Pending, Completed)               │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  EscrowRepository                                                      │
//! │  ├── create_if_absent(&self, escrow)                                   │
//! │  ├── get_by_order(&self, order_id)                                     │
//! │  └── transition(&self, id, from, to)                                   │
//! │       │                                                                 │
//! │       │  Guarded SQL statement                                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • Easy to test against an in-memory database                          │
//! │  • SQL is isolated in one place                                        │
//! │  • Retry-safety lives in one layer, not sprinkled over call sites      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`escrow::EscrowRepository`] - Escrow creation and guarded transitions
//! - [`wallet::WalletRepository`] - Wallet balances and the transaction log
//! - [`campaign::CampaignRepository`] - Campaign storage and live lookups
//! - [`coupon::CouponRepository`] - Coupon resolution and redemptions

pub mod campaign;
pub mod coupon;
pub mod escrow;
pub mod wallet;
