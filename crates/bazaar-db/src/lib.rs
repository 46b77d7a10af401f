//! # bazaar-db: Database Layer for Bazaar Checkout
//!
//! This crate provides database access for the checkout settlement ledger.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bazaar Checkout Data Flow                          │
//! │                                                                         │
//! │  CheckoutService / SettlementService (bazaar-settlement)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (escrow.rs,   │    │  (embedded)  │  │   │
//! │  │   │               │    │  wallet.rs,   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  campaign.rs, │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │  coupon.rs)   │    │ ...          │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (escrow, wallet, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/bazaar.db")).await?;
//!
//! // Guarded escrow release
//! let moved = db
//!     .escrows()
//!     .transition(&escrow_id, EscrowStatus::Pending, EscrowStatus::Completed)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::campaign::CampaignRepository;
pub use repository::coupon::CouponRepository;
pub use repository::escrow::EscrowRepository;
pub use repository::wallet::WalletRepository;
