//! # Validation Module
//!
//! Boundary validation for pricing and settlement input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (order service)                                       │
//! │  ├── Request deserialization / type checks                             │
//! │  └── Authentication, ownership                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - structural rules                               │
//! │  ├── quantities positive, prices non-negative                          │
//! │  └── offer override targets a line that exists                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE order_item_id on escrows                                   │
//! │  └── balance guard on wallet debits                                    │
//! │                                                                         │
//! │  The calculators themselves assume well-typed input; everything        │
//! │  structurally wrong is rejected here first.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::pricing::PricingRequest;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Scalar Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, fully negotiated-down offers)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a settlement amount in cents.
///
/// ## Rules
/// - Must be positive (> 0); zero-amount escrows and wallet moves are
///   rejected before they reach the ledger.
pub fn validate_settlement_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates an entity id (non-blank).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Structural validation of a full pricing request.
///
/// Checks every cart line and the offer override; called by the engine
/// before any calculation runs.
pub fn validate_pricing_request(request: &PricingRequest) -> Result<(), CoreError> {
    for line in &request.lines {
        validate_id("listing_id", &line.listing_id)?;
        validate_id("seller_id", &line.seller_id)?;
        validate_quantity(line.quantity)?;
        validate_price_cents(line.unit_price_cents)?;
    }

    if let Some(override_) = &request.offer_override {
        validate_id("offer listing_id", &override_.listing_id)?;
        validate_quantity(override_.quantity)?;
        validate_price_cents(override_.unit_price_cents)?;

        if !request
            .lines
            .iter()
            .any(|line| line.listing_id == override_.listing_id)
        {
            return Err(CoreError::OverrideListingNotInCart {
                listing_id: override_.listing_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
