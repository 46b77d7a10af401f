//! # Domain Types
//!
//! Core domain types for the checkout pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │    Campaign     │   │     Coupon      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  listing_id     │   │  seller_id      │   │  code (UPPER)   │       │
//! │  │  seller_id      │   │  kind + value   │   │  kind + value   │       │
//! │  │  quantity       │   │  validity win.  │   │  limits + cap   │       │
//! │  │  unit_price     │   │  eligibility    │   │  category set   │       │
//! │  │  category       │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │          │                                                              │
//! │          ▼ price_cart                                                   │
//! │  ┌─────────────────┐   ┌─────────────────────────────────────────┐     │
//! │  │   PricedLine    │──►│            PricingResult                │     │
//! │  │  campaign price │   │  subtotals, discounts, grand total,     │     │
//! │  │  line subtotal  │   │  per-seller payables                    │     │
//! │  └─────────────────┘   └─────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Value Convention
//! Percentages are basis points (1000 bps = 10%), fixed amounts are cents.
//! This keeps every stored number an integer; see [`crate::money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// Listing category, modeled as a closed enum rather than free-form
/// strings so eligibility checks are pattern matches, not string
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electronics,
    Fashion,
    HomeGarden,
    Sports,
    Books,
    Collectibles,
    RealEstate,
    Vehicle,
    Other,
}

impl Category {
    /// High-value categories where automatic discounting is forbidden.
    ///
    /// Real-estate and vehicle lines never receive a campaign or coupon
    /// discount, regardless of how the campaign/coupon is configured, and
    /// are excluded from every eligible-subtotal computation.
    #[inline]
    pub const fn is_discount_restricted(&self) -> bool {
        matches!(self, Category::RealEstate | Category::Vehicle)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a buyer's cart, as handed over by the cart subsystem.
///
/// Prices are frozen by the caller when the line enters the cart
/// (snapshot pattern), so pricing here never re-reads the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Listing being purchased.
    pub listing_id: String,

    /// Seller who owns the listing. Lines from different sellers are
    /// settled independently.
    pub seller_id: String,

    /// Quantity purchased. Must be positive.
    pub quantity: i64,

    /// Unit price in cents at the time the line entered the cart.
    pub unit_price_cents: i64,

    /// Listing category (drives discount eligibility).
    pub category: Category,
}

impl CartLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Campaign
// =============================================================================

/// How a campaign discounts an eligible listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    /// Percentage off the unit price; `value` is basis points.
    Percent,
    /// Fixed amount off the unit price; `value` is cents.
    Fixed,
}

/// A seller-defined, time-bounded automatic discount on eligible listings.
///
/// ## Eligibility Rules
/// ```text
/// apply_to_future_listings = true
///     └── matches every listing passing the category filter
///         (any category when the filter is empty)
///
/// apply_to_future_listings = false
///     ├── listing id in listing_ids           → match
///     ├── category in categories              → match
///     └── BOTH filters empty                  → seller-wide blanket match
///
/// Discount-restricted categories (real estate, vehicles) never match,
/// regardless of configuration.
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Seller who owns this campaign.
    pub seller_id: String,

    /// Discount kind (percent vs. fixed).
    pub kind: CampaignKind,

    /// Basis points for Percent, cents for Fixed.
    pub value: i64,

    /// Start of the validity window (inclusive).
    pub starts_at: DateTime<Utc>,

    /// End of the validity window (inclusive).
    pub ends_at: DateTime<Utc>,

    /// Whether the campaign is switched on by the seller.
    pub is_active: bool,

    /// Explicit listing allow-list. Empty means "no listing filter".
    pub listing_ids: Vec<String>,

    /// Category allow-list. Empty means "no category filter".
    pub categories: Vec<Category>,

    /// When true the campaign matches listings created after it, filtered
    /// only by category.
    pub apply_to_future_listings: bool,

    /// When the campaign was created.
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Checks the active flag and validity window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }

    /// Checks whether this campaign covers the given listing.
    ///
    /// Assumes the line category has already passed the restricted-category
    /// gate; the selector enforces that before calling.
    pub fn applies_to(&self, listing_id: &str, category: Category) -> bool {
        if self.apply_to_future_listings {
            return self.categories.is_empty() || self.categories.contains(&category);
        }

        if self.listing_ids.is_empty() && self.categories.is_empty() {
            // Seller-wide blanket campaign.
            return true;
        }

        self.listing_ids.iter().any(|id| id == listing_id)
            || self.categories.contains(&category)
    }

    /// Per-unit discount this campaign would grant on the given price,
    /// rounded half-up to cents and clamped at the unit price.
    pub fn discount_for(&self, unit_price: Money) -> Money {
        let raw = match self.kind {
            CampaignKind::Percent => unit_price.percent_bps(self.value.max(0) as u32),
            CampaignKind::Fixed => Money::from_cents(self.value),
        };
        raw.min(unit_price).floor_zero()
    }
}

/// The campaign chosen for one line, with its per-unit discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCampaign {
    pub campaign_id: String,
    pub unit_discount_cents: i64,
}

impl AppliedCampaign {
    /// Returns the per-unit discount as Money.
    #[inline]
    pub fn unit_discount(&self) -> Money {
        Money::from_cents(self.unit_discount_cents)
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// How a coupon discounts the eligible subtotal.
///
/// `Order*` kinds apply to every discountable line, `Type*` kinds restrict
/// to the coupon's category set, `Threshold*` kinds additionally require a
/// minimum eligible subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    OrderPercent,
    OrderFixed,
    TypePercent,
    TypeFixed,
    ThresholdPercent,
    ThresholdFixed,
}

impl CouponKind {
    /// Percent kinds interpret `value` as basis points.
    #[inline]
    pub const fn is_percent(&self) -> bool {
        matches!(
            self,
            CouponKind::OrderPercent | CouponKind::TypePercent | CouponKind::ThresholdPercent
        )
    }

    /// Category-scoped kinds honor the coupon's eligible category set.
    #[inline]
    pub const fn is_category_scoped(&self) -> bool {
        matches!(self, CouponKind::TypePercent | CouponKind::TypeFixed)
    }

    /// Threshold kinds require the eligible subtotal to reach min_subtotal.
    #[inline]
    pub const fn is_threshold(&self) -> bool {
        matches!(
            self,
            CouponKind::ThresholdPercent | CouponKind::ThresholdFixed
        )
    }
}

/// A buyer-entered code granting an order-level or category-scoped
/// discount, subject to usage limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Redemption code. Stored uppercase; lookup normalizes input with
    /// trim + uppercase so resolution is case-insensitive.
    pub code: String,

    /// Discount kind.
    pub kind: CouponKind,

    /// Basis points for percent kinds, cents for fixed kinds.
    pub value: i64,

    /// Minimum eligible subtotal (cents) for threshold kinds.
    pub min_subtotal_cents: i64,

    /// Optional cap on the discount amount (cents).
    pub max_discount_cents: Option<i64>,

    /// Eligible categories for Type* kinds. Empty means all discountable
    /// categories.
    pub categories: Vec<Category>,

    /// Optional global redemption limit.
    pub usage_limit: Option<i64>,

    /// Redemptions recorded so far.
    pub used_count: i64,

    /// Optional per-buyer redemption limit.
    pub per_user_limit: Option<i64>,

    /// Start of the validity window (inclusive).
    pub starts_at: DateTime<Utc>,

    /// End of the validity window (inclusive).
    pub ends_at: DateTime<Utc>,

    /// Whether the coupon is switched on.
    pub is_active: bool,
}

impl Coupon {
    /// Checks the active flag and validity window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }

    /// Checks the global usage limit against the recorded count.
    pub fn has_global_uses_left(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.used_count < limit,
            None => true,
        }
    }

    /// Checks the per-buyer limit against a caller-observed count.
    pub fn has_user_uses_left(&self, user_redemptions: i64) -> bool {
        match self.per_user_limit {
            Some(limit) => user_redemptions < limit,
            None => true,
        }
    }

    /// Returns the max discount cap as Money, if set.
    pub fn max_discount(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }

    /// Returns the minimum subtotal as Money.
    #[inline]
    pub fn min_subtotal(&self) -> Money {
        Money::from_cents(self.min_subtotal_cents)
    }
}

// =============================================================================
// Offer Override
// =============================================================================

/// The accepted output of a negotiated offer: a price/quantity that
/// supersedes the catalog price for exactly one cart line.
///
/// A negotiated, accepted price is final - the line it matches is exempt
/// from campaign discounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferOverride {
    /// The single listing this override applies to.
    pub listing_id: String,

    /// Negotiated unit price in cents.
    pub unit_price_cents: i64,

    /// Negotiated quantity.
    pub quantity: i64,
}

impl OfferOverride {
    /// Returns the negotiated unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Negotiated line total (unit price × quantity).
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents * self.quantity)
    }
}

// =============================================================================
// Priced Line
// =============================================================================

/// One cart line after campaign pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub listing_id: String,
    pub seller_id: String,
    pub category: Category,
    pub quantity: i64,
    /// Unit price before any discounting (cents).
    pub unit_price_cents: i64,
    /// Unit price after the applied campaign, if any (cents).
    pub discounted_unit_price_cents: i64,
    /// Line subtotal after campaign: discounted unit price × quantity.
    pub line_subtotal_cents: i64,
    /// Campaign that produced the discount, when one applied.
    pub applied_campaign_id: Option<String>,
}

impl PricedLine {
    /// Returns the pre-discount unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal (after campaign) as Money.
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }

    /// Campaign discount carried by this line, in cents.
    #[inline]
    pub fn campaign_discount_cents(&self) -> i64 {
        (self.unit_price_cents - self.discounted_unit_price_cents) * self.quantity
    }
}

// =============================================================================
// Pricing Result
// =============================================================================

/// The complete priced-cart result consumed by the checkout flow.
///
/// Computed on demand per checkout request and never persisted; the
/// caller uses it to build Order/OrderItem rows and coupon-redemption
/// records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResult {
    /// Σ unit price × quantity before any discounting (cents).
    pub original_subtotal_cents: i64,

    /// Σ line subtotals after campaign discounts (cents).
    pub subtotal_after_campaigns_cents: i64,

    /// Total campaign discount across all lines (cents).
    pub campaign_discount_cents: i64,

    /// Normalized coupon code that was applied, if any.
    pub coupon_code: Option<String>,

    /// Coupon discount granted (cents). Zero when no coupon applied.
    pub coupon_discount_cents: i64,

    /// Final amount the buyer pays (cents).
    pub grand_total_cents: i64,

    /// Campaign + coupon discount combined (cents).
    pub discount_total_cents: i64,

    /// Final per-seller payable amounts after coupon proration (cents).
    /// Determines each seller's eventual escrow amount. BTreeMap for a
    /// deterministic seller order.
    pub seller_payables_cents: BTreeMap<String, i64>,

    /// The priced lines, in cart order.
    pub lines: Vec<PricedLine>,
}

impl PricingResult {
    /// Zero-valued result for an empty cart.
    pub fn empty() -> Self {
        PricingResult {
            original_subtotal_cents: 0,
            subtotal_after_campaigns_cents: 0,
            campaign_discount_cents: 0,
            coupon_code: None,
            coupon_discount_cents: 0,
            grand_total_cents: 0,
            discount_total_cents: 0,
            seller_payables_cents: BTreeMap::new(),
            lines: Vec::new(),
        }
    }

    /// Returns the grand total as Money.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    /// Returns the coupon discount as Money.
    #[inline]
    pub fn coupon_discount(&self) -> Money {
        Money::from_cents(self.coupon_discount_cents)
    }
}

// =============================================================================
// Order (consumed input)
// =============================================================================

/// An order item as constructed by the checkout flow. Settlement consumes
/// these to create escrows; it never creates or mutates order rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub listing_id: String,
    /// Seller owed for this item. Empty when the seller could not be
    /// resolved; such items never get an escrow.
    pub seller_id: String,
    pub quantity: i64,
    /// Final payable for this item after all discounting (cents).
    pub total_cents: i64,
}

impl OrderItem {
    /// Returns the item total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A confirmed order handed over by the order subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub buyer_id: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Wallet Transaction Tags
// =============================================================================

/// Tag recorded on every wallet ledger row, naming why money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionType {
    /// Seller credited on escrow release.
    ItemSale,
    /// Buyer credited on cancellation or refund.
    Refund,
    /// Seller debited when a released escrow is refunded.
    RefundClawback,
}

// =============================================================================
// Unit Tests
// =============================================================================
