//! # Checkout Service
//!
//! Orchestrates cart pricing: loads request-scoped campaign snapshots,
//! resolves the buyer's coupon code, and hands everything to the pure
//! pricing engine.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutService::price_cart(buyer, lines, code, override)              │
//! │                                                                         │
//! │  1. Distinct sellers in the cart                                       │
//! │        └── one CampaignRepository::active_for_seller() each            │
//! │            (snapshot: campaigns changing mid-request don't reprice)    │
//! │                                                                         │
//! │  2. Coupon code entered?                                               │
//! │        ├── resolve (trim + uppercase)                                  │
//! │        ├── count buyer's prior redemptions                             │
//! │        └── invalid code:                                               │
//! │              Lenient → price without coupon (engine zeroes it)         │
//! │              Strict  → CouponNotFound / CouponNotApplicable            │
//! │                                                                         │
//! │  3. bazaar_core::price_cart(request) - pure, no I/O                    │
//! │                                                                         │
//! │  4. Caller confirms the order, then record_coupon_redemption()         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

use bazaar_core::{
    price_cart, CartLine, Coupon, OfferOverride, PricingRequest, PricingResult,
};
use bazaar_db::Database;

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Configuration
// =============================================================================

/// How an invalid or inapplicable coupon code is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouponPolicy {
    /// Price the cart as if no code was entered. The storefront shows
    /// the priced cart with no coupon line instead of an error page.
    #[default]
    Lenient,

    /// Reject the checkout with a typed error naming the problem.
    Strict,
}

/// Checkout service configuration.
#[derive(Debug, Clone, Default)]
pub struct CheckoutConfig {
    /// Invalid-coupon handling. Default: lenient.
    pub coupon_policy: CouponPolicy,
}

// =============================================================================
// Service
// =============================================================================

/// Prices carts against the live campaign/coupon state.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    config: CheckoutConfig,
}

impl CheckoutService {
    /// Creates a checkout service with the default (lenient) config.
    pub fn new(db: Database) -> Self {
        CheckoutService {
            db,
            config: CheckoutConfig::default(),
        }
    }

    /// Creates a checkout service with an explicit config.
    pub fn with_config(db: Database, config: CheckoutConfig) -> Self {
        CheckoutService { db, config }
    }

    /// Prices a cart for the buyer.
    ///
    /// Campaigns are loaded once per distinct seller and held for the
    /// duration of the computation; the result reflects a single instant.
    pub async fn price_cart(
        &self,
        buyer_id: &str,
        lines: Vec<CartLine>,
        coupon_code: Option<&str>,
        offer_override: Option<OfferOverride>,
    ) -> CheckoutResult<PricingResult> {
        let now = Utc::now();

        let mut campaigns_by_seller: HashMap<String, Vec<bazaar_core::Campaign>> = HashMap::new();
        for line in &lines {
            if campaigns_by_seller.contains_key(&line.seller_id) {
                continue;
            }
            let campaigns = self
                .db
                .campaigns()
                .active_for_seller(&line.seller_id, now)
                .await?;
            debug!(
                seller_id = %line.seller_id,
                count = campaigns.len(),
                "Loaded campaign snapshot"
            );
            campaigns_by_seller.insert(line.seller_id.clone(), campaigns);
        }

        let (coupon, buyer_coupon_redemptions) =
            self.resolve_coupon(coupon_code, buyer_id, now).await?;

        let request = PricingRequest {
            lines,
            campaigns_by_seller,
            coupon,
            buyer_coupon_redemptions,
            offer_override,
            now,
        };

        let result = price_cart(&request)?;

        info!(
            buyer_id = %buyer_id,
            grand_total = result.grand_total_cents,
            campaign_discount = result.campaign_discount_cents,
            coupon_discount = result.coupon_discount_cents,
            sellers = result.seller_payables_cents.len(),
            "Cart priced"
        );

        Ok(result)
    }

    /// Resolves a coupon code according to the configured policy.
    ///
    /// Returns the coupon to hand to the engine plus the buyer's prior
    /// redemption count. Under the lenient policy an unusable coupon is
    /// still returned - the engine prices it to zero effect - so strict
    /// and lenient runs price identically apart from error handling.
    async fn resolve_coupon(
        &self,
        coupon_code: Option<&str>,
        buyer_id: &str,
        now: chrono::DateTime<Utc>,
    ) -> CheckoutResult<(Option<Coupon>, i64)> {
        let Some(code) = coupon_code else {
            return Ok((None, 0));
        };

        let Some(coupon) = self.db.coupons().find_by_code(code).await? else {
            debug!(code = %code, "Coupon code did not resolve");
            return match self.config.coupon_policy {
                CouponPolicy::Lenient => Ok((None, 0)),
                CouponPolicy::Strict => Err(CheckoutError::CouponNotFound {
                    code: code.trim().to_uppercase(),
                }),
            };
        };

        let redemptions = self
            .db
            .coupons()
            .redemption_count(&coupon.id, buyer_id)
            .await?;

        if self.config.coupon_policy == CouponPolicy::Strict {
            let reason = if !coupon.is_live(now) {
                Some("not currently active")
            } else if !coupon.has_global_uses_left() {
                Some("usage limit reached")
            } else if !coupon.has_user_uses_left(redemptions) {
                Some("per-user limit reached")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(CheckoutError::CouponNotApplicable {
                    code: coupon.code,
                    reason: reason.to_string(),
                });
            }
        }

        Ok((Some(coupon), redemptions))
    }

    /// Records a coupon redemption for a confirmed order.
    ///
    /// Call after the order is created, with the pricing result that
    /// shaped it. No-op when the result carries no applied coupon.
    /// Returns `true` when a redemption was recorded.
    pub async fn record_coupon_redemption(
        &self,
        result: &PricingResult,
        buyer_id: &str,
        order_id: &str,
    ) -> CheckoutResult<bool> {
        let Some(code) = &result.coupon_code else {
            return Ok(false);
        };

        let Some(coupon) = self.db.coupons().find_by_code(code).await? else {
            // Coupon deleted between pricing and confirmation; the order
            // already carries the discount, nothing to record.
            return Ok(false);
        };

        let recorded = self
            .db
            .coupons()
            .record_redemption(&coupon.id, buyer_id, order_id)
            .await?;

        info!(
            coupon_id = %coupon.id,
            order_id = %order_id,
            recorded,
            "Coupon redemption"
        );

        Ok(recorded)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{Campaign, CampaignKind, Category, CouponKind};
    use bazaar_db::DbConfig;
    use chrono::Duration;
    use uuid::Uuid;

    fn line(listing: &str, seller: &str, qty: i64, unit_cents: i64) -> CartLine {
        CartLine {
            listing_id: listing.to_string(),
            seller_id: seller.to_string(),
            quantity: qty,
            unit_price_cents: unit_cents,
            category: Category::Electronics,
        }
    }

    fn percent_campaign(seller: &str, bps: i64) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4().to_string(),
            seller_id: seller.to_string(),
            kind: CampaignKind::Percent,
            value: bps,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
            listing_ids: vec![],
            categories: vec![],
            apply_to_future_listings: false,
            created_at: now,
        }
    }

    fn order_percent_coupon(code: &str, bps: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            kind: CouponKind::OrderPercent,
            value: bps,
            min_subtotal_cents: 0,
            max_discount_cents: None,
            categories: vec![],
            usage_limit: None,
            used_count: 0,
            per_user_limit: None,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            is_active: true,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_pricing_applies_stored_campaign() {
        let db = test_db().await;
        db.campaigns()
            .insert(&percent_campaign("seller-1", 1000))
            .await
            .unwrap();

        let service = CheckoutService::new(db);
        let result = service
            .price_cart("buyer-1", vec![line("l1", "seller-1", 2, 1000)], None, None)
            .await
            .unwrap();

        // 10% off 10.00 → 9.00 per unit, two units.
        assert_eq!(result.subtotal_after_campaigns_cents, 1800);
        assert_eq!(result.campaign_discount_cents, 200);
        assert_eq!(result.grand_total_cents, 1800);
    }

    #[tokio::test]
    async fn test_lenient_policy_ignores_unknown_code() {
        let db = test_db().await;
        let service = CheckoutService::new(db);

        let result = service
            .price_cart(
                "buyer-1",
                vec![line("l1", "seller-1", 1, 1000)],
                Some("NOSUCH"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.coupon_code, None);
        assert_eq!(result.grand_total_cents, 1000);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_unknown_code() {
        let db = test_db().await;
        let service = CheckoutService::with_config(
            db,
            CheckoutConfig {
                coupon_policy: CouponPolicy::Strict,
            },
        );

        let err = service
            .price_cart(
                "buyer-1",
                vec![line("l1", "seller-1", 1, 1000)],
                Some(" nosuch "),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::CouponNotFound { code } if code == "NOSUCH"
        ));
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_exhausted_coupon() {
        let db = test_db().await;
        let mut coupon = order_percent_coupon("USEDUP", 1000);
        coupon.usage_limit = Some(1);
        coupon.used_count = 1;
        db.coupons().insert(&coupon).await.unwrap();

        let service = CheckoutService::with_config(
            db,
            CheckoutConfig {
                coupon_policy: CouponPolicy::Strict,
            },
        );

        let err = service
            .price_cart(
                "buyer-1",
                vec![line("l1", "seller-1", 1, 1000)],
                Some("USEDUP"),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CouponNotApplicable { .. }));
    }

    #[tokio::test]
    async fn test_coupon_applied_and_redemption_recorded() {
        let db = test_db().await;
        db.coupons()
            .insert(&order_percent_coupon("SAVE10", 1000))
            .await
            .unwrap();

        let service = CheckoutService::new(db.clone());
        let result = service
            .price_cart(
                "buyer-1",
                vec![line("l1", "seller-1", 1, 10000)],
                Some("save10"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(result.coupon_discount_cents, 1000);
        assert_eq!(result.grand_total_cents, 9000);

        assert!(service
            .record_coupon_redemption(&result, "buyer-1", "order-1")
            .await
            .unwrap());

        let stored = db.coupons().find_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored.used_count, 1);
    }

    #[tokio::test]
    async fn test_per_user_limit_blocks_second_use() {
        let db = test_db().await;
        let mut coupon = order_percent_coupon("ONEEACH", 1000);
        coupon.per_user_limit = Some(1);
        db.coupons().insert(&coupon).await.unwrap();

        let service = CheckoutService::new(db.clone());
        let cart = vec![line("l1", "seller-1", 1, 10000)];

        let first = service
            .price_cart("buyer-1", cart.clone(), Some("ONEEACH"), None)
            .await
            .unwrap();
        assert_eq!(first.coupon_discount_cents, 1000);
        service
            .record_coupon_redemption(&first, "buyer-1", "order-1")
            .await
            .unwrap();

        // Lenient: second use prices without the coupon.
        let second = service
            .price_cart("buyer-1", cart, Some("ONEEACH"), None)
            .await
            .unwrap();
        assert_eq!(second.coupon_discount_cents, 0);
        assert_eq!(second.coupon_code, None);
    }
}
