//! # Pricing Engine
//!
//! Orchestrates per-line campaign pricing and coupon proration into one
//! priced-cart result.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_cart(request)                                                    │
//! │                                                                         │
//! │  empty cart ────────────────────────────────────► PricingResult::empty  │
//! │       │                                                                 │
//! │       ▼  per line                                                       │
//! │  offer override matches? ──► substitute qty/price, NO campaign          │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  select_best_campaign(...) ──► discounted unit price                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  accumulate: original subtotal, per-seller + overall post-campaign      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  coupon applicable? ──► compute_discount ──► allocate across sellers    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricingResult { totals, per-seller payables, priced lines }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-rule misses (expired campaign, coupon under threshold) never
//! fail the computation - they contribute zero effect. Only structurally
//! invalid input is rejected, and that happens at the boundary via
//! [`crate::validation`] before the calculators run.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::campaign::select_best_campaign;
use crate::coupon::{allocate_across_sellers, compute_discount};
use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Campaign, CartLine, Coupon, OfferOverride, PricedLine, PricingResult};
use crate::validation::validate_pricing_request;

// =============================================================================
// Request
// =============================================================================

/// Everything the pure engine needs to price one cart.
///
/// The service layer loads campaigns (grouped per seller, request-scoped)
/// and resolves the coupon code before building this; the engine itself
/// performs no I/O and reads no clock.
#[derive(Debug, Clone)]
pub struct PricingRequest {
    /// Cart lines, possibly spanning several sellers.
    pub lines: Vec<CartLine>,

    /// Active campaigns per seller id. Missing sellers mean no campaigns.
    pub campaigns_by_seller: HashMap<String, Vec<Campaign>>,

    /// Resolved coupon, if the buyer entered a valid-looking code.
    pub coupon: Option<Coupon>,

    /// Buyer's prior redemptions of that coupon (for the per-user limit).
    pub buyer_coupon_redemptions: i64,

    /// Negotiated price/quantity override for at most one line.
    pub offer_override: Option<OfferOverride>,

    /// Evaluation instant for validity windows.
    pub now: DateTime<Utc>,
}

// =============================================================================
// Engine
// =============================================================================

/// Prices a cart: at most one best-fit seller campaign per line, then one
/// buyer coupon prorated across sellers.
///
/// ## Errors
/// Only structurally invalid input (non-positive quantity, negative
/// price, bad override) is rejected. An inapplicable coupon yields zero
/// discount rather than failing the whole computation; callers needing a
/// hard rejection check coupon validity separately at the boundary.
pub fn price_cart(request: &PricingRequest) -> CoreResult<PricingResult> {
    if request.lines.is_empty() {
        return Ok(PricingResult::empty());
    }

    validate_pricing_request(request)?;

    let no_campaigns: Vec<Campaign> = Vec::new();
    let mut lines = Vec::with_capacity(request.lines.len());
    let mut original_subtotal = Money::zero();
    let mut subtotal_after_campaigns = Money::zero();
    let mut campaign_discount = Money::zero();
    let mut seller_subtotals: BTreeMap<String, Money> = BTreeMap::new();

    for cart_line in &request.lines {
        let priced = price_line(request, cart_line, &no_campaigns);

        original_subtotal += Money::from_cents(priced.unit_price_cents * priced.quantity);
        subtotal_after_campaigns += priced.line_subtotal();
        campaign_discount += Money::from_cents(priced.campaign_discount_cents());

        *seller_subtotals
            .entry(priced.seller_id.clone())
            .or_insert_with(Money::zero) += priced.line_subtotal();

        lines.push(priced);
    }

    let (coupon_code, coupon_discount) = match &request.coupon {
        Some(coupon) if coupon_applicable(coupon, request) => {
            let discount = compute_discount(coupon, &lines);
            (Some(coupon.code.clone()), discount)
        }
        _ => (None, Money::zero()),
    };

    let payables = allocate_across_sellers(&seller_subtotals, coupon_discount);

    Ok(PricingResult {
        original_subtotal_cents: original_subtotal.cents(),
        subtotal_after_campaigns_cents: subtotal_after_campaigns.cents(),
        campaign_discount_cents: campaign_discount.cents(),
        coupon_code: if coupon_discount.is_positive() {
            coupon_code
        } else {
            None
        },
        coupon_discount_cents: coupon_discount.cents(),
        grand_total_cents: (subtotal_after_campaigns - coupon_discount).cents(),
        discount_total_cents: (campaign_discount + coupon_discount).cents(),
        seller_payables_cents: payables
            .into_iter()
            .map(|(seller, amount)| (seller, amount.cents()))
            .collect(),
        lines,
    })
}

/// Prices a single line: offer override first, otherwise campaign
/// selection.
fn price_line(
    request: &PricingRequest,
    cart_line: &CartLine,
    no_campaigns: &[Campaign],
) -> PricedLine {
    // A negotiated, accepted price is final: substitute quantity and unit
    // price and exempt the line from campaign discounting.
    if let Some(override_) = request
        .offer_override
        .as_ref()
        .filter(|o| o.listing_id == cart_line.listing_id)
    {
        return PricedLine {
            listing_id: cart_line.listing_id.clone(),
            seller_id: cart_line.seller_id.clone(),
            category: cart_line.category,
            quantity: override_.quantity,
            unit_price_cents: override_.unit_price_cents,
            discounted_unit_price_cents: override_.unit_price_cents,
            line_subtotal_cents: override_.total_price().cents(),
            applied_campaign_id: None,
        };
    }

    let campaigns = request
        .campaigns_by_seller
        .get(&cart_line.seller_id)
        .map(Vec::as_slice)
        .unwrap_or(no_campaigns);

    let applied = select_best_campaign(
        campaigns,
        &cart_line.listing_id,
        cart_line.category,
        cart_line.unit_price(),
        request.now,
    );

    let unit_discount = applied
        .as_ref()
        .map(|a| a.unit_discount())
        .unwrap_or_default();
    let discounted_unit = cart_line.unit_price() - unit_discount;

    PricedLine {
        listing_id: cart_line.listing_id.clone(),
        seller_id: cart_line.seller_id.clone(),
        category: cart_line.category,
        quantity: cart_line.quantity,
        unit_price_cents: cart_line.unit_price_cents,
        discounted_unit_price_cents: discounted_unit.cents(),
        line_subtotal_cents: discounted_unit.multiply_quantity(cart_line.quantity).cents(),
        applied_campaign_id: applied.map(|a| a.campaign_id),
    }
}

/// Structural coupon applicability: active, inside its window, and within
/// global/per-user usage limits. Category/threshold fit is the
/// calculator's job and already yields zero when missed.
fn coupon_applicable(coupon: &Coupon, request: &PricingRequest) -> bool {
    coupon.is_live(request.now)
        && coupon.has_global_uses_left()
        && coupon.has_user_uses_left(request.buyer_coupon_redemptions)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Campaign, CampaignKind, Category, CouponKind};
    use chrono::Duration;

    fn request(lines: Vec<CartLine>) -> PricingRequest {
        PricingRequest {
            lines,
            campaigns_by_seller: HashMap::new(),
            coupon: None,
            buyer_coupon_redemptions: 0,
            offer_override: None,
            now: Utc::now(),
        }
    }

    fn cart_line(listing: &str, seller: &str, qty: i64, unit_cents: i64) -> CartLine {
        CartLine {
            listing_id: listing.to_string(),
            seller_id: seller.to_string(),
            quantity: qty,
            unit_price_cents: unit_cents,
            category: Category::Electronics,
        }
    }

    fn ten_percent_campaign(seller: &str) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: format!("camp-{seller}"),
            seller_id: seller.to_string(),
            kind: CampaignKind::Percent,
            value: 1000,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            listing_ids: Vec::new(),
            categories: Vec::new(),
            apply_to_future_listings: false,
            created_at: now - Duration::days(1),
        }
    }

    fn order_fixed_coupon(value_cents: i64, min_subtotal_cents: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "cpn-1".to_string(),
            code: "SAVE50".to_string(),
            kind: CouponKind::OrderFixed,
            value: value_cents,
            min_subtotal_cents,
            max_discount_cents: None,
            categories: Vec::new(),
            usage_limit: None,
            used_count: 0,
            per_user_limit: None,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
        }
    }

    #[test]
    fn test_empty_cart() {
        let result = price_cart(&request(Vec::new())).unwrap();
        assert_eq!(result.grand_total_cents, 0);
        assert!(result.lines.is_empty());
        assert!(result.seller_payables_cents.is_empty());
    }

    /// Scenario A: one seller, one line, $100.00 × 2, no discounts.
    #[test]
    fn test_plain_cart() {
        let result = price_cart(&request(vec![cart_line("l1", "seller-a", 2, 10_000)])).unwrap();

        assert_eq!(result.original_subtotal_cents, 20_000);
        assert_eq!(result.subtotal_after_campaigns_cents, 20_000);
        assert_eq!(result.campaign_discount_cents, 0);
        assert_eq!(result.grand_total_cents, 20_000);
        assert_eq!(result.seller_payables_cents["seller-a"], 20_000);
    }

    /// Scenario B: same line with a 10% seller campaign.
    #[test]
    fn test_campaign_discount() {
        let mut req = request(vec![cart_line("l1", "seller-a", 2, 10_000)]);
        req.campaigns_by_seller
            .insert("seller-a".to_string(), vec![ten_percent_campaign("seller-a")]);

        let result = price_cart(&req).unwrap();
        assert_eq!(result.campaign_discount_cents, 2000);
        assert_eq!(result.subtotal_after_campaigns_cents, 18_000);
        assert_eq!(result.grand_total_cents, 18_000);
        assert_eq!(
            result.lines[0].applied_campaign_id.as_deref(),
            Some("camp-seller-a")
        );
    }

    /// Scenario C: ORDER_FIXED $50 coupon (min $100) on the $180 subtotal.
    #[test]
    fn test_campaign_then_coupon() {
        let mut req = request(vec![cart_line("l1", "seller-a", 2, 10_000)]);
        req.campaigns_by_seller
            .insert("seller-a".to_string(), vec![ten_percent_campaign("seller-a")]);
        req.coupon = Some(order_fixed_coupon(5000, 10_000));

        let result = price_cart(&req).unwrap();
        assert_eq!(result.coupon_discount_cents, 5000);
        assert_eq!(result.grand_total_cents, 13_000);
        assert_eq!(result.discount_total_cents, 7000);
        assert_eq!(result.coupon_code.as_deref(), Some("SAVE50"));
    }

    /// Scenario D: two sellers, $180 + $20 post-campaign, $50 coupon.
    #[test]
    fn test_multi_seller_allocation() {
        let mut req = request(vec![
            cart_line("l1", "seller-a", 1, 18_000),
            cart_line("l2", "seller-b", 1, 2000),
        ]);
        req.coupon = Some(order_fixed_coupon(5000, 10_000));

        let result = price_cart(&req).unwrap();
        assert_eq!(result.coupon_discount_cents, 5000);
        assert_eq!(result.seller_payables_cents["seller-a"], 13_500);
        assert_eq!(result.seller_payables_cents["seller-b"], 1500);
        assert_eq!(
            result.seller_payables_cents.values().sum::<i64>(),
            result.grand_total_cents
        );
    }

    #[test]
    fn test_offer_override_supersedes_campaign() {
        let mut req = request(vec![cart_line("l1", "seller-a", 1, 10_000)]);
        req.campaigns_by_seller
            .insert("seller-a".to_string(), vec![ten_percent_campaign("seller-a")]);
        req.offer_override = Some(OfferOverride {
            listing_id: "l1".to_string(),
            unit_price_cents: 8500,
            quantity: 2,
        });

        let result = price_cart(&req).unwrap();
        let line = &result.lines[0];
        assert_eq!(line.applied_campaign_id, None);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_subtotal_cents, 17_000);
        assert_eq!(result.grand_total_cents, 17_000);
    }

    #[test]
    fn test_restricted_line_gets_no_discounts() {
        let mut vehicle = cart_line("l1", "seller-a", 1, 1_000_000);
        vehicle.category = Category::Vehicle;

        let mut req = request(vec![vehicle, cart_line("l2", "seller-a", 1, 10_000)]);
        req.campaigns_by_seller
            .insert("seller-a".to_string(), vec![ten_percent_campaign("seller-a")]);
        req.coupon = Some(order_fixed_coupon(5000, 0));

        let result = price_cart(&req).unwrap();
        // Vehicle untouched by the campaign.
        assert_eq!(result.lines[0].line_subtotal_cents, 1_000_000);
        assert_eq!(result.lines[0].applied_campaign_id, None);
        // Campaign hit only the electronics line: 10% of $100.
        assert_eq!(result.campaign_discount_cents, 1000);
        // Coupon granted against the $90 eligible subtotal only.
        assert_eq!(result.coupon_discount_cents, 5000);
    }

    #[test]
    fn test_inapplicable_coupon_is_zero_effect() {
        let mut req = request(vec![cart_line("l1", "seller-a", 1, 10_000)]);
        let mut coupon = order_fixed_coupon(5000, 0);
        coupon.is_active = false;
        req.coupon = Some(coupon);

        let result = price_cart(&req).unwrap();
        assert_eq!(result.coupon_discount_cents, 0);
        assert_eq!(result.coupon_code, None);
        assert_eq!(result.grand_total_cents, 10_000);
    }

    #[test]
    fn test_exhausted_coupon_is_zero_effect() {
        let mut req = request(vec![cart_line("l1", "seller-a", 1, 10_000)]);
        let mut coupon = order_fixed_coupon(5000, 0);
        coupon.usage_limit = Some(10);
        coupon.used_count = 10;
        req.coupon = Some(coupon);

        let result = price_cart(&req).unwrap();
        assert_eq!(result.coupon_discount_cents, 0);
    }

    #[test]
    fn test_line_subtotals_sum_to_cart_subtotal() {
        let mut req = request(vec![
            cart_line("l1", "seller-a", 3, 3333),
            cart_line("l2", "seller-b", 7, 919),
            cart_line("l3", "seller-c", 1, 12_345),
        ]);
        req.campaigns_by_seller
            .insert("seller-a".to_string(), vec![ten_percent_campaign("seller-a")]);
        req.campaigns_by_seller
            .insert("seller-b".to_string(), vec![ten_percent_campaign("seller-b")]);

        let result = price_cart(&req).unwrap();
        let summed: i64 = result.lines.iter().map(|l| l.line_subtotal_cents).sum();
        assert_eq!(summed, result.subtotal_after_campaigns_cents);
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let mut line = cart_line("l1", "seller-a", 1, 10_000);
        line.quantity = 0;
        assert!(price_cart(&request(vec![line])).is_err());
    }
}
