//! # Coupon Discount Calculator
//!
//! Computes a cart-wide coupon discount and prorates it across sellers.
//!
//! ## Why Proration Exists
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One coupon, many sellers                                               │
//! │                                                                         │
//! │  Buyer applies SAVE50 ($50.00) to a cart with two sellers:             │
//! │                                                                         │
//! │    Seller A subtotal: $180.00  ──► share = round(50 × 180/200) = 45.00 │
//! │    Seller B subtotal:  $20.00  ──► absorbs remainder: 50 − 45 =  5.00  │
//! │                                         ──────                          │
//! │  Σ shares == coupon discount EXACTLY, despite per-seller rounding.     │
//! │  Each seller's escrow amount is subtotal − share.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every arithmetic step rounds half-up to cents before reuse; skipping
//! that would break the exact-sum property above.

use std::collections::BTreeMap;

use crate::money::Money;
use crate::types::{Coupon, PricedLine};

// =============================================================================
// Discount Computation
// =============================================================================

/// Computes the discount a coupon grants over campaign-priced lines.
///
/// ## Steps
/// 1. Restricted-category lines are excluded unconditionally.
/// 2. `Type*` kinds further restrict to the coupon's eligible category
///    set (when non-empty).
/// 3. `eligible_subtotal` = Σ qualifying line subtotals; zero if ≤ 0.
/// 4. `Threshold*` kinds return zero below `min_subtotal`.
/// 5. Percent kinds take bps of the eligible subtotal (half-up); fixed
///    kinds take the face value.
/// 6. Clamp to `min(discount, eligible_subtotal, max_discount?)`,
///    floored at zero.
///
/// Business non-applicability is zero discount, never an error.
pub fn compute_discount(coupon: &Coupon, lines: &[PricedLine]) -> Money {
    let eligible_subtotal = eligible_subtotal(coupon, lines);
    if !eligible_subtotal.is_positive() {
        return Money::zero();
    }

    if coupon.kind.is_threshold() && eligible_subtotal < coupon.min_subtotal() {
        return Money::zero();
    }

    let raw = if coupon.kind.is_percent() {
        eligible_subtotal.percent_bps(coupon.value.max(0) as u32)
    } else {
        Money::from_cents(coupon.value)
    };

    let capped = match coupon.max_discount() {
        Some(cap) => raw.min(cap),
        None => raw,
    };

    capped.min(eligible_subtotal).floor_zero()
}

/// Σ subtotal-after-campaign of the lines this coupon may discount.
pub fn eligible_subtotal(coupon: &Coupon, lines: &[PricedLine]) -> Money {
    lines
        .iter()
        .filter(|line| !line.category.is_discount_restricted())
        .filter(|line| {
            !coupon.kind.is_category_scoped()
                || coupon.categories.is_empty()
                || coupon.categories.contains(&line.category)
        })
        .map(PricedLine::line_subtotal)
        .sum()
}

// =============================================================================
// Cross-Seller Allocation
// =============================================================================

/// Splits one coupon discount across sellers proportional to their share
/// of the discountable subtotal. Σ shares == `coupon_discount` exactly.
///
/// Sellers are walked in the map's deterministic key order. Every seller
/// but the last gets `round_half_up(discount × subtotal / total)`, capped
/// at the still-undistributed remainder; the last seller absorbs whatever
/// remains.
pub fn allocate_shares(
    seller_subtotals: &BTreeMap<String, Money>,
    coupon_discount: Money,
) -> BTreeMap<String, Money> {
    let total: Money = seller_subtotals.values().copied().sum();

    if !coupon_discount.is_positive() || !total.is_positive() {
        return seller_subtotals
            .keys()
            .map(|seller| (seller.clone(), Money::zero()))
            .collect();
    }

    let mut shares = BTreeMap::new();
    let mut remaining = coupon_discount;
    let last_index = seller_subtotals.len() - 1;

    for (index, (seller, subtotal)) in seller_subtotals.iter().enumerate() {
        let share = if index == last_index {
            remaining
        } else {
            coupon_discount.prorate(*subtotal, total).min(remaining)
        };
        remaining -= share;
        shares.insert(seller.clone(), share);
    }

    shares
}

/// Final per-seller payable amounts: `max(0, subtotal − share)`.
///
/// When the discount or total subtotal is not positive, payables equal
/// the subtotals unchanged.
pub fn allocate_across_sellers(
    seller_subtotals: &BTreeMap<String, Money>,
    coupon_discount: Money,
) -> BTreeMap<String, Money> {
    let shares = allocate_shares(seller_subtotals, coupon_discount);

    seller_subtotals
        .iter()
        .map(|(seller, subtotal)| {
            let share = shares.get(seller).copied().unwrap_or_default();
            (seller.clone(), (*subtotal - share).floor_zero())
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, CouponKind};
    use chrono::{Duration, Utc};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn coupon(kind: CouponKind, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: "cpn-1".to_string(),
            code: "SAVE".to_string(),
            kind,
            value,
            min_subtotal_cents: 0,
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

    fn line(seller: &str, category: Category, subtotal_cents: i64) -> PricedLine {
        PricedLine {
            listing_id: format!("listing-{}", seller),
            seller_id: seller.to_string(),
            category,
            quantity: 1,
            unit_price_cents: subtotal_cents,
            discounted_unit_price_cents: subtotal_cents,
            line_subtotal_cents: subtotal_cents,
            applied_campaign_id: None,
        }
    }

    fn subtotals(entries: &[(&str, i64)]) -> BTreeMap<String, Money> {
        entries
            .iter()
            .map(|(seller, cents)| (seller.to_string(), Money::from_cents(*cents)))
            .collect()
    }

    #[test]
    fn test_order_fixed() {
        let c = coupon(CouponKind::OrderFixed, 5000);
        let lines = [line("a", Category::Books, 18_000)];
        assert_eq!(compute_discount(&c, &lines).cents(), 5000);
    }

    #[test]
    fn test_order_percent_rounds_half_up() {
        let c = coupon(CouponKind::OrderPercent, 1000); // 10%
        let lines = [line("a", Category::Books, 18_005)];
        // $180.05 × 10% = $18.005 → $18.01
        assert_eq!(compute_discount(&c, &lines).cents(), 1801);
    }

    #[test]
    fn test_restricted_lines_excluded_from_eligible_subtotal() {
        let c = coupon(CouponKind::OrderPercent, 1000);
        let lines = [
            line("a", Category::Books, 10_000),
            line("a", Category::Vehicle, 1_000_000),
            line("a", Category::RealEstate, 5_000_000),
        ];
        assert_eq!(eligible_subtotal(&c, &lines).cents(), 10_000);
        assert_eq!(compute_discount(&c, &lines).cents(), 1000);
    }

    #[test]
    fn test_type_kind_respects_category_set() {
        let mut c = coupon(CouponKind::TypePercent, 1000);
        c.categories = vec![Category::Fashion];

        let lines = [
            line("a", Category::Fashion, 10_000),
            line("a", Category::Books, 90_000),
        ];
        assert_eq!(compute_discount(&c, &lines).cents(), 1000);

        // Empty category set on a Type* coupon: all discountable lines.
        c.categories.clear();
        assert_eq!(compute_discount(&c, &lines).cents(), 10_000);
    }

    #[test]
    fn test_threshold_below_min_is_zero() {
        let mut c = coupon(CouponKind::ThresholdFixed, 5000);
        c.min_subtotal_cents = 10_000;

        let below = [line("a", Category::Books, 9999)];
        assert_eq!(compute_discount(&c, &below), Money::zero());

        let at = [line("a", Category::Books, 10_000)];
        assert_eq!(compute_discount(&c, &at).cents(), 5000);
    }

    #[test]
    fn test_cap_and_subtotal_clamp() {
        let mut c = coupon(CouponKind::OrderFixed, 50_000);
        c.max_discount_cents = Some(3000);

        let lines = [line("a", Category::Books, 20_000)];
        assert_eq!(compute_discount(&c, &lines).cents(), 3000);

        // Without the cap, clamp at eligible subtotal.
        c.max_discount_cents = None;
        assert_eq!(compute_discount(&c, &lines).cents(), 20_000);
    }

    #[test]
    fn test_empty_cart_is_zero() {
        let c = coupon(CouponKind::OrderFixed, 5000);
        assert_eq!(compute_discount(&c, &[]), Money::zero());
    }

    #[test]
    fn test_allocation_last_seller_absorbs_remainder() {
        let subtotals = subtotals(&[("seller-a", 18_000), ("seller-b", 2000)]);
        let payables = allocate_across_sellers(&subtotals, Money::from_cents(5000));

        // A: 180 − round(50 × 180/200) = 180 − 45 = 135
        assert_eq!(payables["seller-a"].cents(), 13_500);
        // B absorbs: 200 − 50 − 135 = 15
        assert_eq!(payables["seller-b"].cents(), 1500);
    }

    #[test]
    fn test_allocation_zero_discount_leaves_subtotals() {
        let subtotals = subtotals(&[("seller-a", 18_000), ("seller-b", 2000)]);
        let payables = allocate_across_sellers(&subtotals, Money::zero());

        assert_eq!(payables["seller-a"].cents(), 18_000);
        assert_eq!(payables["seller-b"].cents(), 2000);
    }

    #[test]
    fn test_allocation_single_seller() {
        let subtotals = subtotals(&[("seller-a", 18_000)]);
        let payables = allocate_across_sellers(&subtotals, Money::from_cents(5000));
        assert_eq!(payables["seller-a"].cents(), 13_000);
    }

    #[test]
    fn test_allocation_full_discount() {
        let subtotals = subtotals(&[("seller-a", 100), ("seller-b", 100), ("seller-c", 100)]);
        let payables = allocate_across_sellers(&subtotals, Money::from_cents(300));

        for payable in payables.values() {
            assert_eq!(*payable, Money::zero());
        }
    }

    /// Randomized fixtures: shares must sum to the discount exactly, for
    /// any seller count and subtotal mix - no rounding leak.
    #[test]
    fn test_allocation_sums_exactly_randomized() {
        let mut rng = StdRng::seed_from_u64(0x5EED);

        for _ in 0..500 {
            let seller_count = rng.gen_range(1..=8);
            let mut subtotals = BTreeMap::new();
            for i in 0..seller_count {
                subtotals.insert(
                    format!("seller-{i}"),
                    Money::from_cents(rng.gen_range(1..=1_000_000)),
                );
            }
            let total: Money = subtotals.values().copied().sum();
            let discount = Money::from_cents(rng.gen_range(0..=total.cents()));

            let shares = allocate_shares(&subtotals, discount);
            let allocated: Money = shares.values().copied().sum();

            if discount.is_positive() {
                assert_eq!(allocated, discount, "leaked cents: {subtotals:?}");
            } else {
                assert_eq!(allocated, Money::zero());
            }
            for share in shares.values() {
                assert!(!share.is_negative());
            }
        }
    }
}
