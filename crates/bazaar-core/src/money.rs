//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a marketplace, a coupon prorated across sellers in floats          │
//! │  leaks cents: $50.00 split 3 ways "sums" to $49.99 or $50.01.          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every intermediate amount is rounded half-up to whole cents         │
//! │    BEFORE reuse, and the last seller in an allocation absorbs the      │
//! │    rounding remainder so the shares always sum exactly.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(10_000); // $100.00
//!
//! // 10% campaign discount (1000 basis points)
//! let discount = price.percent_bps(1000);
//! assert_eq!(discount.cents(), 1_000);
//!
//! // NEVER construct Money from a float - no such constructor exists.
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and clawbacks
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// CartLine.unit_price ──► campaign discount ──► PricedLine.line_subtotal
///                                                      │
///            coupon discount ◄── eligible subtotal ◄───┘
///                   │
///                   ▼
///       per-seller payable ──► Escrow.amount ──► wallet credit/debit
///
/// EVERY monetary value in the system flows through this type.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Clamps a (possibly negative) amount to zero or above.
    #[inline]
    pub const fn floor_zero(self) -> Money {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Calculates a percentage of this amount, rounding half-up to cents.
    ///
    /// ## Arguments
    /// * `bps` - Percentage in basis points (1 bps = 0.01%, 1000 = 10%)
    ///
    /// ## Rounding
    /// Uses the integer formula `(amount × bps + 5000) / 10000`: the +5000
    /// shifts the truncating division into round-half-up. Every discount
    /// step in the pricing chain rounds this way BEFORE the value is
    /// reused, which keeps the cross-seller allocation exact.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(18_000); // $180.00
    /// let discount = subtotal.percent_bps(1550); // 15.5%
    /// // $180.00 × 15.5% = $27.90
    /// assert_eq!(discount.cents(), 2790);
    /// ```
    pub fn percent_bps(&self, bps: u32) -> Money {
        // i128 to prevent overflow on large amounts
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Splits this amount proportionally: `self × part / whole`, rounded
    /// half-up to cents.
    ///
    /// ## Proration
    /// This is the building block of coupon allocation: one coupon
    /// discount split across sellers proportional to each seller's share
    /// of the discountable subtotal.
    ///
    /// Returns zero when `whole` is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let discount = Money::from_cents(5000);          // $50.00 coupon
    /// let seller_a = Money::from_cents(18_000);        // $180.00 subtotal
    /// let total = Money::from_cents(20_000);           // $200.00 subtotal
    /// // $50.00 × 180/200 = $45.00
    /// assert_eq!(discount.prorate(seller_a, total).cents(), 4500);
    /// ```
    pub fn prorate(&self, part: Money, whole: Money) -> Money {
        if whole.0 <= 0 {
            return Money::zero();
        }
        let numerator = self.0 as i128 * part.0 as i128;
        let denominator = whole.0 as i128;
        // round-half-up division: (2n + d) / 2d
        let cents = (2 * numerator + denominator) / (2 * denominator);
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10_000); // $100.00
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 20_000); // $200.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Callers format for display themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money values.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_percent_bps_basic() {
        // $100.00 at 10% = $10.00
        let amount = Money::from_cents(10_000);
        assert_eq!(amount.percent_bps(1000).cents(), 1000);
    }

    #[test]
    fn test_percent_bps_rounds_half_up() {
        // $10.00 at 8.25% = $0.825 → $0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percent_bps(825).cents(), 83);

        // $0.05 at 10% = $0.005 → $0.01 (half rounds up, not to even)
        let amount = Money::from_cents(5);
        assert_eq!(amount.percent_bps(1000).cents(), 1);
    }

    #[test]
    fn test_prorate() {
        let discount = Money::from_cents(5000);
        let total = Money::from_cents(20_000);

        // 180/200 share of $50.00 = $45.00
        assert_eq!(
            discount.prorate(Money::from_cents(18_000), total).cents(),
            4500
        );
        // 20/200 share of $50.00 = $5.00
        assert_eq!(
            discount.prorate(Money::from_cents(2000), total).cents(),
            500
        );
    }

    #[test]
    fn test_prorate_rounds_half_up() {
        // $1.00 × 1/3 = $0.333... → $0.33
        let amount = Money::from_cents(100);
        let share = amount.prorate(Money::from_cents(1), Money::from_cents(3));
        assert_eq!(share.cents(), 33);

        // $1.00 × 1/2 would be exact; $0.25 × 1/2 = $0.125 → $0.13
        let amount = Money::from_cents(25);
        let share = amount.prorate(Money::from_cents(1), Money::from_cents(2));
        assert_eq!(share.cents(), 13);
    }

    #[test]
    fn test_prorate_zero_whole() {
        let amount = Money::from_cents(100);
        assert_eq!(
            amount.prorate(Money::from_cents(1), Money::zero()),
            Money::zero()
        );
    }

    #[test]
    fn test_min_and_floor_zero() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(50);
        assert_eq!(a.min(b), b);
        assert_eq!(Money::from_cents(-10).floor_zero(), Money::zero());
        assert_eq!(a.floor_zero(), a);
    }

    #[test]
    fn test_sum_iterator() {
        let amounts = [Money::from_cents(100), Money::from_cents(250)];
        let total: Money = amounts.iter().copied().sum();
        assert_eq!(total.cents(), 350);
    }

    /// Documents the intentional handling of proration remainders:
    /// naive per-part rounding loses/gains cents, which is exactly why
    /// the allocation code makes the last seller absorb the remainder.
    #[test]
    fn test_prorate_remainder_documented() {
        let discount = Money::from_cents(100); // $1.00 across 3 equal parts
        let part = Money::from_cents(1);
        let whole = Money::from_cents(3);

        let rounded_share = discount.prorate(part, whole); // 33c
        let reconstructed = rounded_share * 3; // 99c

        assert_eq!(reconstructed.cents(), 99);
        assert_ne!(reconstructed, discount);
    }
}
