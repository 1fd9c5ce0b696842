//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Aging buckets are sums of balances:                                    │
//! │    current + 1-15 + 16-30 + 31-45 + >45 == total ?                      │
//! │  With floats this only holds "within tolerance".                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents)                              │
//! │    Every sum is exact, every percentage is rounded once, explicitly.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let rate = Money::from_major_minor(1250, 0); // 1,250.00 per ream
//! let line = rate * 50_i64;                    // 62,500.00
//! assert_eq!(line.cents(), 6_250_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Item.price ──► InvoiceLineItem.rate ──► line amount ──► InvoiceTotals
///                                                           │
/// Item.cost ◄── GrnLineItem.unit_cost (on confirm)          ▼
///                                              Invoice.balance_due ──► Aging
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(350_000);
    /// assert_eq!(price.cents(), 350_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(5937, 50).cents(), 593_750);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    ///
    /// For negative amounts, only the major unit should be negative.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-200).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(200).clamp_non_negative().cents(), 200);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Calculates `self × rate`, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Rate;
    ///
    /// let subtotal = Money::from_cents(593_750);   // 5,937.50
    /// let discount = subtotal.percentage(Rate::from_bps(500)); // 5%
    /// // 296.875 → 296.88
    /// assert_eq!(discount.cents(), 29_688);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        // i128 keeps large invoices from overflowing the intermediate product
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000).div_euclid(10000);
        Money::from_cents(cents as i64)
    }

    /// Tax on this amount at the given rate.
    #[inline]
    pub fn calculate_tax(&self, rate: Rate) -> Money {
        self.percentage(rate)
    }

    /// Multiplies money by a quantity. `None` on overflow.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_major(3500);
    /// assert_eq!(unit_price.checked_multiply_quantity(10), Some(Money::from_major(35_000)));
    /// assert_eq!(unit_price.checked_multiply_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts. `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Splits the amount evenly across `parts`, truncating the remainder.
    ///
    /// Returns `None` when `parts` is zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let share = Money::from_cents(1000).split_evenly(3).unwrap();
    /// assert_eq!(share.cents(), 333); // 1 cent is not allocated
    /// assert!(Money::from_cents(1000).split_evenly(0).is_none());
    /// ```
    pub fn split_evenly(&self, parts: usize) -> Option<Money> {
        if parts == 0 {
            return None;
        }
        Some(Money(self.0 / parts as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals and no currency code.
///
/// Use `LedgerConfig::format_currency` for display with a currency code.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(62343, 75).cents(), 6_234_375);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
        assert_eq!(Money::from_major(1050).cents(), 105_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::zero()), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250)];
        let by_ref: Money = amounts.iter().sum();
        let by_value: Money = amounts.into_iter().sum();
        assert_eq!(by_ref.cents(), 350);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_flat_tax_and_discount() {
        let subtotal = Money::from_major(1000);
        assert_eq!(subtotal.percentage(Rate::from_bps(1000)), Money::from_major(100));
        assert_eq!(subtotal.percentage(Rate::from_bps(500)), Money::from_major(50));
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 0.05 × 10% = 0.005 → 0.01
        assert_eq!(Money::from_cents(5).percentage(Rate::from_bps(1000)).cents(), 1);
        // 0.04 × 10% = 0.004 → 0.00
        assert_eq!(Money::from_cents(4).percentage(Rate::from_bps(1000)).cents(), 0);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert!(Money::from_cents(-1).clamp_non_negative().is_zero());
        assert_eq!(Money::from_cents(7).clamp_non_negative().cents(), 7);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs().cents(), 100);
    }

    /// Splitting a payment across invoices truncates; the lost cents are
    /// visible, not hidden in float noise.
    #[test]
    fn test_split_precision_loss_documented() {
        let amount = Money::from_cents(1000);
        let share = amount.split_evenly(3).unwrap();
        let reconstructed: Money = share * 3;

        assert_eq!(reconstructed.cents(), 999);
        assert_eq!((amount - reconstructed).cents(), 1);
    }

    #[test]
    fn test_checked_operations_report_overflow() {
        let cost = Money::from_major(100);
        assert_eq!(cost.checked_multiply_quantity(3), Some(Money::from_major(300)));
        assert_eq!(cost.checked_multiply_quantity(i64::MAX / 2), None);

        assert_eq!(cost.checked_add(cost), Some(Money::from_major(200)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }
}
