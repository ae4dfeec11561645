//! # Money Module
//!
//! Provides the `Money` type for monetary values and `DiscountRate` for
//! percentage discounts.
//!
//! ## Whole Units Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The shop's currency has no fractional subunits.                        │
//! │                                                                         │
//! │    daily rate     100.000 ₫                                            │
//! │    × 2 units  ×   3 days       =  600.000 ₫                            │
//! │    − 10 %                      =  540.000 ₫  (rounded half-up)         │
//! │    + surcharge                 =  560.000 ₫                            │
//! │                                                                         │
//! │  Every amount is an i64 count of whole units. The discount step is     │
//! │  the only place a fraction can appear, and it is rounded exactly once  │
//! │  using integer arithmetic.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelier_core::money::Money;
//!
//! let rate = Money::from_units(100_000);
//! let line = rate.multiply_quantity(2);
//! assert_eq!(line.units(), 200_000);
//! assert_eq!(line.to_string(), "200.000 ₫");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Basis points in 100 %.
pub const BPS_PER_WHOLE: u32 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction results stay representable
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity (or a day count).
    ///
    /// Plain arithmetic: use [`Money::checked_mul`] on amounts that come
    /// from stored or user-supplied rates.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `self × qty`, or `None` if the product does not fit in i64.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Money(units)),
            None => None,
        }
    }

    /// Applies a percentage discount and rounds the result half-up to a
    /// whole unit.
    ///
    /// ## Implementation
    /// `round(amount - amount * bps / 10000)` is evaluated as
    /// `floor((amount * (10000 - bps) + 5000) / 10000)` in i128, so the
    /// fractional discount is never materialised as a float. Ties round
    /// toward positive infinity.
    ///
    /// ## Example
    /// ```rust
    /// use atelier_core::money::{DiscountRate, Money};
    ///
    /// let gross = Money::from_units(25);
    /// // 25 - 2.5 = 22.5 → 23
    /// assert_eq!(gross.discounted_half_up(DiscountRate::from_percentage(10.0)).units(), 23);
    /// ```
    pub fn discounted_half_up(&self, rate: DiscountRate) -> Money {
        let keep = BPS_PER_WHOLE.saturating_sub(rate.bps()) as i128;
        let scaled = self.0 as i128 * keep + (BPS_PER_WHOLE / 2) as i128;
        Money(scaled.div_euclid(BPS_PER_WHOLE as i128) as i64)
    }
}

/// Display with `.` thousands separators and the currency suffix.
///
/// ## Note
/// For logs and plain-text summaries. Localised front ends format on their own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} ₫", sign, grouped)
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

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount percentage represented in basis points (bps).
///
/// 1 basis point = 0.01 %, so 1000 bps = 10 %. Capped at 10000 (100 %).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points, clamped to 100 %.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > BPS_PER_WHOLE {
            DiscountRate(BPS_PER_WHOLE)
        } else {
            DiscountRate(bps)
        }
    }

    /// Creates a discount rate from a percentage, rounded to the nearest
    /// basis point and clamped to 0..=100 %.
    ///
    /// Callers that must reject out-of-range input run
    /// [`validate_discount_percent`](crate::validation::validate_discount_percent) first.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return DiscountRate(0);
        }
        DiscountRate::from_bps((pct * 100.0).round().min(BPS_PER_WHOLE as f64) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the discount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
