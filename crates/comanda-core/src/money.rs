//! # Money Module
//!
//! The `Money` type carries every monetary value in the engine: catalog
//! prices, topping prices, line subtotals, sale totals and payment amounts.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUNDING AT THE REGISTER                                               │
//! │                                                                         │
//! │  Float arithmetic:                                                      │
//! │    10.10 * 3 = 30.299999999999997  → needs round2() everywhere          │
//! │                                                                         │
//! │  Integer cents:                                                         │
//! │    1010 * 3 = 3030                  → already rounded to two decimals   │
//! │                                                                         │
//! │  subtotal == unit_price * qty + Σ topping.price * topping.qty          │
//! │  holds exactly, so the stored total never drifts from its lines.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! let burger = Money::from_cents(1000); // $10.00
//! let cheese = Money::from_cents(100);  // $1.00
//!
//! let line = burger.checked_mul_quantity(2).unwrap() + cheese;
//! assert_eq!(line.to_string(), "$21.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed so that differences (payment sum minus total) can be expressed
/// without a separate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_cents(1250); // $12.50
    /// assert_eq!(price.cents(), 1250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// Line pricing goes through this instead of `*` because both the unit
    /// price of a topping and its quantity come from the client.
    #[inline]
    pub const fn checked_mul_quantity(&self, quantity: i64) -> Option<Money> {
        match self.0.checked_mul(quantity) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Absolute difference between two amounts.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let total = Money::from_cents(2100);
    /// let paid = Money::from_cents(2099);
    /// assert_eq!(total.distance(paid), Money::from_cents(1));
    /// ```
    #[inline]
    pub fn distance(&self, other: Money) -> Money {
        Money(self.0.abs_diff(other.0).min(i64::MAX as u64) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two-decimal display with a dollar sign, as printed on the invoice.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.whole_units().abs(),
            self.cents_part()
        )
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
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
