//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floats:                                                    │
//! │    3500 × 0.1 = 350.00000000000006  ❌                                  │
//! │                                                                         │
//! │  A checkout that sums many such lines drifts away from                  │
//! │  Σ subtotals − global discount = total_amount                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (1/100 of the currency unit)         │
//! │    Rp 3.500      → 350000                                               │
//! │    10% of 350000 → 35000 exactly                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decimals only appear at the HTTP edge, through [`Money::from_decimal`]
//! and [`Money::to_decimal`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Minor units per major unit.
const MINOR_PER_MAJOR: i64 = 100;

/// Basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (1/100 of the currency unit).
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► unit price ──► − unit discount ──► line subtotal
///                                                               │
///                        Σ line subtotals = order total ◄───────┘
///                                 │
///                                 ▼
///          − global discount = total_amount ──► change = payment − total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let price = Money::from_cents(350_000); // Rp 3.500
    /// assert_eq!(price.cents(), 350_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
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

    /// Multiplies a unit amount by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// [`multiply_quantity`](Self::multiply_quantity), or `None` past i64.
    ///
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(250).checked_multiply_quantity(4), Some(Money::from_cents(1000)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_multiply_quantity(3), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `bps / 10000` of this amount, rounded half-up to the
    /// nearest minor unit.
    ///
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// // 12.5% of 3.33 = 0.41625 → 0.42
    /// assert_eq!(Money::from_cents(333).percentage(1250).cents(), 42);
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        // i128 so large order totals times 10000 cannot overflow
        let scaled = self.0 as i128 * bps as i128;
        let rounded = (scaled + (BPS_SCALE as i128 / 2)).div_euclid(BPS_SCALE as i128);
        Money(rounded as i64)
    }

    /// Clamps this amount into `[0, ceiling]`.
    ///
    /// Every discount amount passes through here so a discount never
    /// exceeds what it is applied against.
    #[inline]
    pub fn clamp_to(self, ceiling: Money) -> Money {
        self.max(Money::zero()).min(ceiling.max(Money::zero()))
    }

    /// Subtraction that floors at zero.
    #[inline]
    pub fn saturating_sub_floor(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Converts a decimal amount in major units to Money.
    ///
    /// ## Errors
    /// - more than two fractional digits (sub-minor-unit precision)
    /// - magnitude beyond what fits in i64 minor units
    ///
    /// ```rust
    /// use kasir_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::from_decimal("field", Decimal::new(180005, 1)).unwrap(); // 18000.5
    /// assert_eq!(m.cents(), 1_800_050);
    /// assert!(Money::from_decimal("field", Decimal::new(1, 3)).is_err()); // 0.001
    /// ```
    pub fn from_decimal(field: &str, value: Decimal) -> Result<Money, ValidationError> {
        let value = value.normalize();
        if value.scale() > 2 {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "at most two decimal places are allowed".to_string(),
            });
        }

        let cents = value
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .and_then(|d| d.to_i64())
            .ok_or_else(|| ValidationError::OutOfRange {
                field: field.to_string(),
                min: i64::MIN / MINOR_PER_MAJOR,
                max: i64::MAX / MINOR_PER_MAJOR,
            })?;

        Ok(Money(cents))
    }

    /// Converts to a decimal amount in major units.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2).normalize()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented formatting: `3500.00`, `-12.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / MINOR_PER_MAJOR as u64,
            abs % MINOR_PER_MAJOR as u64
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
// Unit Tests
// =============================================================================
