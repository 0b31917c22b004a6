//! # Money Module
//!
//! Provides the `Money` type and the rounding helpers every other module
//! builds on.
//!
//! ## Whole Units Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ONE CURRENCY, NO SUB-UNITS                                             │
//! │                                                                         │
//! │  Every amount is an integer count of the store's base unit.             │
//! │  There are no cents, no fractional amounts, no floats.                  │
//! │                                                                         │
//! │  Two ways back to an integer:                                           │
//! │    percentages  → round half up     (10% of 2995 = 299.5 → 300)         │
//! │    even splits  → floor + remainder (1000 / 3 = 333 r 1)                │
//! │                                                                         │
//! │  Rounding happens once, at the point a percentage is resolved.          │
//! │  Splits never round: the remainder is handed back to the caller.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_units(1000);
//! let line = price * 3_i64;
//! assert_eq!(line.units(), 3000);
//!
//! // 10% expressed in basis points
//! assert_eq!(line.percentage_of(1000).units(), 300);
//!
//! let (base, remainder) = Money::from_units(1000).split_even(3);
//! assert_eq!((base.units(), remainder.units()), (333, 1));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in one whole (100%).
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole base-currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: amounts stored on carts and parts are never negative,
///   but variances and allocation gaps are, and they use the same type
/// - **Single field tuple struct**: serializes as a bare JSON number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 is the
    /// half-unit, so `x.5` always goes up for non-negative amounts. This is
    /// the same value as `round(amount * pct / 100)` with `pct = bps / 100`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// // 15% of 2995 = 449.25 → 449
    /// assert_eq!(Money::from_units(2995).percentage_of(1500).units(), 449);
    /// // 10% of 2995 = 299.5 → 300
    /// assert_eq!(Money::from_units(2995).percentage_of(1000).units(), 300);
    /// ```
    pub fn percentage_of(&self, bps: u32) -> Money {
        // i128 so that large amounts times 10000 cannot overflow
        let scaled = self.0 as i128 * bps as i128;
        let half = (BPS_SCALE / 2) as i128;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_SCALE as i128
        } else {
            (scaled - half) / BPS_SCALE as i128
        };
        Money(rounded as i64)
    }

    /// Calculates tax on this amount, rounded half up.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// let net = Money::from_units(1000);
    /// // 8.25% of 1000 = 82.5 → 83
    /// assert_eq!(net.calculate_tax(TaxRate::from_bps(825)).units(), 83);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage_of(rate.bps())
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Restricts this amount to `[lo, hi]`.
    ///
    /// Used to keep a discount between nothing and the whole base it
    /// applies to. If `hi < lo` the result is `lo`.
    #[inline]
    pub fn clamp_between(self, lo: Money, hi: Money) -> Money {
        if self > hi {
            hi.max(lo)
        } else if self < lo {
            lo
        } else {
            self
        }
    }

    /// Divides this amount into `parts` equal shares using floor division.
    ///
    /// Returns `(base, remainder)` with `base * parts + remainder == self`.
    /// No rounding takes place; distributing the remainder is the caller's
    /// decision.
    ///
    /// `parts` must be at least 1; a zero count is treated as 1.
    pub fn split_even(&self, parts: u32) -> (Money, Money) {
        let n = i64::from(parts.max(1));
        let base = self.0.div_euclid(n);
        let remainder = self.0 - base * n;
        (Money(base), Money(remainder))
    }

    /// Rounds this amount up to the next multiple of `step`.
    ///
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let due = Money::from_units(7350);
    /// assert_eq!(due.round_up_to(Money::from_units(1000)).units(), 8000);
    /// assert_eq!(due.round_up_to(Money::from_units(50)).units(), 7350);
    /// ```
    pub fn round_up_to(&self, step: Money) -> Money {
        if step.0 <= 0 {
            return *self;
        }
        let rem = self.0.rem_euclid(step.0);
        if rem == 0 {
            *self
        } else {
            Money(self.0 + (step.0 - rem))
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain integer display; currency symbols are a presentation concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * i64::from(qty))
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
