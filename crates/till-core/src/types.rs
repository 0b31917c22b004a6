//! # Domain Types
//!
//! Small value types shared by the pricing, cart and split modules.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Discount     │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  kind           │   │  Cash           │       │
//! │  │  825 = 8.25%    │   │  value          │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  Mobile         │       │
//! │                                              │  Other          │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   └─────────────────┘       │
//! │  │  DiscountKind   │   │  DiscountScope  │                             │
//! │  │  Percentage     │   │  Line(id)       │                             │
//! │  │  FixedAmount    │   │  Cart           │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, BPS_SCALE};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 825 bps = 8.25%
///
/// Rates are owned by the product catalog and arrive per line; a cart may
/// carry several different rates at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
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

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a payer settled their share.
///
/// Mirrors the per-method sales totals kept by a cash session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Wallet / QR / phone payment.
    Mobile,
    /// Vouchers, gift cards, anything else.
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Mobile => write!(f, "mobile"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is in basis points: 1000 = 10%.
    Percentage,
    /// `value` is a whole-unit amount taken off the base.
    FixedAmount,
}

/// A discount attached to exactly one line or to the cart.
///
/// ## Bounds
/// - `Percentage`: `0 < value <= 10000` (bps, i.e. more than 0% up to 100%)
/// - `FixedAmount`: `value >= 0`
///
/// Bounds are checked by [`Discount::validate`] whenever a discount is
/// applied or stored. [`Discount::amount_on`] never returns more than the
/// base, so a discount can make something free but never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: i64,
}

impl Discount {
    /// A percentage discount in whole percent (`percentage(10)` = 10% off).
    #[inline]
    pub const fn percentage(pct: u32) -> Self {
        Discount {
            kind: DiscountKind::Percentage,
            value: pct as i64 * 100,
        }
    }

    /// A percentage discount in basis points (`percentage_bps(1250)` = 12.5%).
    #[inline]
    pub const fn percentage_bps(bps: u32) -> Self {
        Discount {
            kind: DiscountKind::Percentage,
            value: bps as i64,
        }
    }

    /// A fixed whole-unit amount off.
    #[inline]
    pub const fn fixed(amount: Money) -> Self {
        Discount {
            kind: DiscountKind::FixedAmount,
            value: amount.units(),
        }
    }

    /// Checks the value against the bounds for its kind.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{Discount, Money};
    ///
    /// assert!(Discount::percentage(100).validate().is_ok());
    /// assert!(Discount::percentage(0).validate().is_err());
    /// assert!(Discount::percentage(101).validate().is_err());
    /// assert!(Discount::fixed(Money::zero()).validate().is_ok());
    /// assert!(Discount::fixed(Money::from_units(-1)).validate().is_err());
    /// ```
    pub fn validate(&self) -> CoreResult<()> {
        match self.kind {
            DiscountKind::Percentage if self.value <= 0 || self.value > BPS_SCALE => {
                Err(CoreError::InvalidDiscount(format!(
                    "percentage must be greater than 0% and at most 100%, got {}",
                    self
                )))
            }
            DiscountKind::FixedAmount if self.value < 0 => Err(CoreError::InvalidDiscount(
                format!("fixed amount must not be negative, got {}", self.value),
            )),
            _ => Ok(()),
        }
    }

    /// Resolves this discount against `base`, clamped to `[0, base]`.
    ///
    /// Percentages round half up. Callers validate first; an out-of-range
    /// value still cannot push the result outside the clamp.
    pub fn amount_on(&self, base: Money) -> Money {
        let raw = match self.kind {
            DiscountKind::Percentage => {
                let bps = self.value.clamp(0, BPS_SCALE) as u32;
                base.percentage_of(bps)
            }
            DiscountKind::FixedAmount => Money::from_units(self.value),
        };
        raw.clamp_between(Money::zero(), base)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiscountKind::Percentage if self.value % 100 == 0 => {
                write!(f, "{}%", self.value / 100)
            }
            DiscountKind::Percentage => {
                let (whole, fraction) = (self.value / 100, (self.value % 100).abs());
                write!(f, "{}.{:02}%", whole, fraction)
            }
            DiscountKind::FixedAmount => write!(f, "{}", self.value),
        }
    }
}

/// Which entity a discount dialog targets.
///
/// Selects between line-level and cart-level application at the boundary;
/// see [`crate::cart::Cart::apply_discount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// A single cart line, by line id.
    Line(String),
    /// The whole cart, applied after line discounts.
    Cart,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
        assert!(TaxRate::default().is_zero());
    }

    #[test]
    fn test_discount_constructors() {
        assert_eq!(Discount::percentage(10).value, 1000);
        assert_eq!(Discount::percentage_bps(1250).value, 1250);
        assert_eq!(Discount::fixed(Money::from_units(500)).kind, DiscountKind::FixedAmount);
    }

    #[test]
    fn test_discount_validation_bounds() {
        assert!(Discount::percentage_bps(1).validate().is_ok());
        assert!(Discount::percentage_bps(10_000).validate().is_ok());
        assert!(Discount::percentage_bps(10_001).validate().is_err());

        let negative = Discount {
            kind: DiscountKind::Percentage,
            value: -100,
        };
        assert!(matches!(negative.validate(), Err(CoreError::InvalidDiscount(_))));
    }

    #[test]
    fn test_discount_amount_is_clamped() {
        let base = Money::from_units(3000);
        assert_eq!(Discount::percentage(10).amount_on(base).units(), 300);
        assert_eq!(Discount::percentage(100).amount_on(base), base);
        assert_eq!(Discount::fixed(Money::from_units(5000)).amount_on(base), base);
        assert_eq!(Discount::fixed(Money::zero()).amount_on(base), Money::zero());
        assert_eq!(Discount::percentage(50).amount_on(Money::zero()), Money::zero());
    }

    #[test]
    fn test_discount_display() {
        assert_eq!(Discount::percentage(10).to_string(), "10%");
        assert_eq!(Discount::percentage_bps(1250).to_string(), "12.50%");
        assert_eq!(Discount::fixed(Money::from_units(500)).to_string(), "500");
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::Mobile).unwrap();
        assert_eq!(json, "\"mobile\"");
        let scope: DiscountScope = serde_json::from_str("\"cart\"").unwrap();
        assert_eq!(scope, DiscountScope::Cart);
    }
}
