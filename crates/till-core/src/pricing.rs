//! # Line Pricing
//!
//! Prices a single cart line: unit price plus supplements, times quantity,
//! less an optional line discount, plus tax at the line's own rate.
//!
//! ## Line Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_price_with_supplements = unit_price + Σ supplement.price          │
//! │  gross_total                 = unit_price_with_supplements × quantity   │
//! │  discount_amount             = discount resolved on gross_total,        │
//! │                                clamped to [0, gross_total]              │
//! │  net_total                   = gross_total − discount_amount  (≥ 0)     │
//! │  tax_amount                  = net_total × tax_rate (half up)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, TaxRate};
use crate::validation::{
    validate_amount, validate_line_id, validate_quantity, validate_tax_rate_bps,
};
use crate::MAX_ITEM_QUANTITY;

/// A paid add-on to a line (extra topping, extra shot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Supplement {
    pub name: String,
    pub price: Money,
}

impl Supplement {
    pub fn new(name: impl Into<String>, price: Money) -> CoreResult<Self> {
        validate_amount("supplement price", price.units())?;
        Ok(Supplement {
            name: name.into(),
            price,
        })
    }
}

/// One product entry in a cart.
///
/// ## Design Notes
/// - `unit_price` and `tax_rate` are frozen from the product catalog when the
///   line is created; catalog changes afterwards do not reprice the line
/// - `discount` is owned by this line alone and is validated on the way in
/// - `notes` are carried through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Unique within a cart.
    pub id: String,

    /// Display name at time of adding.
    pub name: String,

    pub unit_price: Money,

    pub quantity: i64,

    pub supplements: Vec<Supplement>,

    pub discount: Option<Discount>,

    pub tax_rate: TaxRate,

    pub notes: Option<String>,
}

impl LineItem {
    /// Creates a line with no supplements, no discount and zero tax.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::{LineItem, Money};
    ///
    /// let line = LineItem::new("l1", "Espresso", Money::from_units(1000), 3).unwrap();
    /// assert_eq!(line.gross_total().units(), 3000);
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<Self> {
        let id = id.into();
        validate_line_id(&id)?;
        validate_amount("unit price", unit_price.units())?;
        check_quantity(quantity)?;

        Ok(LineItem {
            id,
            name: name.into(),
            unit_price,
            quantity,
            supplements: Vec::new(),
            discount: None,
            tax_rate: TaxRate::zero(),
            notes: None,
        })
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> CoreResult<Self> {
        validate_tax_rate_bps(rate.bps())?;
        self.tax_rate = rate;
        Ok(self)
    }

    pub fn with_supplement(mut self, supplement: Supplement) -> CoreResult<Self> {
        validate_amount("supplement price", supplement.price.units())?;
        self.supplements.push(supplement);
        check_unit_total(self.unit_price, &self.supplements)?;
        Ok(self)
    }

    pub fn with_discount(mut self, discount: Discount) -> CoreResult<Self> {
        self.set_discount(Some(discount))?;
        Ok(self)
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Re-checks every field of a line that was not built through the
    /// constructors (deserialized, or assembled as a struct literal).
    pub fn validate(&self) -> CoreResult<()> {
        validate_line_id(&self.id)?;
        validate_amount("unit price", self.unit_price.units())?;
        for supplement in &self.supplements {
            validate_amount("supplement price", supplement.price.units())?;
        }
        check_unit_total(self.unit_price, &self.supplements)?;
        check_quantity(self.quantity)?;
        validate_tax_rate_bps(self.tax_rate.bps())?;
        if let Some(discount) = &self.discount {
            discount.validate()?;
        }
        Ok(())
    }

    /// Replaces the line discount and returns the resolved amount.
    ///
    /// `None` removes the discount. An invalid discount leaves the line
    /// untouched.
    pub fn set_discount(&mut self, discount: Option<Discount>) -> CoreResult<Money> {
        let amount = match &discount {
            Some(d) => apply_line_discount(self, d)?,
            None => Money::zero(),
        };
        debug!(line_id = %self.id, discount = ?discount, amount = %amount, "Line discount set");
        self.discount = discount;
        Ok(amount)
    }

    /// Changes the quantity. A stored percentage discount follows the new
    /// gross total; a fixed discount is re-clamped against it.
    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        check_quantity(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn unit_price_with_supplements(&self) -> Money {
        self.unit_price + self.supplements.iter().map(|s| s.price).sum::<Money>()
    }

    pub fn gross_total(&self) -> Money {
        self.unit_price_with_supplements()
            .multiply_quantity(self.quantity)
    }

    /// Resolved line discount, always within `[0, gross_total]`.
    pub fn discount_amount(&self) -> Money {
        self.discount
            .map(|d| d.amount_on(self.gross_total()))
            .unwrap_or_default()
    }

    pub fn net_total(&self) -> Money {
        self.gross_total() - self.discount_amount()
    }

    /// Tax on the post-discount net amount at this line's rate.
    pub fn tax_amount(&self) -> Money {
        self.net_total().calculate_tax(self.tax_rate)
    }

    pub fn total_with_tax(&self) -> Money {
        self.net_total() + self.tax_amount()
    }
}

/// Resolves `discount` against `line` without modifying it.
///
/// ## Rules
/// - `discount` must be within the bounds for its kind, else `InvalidDiscount`
/// - Percentage: `round(gross_total × pct / 100)`, half up
/// - Fixed amount: the value itself
/// - Either way the result is clamped to `gross_total`
///
/// ## Example
/// ```rust
/// use till_core::{apply_line_discount, Discount, LineItem, Money};
///
/// let line = LineItem::new("l1", "Pizza", Money::from_units(1000), 3).unwrap();
/// let amount = apply_line_discount(&line, &Discount::percentage(10)).unwrap();
/// assert_eq!(amount.units(), 300);
/// ```
pub fn apply_line_discount(line: &LineItem, discount: &Discount) -> CoreResult<Money> {
    discount.validate()?;
    Ok(discount.amount_on(line.gross_total()))
}

/// The per-unit price including supplements is held to the same ceiling as
/// any single amount.
fn check_unit_total(unit_price: Money, supplements: &[Supplement]) -> CoreResult<()> {
    let total = supplements
        .iter()
        .try_fold(unit_price.units(), |acc, s| acc.checked_add(s.price.units()))
        .unwrap_or(i64::MAX);
    validate_amount("unit price with supplements", total)?;
    Ok(())
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_quantity(quantity)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
