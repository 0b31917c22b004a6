//! # Cart Aggregation
//!
//! Sums priced lines into the totals a payer sees.
//!
//! ## Discount Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Totals Pipeline                                 │
//! │                                                                         │
//! │  subtotal             = Σ line.gross_total                              │
//! │       │                                                                 │
//! │       ▼  line discounts first (retail price corrections)                │
//! │  line_discounts_total = Σ line.discount_amount                          │
//! │       │                                                                 │
//! │       ▼  cart discount second (checkout promotion)                      │
//! │  cart_discount        = cart discount resolved on                       │
//! │                         (subtotal − line_discounts_total), clamped      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax                  = Σ line.tax_amount   (each at its own rate)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  grand_total          = subtotal − line_discounts_total                 │
//! │                         − cart_discount + tax            (≥ 0)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discounts apply sequentially, never multiplicatively: a 10% cart discount
//! on top of a 10% line discount takes 10% of what is left, not 19% of the
//! original. Only one cart discount is active at a time.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::LineItem;
use crate::types::{Discount, DiscountScope};
use crate::validation::validate_cart_size;
use crate::MAX_CART_LINES;

/// An ordered list of lines with at most one cart-wide discount.
///
/// ## Invariants
/// - Line ids are unique
/// - At most `MAX_CART_LINES` lines
/// - A stored discount (line or cart) has passed validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<LineItem>,
    pub discount: Option<Discount>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Appends a line.
    ///
    /// ## Returns
    /// - `Err(DuplicateLine)` if a line with the same id exists
    /// - `Err(CartTooLarge)` if the cart is full
    /// - a validation error if any field of the line is out of range
    pub fn add_line(&mut self, line: LineItem) -> CoreResult<()> {
        if self.lines.iter().any(|l| l.id == line.id) {
            return Err(CoreError::DuplicateLine(line.id));
        }

        if validate_cart_size(self.lines.len()).is_err() {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        line.validate()?;

        self.lines.push(line);
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<LineItem> {
        let index = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        Ok(self.lines.remove(index))
    }

    /// Updates a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(line_id).map(|_| ());
        }
        self.line_mut(line_id)?.set_quantity(quantity)
    }

    pub fn line(&self, line_id: &str) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    /// Sets or clears one line's discount, returning the resolved amount.
    pub fn set_line_discount(
        &mut self,
        line_id: &str,
        discount: Option<Discount>,
    ) -> CoreResult<Money> {
        self.line_mut(line_id)?.set_discount(discount)
    }

    /// Installs the cart-wide discount, replacing any previous one.
    ///
    /// Returns the resolved cart discount amount.
    pub fn set_cart_discount(&mut self, discount: Discount) -> CoreResult<Money> {
        discount.validate()?;
        if let Some(previous) = self.discount.replace(discount) {
            debug!(previous = %previous, next = %discount, "Cart discount replaced");
        }
        apply_cart_discount(self)
    }

    pub fn clear_cart_discount(&mut self) {
        self.discount = None;
    }

    /// Routes a discount dialog's result to the line or the cart.
    ///
    /// `None` removes the discount at that scope.
    pub fn apply_discount(
        &mut self,
        scope: &DiscountScope,
        discount: Option<Discount>,
    ) -> CoreResult<Money> {
        match (scope, discount) {
            (DiscountScope::Line(id), d) => self.set_line_discount(id, d),
            (DiscountScope::Cart, Some(d)) => self.set_cart_discount(d),
            (DiscountScope::Cart, None) => {
                self.clear_cart_discount();
                Ok(Money::zero())
            }
        }
    }

    /// Removes all lines and the cart discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = None;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ gross line totals, before any discount.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(LineItem::gross_total).sum()
    }

    pub fn line_discounts_total(&self) -> Money {
        self.lines.iter().map(LineItem::discount_amount).sum()
    }

    /// Base the cart discount is resolved against.
    pub fn discountable_base(&self) -> Money {
        self.subtotal() - self.line_discounts_total()
    }

    pub fn cart_discount_amount(&self) -> Money {
        self.discount
            .map(|d| d.amount_on(self.discountable_base()))
            .unwrap_or_default()
    }

    /// Σ per-line tax; rates are summed independently, never averaged.
    pub fn tax(&self) -> Money {
        self.lines.iter().map(LineItem::tax_amount).sum()
    }

    pub fn grand_total(&self) -> Money {
        self.discountable_base() - self.cart_discount_amount() + self.tax()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

/// Resolves the cart's current cart-wide discount.
///
/// The base is `subtotal - line_discounts_total`; the result is clamped to
/// that base. A cart with no discount yields zero.
///
/// ## Example
/// ```rust
/// use till_core::{apply_cart_discount, Cart, Discount, LineItem, Money};
///
/// let mut cart = Cart::new();
/// cart.add_line(LineItem::new("l1", "Soup", Money::from_units(3000), 1).unwrap()).unwrap();
/// cart.discount = Some(Discount::fixed(Money::from_units(5000)));
///
/// assert_eq!(apply_cart_discount(&cart).unwrap().units(), 3000);
/// assert_eq!(cart.grand_total().units(), 0);
/// ```
pub fn apply_cart_discount(cart: &Cart) -> CoreResult<Money> {
    match &cart.discount {
        Some(d) => {
            d.validate()?;
            Ok(d.amount_on(cart.discountable_base()))
        }
        None => Ok(Money::zero()),
    }
}

/// Cart totals summary handed to display and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub line_discounts_total: Money,
    pub cart_discount: Money,
    /// `line_discounts_total + cart_discount`
    pub discount_total: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let subtotal = cart.subtotal();
        let line_discounts_total = cart.line_discounts_total();
        let cart_discount = cart
            .discount
            .map(|d| d.amount_on(subtotal - line_discounts_total))
            .unwrap_or_default();
        let tax = cart.tax();

        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal,
            line_discounts_total,
            cart_discount,
            discount_total: line_discounts_total + cart_discount,
            tax,
            grand_total: subtotal - line_discounts_total - cart_discount + tax,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
