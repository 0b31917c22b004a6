//! # Split-Bill Allocator
//!
//! Divides a bill among several payers and settles it once every share is
//! paid.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Split Modes                                      │
//! │                                                                         │
//! │  EQUAL(n)                                                               │
//! │  ────────                                                               │
//! │  • base = floor(total / n), remainder = total − base × n                │
//! │  • first part gets base + remainder, the rest get base                  │
//! │  • 1000 / 3 → [334, 333, 333]                                           │
//! │                                                                         │
//! │  CUSTOM                                                                 │
//! │  ──────                                                                 │
//! │  • amounts typed per part, never rebalanced                             │
//! │  • variance = total − Σ amounts  (+ under, − over)                      │
//! │  • only settlement requires variance == 0 (in every mode)               │
//! │                                                                         │
//! │  ITEMS                                                                  │
//! │  ─────                                                                  │
//! │  • each line id belongs to at most one part                             │
//! │  • assigning moves the line, it never copies it                         │
//! │  • each line carries a share of the total: its total with tax, plus a   │
//! │    proportional slice of any cart discount (first line takes the        │
//! │    rounding remainder), so the shares sum to the total exactly          │
//! │  • part amount = Σ shares of its lines (read only)                      │
//! │  • unassigned lines block settlement                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! ```text
//!   new / from_cart
//!        │
//!        ▼
//!   EQUAL ⇄ CUSTOM ⇄ ITEMS      free while nothing is paid
//!        │
//!        ▼  mark_as_paid
//!   locked                       mode changes and edits to paid parts fail;
//!                                split_equal(n) in EQUAL starts over unpaid
//!        │
//!        ▼  settle (consumes the session)
//!   SplitSettlement              handed to transaction persistence
//! ```
//!
//! The session assumes a single writer. Callers serving several terminals
//! serialize access per session.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::LineItem;
use crate::types::PaymentMethod;
use crate::validation::{validate_amount, validate_part_count};
use crate::DEFAULT_SPLIT_PARTS;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    Equal,
    Custom,
    Items,
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Equal => write!(f, "equal"),
            SplitMode::Custom => write!(f, "custom"),
            SplitMode::Items => write!(f, "items"),
        }
    }
}

/// One payer's share.
///
/// Once `paid` is set the amount and the assigned items are frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SplitPart {
    pub id: String,
    pub amount: Money,
    pub paid: bool,
    pub payment_method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub assigned_item_ids: BTreeSet<String>,
}

impl SplitPart {
    fn new(amount: Money) -> Self {
        SplitPart {
            id: Uuid::new_v4().to_string(),
            amount,
            paid: false,
            payment_method: None,
            reference: None,
            assigned_item_ids: BTreeSet::new(),
        }
    }
}

/// A bill being divided among payers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SplitSession {
    total: Money,
    mode: SplitMode,
    parts: Vec<SplitPart>,
    lines: Vec<LineItem>,
}

/// One settled share, as handed to transaction persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettledPayment {
    pub part_id: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    /// Line ids paid by this share; empty outside ITEMS mode.
    pub item_ids: Vec<String>,
}

/// The finalized result of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SplitSettlement {
    pub total: Money,
    pub mode: SplitMode,
    pub payments: Vec<SettledPayment>,
    pub lines: Vec<LineItem>,
}

impl SplitSettlement {
    pub fn paid_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

/// Settlement was refused; the untouched session comes back with the reason.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SettlementRejected {
    pub session: Box<SplitSession>,
    #[source]
    pub error: CoreError,
}

// =============================================================================
// Session
// =============================================================================

impl SplitSession {
    /// Starts a split of `total` over `lines`, as an equal split between
    /// `DEFAULT_SPLIT_PARTS` payers.
    pub fn new(total: Money, lines: Vec<LineItem>) -> CoreResult<Self> {
        validate_amount("split total", total.units())?;

        let mut seen = HashSet::new();
        for line in &lines {
            line.validate()?;
            if !seen.insert(line.id.as_str()) {
                return Err(CoreError::DuplicateLine(line.id.clone()));
            }
        }

        Ok(SplitSession {
            total,
            mode: SplitMode::Equal,
            parts: equal_parts(total, DEFAULT_SPLIT_PARTS),
            lines,
        })
    }

    /// Starts a split of the cart's grand total over its lines.
    ///
    /// In ITEMS mode the cart discount and line taxes are spread over the
    /// line shares, so assigning every line allocates exactly the total.
    pub fn from_cart(cart: &Cart) -> CoreResult<Self> {
        SplitSession::new(cart.grand_total(), cart.lines.clone())
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn parts(&self) -> &[SplitPart] {
        &self.parts
    }

    pub fn part(&self, part_id: &str) -> Option<&SplitPart> {
        self.parts.iter().find(|p| p.id == part_id)
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// True once any part has been paid.
    pub fn is_locked(&self) -> bool {
        self.parts.iter().any(|p| p.paid)
    }

    // -------------------------------------------------------------------------
    // Mode transitions
    // -------------------------------------------------------------------------

    /// Regenerates the parts as an equal split between `parts` payers.
    ///
    /// Every previous part is discarded along with its paid flag and payment
    /// fields; part ids are not stable across resizes. Called from another
    /// mode this is a mode switch, and fails with `SplitLocked` once anything
    /// is paid.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::split::SplitSession;
    /// use till_core::Money;
    ///
    /// let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
    /// split.split_equal(3).unwrap();
    ///
    /// let amounts: Vec<i64> = split.parts().iter().map(|p| p.amount.units()).collect();
    /// assert_eq!(amounts, vec![334, 333, 333]);
    /// ```
    pub fn split_equal(&mut self, parts: u32) -> CoreResult<()> {
        validate_part_count(parts)?;
        if self.mode != SplitMode::Equal {
            self.ensure_unlocked("change split mode")?;
        } else if self.is_locked() {
            debug!(paid = %self.paid_total(), "Equal split resized, payments discarded");
        }

        self.mode = SplitMode::Equal;
        self.parts = equal_parts(self.total, parts);
        debug!(total = %self.total, parts, "Equal split generated");
        Ok(())
    }

    /// Moves to another mode.
    ///
    /// - `Equal`: regenerates an equal split over the current number of parts
    /// - `Custom`: keeps the parts and their amounts, drops item assignments
    /// - `Items`: keeps the parts, drops assignments, amounts start at zero
    pub fn switch_mode(&mut self, mode: SplitMode) -> CoreResult<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.ensure_unlocked("change split mode")?;

        match mode {
            SplitMode::Equal => {
                let count = self.parts.len().clamp(1, crate::MAX_SPLIT_PARTS) as u32;
                self.parts = equal_parts(self.total, count);
            }
            SplitMode::Custom => {
                for part in &mut self.parts {
                    part.assigned_item_ids.clear();
                }
            }
            SplitMode::Items => {
                for part in &mut self.parts {
                    part.assigned_item_ids.clear();
                    part.amount = Money::zero();
                }
            }
        }

        debug!(from = %self.mode, to = %mode, "Split mode switched");
        self.mode = mode;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Part management (CUSTOM / ITEMS)
    // -------------------------------------------------------------------------

    /// Adds an empty, unpaid part and returns its id.
    pub fn add_part(&mut self) -> CoreResult<String> {
        self.require_mode(&[SplitMode::Custom, SplitMode::Items], "add a part")?;
        validate_part_count(self.parts.len() as u32 + 1)?;

        let part = SplitPart::new(Money::zero());
        let id = part.id.clone();
        self.parts.push(part);
        debug!(part_id = %id, "Split part added");
        Ok(id)
    }

    /// Removes an unpaid part. Its items, if any, become unassigned.
    pub fn remove_part(&mut self, part_id: &str) -> CoreResult<SplitPart> {
        self.require_mode(&[SplitMode::Custom, SplitMode::Items], "remove a part")?;
        let index = self.part_index(part_id)?;
        if self.parts[index].paid {
            return Err(CoreError::SplitLocked(format!(
                "part {} is paid and cannot be removed",
                part_id
            )));
        }

        debug!(part_id = %part_id, "Split part removed");
        Ok(self.parts.remove(index))
    }

    /// Sets a part's amount in CUSTOM mode.
    ///
    /// No other part is adjusted; a resulting gap shows up in [`variance`]
    /// and only blocks settlement.
    ///
    /// [`variance`]: SplitSession::variance
    pub fn set_part_amount(&mut self, part_id: &str, amount: Money) -> CoreResult<()> {
        self.require_mode(&[SplitMode::Custom], "edit a part amount")?;
        validate_amount("part amount", amount.units())?;

        let part = self.unpaid_part_mut(part_id)?;
        part.amount = amount;
        debug!(part_id = %part_id, amount = %amount, "Split part amount set");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Item assignment (ITEMS)
    // -------------------------------------------------------------------------

    /// Gives `item_id` to `part_id`, taking it away from whichever part held
    /// it. Both parts' amounts are recomputed.
    ///
    /// Fails with `SplitLocked` if either the target or the current holder
    /// is paid.
    pub fn assign_item(&mut self, item_id: &str, part_id: &str) -> CoreResult<()> {
        self.require_mode(&[SplitMode::Items], "assign items")?;
        self.require_line(item_id)?;

        let target = self.part_index(part_id)?;
        if self.parts[target].paid {
            return Err(CoreError::SplitLocked(format!(
                "part {} is paid and cannot take more items",
                part_id
            )));
        }

        if let Some(holder) = self.holder_index(item_id) {
            if holder == target {
                return Ok(());
            }
            if self.parts[holder].paid {
                return Err(CoreError::SplitLocked(format!(
                    "item {} belongs to paid part {}",
                    item_id, self.parts[holder].id
                )));
            }
            self.parts[holder].assigned_item_ids.remove(item_id);
        }

        self.parts[target]
            .assigned_item_ids
            .insert(item_id.to_string());
        self.recompute_item_amounts();

        debug!(item_id = %item_id, part_id = %part_id, "Item assigned");
        Ok(())
    }

    /// Returns `item_id` to the unassigned pool.
    pub fn unassign_item(&mut self, item_id: &str) -> CoreResult<()> {
        self.require_mode(&[SplitMode::Items], "unassign items")?;
        self.require_line(item_id)?;

        let Some(holder) = self.holder_index(item_id) else {
            return Ok(());
        };
        if self.parts[holder].paid {
            return Err(CoreError::SplitLocked(format!(
                "item {} belongs to paid part {}",
                item_id, self.parts[holder].id
            )));
        }

        self.parts[holder].assigned_item_ids.remove(item_id);
        self.recompute_item_amounts();
        debug!(item_id = %item_id, "Item unassigned");
        Ok(())
    }

    /// The part currently holding `item_id`.
    pub fn item_owner(&self, item_id: &str) -> Option<&SplitPart> {
        self.holder_index(item_id).map(|i| &self.parts[i])
    }

    /// Lines not yet given to any part, in cart order.
    pub fn unassigned_items(&self) -> Vec<&LineItem> {
        let assigned: HashSet<&str> = self
            .parts
            .iter()
            .flat_map(|p| p.assigned_item_ids.iter().map(String::as_str))
            .collect();

        self.lines
            .iter()
            .filter(|l| !assigned.contains(l.id.as_str()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    /// Records a part as paid. Paying an already paid part changes nothing.
    pub fn mark_as_paid(
        &mut self,
        part_id: &str,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> CoreResult<()> {
        let index = self.part_index(part_id)?;
        let part = &mut self.parts[index];
        if part.paid {
            return Ok(());
        }

        part.paid = true;
        part.payment_method = Some(method);
        part.reference = reference;
        debug!(part_id = %part_id, amount = %part.amount, method = %method, "Split part paid");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    /// Σ part amounts.
    pub fn allocated(&self) -> Money {
        self.parts.iter().map(|p| p.amount).sum()
    }

    /// `total - allocated`: positive when under-allocated, negative when over.
    pub fn variance(&self) -> Money {
        self.total - self.allocated()
    }

    pub fn paid_total(&self) -> Money {
        self.parts.iter().filter(|p| p.paid).map(|p| p.amount).sum()
    }

    pub fn remaining_unpaid(&self) -> Money {
        self.parts.iter().filter(|p| !p.paid).map(|p| p.amount).sum()
    }

    // -------------------------------------------------------------------------
    // Settlement
    // -------------------------------------------------------------------------

    /// Checks the settlement preconditions without consuming the session.
    ///
    /// ## Errors
    /// - `IncompleteSettlement` if a part is unpaid, or (ITEMS) a line is
    ///   unassigned
    /// - `AmountMismatch` if the part amounts do not sum to the total
    pub fn check_settlement(&self) -> CoreResult<()> {
        let unpaid_parts = self
            .parts
            .iter()
            .filter(|p| !p.paid || p.payment_method.is_none())
            .count();
        let unassigned_items = match self.mode {
            SplitMode::Items => self.unassigned_items().len(),
            _ => 0,
        };

        if unpaid_parts > 0 || unassigned_items > 0 {
            return Err(CoreError::IncompleteSettlement {
                unpaid_parts,
                unassigned_items,
            });
        }

        if !self.variance().is_zero() {
            return Err(CoreError::AmountMismatch {
                total: self.total,
                allocated: self.allocated(),
                variance: self.variance(),
            });
        }

        Ok(())
    }

    pub fn can_settle(&self) -> bool {
        self.check_settlement().is_ok()
    }

    /// Finalizes the split.
    ///
    /// Consumes the session: a split settles once. On failure the session
    /// is returned unchanged inside [`SettlementRejected`].
    pub fn settle(self) -> Result<SplitSettlement, SettlementRejected> {
        if let Err(error) = self.check_settlement() {
            warn!(mode = %self.mode, error = %error, "Split settlement rejected");
            return Err(SettlementRejected {
                session: Box::new(self),
                error,
            });
        }

        let SplitSession {
            total,
            mode,
            parts,
            lines,
        } = self;

        let payments: Vec<SettledPayment> = parts
            .into_iter()
            .filter_map(|part| {
                let method = part.payment_method?;
                Some(SettledPayment {
                    part_id: part.id,
                    amount: part.amount,
                    payment_method: method,
                    reference: part.reference,
                    item_ids: part.assigned_item_ids.into_iter().collect(),
                })
            })
            .collect();

        info!(total = %total, mode = %mode, payments = payments.len(), "Split settled");

        Ok(SplitSettlement {
            total,
            mode,
            payments,
            lines,
        })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_unlocked(&self, action: &str) -> CoreResult<()> {
        if self.is_locked() {
            return Err(CoreError::SplitLocked(format!(
                "cannot {} after a part has been paid",
                action
            )));
        }
        Ok(())
    }

    fn require_mode(&self, allowed: &[SplitMode], operation: &'static str) -> CoreResult<()> {
        if allowed.contains(&self.mode) {
            Ok(())
        } else {
            Err(CoreError::ModeMismatch {
                operation,
                mode: self.mode.to_string(),
            })
        }
    }

    fn require_line(&self, item_id: &str) -> CoreResult<()> {
        if self.lines.iter().any(|l| l.id == item_id) {
            Ok(())
        } else {
            Err(CoreError::ItemNotFound(item_id.to_string()))
        }
    }

    fn part_index(&self, part_id: &str) -> CoreResult<usize> {
        self.parts
            .iter()
            .position(|p| p.id == part_id)
            .ok_or_else(|| CoreError::PartNotFound(part_id.to_string()))
    }

    fn unpaid_part_mut(&mut self, part_id: &str) -> CoreResult<&mut SplitPart> {
        let index = self.part_index(part_id)?;
        let part = &mut self.parts[index];
        if part.paid {
            return Err(CoreError::SplitLocked(format!(
                "part {} is paid and cannot be edited",
                part_id
            )));
        }
        Ok(part)
    }

    fn holder_index(&self, item_id: &str) -> Option<usize> {
        self.parts
            .iter()
            .position(|p| p.assigned_item_ids.contains(item_id))
    }

    /// Paid parts keep their frozen amount.
    fn recompute_item_amounts(&mut self) {
        let shares = line_shares(self.total, &self.lines);

        for part in self.parts.iter_mut().filter(|p| !p.paid) {
            part.amount = part
                .assigned_item_ids
                .iter()
                .filter_map(|id| shares.get(id.as_str()).copied())
                .sum();
        }
    }
}

/// Each line's share of `total`, keyed by line id.
///
/// A line weighs its total with tax. The gap between `total` and the sum of
/// the weights (a cart discount, usually) is spread in proportion to the
/// weights, rounded down, and the first line absorbs what rounding leaves.
/// The shares therefore sum to `total` exactly and, for `total >= 0`, none
/// is negative.
fn line_shares(total: Money, lines: &[LineItem]) -> HashMap<&str, Money> {
    let weights: Vec<i128> = lines
        .iter()
        .map(|l| i128::from(l.total_with_tax().units()))
        .collect();
    let weight_sum: i128 = weights.iter().sum();
    let gap = i128::from(total.units()) - weight_sum;

    let mut shares: Vec<i128> = weights
        .iter()
        .map(|&w| match weight_sum {
            0 => w,
            _ => w + (gap * w).div_euclid(weight_sum),
        })
        .collect();
    let spread: i128 = shares.iter().sum();
    if let Some(first) = shares.first_mut() {
        *first += i128::from(total.units()) - spread;
    }

    lines
        .iter()
        .zip(shares)
        // each share lies between zero and max(total, weight), so it fits i64
        .map(|(line, share)| (line.id.as_str(), Money::from_units(share as i64)))
        .collect()
}

/// `n` parts of `floor(total / n)`, the first carrying the remainder.
fn equal_parts(total: Money, n: u32) -> Vec<SplitPart> {
    let (base, remainder) = total.split_even(n);
    (0..n)
        .map(|i| {
            let amount = if i == 0 { base + remainder } else { base };
            SplitPart::new(amount)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, TaxRate};

    fn line(id: &str, price: i64, qty: i64) -> LineItem {
        LineItem::new(id, format!("Dish {}", id), Money::from_units(price), qty).unwrap()
    }

    fn amounts(split: &SplitSession) -> Vec<i64> {
        split.parts().iter().map(|p| p.amount.units()).collect()
    }

    fn part_id(split: &SplitSession, index: usize) -> String {
        split.parts()[index].id.clone()
    }

    fn items_session() -> SplitSession {
        let lines = vec![line("x", 1200, 1), line("y", 800, 2), line("z", 500, 1)];
        let mut split = SplitSession::new(Money::from_units(3300), lines).unwrap();
        split.switch_mode(SplitMode::Items).unwrap();
        split
    }

    fn pay_all(split: &mut SplitSession) {
        let ids: Vec<String> = split.parts().iter().map(|p| p.id.clone()).collect();
        for id in ids {
            split.mark_as_paid(&id, PaymentMethod::Cash, None).unwrap();
        }
    }

    // ========== EQUAL ==========

    #[test]
    fn test_equal_split_first_part_absorbs_remainder() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.split_equal(3).unwrap();
        assert_eq!(amounts(&split), vec![334, 333, 333]);
        assert_eq!(split.variance(), Money::zero());
    }

    #[test]
    fn test_equal_split_always_exact() {
        for total in [0i64, 1, 2, 5, 99, 1000, 1001, 54_321] {
            let mut split = SplitSession::new(Money::from_units(total), vec![]).unwrap();
            for n in 1..=12 {
                split.split_equal(n).unwrap();
                assert_eq!(split.parts().len(), n as usize);
                assert_eq!(split.allocated().units(), total);
            }
        }
    }

    #[test]
    fn test_resize_regenerates_part_ids() {
        let mut split = SplitSession::new(Money::from_units(900), vec![]).unwrap();
        split.split_equal(3).unwrap();
        let before = part_id(&split, 0);
        split.split_equal(2).unwrap();
        assert_ne!(part_id(&split, 0), before);
        assert!(split.parts().iter().all(|p| !p.paid));
    }

    #[test]
    fn test_invalid_part_counts() {
        let mut split = SplitSession::new(Money::from_units(900), vec![]).unwrap();
        assert!(matches!(split.split_equal(0), Err(CoreError::Validation(_))));
        assert!(split.split_equal(crate::MAX_SPLIT_PARTS as u32 + 1).is_err());
    }

    #[test]
    fn test_equal_settles_when_all_paid() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.split_equal(3).unwrap();
        pay_all(&mut split);

        let settlement = split.settle().unwrap();
        assert_eq!(settlement.mode, SplitMode::Equal);
        assert_eq!(settlement.payments.len(), 3);
        assert_eq!(settlement.paid_total().units(), 1000);
    }

    // ========== CUSTOM ==========

    #[test]
    fn test_custom_variance_sign() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.switch_mode(SplitMode::Custom).unwrap();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));

        split.set_part_amount(&a, Money::from_units(300)).unwrap();
        split.set_part_amount(&b, Money::from_units(500)).unwrap();
        assert_eq!(split.variance().units(), 200);

        split.set_part_amount(&b, Money::from_units(900)).unwrap();
        assert_eq!(split.variance().units(), -200);
    }

    #[test]
    fn test_custom_mismatch_blocks_only_settlement() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.switch_mode(SplitMode::Custom).unwrap();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));
        split.set_part_amount(&a, Money::from_units(400)).unwrap();
        split.set_part_amount(&b, Money::from_units(500)).unwrap();

        // part edits and payments stay possible while the gap exists
        split.mark_as_paid(&a, PaymentMethod::Card, Some("AUTH-1".into()))
            .unwrap();
        split.mark_as_paid(&b, PaymentMethod::Cash, None).unwrap();

        let rejected = split.settle().unwrap_err();
        match &rejected.error {
            CoreError::AmountMismatch {
                total,
                allocated,
                variance,
            } => {
                assert_eq!(total.units(), 1000);
                assert_eq!(allocated.units(), 900);
                assert_eq!(variance.units(), 100);
            }
            other => panic!("unexpected error: {other}"),
        }

        // the session comes back intact
        let mut split = *rejected.session;
        let extra = split.add_part().unwrap();
        split.set_part_amount(&extra, Money::from_units(100)).unwrap();
        split.mark_as_paid(&extra, PaymentMethod::Mobile, None).unwrap();
        assert!(split.can_settle());
        assert_eq!(split.settle().unwrap().paid_total().units(), 1000);
    }

    #[test]
    fn test_custom_amount_edit_not_allowed_elsewhere() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        let a = part_id(&split, 0);
        assert!(matches!(
            split.set_part_amount(&a, Money::from_units(10)),
            Err(CoreError::ModeMismatch { .. })
        ));
        assert!(matches!(split.add_part(), Err(CoreError::ModeMismatch { .. })));
    }

    #[test]
    fn test_custom_rejects_negative_amount() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.switch_mode(SplitMode::Custom).unwrap();
        let a = part_id(&split, 0);
        assert!(split.set_part_amount(&a, Money::from_units(-1)).is_err());
    }

    // ========== ITEMS ==========

    #[test]
    fn test_item_transfer_between_parts() {
        let mut split = items_session();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));

        split.assign_item("x", &a).unwrap();
        assert_eq!(amounts(&split), vec![1200, 0]);

        split.assign_item("x", &b).unwrap();
        assert!(!split.parts()[0].assigned_item_ids.contains("x"));
        assert!(split.parts()[1].assigned_item_ids.contains("x"));
        assert_eq!(amounts(&split), vec![0, 1200]);
        assert_eq!(split.item_owner("x").map(|p| p.id.as_str()), Some(b.as_str()));
    }

    #[test]
    fn test_item_belongs_to_at_most_one_part() {
        let mut split = items_session();
        let extra = split.add_part().unwrap();
        let ids: Vec<String> = split.parts().iter().map(|p| p.id.clone()).collect();

        let moves = [("x", 0), ("y", 1), ("x", 2), ("z", 0), ("y", 2), ("x", 1), ("z", 2)];
        for (item, part) in moves {
            split.assign_item(item, &ids[part]).unwrap();
            for line in split.lines() {
                let holders = split
                    .parts()
                    .iter()
                    .filter(|p| p.assigned_item_ids.contains(&line.id))
                    .count();
                assert!(holders <= 1);
            }
        }
        assert_eq!(ids[2], extra);
    }

    #[test]
    fn test_item_amounts_use_line_net_totals() {
        let lines = vec![
            line("x", 1000, 2)
                .with_discount(Discount::percentage(25))
                .unwrap(),
            line("y", 300, 1),
        ];
        let mut split = SplitSession::new(Money::from_units(1800), lines).unwrap();
        split.switch_mode(SplitMode::Items).unwrap();
        let a = part_id(&split, 0);

        split.assign_item("x", &a).unwrap();
        split.assign_item("y", &a).unwrap();
        assert_eq!(split.parts()[0].amount.units(), 1800);
    }

    #[test]
    fn test_item_shares_carry_tax_and_cart_discount() {
        let mut cart = Cart::new();
        cart.add_line(line("a", 1000, 1)).unwrap();
        cart.add_line(
            line("b", 1000, 1)
                .with_tax_rate(TaxRate::from_bps(1000))
                .unwrap(),
        )
        .unwrap();
        cart.set_cart_discount(Discount::fixed(Money::from_units(300)))
            .unwrap();

        let mut split = SplitSession::from_cart(&cart).unwrap();
        assert_eq!(split.total().units(), 1800);
        split.switch_mode(SplitMode::Items).unwrap();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));
        split.assign_item("a", &a).unwrap();
        split.assign_item("b", &b).unwrap();

        // weights 1000 and 1100 absorb the -300 gap: -143 and -158, +1 remainder
        assert_eq!(amounts(&split), vec![858, 942]);
        assert_eq!(split.variance(), Money::zero());

        pay_all(&mut split);
        let settlement = split.settle().unwrap();
        assert_eq!(settlement.paid_total(), settlement.total);
    }

    #[test]
    fn test_item_shares_always_sum_to_total() {
        let lines = vec![
            line("p", 333, 1).with_tax_rate(TaxRate::from_bps(825)).unwrap(),
            line("q", 1, 7),
            line("r", 0, 1),
            line("s", 4999, 3).with_tax_rate(TaxRate::from_bps(2000)).unwrap(),
        ];
        for total in [0i64, 1, 999, 15_000, 19_361, 25_000] {
            let mut split = SplitSession::new(Money::from_units(total), lines.clone()).unwrap();
            split.switch_mode(SplitMode::Items).unwrap();
            let (a, b) = (part_id(&split, 0), part_id(&split, 1));
            for (i, id) in ["p", "q", "r", "s"].iter().enumerate() {
                split.assign_item(id, if i % 2 == 0 { &a } else { &b }).unwrap();
            }
            assert_eq!(split.allocated().units(), total);
            assert!(split.parts().iter().all(|p| !p.amount.is_negative()));
        }
    }

    #[test]
    fn test_items_without_lines_cannot_settle_a_nonzero_total() {
        let mut split = SplitSession::new(Money::from_units(500), vec![]).unwrap();
        split.switch_mode(SplitMode::Items).unwrap();
        pay_all(&mut split);
        assert!(matches!(
            split.check_settlement(),
            Err(CoreError::AmountMismatch { .. })
        ));
    }

    #[test]
    fn test_unassigned_items_block_settlement() {
        let mut split = items_session();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));
        split.assign_item("x", &a).unwrap();
        split.assign_item("y", &b).unwrap();
        pay_all(&mut split);

        assert_eq!(split.unassigned_items().len(), 1);
        assert!(matches!(
            split.check_settlement(),
            Err(CoreError::IncompleteSettlement {
                unpaid_parts: 0,
                unassigned_items: 1
            })
        ));
    }

    #[test]
    fn test_paid_part_items_are_frozen() {
        let mut split = items_session();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));
        split.assign_item("x", &a).unwrap();
        split.mark_as_paid(&a, PaymentMethod::Card, None).unwrap();

        assert!(matches!(split.assign_item("x", &b), Err(CoreError::SplitLocked(_))));
        assert!(matches!(split.assign_item("y", &a), Err(CoreError::SplitLocked(_))));
        assert!(matches!(split.unassign_item("x"), Err(CoreError::SplitLocked(_))));

        // unpaid parts keep working
        split.assign_item("y", &b).unwrap();
        split.assign_item("z", &b).unwrap();
        assert_eq!(amounts(&split), vec![1200, 2100]);
    }

    #[test]
    fn test_items_settlement_carries_assignments_and_lines() {
        let mut split = items_session();
        let (a, b) = (part_id(&split, 0), part_id(&split, 1));
        split.assign_item("x", &a).unwrap();
        split.assign_item("y", &b).unwrap();
        split.assign_item("z", &b).unwrap();
        pay_all(&mut split);

        let settlement = split.settle().unwrap();
        assert_eq!(settlement.lines.len(), 3);
        assert_eq!(settlement.payments[0].item_ids, vec!["x".to_string()]);
        assert_eq!(
            settlement.payments[1].item_ids,
            vec!["y".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn test_unknown_ids() {
        let mut split = items_session();
        let a = part_id(&split, 0);
        assert!(matches!(split.assign_item("nope", &a), Err(CoreError::ItemNotFound(_))));
        assert!(matches!(split.assign_item("x", "nope"), Err(CoreError::PartNotFound(_))));
        assert!(matches!(
            split.mark_as_paid("nope", PaymentMethod::Cash, None),
            Err(CoreError::PartNotFound(_))
        ));
    }

    #[test]
    fn test_removing_part_releases_items() {
        let mut split = items_session();
        let b = part_id(&split, 1);
        split.assign_item("z", &b).unwrap();
        let removed = split.remove_part(&b).unwrap();
        assert!(removed.assigned_item_ids.contains("z"));
        assert_eq!(split.unassigned_items().len(), 3);
    }

    // ========== LOCKING & PAYMENT ==========

    #[test]
    fn test_mode_switch_locked_after_payment() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Cash, None).unwrap();

        assert!(split.is_locked());
        assert!(matches!(
            split.switch_mode(SplitMode::Custom),
            Err(CoreError::SplitLocked(_))
        ));
        assert_eq!(split.mode(), SplitMode::Equal);
    }

    #[test]
    fn test_equal_resize_resets_paid_flags() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Cash, None).unwrap();

        split.split_equal(4).unwrap();
        assert!(!split.is_locked());
        assert_eq!(split.paid_total(), Money::zero());
        assert_eq!(amounts(&split), vec![250, 250, 250, 250]);
    }

    #[test]
    fn test_entering_equal_after_payment_is_locked() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.switch_mode(SplitMode::Custom).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Card, None).unwrap();

        assert!(matches!(split.split_equal(3), Err(CoreError::SplitLocked(_))));
        assert_eq!(split.mode(), SplitMode::Custom);
    }

    #[test]
    fn test_paid_custom_part_is_frozen() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        split.switch_mode(SplitMode::Custom).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Cash, None).unwrap();

        assert!(matches!(
            split.set_part_amount(&a, Money::from_units(1)),
            Err(CoreError::SplitLocked(_))
        ));
        assert!(matches!(split.remove_part(&a), Err(CoreError::SplitLocked(_))));
    }

    #[test]
    fn test_mark_as_paid_is_idempotent() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Card, Some("REF-1".into()))
            .unwrap();
        let snapshot = split.parts()[0].clone();

        split.mark_as_paid(&a, PaymentMethod::Cash, None).unwrap();
        assert_eq!(split.parts()[0], snapshot);
        assert_eq!(split.paid_total().units(), 500);
        assert_eq!(split.remaining_unpaid().units(), 500);
    }

    #[test]
    fn test_unpaid_parts_block_settlement() {
        let mut split = SplitSession::new(Money::from_units(1000), vec![]).unwrap();
        let a = part_id(&split, 0);
        split.mark_as_paid(&a, PaymentMethod::Cash, None).unwrap();

        let rejected = split.settle().unwrap_err();
        assert!(matches!(
            rejected.error,
            CoreError::IncompleteSettlement {
                unpaid_parts: 1,
                unassigned_items: 0
            }
        ));
        assert_eq!(rejected.session.paid_total().units(), 500);
    }

    #[test]
    fn test_from_cart_uses_grand_total() {
        let mut cart = Cart::new();
        cart.add_line(line("a", 1000, 1)).unwrap();
        cart.add_line(line("b", 500, 2)).unwrap();
        cart.set_cart_discount(Discount::fixed(Money::from_units(100)))
            .unwrap();

        let split = SplitSession::from_cart(&cart).unwrap();
        assert_eq!(split.total().units(), 1900);
        assert_eq!(split.lines().len(), 2);
        assert_eq!(split.allocated().units(), 1900);
    }

    #[test]
    fn test_duplicate_lines_rejected() {
        let lines = vec![line("a", 1, 1), line("a", 2, 1)];
        assert!(matches!(
            SplitSession::new(Money::from_units(3), lines),
            Err(CoreError::DuplicateLine(_))
        ));
    }

    #[test]
    fn test_out_of_range_lines_rejected() {
        let mut bad = line("a", 100, 1);
        bad.quantity = -3;
        assert!(SplitSession::new(Money::from_units(100), vec![bad]).is_err());
    }

    #[test]
    fn test_settlement_serializes_for_persistence() {
        let mut split = SplitSession::new(Money::from_units(10), vec![]).unwrap();
        split.split_equal(1).unwrap();
        pay_all(&mut split);
        let settlement = split.settle().unwrap();

        let json = serde_json::to_value(&settlement).unwrap();
        assert_eq!(json["mode"], "equal");
        assert_eq!(json["payments"][0]["amount"], 10);
        assert_eq!(json["payments"][0]["payment_method"], "cash");
    }
}
