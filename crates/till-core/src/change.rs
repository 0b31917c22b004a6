//! # Change Calculator
//!
//! Turns a cash surplus into notes and coins, and proposes quick-tender
//! amounts for the payment screen.
//!
//! ## Greedy Decomposition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tendered 10000, due 7350 → change 2650                                 │
//! │                                                                         │
//! │  5000  × 0   remaining 2650                                             │
//! │  2000  × 1   remaining  650                                             │
//! │  1000  × 0   remaining  650                                             │
//! │   500  × 1   remaining  150                                             │
//! │   100  × 1   remaining   50                                             │
//! │    50  × 1   remaining    0  ✓                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitation
//! Greedy gives the fewest pieces for canonical currency systems (every
//! real-world note/coin series this engine targets). For a non-canonical
//! catalog such as `{4, 3, 1}` it can hand out more pieces than necessary
//! (6 → 4+1+1 instead of 3+3). The catalog is deployment configuration; a
//! deployment with such a catalog gets a correct but non-minimal breakdown.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_amount;
use crate::MAX_TENDER_SUGGESTIONS;

// =============================================================================
// Denominations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DenominationKind {
    Note,
    Coin,
}

/// A single note or coin face value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Denomination {
    pub face_value: Money,
    pub kind: DenominationKind,
    pub label: String,
}

impl Denomination {
    pub fn note(face_value: i64, label: impl Into<String>) -> Self {
        Denomination {
            face_value: Money::from_units(face_value),
            kind: DenominationKind::Note,
            label: label.into(),
        }
    }

    pub fn coin(face_value: i64, label: impl Into<String>) -> Self {
        Denomination {
            face_value: Money::from_units(face_value),
            kind: DenominationKind::Coin,
            label: label.into(),
        }
    }
}

/// The deployment's notes and coins, largest first.
///
/// Supplied by configuration, never hard-coded in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Denomination>", into = "Vec<Denomination>")]
pub struct DenominationCatalog {
    denominations: Vec<Denomination>,
}

impl DenominationCatalog {
    /// Builds a catalog, sorting it by descending face value.
    ///
    /// ## Rules
    /// - At least one denomination
    /// - Every face value > 0
    /// - No two denominations share a face value
    pub fn new(mut denominations: Vec<Denomination>) -> CoreResult<Self> {
        if denominations.is_empty() {
            return Err(ValidationError::Required {
                field: "denominations".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for d in &denominations {
            if !d.face_value.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: format!("face value of '{}'", d.label),
                }
                .into());
            }
            if !seen.insert(d.face_value) {
                return Err(ValidationError::Duplicate {
                    field: "face value".to_string(),
                    value: d.face_value.to_string(),
                }
                .into());
            }
        }

        denominations.sort_by(|a, b| b.face_value.cmp(&a.face_value));
        Ok(DenominationCatalog { denominations })
    }

    /// Largest first.
    pub fn iter(&self) -> impl Iterator<Item = &Denomination> {
        self.denominations.iter()
    }

    pub fn len(&self) -> usize {
        self.denominations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.denominations.is_empty()
    }

    pub fn smallest(&self) -> Option<&Denomination> {
        self.denominations.last()
    }

    pub fn find(&self, face_value: Money) -> Option<&Denomination> {
        self.denominations.iter().find(|d| d.face_value == face_value)
    }
}

impl TryFrom<Vec<Denomination>> for DenominationCatalog {
    type Error = CoreError;

    fn try_from(value: Vec<Denomination>) -> Result<Self, Self::Error> {
        DenominationCatalog::new(value)
    }
}

impl From<DenominationCatalog> for Vec<Denomination> {
    fn from(catalog: DenominationCatalog) -> Self {
        catalog.denominations
    }
}

// =============================================================================
// Change Breakdown
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChangeEntry {
    pub denomination: Denomination,
    pub count: u32,
}

impl ChangeEntry {
    pub fn subtotal(&self) -> Money {
        self.denomination.face_value * self.count
    }
}

/// Pieces to hand back, largest denomination first. Only denominations
/// actually used appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChangeBreakdown {
    pub change_due: Money,
    pub entries: Vec<ChangeEntry>,
}

impl ChangeBreakdown {
    /// Σ face value × count; always equals `change_due`.
    pub fn total(&self) -> Money {
        self.entries.iter().map(ChangeEntry::subtotal).sum()
    }

    pub fn piece_count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.count)).sum()
    }

    pub fn note_count(&self) -> u64 {
        self.count_of(DenominationKind::Note)
    }

    pub fn coin_count(&self) -> u64 {
        self.count_of(DenominationKind::Coin)
    }

    fn count_of(&self, kind: DenominationKind) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.denomination.kind == kind)
            .map(|e| u64::from(e.count))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Decomposes `amount_tendered - amount_due` into denominations.
///
/// ## Errors
/// - `InsufficientPayment` if `amount_tendered < amount_due`
/// - `UnrepresentableAmount` if the catalog cannot make the exact change
///   (e.g. no unit-value coin and an odd remainder)
/// - `TooManyPieces` if a single denomination would exceed `u32::MAX` pieces
///
/// ## Example
/// ```rust
/// use till_core::change::{compute_change, Denomination, DenominationCatalog};
/// use till_core::Money;
///
/// let catalog = DenominationCatalog::new(
///     [5000, 2000, 1000, 500, 100, 50, 25, 10, 5]
///         .into_iter()
///         .map(|v| Denomination::coin(v, v.to_string()))
///         .collect(),
/// )
/// .unwrap();
///
/// let change =
///     compute_change(Money::from_units(10_000), Money::from_units(7350), &catalog).unwrap();
/// assert_eq!(change.total().units(), 2650);
/// assert_eq!(change.piece_count(), 4); // 2000 + 500 + 100 + 50
/// ```
pub fn compute_change(
    amount_tendered: Money,
    amount_due: Money,
    catalog: &DenominationCatalog,
) -> CoreResult<ChangeBreakdown> {
    validate_amount("amount tendered", amount_tendered.units())?;
    validate_amount("amount due", amount_due.units())?;

    if amount_tendered < amount_due {
        return Err(CoreError::InsufficientPayment {
            tendered: amount_tendered,
            due: amount_due,
        });
    }

    let change_due = amount_tendered - amount_due;
    let mut remaining = change_due.units();
    let mut entries = Vec::new();

    for denomination in catalog.iter() {
        let face = denomination.face_value.units();
        let count = remaining / face;
        if count > 0 {
            let pieces = u32::try_from(count).map_err(|_| CoreError::TooManyPieces {
                denomination: denomination.face_value,
                count,
            })?;
            remaining -= count * face;
            entries.push(ChangeEntry {
                denomination: denomination.clone(),
                count: pieces,
            });
        }
    }

    if remaining != 0 {
        return Err(CoreError::UnrepresentableAmount {
            amount: change_due,
            remainder: Money::from_units(remaining),
        });
    }

    Ok(ChangeBreakdown {
        change_due,
        entries,
    })
}

/// Quick-tender amounts for `amount_due`, at most `MAX_TENDER_SUGGESTIONS`.
///
/// See [`suggest_tender_amounts`].
pub fn suggest_rounded_amounts(amount_due: Money, catalog: &DenominationCatalog) -> Vec<Money> {
    suggest_tender_amounts(amount_due, catalog, MAX_TENDER_SUGGESTIONS)
}

/// Quick-tender amounts for `amount_due`, ascending, at most `limit`.
///
/// Candidates are the exact amount plus `amount_due` rounded up to each
/// face value in the catalog; duplicates collapse. Every suggestion is
/// `>= amount_due`.
///
/// ```rust
/// use till_core::change::{suggest_tender_amounts, Denomination, DenominationCatalog};
/// use till_core::Money;
///
/// let catalog = DenominationCatalog::new(vec![
///     Denomination::note(5000, "5000"),
///     Denomination::note(1000, "1000"),
///     Denomination::coin(100, "100"),
///     Denomination::coin(1, "1"),
/// ])
/// .unwrap();
///
/// let amounts: Vec<i64> = suggest_tender_amounts(Money::from_units(7350), &catalog, 5)
///     .into_iter()
///     .map(|m| m.units())
///     .collect();
/// assert_eq!(amounts, vec![7350, 7400, 8000, 10_000]);
/// ```
pub fn suggest_tender_amounts(
    amount_due: Money,
    catalog: &DenominationCatalog,
    limit: usize,
) -> Vec<Money> {
    let amount_due = amount_due.max(Money::zero());

    let mut candidates = BTreeSet::new();
    candidates.insert(amount_due);
    for denomination in catalog.iter() {
        candidates.insert(amount_due.round_up_to(denomination.face_value));
    }

    candidates.into_iter().take(limit).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
