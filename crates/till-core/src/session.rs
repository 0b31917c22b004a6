//! # Cash Session Reconciliation
//!
//! Tracks one drawer from open to close and compares the counted cash with
//! what should be there.
//!
//! ## Drawer Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Session Close                                  │
//! │                                                                         │
//! │  Open:    float_amount fixed (e.g. 50000)                               │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  Sales:   totals per method pushed in by the sales pipeline             │
//! │           cash 120000 │ card 80000 │ mobile 0 │ other 0                 │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  Count:   expected = float + cash sales          = 170000               │
//! │           counted  (from the drawer)             = 169000               │
//! │           variance = counted − expected          =  −1000  → SHORTAGE   │
//! │              │                                                          │
//! │              ▼  reconcile() may run any number of times                 │
//! │  Close:   counted cash and variance frozen, once                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Card, mobile and other sales are reported but never enter the drawer
//! math. There is no tolerance band: any non-zero variance is flagged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use ts_rs::TS;

use crate::change::{ChangeEntry, Denomination};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::validate_amount;

// =============================================================================
// Reconciliation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VarianceClassification {
    Balanced,
    Surplus,
    Shortage,
}

impl VarianceClassification {
    pub fn from_variance(variance: Money) -> Self {
        if variance.is_zero() {
            VarianceClassification::Balanced
        } else if variance.is_positive() {
            VarianceClassification::Surplus
        } else {
            VarianceClassification::Shortage
        }
    }
}

impl fmt::Display for VarianceClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarianceClassification::Balanced => write!(f, "balanced"),
            VarianceClassification::Surplus => write!(f, "surplus"),
            VarianceClassification::Shortage => write!(f, "shortage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub expected: Money,
    pub counted: Money,
    /// `counted - expected`.
    pub variance: Money,
    pub classification: VarianceClassification,
}

/// Compares `counted` against the session's expected cash.
///
/// Pure: identical inputs give identical output, and the session is not
/// touched. The close workflow calls this repeatedly while the cashier
/// adjusts the count.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use till_core::session::{reconcile, CashSession, SalesTotals, VarianceClassification};
/// use till_core::Money;
///
/// let mut session = CashSession::open(Money::from_units(50_000), Utc::now()).unwrap();
/// session
///     .update_sales(SalesTotals {
///         cash: Money::from_units(120_000),
///         ..SalesTotals::default()
///     })
///     .unwrap();
///
/// let result = reconcile(&session, Money::from_units(169_000));
/// assert_eq!(result.variance.units(), -1000);
/// assert_eq!(result.classification, VarianceClassification::Shortage);
/// ```
pub fn reconcile(session: &CashSession, counted: Money) -> Reconciliation {
    let expected = session.expected_cash();
    let variance = counted - expected;
    Reconciliation {
        expected,
        counted,
        variance,
        classification: VarianceClassification::from_variance(variance),
    }
}

// =============================================================================
// Sales Totals
// =============================================================================

/// Running sales totals per payment method, as reported by the sales
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTotals {
    pub cash: Money,
    pub card: Money,
    pub mobile: Money,
    pub other: Money,
}

impl SalesTotals {
    pub fn total(&self) -> Money {
        self.cash + self.card + self.mobile + self.other
    }

    fn validate(&self) -> CoreResult<()> {
        validate_amount("cash sales total", self.cash.units())?;
        validate_amount("card sales total", self.card.units())?;
        validate_amount("mobile sales total", self.mobile.units())?;
        validate_amount("other sales total", self.other.units())?;
        Ok(())
    }
}

// =============================================================================
// Cash Session
// =============================================================================

/// One drawer from open to close.
///
/// Fields are read through accessors only: the float is fixed by
/// [`CashSession::open`] and the close fields by [`CashSession::close`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CashSession {
    #[ts(as = "String")]
    opened_at: DateTime<Utc>,
    float_amount: Money,
    cash_sales_total: Money,
    card_sales_total: Money,
    mobile_sales_total: Money,
    other_sales_total: Money,
    /// Set once, at close.
    counted_cash: Option<Money>,
    /// Set once, at close.
    variance: Option<Money>,
    #[ts(as = "Option<String>")]
    closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    /// Opens a drawer with `float_amount` in it. The float never changes
    /// afterwards.
    pub fn open(float_amount: Money, opened_at: DateTime<Utc>) -> CoreResult<Self> {
        validate_amount("float amount", float_amount.units())?;
        debug!(float = %float_amount, "Cash session opened");

        Ok(CashSession {
            opened_at,
            float_amount,
            cash_sales_total: Money::zero(),
            card_sales_total: Money::zero(),
            mobile_sales_total: Money::zero(),
            other_sales_total: Money::zero(),
            counted_cash: None,
            variance: None,
            closed_at: None,
        })
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn float_amount(&self) -> Money {
        self.float_amount
    }

    /// Counted cash frozen at close; `None` while open.
    pub fn counted_cash(&self) -> Option<Money> {
        self.counted_cash
    }

    /// `counted - expected` frozen at close; `None` while open.
    pub fn variance(&self) -> Option<Money> {
        self.variance
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Replaces the sales totals with the pipeline's latest aggregates.
    pub fn update_sales(&mut self, totals: SalesTotals) -> CoreResult<()> {
        self.ensure_open()?;
        totals.validate()?;

        self.cash_sales_total = totals.cash;
        self.card_sales_total = totals.card;
        self.mobile_sales_total = totals.mobile;
        self.other_sales_total = totals.other;
        debug!(cash = %totals.cash, total = %totals.total(), "Session sales updated");
        Ok(())
    }

    /// Adds a single sale to the running total for its method.
    pub fn record_sale(&mut self, method: PaymentMethod, amount: Money) -> CoreResult<()> {
        self.ensure_open()?;
        validate_amount("sale amount", amount.units())?;

        let bucket = match method {
            PaymentMethod::Cash => &mut self.cash_sales_total,
            PaymentMethod::Card => &mut self.card_sales_total,
            PaymentMethod::Mobile => &mut self.mobile_sales_total,
            PaymentMethod::Other => &mut self.other_sales_total,
        };
        let updated = bucket.units().checked_add(amount.units()).unwrap_or(i64::MAX);
        validate_amount("sales total", updated)?;
        *bucket = Money::from_units(updated);
        Ok(())
    }

    pub fn sales(&self) -> SalesTotals {
        SalesTotals {
            cash: self.cash_sales_total,
            card: self.card_sales_total,
            mobile: self.mobile_sales_total,
            other: self.other_sales_total,
        }
    }

    /// `float_amount + cash_sales_total`.
    pub fn expected_cash(&self) -> Money {
        self.float_amount + self.cash_sales_total
    }

    /// Sales across every payment method.
    pub fn total_sales(&self) -> Money {
        self.sales().total()
    }

    /// Same as the free [`reconcile`].
    pub fn reconcile(&self, counted: Money) -> Reconciliation {
        reconcile(self, counted)
    }

    /// Freezes the counted cash and variance. A session closes once.
    pub fn close(
        &mut self,
        counted: Money,
        closed_at: DateTime<Utc>,
    ) -> CoreResult<Reconciliation> {
        self.ensure_open()?;
        validate_amount("counted cash", counted.units())?;

        let result = reconcile(self, counted);
        self.counted_cash = Some(result.counted);
        self.variance = Some(result.variance);
        self.closed_at = Some(closed_at);

        info!(
            expected = %result.expected,
            counted = %result.counted,
            variance = %result.variance,
            classification = %result.classification,
            "Cash session closed"
        );
        Ok(result)
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_closed() {
            Err(CoreError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Cash Count
// =============================================================================

/// Pieces counted in the drawer at close, one entry per denomination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashCount {
    pub entries: Vec<ChangeEntry>,
}

impl CashCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the count for `denomination`, replacing any earlier count.
    /// A count of zero drops the entry.
    pub fn set(&mut self, denomination: &Denomination, count: u32) {
        self.entries
            .retain(|e| e.denomination.face_value != denomination.face_value);
        if count > 0 {
            self.entries.push(ChangeEntry {
                denomination: denomination.clone(),
                count,
            });
            self.entries
                .sort_by(|a, b| b.denomination.face_value.cmp(&a.denomination.face_value));
        }
    }

    pub fn count_of(&self, face_value: Money) -> u32 {
        self.entries
            .iter()
            .find(|e| e.denomination.face_value == face_value)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Counted cash to feed into [`reconcile`].
    pub fn total(&self) -> Money {
        self.entries.iter().map(ChangeEntry::subtotal).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
