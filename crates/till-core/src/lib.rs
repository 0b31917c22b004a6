//! # till-core: Pricing, Discount and Settlement Engine
//!
//! This crate turns a list of line items into a payable amount, splits that
//! amount among payers, works out physical change, and reconciles a cash
//! drawer. Every function is pure: no I/O, no clock, no global state.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            UI / order service (external collaborators)          │   │
//! │  │    Cart screen ──► Payment modal ──► Split dialog ──► Close     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   money ──► pricing ──► cart ──┬──► change                      │   │
//! │  │                                ├──► split                       │   │
//! │  │                                └──► session                     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 till-config (deployment shell)                  │   │
//! │  │          denomination catalog, currency, logging setup          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money and half-up percentage rounding
//! - [`types`] - Tax rates, discounts, payment methods
//! - [`pricing`] - Single line pricing
//! - [`cart`] - Cart aggregation and cart-wide discounts
//! - [`change`] - Change in discrete notes and coins
//! - [`split`] - Split-bill allocation and settlement
//! - [`session`] - Cash drawer reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Input range checks
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: amounts are whole base units (i64), never floats
//! 2. **Half-Up Rounding**: every percentage rounds half up, exactly once
//! 3. **Explicit Errors**: every failure is a typed `CoreError`, never a panic
//! 4. **Single Writer**: split and cash sessions are owned structs; callers
//!    serialize access
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{Cart, Discount, LineItem, Money};
//!
//! let mut cart = Cart::new();
//! cart.add_line(LineItem::new("l1", "Pizza", Money::from_units(1000), 3).unwrap())
//!     .unwrap();
//! cart.set_line_discount("l1", Some(Discount::percentage(10))).unwrap();
//!
//! let totals = cart.totals();
//! assert_eq!(totals.subtotal.units(), 3000);
//! assert_eq!(totals.grand_total.units(), 2700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod change;
pub mod error;
pub mod money;
pub mod pricing;
pub mod session;
pub mod split;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use cart::{apply_cart_discount, Cart, CartTotals};
pub use change::{
    compute_change, suggest_rounded_amounts, suggest_tender_amounts, ChangeBreakdown,
    ChangeEntry, Denomination, DenominationCatalog, DenominationKind,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{apply_line_discount, LineItem, Supplement};
pub use session::{
    reconcile, CashCount, CashSession, Reconciliation, SalesTotals, VarianceClassification,
};
pub use split::{
    SettledPayment, SettlementRejected, SplitMode, SplitPart, SplitSession, SplitSettlement,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps ITEMS-mode splits small.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest single amount the engine accepts (prices, floats, tenders).
///
/// ## Business Reason
/// A line of 999 units at this price, times a full cart, still fits in
/// `i64` with room for tax.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000;

/// Maximum payers in one split.
pub const MAX_SPLIT_PARTS: usize = 50;

/// Payers a new split session starts with.
pub const DEFAULT_SPLIT_PARTS: u32 = 2;

/// Quick-tender buttons offered by default.
pub const MAX_TENDER_SUGGESTIONS: usize = 5;
