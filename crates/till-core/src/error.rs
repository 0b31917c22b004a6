//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                           │
//! │  ├── CoreError        - Pricing / change / split / session failures     │
//! │  └── ValidationError  - Field-level input failures                      │
//! │                                                                         │
//! │  till-config errors (separate crate)                                    │
//! │  └── ConfigError      - Config file / environment failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → caller → user-facing message       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure here is a local validation failure. Nothing is transient and
//! nothing is retried; the caller shows the message and lets a human fix the
//! input.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Engine errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Discount value out of bounds for its kind.
    #[error("Invalid discount: {0}")]
    InvalidDiscount(String),

    /// Cash tendered does not cover the amount due.
    ///
    /// ## User Workflow
    /// ```text
    /// Amount due: 7350
    /// Tendered:   5000
    ///      │
    ///      ▼
    /// InsufficientPayment { tendered: 5000, due: 7350 }
    ///      │
    ///      ▼
    /// UI shows: "2350 still owed"
    /// ```
    #[error("Insufficient payment: tendered {tendered}, due {due}")]
    InsufficientPayment { tendered: Money, due: Money },

    /// The change cannot be made from the configured denominations.
    #[error("Change of {amount} cannot be made with the configured denominations ({remainder} left over)")]
    UnrepresentableAmount { amount: Money, remainder: Money },

    /// One denomination would be handed out more times than a count can hold.
    #[error("Change needs {count} pieces of {denomination}, more than can be counted")]
    TooManyPieces { denomination: Money, count: i64 },

    /// Mutation of a paid split part, or a mode change after payments began.
    #[error("Split is locked: {0}")]
    SplitLocked(String),

    /// Settlement attempted with unpaid parts or unassigned items.
    #[error("Settlement incomplete: {unpaid_parts} unpaid part(s), {unassigned_items} unassigned item(s)")]
    IncompleteSettlement {
        unpaid_parts: usize,
        unassigned_items: usize,
    },

    /// Split part amounts do not add up to the bill total.
    ///
    /// `variance` is `total - allocated`: positive means under-allocated,
    /// negative means over-allocated.
    #[error("Split amounts total {allocated}, expected {total} (variance {variance})")]
    AmountMismatch {
        total: Money,
        allocated: Money,
        variance: Money,
    },

    /// The requested operation only exists in another split mode.
    #[error("Cannot {operation} in {mode} split mode")]
    ModeMismatch {
        operation: &'static str,
        mode: String,
    },

    #[error("Line not found: {0}")]
    LineNotFound(String),

    #[error("Line {0} is already in the cart")]
    DuplicateLine(String),

    #[error("Split part not found: {0}")]
    PartNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The cash session has already been closed.
    #[error("Cash session is closed")]
    SessionClosed,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any engine logic runs, when a primitive value handed in by
/// a collaborator is out of range.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., two denominations with the same face value).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
