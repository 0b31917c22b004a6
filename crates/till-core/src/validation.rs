//! # Validation Module
//!
//! Input checks for the primitive values collaborators hand to the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Catalog / UI                                                  │
//! │  └── Supplies prices, rates, quantities it believes are valid           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Range checks at the engine boundary (quantity, amounts, rates)     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine operations                                             │
//! │  └── Rule checks (discount bounds, locks, settlement preconditions)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_amount, validate_quantity};
//!
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_amount("unit price", 0).is_ok());
//! assert!(validate_amount("unit price", -1).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_UNITS, MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_SPLIT_PARTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted line id.
pub const MAX_LINE_ID_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a cart line id.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 64 characters
pub fn validate_line_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "line id".to_string(),
        });
    }

    if id.len() > MAX_LINE_ID_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "line id".to_string(),
            reason: format!("must be at most {} characters", MAX_LINE_ID_LEN),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Change Quantity                                                  │
/// │                                                                         │
/// │  User enters quantity: 5                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"      │
/// │       └── OK → line is repriced                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a whole-unit amount (price, float, sales total, tendered cash).
///
/// Zero is allowed (free items, empty drawer). The upper bound keeps every
/// cart total, quantity product and tax computation inside `i64`.
pub fn validate_amount(field: &str, units: i64) -> ValidationResult<()> {
    if units < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if units > MAX_AMOUNT_UNITS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_UNITS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates the number of payers in an equal split.
pub fn validate_part_count(parts: u32) -> ValidationResult<()> {
    if parts == 0 {
        return Err(ValidationError::MustBePositive {
            field: "number of parts".to_string(),
        });
    }

    if parts as usize > MAX_SPLIT_PARTS {
        return Err(ValidationError::OutOfRange {
            field: "number of parts".to_string(),
            min: 1,
            max: MAX_SPLIT_PARTS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding one more line.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_line_id() {
        assert!(validate_line_id("line-1").is_ok());
        assert!(validate_line_id("").is_err());
        assert!(validate_line_id("   ").is_err());
        assert!(validate_line_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", 0).is_ok());
        assert!(validate_amount("price", 1099).is_ok());
        assert!(validate_amount("price", -100).is_err());
        assert!(validate_amount("price", MAX_AMOUNT_UNITS).is_ok());
        assert!(matches!(
            validate_amount("price", MAX_AMOUNT_UNITS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(825).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_part_count() {
        assert!(validate_part_count(1).is_ok());
        assert!(validate_part_count(MAX_SPLIT_PARTS as u32).is_ok());
        assert!(validate_part_count(0).is_err());
        assert!(validate_part_count(MAX_SPLIT_PARTS as u32 + 1).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }
}
