//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → caller                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected command never mutates the store: callers get an error and
//! the previous state is untouched.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations raised by store commands, the cart and the GRN
/// processor.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item cannot be found in the item master.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Supplier cannot be found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// Invoice cannot be found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Tried to confirm a goods received note that has no lines.
    ///
    /// ## User Workflow
    /// ```text
    /// Open GRN ──► (no lines added) ──► Confirm
    ///                                      │
    ///                                      ▼
    ///                          EmptyGoodsReceipt, stock unchanged
    /// ```
    #[error("Goods received note has no lines")]
    EmptyGoodsReceipt,

    /// A line position does not exist in the draft.
    #[error("Line {index} out of range (draft has {len} lines)")]
    LineIndexOutOfRange { index: usize, len: usize },

    /// Item is not in the cart.
    #[error("Item {0} not in cart")]
    NotInCart(String),

    /// Tried to take payment for an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash received does not cover the grand total.
    #[error("Insufficient tender: required {required}, received {received}")]
    InsufficientTender { required: Money, received: Money },

    /// A total or stock level does not fit in 64 bits.
    #[error("{0} is too large")]
    Overflow(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU).
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineIndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.to_string(), "Line 3 out of range (draft has 2 lines)");

        let err = CoreError::ItemNotFound("item_9".to_string());
        assert_eq!(err.to_string(), "Item not found: item_9");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");

        let err = ValidationError::Duplicate {
            field: "sku".to_string(),
            value: "HW-LPT-001".to_string(),
        };
        assert_eq!(err.to_string(), "sku 'HW-LPT-001' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
