//! # Error Types
//!
//! Domain-specific error types for consign-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  consign-core errors (this file)                                    │
//! │  ├── CoreError        - Lifecycle rule violations                   │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  consign-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  consign-sync errors (separate crate)                               │
//! │  └── SyncError        - Folded into SyncReport, never thrown at UI  │
//! │                                                                     │
//! │  Domain-rule violations propagate as errors to the caller; sync     │
//! │  failures are captured and returned as structured results.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::ItemStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent domain-rule violations the caller must prevent or
/// report; they are never silently swallowed.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Referenced item does not exist.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Attempted a transition on an item that is not Active.
    ///
    /// Sold, Returned, and Expired are terminal; re-selling a sold item
    /// or returning an expired one lands here.
    #[error("Item {item_id} is not active (status: {status})")]
    InvalidItemState { item_id: String, status: ItemStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Early checks on caller-supplied fields, before lifecycle logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },
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
        let err = CoreError::InvalidItemState {
            item_id: "I000001".to_string(),
            status: ItemStatus::Sold,
        };
        assert_eq!(err.to_string(), "Item I000001 is not active (status: sold)");

        let err = CoreError::AccountNotFound("A9999".to_string());
        assert_eq!(err.to_string(), "Account not found: A9999");
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
