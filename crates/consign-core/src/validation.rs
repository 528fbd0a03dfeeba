//! # Validation Module
//!
//! Input validation for caller-supplied account and item fields.
//!
//! These run before lifecycle logic; the database's NOT NULL constraints
//! are the second line of defense. Split percentages are intentionally
//! NOT range-checked here: legacy data carries out-of-range terms and
//! the split arithmetic handles them deterministically (boundary behavior
//! is covered by pricing tests instead).

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length for name fields.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length for item descriptions.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Validates a person or item name field.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an item description (may be empty, bounded length).
pub fn validate_description(value: &str) -> ValidationResult<()> {
    if value.len() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Validates a price or fee (must not be negative).
pub fn validate_price(field: &str, value: Money) -> ValidationResult<()> {
    if value.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}
