// crates/lecture-catalog-core/src/core/error.rs
// ============================================================================
// Module: Lecture Catalog Validation Errors
// Description: Typed failures raised when inputs violate domain invariants.
// Purpose: Give storage backends one error type for boundary validation.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation errors are constraint violations: they are surfaced to the
//! caller as typed failures and never retried automatically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Domain validation failures.
///
/// # Invariants
/// - Messages never embed passwords or password hashes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sheikh number did not reduce to exactly eight ASCII digits.
    #[error("sheikh number must contain exactly 8 digits (found {digits})")]
    SheikhNumber {
        /// Number of digits left after stripping non-digit characters.
        digits: usize,
    },
    /// A required text field was empty after trimming.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A timestamp could not be parsed or represented.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
    /// A lecture status label was not recognized.
    #[error("unknown lecture status: {0}")]
    Status(String),
    /// A lecture ends before it starts.
    #[error("lecture end time precedes its start time")]
    EndBeforeStart,
}

/// Rejects empty or whitespace-only text for a required field.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] when `value` is blank.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty {
            field,
        });
    }
    Ok(())
}
