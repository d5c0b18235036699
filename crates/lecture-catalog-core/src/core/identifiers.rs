// crates/lecture-catalog-core/src/core/identifiers.rs
// ============================================================================
// Module: Lecture Catalog Identifiers
// Description: Opaque record identifiers and the external sheikh number.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Record identifiers are opaque strings minted by an injected
//! [`crate::IdGenerator`]. The sheikh number is different: it is an
//! external-facing, fixed-width eight digit code validated on construction,
//! so no invalid value can reach storage through this type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValidationError;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_id!(
    /// User account identifier.
    UserId
);
opaque_id!(
    /// Sheikh (lecturer) record identifier.
    SheikhId
);
opaque_id!(
    /// Category identifier.
    CategoryId
);
opaque_id!(
    /// Subcategory identifier.
    SubcategoryId
);
opaque_id!(
    /// Lecture identifier.
    LectureId
);

// ============================================================================
// SECTION: Sheikh Number
// ============================================================================

/// Required digit count for sheikh numbers.
pub const SHEIKH_NUMBER_DIGITS: usize = 8;

/// External-facing eight digit sheikh number.
///
/// # Invariants
/// - Always exactly [`SHEIKH_NUMBER_DIGITS`] ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SheikhNumber(String);

impl SheikhNumber {
    /// Strips non-digit characters and validates the remaining digits.
    ///
    /// Inputs are never padded or truncated: `"1234-5678"` is accepted as
    /// `12345678`, while `"1234567"` and `"123456789"` are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SheikhNumber`] when the digit count is not
    /// exactly eight.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.len() != SHEIKH_NUMBER_DIGITS {
            return Err(ValidationError::SheikhNumber {
                digits: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheikhNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SheikhNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SheikhNumber> for String {
    fn from(value: SheikhNumber) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
