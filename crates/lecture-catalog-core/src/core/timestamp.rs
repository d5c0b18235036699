// crates/lecture-catalog-core/src/core/timestamp.rs
// ============================================================================
// Module: Lecture Catalog Timestamps
// Description: Millisecond-precision UTC instants.
// Purpose: Provide one comparable instant type for scheduling and audit fields.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`UnixMillis`] is the only instant type in the catalog. Two instants are
//! equal exactly when their millisecond counts are equal, which is the basis
//! of the exact-match scheduling rule. Callers that want "same wall-clock
//! minute" semantics normalize with [`UnixMillis::truncate_to_minute`] first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use ::time::OffsetDateTime;
use ::time::format_description::well_known::Rfc3339;
use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ValidationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one minute.
const MILLIS_PER_MINUTE: i64 = 60_000;
/// Nanoseconds in one millisecond.
const NANOS_PER_MILLI: i128 = 1_000_000;

// ============================================================================
// SECTION: Unix Millis
// ============================================================================

/// Milliseconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixMillis(i64);

impl UnixMillis {
    /// Wraps a raw millisecond count.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond count.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 timestamp such as `2024-01-15T10:00:00Z`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Timestamp`] when the input is not RFC 3339
    /// or falls outside the representable range.
    pub fn parse_rfc3339(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input.trim(), &Rfc3339)
            .map_err(|err| ValidationError::Timestamp(err.to_string()))?;
        let millis = parsed.unix_timestamp_nanos() / NANOS_PER_MILLI;
        i64::try_from(millis)
            .map(Self)
            .map_err(|_| ValidationError::Timestamp("timestamp out of range".to_string()))
    }

    /// Formats the instant as RFC 3339 in UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Timestamp`] when the instant cannot be
    /// represented as a calendar date.
    pub fn to_rfc3339(self) -> Result<String, ValidationError> {
        let nanos = i128::from(self.0) * NANOS_PER_MILLI;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|err| ValidationError::Timestamp(err.to_string()))?;
        datetime.format(&Rfc3339).map_err(|err| ValidationError::Timestamp(err.to_string()))
    }

    /// Drops seconds and sub-second components.
    #[must_use]
    pub const fn truncate_to_minute(self) -> Self {
        Self(self.0 - self.0.rem_euclid(MILLIS_PER_MINUTE))
    }

    /// Returns the instant shifted by a number of minutes.
    #[must_use]
    pub const fn plus_minutes(self, minutes: i64) -> Self {
        Self(self.0.saturating_add(minutes.saturating_mul(MILLIS_PER_MINUTE)))
    }
}

impl fmt::Display for UnixMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for UnixMillis {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
