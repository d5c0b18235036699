// crates/lecture-catalog-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Store Errors
// Description: Error taxonomy for the catalog store.
// Purpose: Classify engine failures into actionable categories.
// Dependencies: rusqlite, thiserror, lecture-catalog-core
// ============================================================================

//! ## Overview
//! Every engine error passes through [`SqliteStoreError::from`], which
//! separates schema drift (a missing table, column, or index) and uniqueness
//! violations from generic database failures. The repair-and-retry wrapper
//! only reacts to [`SqliteStoreError::SchemaDrift`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::ValidationError;
use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Engine message fragments that indicate the schema is behind the code.
const SCHEMA_DRIFT_MARKERS: [&str; 4] =
    ["no such table", "no such column", "no such index", "has no column named"];

/// Message raised by the sheikh number validation triggers.
pub(crate) const SHEIKH_NUMBER_TRIGGER_MESSAGE: &str = "sheikh_number must be exactly 8 digits";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` catalog store errors.
///
/// # Invariants
/// - Messages never embed password hashes or raw blob payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Schema object missing; repairable by re-asserting migrations.
    #[error("sqlite store schema drift: {0}")]
    SchemaDrift(String),
    /// Store corruption or unreadable stored values.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema is newer than this build supports.
    #[error("sqlite store version mismatch: found {found}, supported {supported}")]
    VersionMismatch {
        /// Version recorded in the database.
        found: u32,
        /// Latest version known to this build.
        supported: u32,
    },
    /// Invalid input or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Uniqueness constraint violated.
    #[error("sqlite store duplicate: {0}")]
    Duplicate(String),
    /// Scheduling conflict for a sheikh, category, and start time.
    #[error(
        "schedule conflict: sheikh {sheikh_id} already has a lecture in category {category_id} \
         at {start_time}"
    )]
    Conflict {
        /// Sheikh owning the clashing lecture.
        sheikh_id: String,
        /// Category shared by both lectures.
        category_id: String,
        /// Shared start instant in milliseconds.
        start_time: i64,
    },
    /// Referenced record does not exist.
    #[error("sqlite store not found: {0}")]
    NotFound(String),
}

impl SqliteStoreError {
    /// Returns true when the error is schema drift.
    #[must_use]
    pub const fn is_schema_drift(&self) -> bool {
        matches!(self, Self::SchemaDrift(_))
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, message) => {
                let text = message.clone().unwrap_or_else(|| error.to_string());
                if failure.code == ErrorCode::ConstraintViolation {
                    if text.contains(SHEIKH_NUMBER_TRIGGER_MESSAGE) {
                        return Self::Invalid(text);
                    }
                    if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                        || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    {
                        return Self::Duplicate(text);
                    }
                }
                if matches!(failure.code, ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) {
                    return Self::Corrupt(text);
                }
                if is_schema_drift_message(&text) {
                    return Self::SchemaDrift(text);
                }
                Self::Db(text)
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => Self::Corrupt(error.to_string()),
            _ => {
                let text = error.to_string();
                if is_schema_drift_message(&text) {
                    Self::SchemaDrift(text)
                } else {
                    Self::Db(text)
                }
            }
        }
    }
}

impl From<ValidationError> for SqliteStoreError {
    fn from(error: ValidationError) -> Self {
        Self::Invalid(error.to_string())
    }
}

impl From<std::io::Error> for SqliteStoreError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

/// Returns true when an engine message names a missing schema object.
#[must_use]
pub fn is_schema_drift_message(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    SCHEMA_DRIFT_MARKERS.iter().any(|marker| lowered.contains(marker))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use rusqlite::Connection;

    use super::SqliteStoreError;
    use super::is_schema_drift_message;

    #[test]
    fn drift_markers_are_recognized() {
        assert!(is_schema_drift_message("no such table: lectures"));
        assert!(is_schema_drift_message("table lectures has no column named sheikh_id"));
        assert!(!is_schema_drift_message("database is locked"));
    }

    #[test]
    fn engine_errors_are_classified() {
        let connection = Connection::open_in_memory().unwrap();
        let missing = connection.execute("SELECT * FROM missing_table", []).unwrap_err();
        assert!(matches!(SqliteStoreError::from(missing), SqliteStoreError::SchemaDrift(_)));

        connection.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY, v TEXT UNIQUE);").unwrap();
        connection.execute("INSERT INTO t VALUES ('a', 'x')", []).unwrap();
        let duplicate = connection.execute("INSERT INTO t VALUES ('b', 'x')", []).unwrap_err();
        assert!(matches!(SqliteStoreError::from(duplicate), SqliteStoreError::Duplicate(_)));
    }
}
