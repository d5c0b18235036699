// crates/lecture-catalog-store-sqlite/src/retry.rs
// ============================================================================
// Module: Schema Repair Retry
// Description: Single repair-and-retry around one database operation.
// Purpose: Survive external schema drift without surfacing it to callers.
// Dependencies: rusqlite, tracing
// ============================================================================

//! ## Overview
//! When an operation fails because a table, column, or index is missing, the
//! wrapper runs the repair closure once and retries the operation once. Any
//! other failure, and any failure of the retry, is returned unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;

use crate::error::SqliteStoreError;

// ============================================================================
// SECTION: Wrapper
// ============================================================================

/// Runs `op`, repairing the schema and retrying once on drift.
///
/// # Errors
///
/// Returns the first non-drift error, the repair error, or the retry's error.
pub fn with_schema_repair<T, Op, Repair>(
    operation: &str,
    connection: &mut Connection,
    mut op: Op,
    repair: Repair,
) -> Result<T, SqliteStoreError>
where
    Op: FnMut(&mut Connection) -> Result<T, SqliteStoreError>,
    Repair: FnOnce(&mut Connection) -> Result<(), SqliteStoreError>,
{
    match op(connection) {
        Err(SqliteStoreError::SchemaDrift(message)) => {
            tracing::warn!(
                operation,
                error = %message,
                "schema drift detected; re-asserting schema and retrying once"
            );
            repair(connection)?;
            op(connection)
        }
        outcome => outcome,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
