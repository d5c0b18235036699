// crates/lecture-catalog-store-sqlite/src/conflict.rs
// ============================================================================
// Module: Scheduling Conflict Detection
// Description: Exact-match check on sheikh, category, and start instant.
// Purpose: Stop a sheikh from holding two lectures in one slot.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Two lectures conflict when they share the owning sheikh, the category,
//! and the exact start instant. Overlapping ranges with different start
//! instants do not conflict, and neither do lectures in different
//! categories. Soft-deleted lectures never conflict; drafts and archived
//! lectures do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::LectureId;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::UnixMillis;
use rusqlite::Connection;
use rusqlite::params;

use crate::error::SqliteStoreError;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Returns true when another non-deleted lecture occupies the slot.
pub(crate) fn schedule_conflict_exists(
    connection: &Connection,
    sheikh_id: &SheikhId,
    category_id: &CategoryId,
    start_time: UnixMillis,
    exclude: Option<&LectureId>,
) -> Result<bool, SqliteStoreError> {
    Ok(connection.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM lectures
             WHERE sheikh_id = ?1 AND category_id = ?2 AND start_time = ?3
               AND status != 'deleted'
               AND (?4 IS NULL OR id != ?4)
         )",
        params![
            sheikh_id.as_str(),
            category_id.as_str(),
            start_time.as_i64(),
            exclude.map(LectureId::as_str)
        ],
        |row| row.get(0),
    )?)
}

impl CatalogStore {
    /// Reports whether the sheikh already has a lecture in `category_id`
    /// starting exactly at `start_time`, ignoring `exclude`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn has_schedule_conflict(
        &self,
        sheikh_id: &SheikhId,
        category_id: &CategoryId,
        start_time: UnixMillis,
        exclude: Option<&LectureId>,
    ) -> Result<bool, SqliteStoreError> {
        self.with_connection("has_schedule_conflict", |conn| {
            schedule_conflict_exists(conn, sheikh_id, category_id, start_time, exclude)
        })
    }
}
