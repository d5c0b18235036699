// crates/lecture-catalog-store-sqlite/src/repository/mod.rs
// ============================================================================
// Module: Catalog Repository
// Description: Create, read, update, and delete operations per entity.
// Purpose: Map catalog records to and from rows at one boundary.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Each submodule extends [`crate::CatalogStore`] with the operations for
//! one entity and owns that entity's row mapping function. Section-keyed
//! queries normalize their section argument first. Soft-deleted rows are
//! filtered out of every read unless a call says otherwise. Writes that
//! change what the hierarchy shows invalidate its cache.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod categories;
pub mod lectures;
pub mod sheikhs;
pub mod subcategories;
pub mod users;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lectures::LectureQuery;

// ============================================================================
// SECTION: Helpers
// ============================================================================

use crate::error::SqliteStoreError;

/// Trims optional text, mapping blank values to `None`.
pub(crate) fn clean_optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Canonical stored form of an email address.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Converts a missing row into [`SqliteStoreError::NotFound`].
pub(crate) fn require_found<T>(
    value: Option<T>,
    kind: &str,
    id: &str,
) -> Result<T, SqliteStoreError> {
    value.ok_or_else(|| SqliteStoreError::NotFound(format!("{kind} {id}")))
}
