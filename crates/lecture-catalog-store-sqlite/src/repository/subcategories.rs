// crates/lecture-catalog-store-sqlite/src/repository/subcategories.rs
// ============================================================================
// Module: Subcategory Repository
// Description: Second level of the catalog taxonomy.
// Purpose: Maintain subcategories and repair ones missing a parent.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! A subcategory normally names its parent category. Rows written before
//! that link existed are orphans: they stay readable and appear in the
//! hierarchy's orphan list until [`CatalogStore::repair_orphan_subcategories`]
//! attaches them to the first category of their section.
//!
//! Subcategories are hard-deleted; lectures pointing at a removed
//! subcategory lose the reference in the same transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::Subcategory;
use lecture_catalog_core::SubcategoryId;
use lecture_catalog_core::SubcategoryInput;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_core::require_text;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;

use super::clean_optional;
use super::require_found;
use crate::error::SqliteStoreError;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Column list matching [`map_subcategory_row`].
const SUBCATEGORY_COLUMNS: &str = "id, name, section, category_id, description, icon, created_at";

/// Maps a `subcategories` row; a blank parent reads as no parent.
fn map_subcategory_row(row: &Row<'_>) -> rusqlite::Result<Subcategory> {
    let category_id: Option<String> = row.get(3)?;
    Ok(Subcategory {
        id: SubcategoryId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        section: SectionKey::normalize(&row.get::<_, String>(2)?),
        category_id: clean_optional(category_id.as_deref()).map(CategoryId::new),
        description: row.get(4)?,
        icon: row.get(5)?,
        created_at: UnixMillis::new(row.get(6)?),
    })
}

/// Loads one subcategory.
pub(crate) fn select_subcategory(
    connection: &Connection,
    id: &SubcategoryId,
) -> Result<Option<Subcategory>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!("SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE id = ?1"),
            params![id.as_str()],
            map_subcategory_row,
        )
        .optional()?)
}

/// Loads a section's subcategories, optionally limited to one parent.
pub(crate) fn select_subcategories(
    connection: &Connection,
    section: &SectionKey,
    category_id: Option<&CategoryId>,
) -> Result<Vec<Subcategory>, SqliteStoreError> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories \
         WHERE section = ?1 AND (?2 IS NULL OR category_id = ?2) ORDER BY name, id"
    ))?;
    let rows = stmt.query_map(
        params![section.as_str(), category_id.map(CategoryId::as_str)],
        map_subcategory_row,
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl CatalogStore {
    /// Creates a subcategory.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the name or section is
    /// blank.
    pub fn create_subcategory(
        &self,
        input: &SubcategoryInput,
    ) -> Result<Subcategory, SqliteStoreError> {
        let section = SectionKey::normalize(input.section.as_str());
        require_text("section", section.as_str())?;
        require_text("name", &input.name)?;
        let subcategory = Subcategory {
            id: SubcategoryId::new(self.next_id()),
            name: input.name.trim().to_string(),
            section,
            category_id: input
                .category_id
                .as_ref()
                .and_then(|id| clean_optional(Some(id.as_str())))
                .map(CategoryId::new),
            description: clean_optional(input.description.as_deref()),
            icon: clean_optional(input.icon.as_deref()),
            created_at: self.now(),
        };
        self.with_connection("create_subcategory", |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO subcategories ({SUBCATEGORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, \
                     ?5, ?6, ?7)"
                ),
                params![
                    subcategory.id.as_str(),
                    subcategory.name,
                    subcategory.section.as_str(),
                    subcategory.category_id.as_ref().map(CategoryId::as_str),
                    subcategory.description,
                    subcategory.icon,
                    subcategory.created_at.as_i64(),
                ],
            )?;
            Ok(())
        })?;
        self.invalidate_hierarchy();
        Ok(subcategory)
    }

    /// Loads a subcategory.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn get_subcategory(
        &self,
        id: &SubcategoryId,
    ) -> Result<Option<Subcategory>, SqliteStoreError> {
        self.with_connection("get_subcategory", |conn| select_subcategory(conn, id))
    }

    /// Lists a section's subcategories by name, optionally for one parent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_subcategories(
        &self,
        section: &str,
        category_id: Option<&CategoryId>,
    ) -> Result<Vec<Subcategory>, SqliteStoreError> {
        let section = SectionKey::normalize(section);
        self.with_connection("list_subcategories", |conn| {
            select_subcategories(conn, &section, category_id)
        })
    }

    /// Replaces a subcategory's fields and refreshes cached lecture names.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the subcategory does not
    /// exist.
    pub fn update_subcategory(
        &self,
        id: &SubcategoryId,
        input: &SubcategoryInput,
    ) -> Result<Subcategory, SqliteStoreError> {
        let section = SectionKey::normalize(input.section.as_str());
        require_text("section", section.as_str())?;
        require_text("name", &input.name)?;
        let name = input.name.trim().to_string();
        let category_id =
            input.category_id.as_ref().and_then(|id| clean_optional(Some(id.as_str())));
        let description = clean_optional(input.description.as_deref());
        let icon = clean_optional(input.icon.as_deref());
        let subcategory = self.with_connection("update_subcategory", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE subcategories SET name = ?1, section = ?2, category_id = ?3, \
                 description = ?4, icon = ?5 WHERE id = ?6",
                params![name, section.as_str(), category_id, description, icon, id.as_str()],
            )?;
            require_found((changed > 0).then_some(()), "subcategory", id.as_str())?;
            tx.execute(
                "UPDATE lectures SET subcategory_name = ?1 WHERE subcategory_id = ?2",
                params![name, id.as_str()],
            )?;
            let subcategory =
                require_found(select_subcategory(&tx, id)?, "subcategory", id.as_str())?;
            tx.commit()?;
            Ok(subcategory)
        })?;
        self.invalidate_hierarchy();
        Ok(subcategory)
    }

    /// Removes a subcategory and clears lecture references to it.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn delete_subcategory(&self, id: &SubcategoryId) -> Result<bool, SqliteStoreError> {
        let now = self.now();
        let removed = self.with_connection("delete_subcategory", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "UPDATE lectures SET subcategory_id = NULL, subcategory_name = NULL, \
                 updated_at = ?1 WHERE subcategory_id = ?2",
                params![now.as_i64(), id.as_str()],
            )?;
            let removed =
                tx.execute("DELETE FROM subcategories WHERE id = ?1", params![id.as_str()])?;
            tx.commit()?;
            Ok(removed)
        })?;
        self.invalidate_hierarchy();
        Ok(removed > 0)
    }

    /// Attaches every orphan subcategory to the first active category of its
    /// section; returns the number of rows repaired.
    ///
    /// Orphans in a section without categories are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the transaction fails.
    pub fn repair_orphan_subcategories(&self) -> Result<usize, SqliteStoreError> {
        let repaired = self.with_connection("repair_orphan_subcategories", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let repaired = tx.execute(
                "UPDATE subcategories SET category_id = (
                     SELECT categories.id FROM categories
                     WHERE categories.section = subcategories.section
                       AND categories.is_deleted = 0
                     ORDER BY categories.sort_order, categories.created_at, categories.id
                     LIMIT 1
                 )
                 WHERE (category_id IS NULL OR trim(category_id) = '')
                   AND EXISTS (
                     SELECT 1 FROM categories
                     WHERE categories.section = subcategories.section
                       AND categories.is_deleted = 0
                 )",
                [],
            )?;
            tx.commit()?;
            Ok(repaired)
        })?;
        if repaired > 0 {
            tracing::info!(repaired, "orphan subcategories attached to categories");
            self.invalidate_hierarchy();
        }
        Ok(repaired)
    }
}
