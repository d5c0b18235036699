// crates/lecture-catalog-store-sqlite/src/repository/categories.rs
// ============================================================================
// Module: Category Repository
// Description: Ordered, soft-deletable categories per section.
// Purpose: Maintain the top level of the catalog taxonomy.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Categories are listed by `sort_order`, then name. Renaming a category
//! refreshes the category name cached on its lectures in the same
//! transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::Category;
use lecture_catalog_core::CategoryId;
use lecture_catalog_core::CategoryInput;
use lecture_catalog_core::SectionKey;
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

/// Column list matching [`map_category_row`].
const CATEGORY_COLUMNS: &str =
    "id, section, name, description, sort_order, is_deleted, created_at, updated_at";

/// Maps a `categories` row.
fn map_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId::new(row.get::<_, String>(0)?),
        section: SectionKey::normalize(&row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        sort_order: row.get(4)?,
        is_deleted: row.get(5)?,
        created_at: UnixMillis::new(row.get(6)?),
        updated_at: UnixMillis::new(row.get(7)?),
    })
}

/// Loads one active category.
pub(crate) fn select_active_category(
    connection: &Connection,
    id: &CategoryId,
) -> Result<Option<Category>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND is_deleted = 0"
            ),
            params![id.as_str()],
            map_category_row,
        )
        .optional()?)
}

/// Loads the active categories of a section in display order.
pub(crate) fn select_categories(
    connection: &Connection,
    section: &SectionKey,
) -> Result<Vec<Category>, SqliteStoreError> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE section = ?1 AND is_deleted = 0 \
         ORDER BY sort_order, name, id"
    ))?;
    let rows = stmt.query_map(params![section.as_str()], map_category_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl CatalogStore {
    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the name or section is
    /// blank.
    pub fn create_category(&self, input: &CategoryInput) -> Result<Category, SqliteStoreError> {
        let section = SectionKey::normalize(input.section.as_str());
        require_text("section", section.as_str())?;
        require_text("name", &input.name)?;
        let now = self.now();
        let category = Category {
            id: CategoryId::new(self.next_id()),
            section,
            name: input.name.trim().to_string(),
            description: clean_optional(input.description.as_deref()),
            sort_order: input.sort_order,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.with_connection("create_category", |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO categories ({CATEGORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
                     ?7, ?8)"
                ),
                params![
                    category.id.as_str(),
                    category.section.as_str(),
                    category.name,
                    category.description,
                    category.sort_order,
                    category.is_deleted,
                    category.created_at.as_i64(),
                    category.updated_at.as_i64(),
                ],
            )?;
            Ok(())
        })?;
        self.invalidate_hierarchy();
        Ok(category)
    }

    /// Loads an active category.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn get_category(&self, id: &CategoryId) -> Result<Option<Category>, SqliteStoreError> {
        self.with_connection("get_category", |conn| select_active_category(conn, id))
    }

    /// Lists the active categories of a section; `section` may be a label.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_categories(&self, section: &str) -> Result<Vec<Category>, SqliteStoreError> {
        let section = SectionKey::normalize(section);
        self.with_connection("list_categories", |conn| select_categories(conn, &section))
    }

    /// Replaces a category's fields and refreshes cached lecture names.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when no active category matches.
    pub fn update_category(
        &self,
        id: &CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, SqliteStoreError> {
        let section = SectionKey::normalize(input.section.as_str());
        require_text("section", section.as_str())?;
        require_text("name", &input.name)?;
        let name = input.name.trim().to_string();
        let description = clean_optional(input.description.as_deref());
        let now = self.now();
        let category = self.with_connection("update_category", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE categories SET section = ?1, name = ?2, description = ?3, \
                 sort_order = ?4, updated_at = ?5 WHERE id = ?6 AND is_deleted = 0",
                params![
                    section.as_str(),
                    name,
                    description,
                    input.sort_order,
                    now.as_i64(),
                    id.as_str()
                ],
            )?;
            require_found((changed > 0).then_some(()), "category", id.as_str())?;
            tx.execute(
                "UPDATE lectures SET category_name = ?1 WHERE category_id = ?2",
                params![name, id.as_str()],
            )?;
            let category =
                require_found(select_active_category(&tx, id)?, "category", id.as_str())?;
            tx.commit()?;
            Ok(category)
        })?;
        self.invalidate_hierarchy();
        Ok(category)
    }

    /// Rewrites the sort order of a section's categories to match `ordered`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when an identifier is not an
    /// active category of the section; nothing is changed in that case.
    pub fn reorder_categories(
        &self,
        section: &str,
        ordered: &[CategoryId],
    ) -> Result<(), SqliteStoreError> {
        let section = SectionKey::normalize(section);
        let now = self.now();
        self.with_connection("reorder_categories", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for (position, id) in (0_i64 ..).zip(ordered) {
                let changed = tx.execute(
                    "UPDATE categories SET sort_order = ?1, updated_at = ?2 \
                     WHERE id = ?3 AND section = ?4 AND is_deleted = 0",
                    params![position, now.as_i64(), id.as_str(), section.as_str()],
                )?;
                require_found((changed > 0).then_some(()), "category", id.as_str())?;
            }
            tx.commit()?;
            Ok(())
        })?;
        self.invalidate_hierarchy();
        Ok(())
    }

    /// Soft-deletes a category; returns false when none matched.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the update fails.
    pub fn delete_category(&self, id: &CategoryId) -> Result<bool, SqliteStoreError> {
        let now = self.now();
        let changed = self.with_connection("delete_category", |conn| {
            Ok(conn.execute(
                "UPDATE categories SET is_deleted = 1, updated_at = ?1 \
                 WHERE id = ?2 AND is_deleted = 0",
                params![now.as_i64(), id.as_str()],
            )?)
        })?;
        if changed > 0 {
            self.invalidate_hierarchy();
        }
        Ok(changed > 0)
    }
}
