// crates/lecture-catalog-store-sqlite/src/repository/sheikhs.rs
// ============================================================================
// Module: Sheikh Repository
// Description: Lecturer accounts keyed by an eight digit number.
// Purpose: Register, authenticate, and maintain sheikhs.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Sheikh numbers are validated here before any write and again by storage
//! triggers, so raw SQL writers cannot store a malformed number either.
//! Sheikhs are soft-deleted; deleted sheikhs disappear from every read and
//! can no longer sign in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::NewSheikh;
use lecture_catalog_core::Sheikh;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::SheikhNumber;
use lecture_catalog_core::SheikhProfile;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_core::require_text;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::types::Type;

use super::clean_optional;
use super::normalize_email;
use super::require_found;
use crate::error::SqliteStoreError;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Column list matching [`map_sheikh_row`].
const SHEIKH_COLUMNS: &str = "id, sheikh_number, name, email, phone, category, password_hash, \
                              is_deleted, created_at, updated_at";

/// Maps a `sheikhs` row.
fn map_sheikh_row(row: &Row<'_>) -> rusqlite::Result<Sheikh> {
    let raw_number: String = row.get(1)?;
    let number = SheikhNumber::parse(&raw_number)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))?;
    Ok(Sheikh {
        id: SheikhId::new(row.get::<_, String>(0)?),
        number,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        category: row.get(5)?,
        password_hash: row.get(6)?,
        is_deleted: row.get(7)?,
        created_at: UnixMillis::new(row.get(8)?),
        updated_at: UnixMillis::new(row.get(9)?),
    })
}

/// Loads one active sheikh by identifier.
pub(crate) fn select_active_sheikh(
    connection: &Connection,
    id: &SheikhId,
) -> Result<Option<Sheikh>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!("SELECT {SHEIKH_COLUMNS} FROM sheikhs WHERE id = ?1 AND is_deleted = 0"),
            params![id.as_str()],
            map_sheikh_row,
        )
        .optional()?)
}

/// Loads one active sheikh by number.
fn select_sheikh_by_number(
    connection: &Connection,
    number: &SheikhNumber,
) -> Result<Option<Sheikh>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!(
                "SELECT {SHEIKH_COLUMNS} FROM sheikhs WHERE sheikh_number = ?1 AND is_deleted = 0"
            ),
            params![number.as_str()],
            map_sheikh_row,
        )
        .optional()?)
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl CatalogStore {
    /// Registers a sheikh.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] for a malformed number or blank
    /// fields and [`SqliteStoreError::Duplicate`] when the number is taken.
    pub fn create_sheikh(&self, input: &NewSheikh) -> Result<Sheikh, SqliteStoreError> {
        let number = SheikhNumber::parse(&input.number)?;
        require_text("name", &input.name)?;
        require_text("password", &input.password)?;
        let now = self.now();
        let sheikh = Sheikh {
            id: SheikhId::new(self.next_id()),
            number,
            name: input.name.trim().to_string(),
            email: clean_optional(input.email.as_deref()).map(|email| normalize_email(&email)),
            phone: clean_optional(input.phone.as_deref()),
            category: clean_optional(input.category.as_deref()),
            password_hash: self.hasher().hash(&input.password),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.with_connection("create_sheikh", |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO sheikhs ({SHEIKH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, \
                     ?8, ?9, ?10)"
                ),
                params![
                    sheikh.id.as_str(),
                    sheikh.number.as_str(),
                    sheikh.name,
                    sheikh.email,
                    sheikh.phone,
                    sheikh.category,
                    sheikh.password_hash,
                    sheikh.is_deleted,
                    sheikh.created_at.as_i64(),
                    sheikh.updated_at.as_i64(),
                ],
            )?;
            Ok(())
        })?;
        tracing::info!(sheikh_id = %sheikh.id, "sheikh created");
        Ok(sheikh)
    }

    /// Loads an active sheikh by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn get_sheikh(&self, id: &SheikhId) -> Result<Option<Sheikh>, SqliteStoreError> {
        self.with_connection("get_sheikh", |conn| select_active_sheikh(conn, id))
    }

    /// Loads an active sheikh by number, accepting formatted input.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the number is malformed.
    pub fn get_sheikh_by_number(&self, number: &str) -> Result<Option<Sheikh>, SqliteStoreError> {
        let number = SheikhNumber::parse(number)?;
        self.with_connection("get_sheikh_by_number", |conn| select_sheikh_by_number(conn, &number))
    }

    /// Lists active sheikhs by name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_sheikhs(&self) -> Result<Vec<Sheikh>, SqliteStoreError> {
        self.with_connection("list_sheikhs", |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SHEIKH_COLUMNS} FROM sheikhs WHERE is_deleted = 0 ORDER BY name, id"
            ))?;
            let rows = stmt.query_map([], map_sheikh_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Replaces profile fields and refreshes the name cached on lectures.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when no active sheikh matches.
    pub fn update_sheikh_profile(
        &self,
        id: &SheikhId,
        profile: &SheikhProfile,
    ) -> Result<Sheikh, SqliteStoreError> {
        require_text("name", &profile.name)?;
        let now = self.now();
        let name = profile.name.trim().to_string();
        let email = clean_optional(profile.email.as_deref()).map(|email| normalize_email(&email));
        let phone = clean_optional(profile.phone.as_deref());
        let category = clean_optional(profile.category.as_deref());
        let sheikh = self.with_connection("update_sheikh_profile", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                "UPDATE sheikhs SET name = ?1, email = ?2, phone = ?3, category = ?4, \
                 updated_at = ?5 WHERE id = ?6 AND is_deleted = 0",
                params![name, email, phone, category, now.as_i64(), id.as_str()],
            )?;
            require_found((changed > 0).then_some(()), "sheikh", id.as_str())?;
            tx.execute(
                "UPDATE lectures SET sheikh_name = ?1 WHERE sheikh_id = ?2",
                params![name, id.as_str()],
            )?;
            let sheikh = require_found(select_active_sheikh(&tx, id)?, "sheikh", id.as_str())?;
            tx.commit()?;
            Ok(sheikh)
        })?;
        self.invalidate_hierarchy();
        Ok(sheikh)
    }

    /// Replaces the stored password hash.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when no active sheikh matches.
    pub fn change_sheikh_password(
        &self,
        id: &SheikhId,
        new_password: &str,
    ) -> Result<(), SqliteStoreError> {
        require_text("password", new_password)?;
        let hash = self.hasher().hash(new_password);
        let now = self.now();
        let changed = self.with_connection("change_sheikh_password", |conn| {
            Ok(conn.execute(
                "UPDATE sheikhs SET password_hash = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND is_deleted = 0",
                params![hash, now.as_i64(), id.as_str()],
            )?)
        })?;
        require_found((changed > 0).then_some(()), "sheikh", id.as_str())
    }

    /// Soft-deletes a sheikh; returns false when no active sheikh matched.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the update fails.
    pub fn delete_sheikh(&self, id: &SheikhId) -> Result<bool, SqliteStoreError> {
        let now = self.now();
        let changed = self.with_connection("delete_sheikh", |conn| {
            Ok(conn.execute(
                "UPDATE sheikhs SET is_deleted = 1, updated_at = ?1 WHERE id = ?2 AND is_deleted = 0",
                params![now.as_i64(), id.as_str()],
            )?)
        })?;
        Ok(changed > 0)
    }

    /// Returns the sheikh when the number and password match.
    ///
    /// A malformed number never matches.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn verify_sheikh_credentials(
        &self,
        number: &str,
        password: &str,
    ) -> Result<Option<Sheikh>, SqliteStoreError> {
        let Ok(number) = SheikhNumber::parse(number) else {
            return Ok(None);
        };
        let sheikh = self.with_connection("verify_sheikh_credentials", |conn| {
            select_sheikh_by_number(conn, &number)
        })?;
        Ok(sheikh.filter(|sheikh| self.hasher().verify(password, &sheikh.password_hash)))
    }
}
