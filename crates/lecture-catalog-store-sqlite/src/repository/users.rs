// crates/lecture-catalog-store-sqlite/src/repository/users.rs
// ============================================================================
// Module: User Repository
// Description: Application user accounts.
// Purpose: Register, authenticate, and maintain users.
// Dependencies: lecture-catalog-core, rusqlite
// ============================================================================

//! ## Overview
//! Usernames and emails are unique; emails are stored lowercase so login by
//! email is case-insensitive. Users are hard-deleted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::NewUser;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_core::User;
use lecture_catalog_core::UserId;
use lecture_catalog_core::UserProfile;
use lecture_catalog_core::require_text;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;

use super::clean_optional;
use super::normalize_email;
use super::require_found;
use crate::error::SqliteStoreError;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Column list matching [`map_user_row`].
const USER_COLUMNS: &str = "id, username, email, password_hash, is_admin, display_name, bio, \
                            avatar_url, created_at, updated_at";

/// Maps a `users` row.
fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get::<_, String>(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_admin: row.get(4)?,
        display_name: row.get(5)?,
        bio: row.get(6)?,
        avatar_url: row.get(7)?,
        created_at: UnixMillis::new(row.get(8)?),
        updated_at: UnixMillis::new(row.get(9)?),
    })
}

/// Loads one user by identifier.
fn select_user(connection: &Connection, id: &UserId) -> Result<Option<User>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.as_str()],
            map_user_row,
        )
        .optional()?)
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl CatalogStore {
    /// Registers a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] for blank fields and
    /// [`SqliteStoreError::Duplicate`] when the username or email is taken.
    pub fn create_user(&self, input: &NewUser) -> Result<User, SqliteStoreError> {
        require_text("username", &input.username)?;
        require_text("email", &input.email)?;
        require_text("password", &input.password)?;
        let now = self.now();
        let user = User {
            id: UserId::new(self.next_id()),
            username: input.username.trim().to_string(),
            email: normalize_email(&input.email),
            password_hash: self.hasher().hash(&input.password),
            is_admin: input.is_admin,
            display_name: clean_optional(input.display_name.as_deref()),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        self.with_connection("create_user", |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, \
                     ?9, ?10)"
                ),
                params![
                    user.id.as_str(),
                    user.username,
                    user.email,
                    user.password_hash,
                    user.is_admin,
                    user.display_name,
                    user.bio,
                    user.avatar_url,
                    user.created_at.as_i64(),
                    user.updated_at.as_i64(),
                ],
            )?;
            Ok(())
        })?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Loads a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn get_user(&self, id: &UserId) -> Result<Option<User>, SqliteStoreError> {
        self.with_connection("get_user", |conn| select_user(conn, id))
    }

    /// Finds a user by username or email.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn find_user_by_login(&self, login: &str) -> Result<Option<User>, SqliteStoreError> {
        let username = login.trim();
        let email = normalize_email(login);
        self.with_connection("find_user_by_login", |conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?2 \
                         ORDER BY username = ?1 DESC LIMIT 1"
                    ),
                    params![username, email],
                    map_user_row,
                )
                .optional()?)
        })
    }

    /// Returns the user when `password` matches.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn verify_user_credentials(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Option<User>, SqliteStoreError> {
        let user = self.find_user_by_login(login)?;
        Ok(user.filter(|user| self.hasher().verify(password, &user.password_hash)))
    }

    /// Replaces the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the user does not exist.
    pub fn update_user_profile(
        &self,
        id: &UserId,
        profile: &UserProfile,
    ) -> Result<User, SqliteStoreError> {
        let now = self.now();
        let display_name = clean_optional(profile.display_name.as_deref());
        let bio = clean_optional(profile.bio.as_deref());
        let avatar_url = clean_optional(profile.avatar_url.as_deref());
        self.with_connection("update_user_profile", |conn| {
            conn.execute(
                "UPDATE users SET display_name = ?1, bio = ?2, avatar_url = ?3, updated_at = ?4 \
                 WHERE id = ?5",
                params![display_name, bio, avatar_url, now.as_i64(), id.as_str()],
            )?;
            require_found(select_user(conn, id)?, "user", id.as_str())
        })
    }

    /// Grants or revokes administrator rights.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the user does not exist.
    pub fn set_user_admin(&self, id: &UserId, is_admin: bool) -> Result<(), SqliteStoreError> {
        let now = self.now();
        let changed = self.with_connection("set_user_admin", |conn| {
            Ok(conn.execute(
                "UPDATE users SET is_admin = ?1, updated_at = ?2 WHERE id = ?3",
                params![is_admin, now.as_i64(), id.as_str()],
            )?)
        })?;
        require_found((changed > 0).then_some(()), "user", id.as_str())
    }

    /// Lists every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_users(&self) -> Result<Vec<User>, SqliteStoreError> {
        self.with_connection("list_users", |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"))?;
            let rows = stmt.query_map([], map_user_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Removes a user permanently; returns false when nothing was removed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the delete fails.
    pub fn delete_user(&self, id: &UserId) -> Result<bool, SqliteStoreError> {
        let removed = self.with_connection("delete_user", |conn| {
            Ok(conn.execute("DELETE FROM users WHERE id = ?1", params![id.as_str()])?)
        })?;
        Ok(removed > 0)
    }
}
