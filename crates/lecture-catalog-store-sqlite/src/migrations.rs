// crates/lecture-catalog-store-sqlite/src/migrations.rs
// ============================================================================
// Module: Schema Migrations
// Description: Ordered, idempotent schema steps tracked in `store_meta`.
// Purpose: Upgrade any older catalog file to the current schema atomically.
// Dependencies: rusqlite, tracing
// ============================================================================

//! ## Overview
//! The schema version lives in the `store_meta` key/value table. On open,
//! every step newer than the recorded version runs inside one immediate
//! transaction and the recorded version is bumped to the last step applied.
//! A failure rolls the whole upgrade back. A file recorded at a version newer
//! than [`SCHEMA_VERSION`] is rejected.
//!
//! Steps only add: tables and indexes use `IF NOT EXISTS`, columns are added
//! after a `pragma_table_info` probe, and backfills touch rows whose target
//! column is still `NULL`. Re-running a step is a no-op, which is what lets
//! [`reassert_schema`] repair drift by replaying every step.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Serialize;

use crate::error::SHEIKH_NUMBER_TRIGGER_MESSAGE;
use crate::error::SqliteStoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: u32 = 5;
/// `store_meta` key holding the schema version.
const META_SCHEMA_VERSION: &str = "schema_version";
/// `store_meta` key recording whether the search index is present.
const META_SEARCH_INDEX: &str = "search_index";
/// Name of the optional full-text index table.
pub(crate) const SEARCH_INDEX_TABLE: &str = "lectures_fts";

// ============================================================================
// SECTION: Steps
// ============================================================================

/// One ordered schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version reached once this step has run.
    pub version: u32,
    /// Short description used in logs.
    pub description: &'static str,
    /// Idempotent step body.
    apply: fn(&Connection) -> rusqlite::Result<()>,
}

/// Every schema step in ascending version order.
pub const MIGRATIONS: [Migration; 5] = [
    Migration {
        version: 1,
        description: "base catalog tables and search index",
        apply: create_base_tables,
    },
    Migration {
        version: 2,
        description: "lecture ownership and schedule index",
        apply: add_lecture_ownership,
    },
    Migration {
        version: 3,
        description: "taxonomy links and denormalized names",
        apply: add_taxonomy_links,
    },
    Migration {
        version: 4,
        description: "category ordering and soft deletes",
        apply: add_soft_deletes,
    },
    Migration {
        version: 5,
        description: "sheikh number integrity",
        apply: enforce_sheikh_numbers,
    },
];

/// Outcome of a migration or repair pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Version recorded before the pass.
    pub from_version: u32,
    /// Version recorded after the pass.
    pub to_version: u32,
    /// Step versions executed during the pass.
    pub applied: Vec<u32>,
    /// Whether the full-text search index exists.
    pub search_index: bool,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Applies every pending step up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`SqliteStoreError::VersionMismatch`] when the file is newer than
/// this build, or the failing step's error after rolling back.
pub fn migrate(connection: &mut Connection) -> Result<MigrationReport, SqliteStoreError> {
    migrate_to(connection, SCHEMA_VERSION)
}

/// Applies pending steps up to and including `target`.
///
/// # Errors
///
/// Returns [`SqliteStoreError::Invalid`] when `target` is unknown,
/// [`SqliteStoreError::VersionMismatch`] when the file is newer than this
/// build, or the failing step's error after rolling back.
pub fn migrate_to(
    connection: &mut Connection,
    target: u32,
) -> Result<MigrationReport, SqliteStoreError> {
    if target > SCHEMA_VERSION {
        return Err(SqliteStoreError::Invalid(format!(
            "migration target {target} exceeds latest version {SCHEMA_VERSION}"
        )));
    }
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_meta_table(&tx)?;
    let from_version = read_schema_version(&tx)?;
    if from_version > SCHEMA_VERSION {
        return Err(SqliteStoreError::VersionMismatch {
            found: from_version,
            supported: SCHEMA_VERSION,
        });
    }
    let mut applied = Vec::new();
    for step in MIGRATIONS.iter().filter(|step| step.version > from_version && step.version <= target)
    {
        tracing::info!(
            version = step.version,
            description = step.description,
            "applying schema migration"
        );
        (step.apply)(&tx)?;
        applied.push(step.version);
    }
    let to_version = applied.last().copied().unwrap_or(from_version);
    let search_index = search_index_exists(&tx)?;
    if !applied.is_empty() {
        write_meta(&tx, META_SCHEMA_VERSION, &to_version.to_string())?;
        write_meta(&tx, META_SEARCH_INDEX, if search_index { "1" } else { "0" })?;
    }
    tx.commit()?;
    if !applied.is_empty() {
        tracing::info!(from_version, to_version, search_index, "schema migration complete");
    }
    Ok(MigrationReport {
        from_version,
        to_version,
        applied,
        search_index,
    })
}

/// Replays every step to restore dropped tables, columns, and indexes.
///
/// # Errors
///
/// Returns [`SqliteStoreError::VersionMismatch`] when the file is newer than
/// this build, or the failing step's error after rolling back.
pub fn reassert_schema(connection: &mut Connection) -> Result<MigrationReport, SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_meta_table(&tx)?;
    let from_version = read_schema_version(&tx)?;
    if from_version > SCHEMA_VERSION {
        return Err(SqliteStoreError::VersionMismatch {
            found: from_version,
            supported: SCHEMA_VERSION,
        });
    }
    let mut applied = Vec::with_capacity(MIGRATIONS.len());
    for step in &MIGRATIONS {
        (step.apply)(&tx)?;
        applied.push(step.version);
    }
    let search_index = search_index_exists(&tx)?;
    write_meta(&tx, META_SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
    write_meta(&tx, META_SEARCH_INDEX, if search_index { "1" } else { "0" })?;
    tx.commit()?;
    tracing::info!(from_version, search_index, "schema re-asserted");
    Ok(MigrationReport {
        from_version,
        to_version: SCHEMA_VERSION,
        applied,
        search_index,
    })
}

/// Reads the recorded schema version, treating a fresh file as version 0.
///
/// # Errors
///
/// Returns [`SqliteStoreError::Corrupt`] when the recorded value is not a
/// number.
pub fn schema_version(connection: &Connection) -> Result<u32, SqliteStoreError> {
    ensure_meta_table(connection)?;
    read_schema_version(connection)
}

/// Returns true when the full-text search table exists.
pub(crate) fn search_index_exists(connection: &Connection) -> Result<bool, SqliteStoreError> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![SEARCH_INDEX_TABLE],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Creates the key/value metadata table.
fn ensure_meta_table(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Reads the schema version without creating anything.
fn read_schema_version(connection: &Connection) -> Result<u32, SqliteStoreError> {
    let raw: Option<String> = connection
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![META_SCHEMA_VERSION],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        None => Ok(0),
        Some(value) => value.trim().parse::<u32>().map_err(|_| {
            SqliteStoreError::Corrupt(format!("unreadable schema version: '{value}'"))
        }),
    }
}

/// Upserts one metadata value.
fn write_meta(connection: &Connection, key: &str, value: &str) -> Result<(), SqliteStoreError> {
    connection.execute(
        "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Step Helpers
// ============================================================================

/// Returns true when `table` already has `column`.
fn column_exists(connection: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Adds a column unless it is already present.
fn add_column_if_missing(
    connection: &Connection,
    table: &str,
    column: &str,
    declaration: &str,
) -> rusqlite::Result<()> {
    if column_exists(connection, table, column)? {
        return Ok(());
    }
    connection.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {declaration};"))
}

/// Creates the full-text index inside a savepoint, skipping it when the
/// engine lacks FTS5.
fn create_search_index(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch("SAVEPOINT search_index;")?;
    let created = connection.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS lectures_fts
             USING fts5(lecture_id UNINDEXED, title, description);
         CREATE TRIGGER IF NOT EXISTS lectures_fts_insert AFTER INSERT ON lectures BEGIN
             INSERT INTO lectures_fts (lecture_id, title, description)
             VALUES (new.id, new.title, new.description);
         END;
         CREATE TRIGGER IF NOT EXISTS lectures_fts_delete AFTER DELETE ON lectures BEGIN
             DELETE FROM lectures_fts WHERE lecture_id = old.id;
         END;
         CREATE TRIGGER IF NOT EXISTS lectures_fts_update
             AFTER UPDATE OF title, description ON lectures BEGIN
             DELETE FROM lectures_fts WHERE lecture_id = old.id;
             INSERT INTO lectures_fts (lecture_id, title, description)
             VALUES (new.id, new.title, new.description);
         END;
         INSERT INTO lectures_fts (lecture_id, title, description)
             SELECT id, title, description FROM lectures
             WHERE id NOT IN (SELECT lecture_id FROM lectures_fts);",
    );
    match created {
        Ok(()) => connection.execute_batch("RELEASE search_index;"),
        Err(err) => {
            tracing::warn!(error = %err, "full-text search unavailable; using scan search");
            connection.execute_batch("ROLLBACK TO search_index; RELEASE search_index;")
        }
    }
}

// ============================================================================
// SECTION: Step Bodies
// ============================================================================

/// Version 1: base tables for users, sheikhs, taxonomy, and lectures.
fn create_base_tables(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            display_name TEXT,
            bio TEXT,
            avatar_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS sheikhs (
            id TEXT PRIMARY KEY,
            sheikh_number TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            category TEXT,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            section TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_categories_section ON categories (section);
        CREATE TABLE IF NOT EXISTS subcategories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            section TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subcategories_section ON subcategories (section);
        CREATE TABLE IF NOT EXISTS lectures (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            section TEXT NOT NULL,
            category_id TEXT,
            subcategory_id TEXT,
            start_time INTEGER NOT NULL,
            end_time INTEGER,
            location_json TEXT,
            media_json TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_lectures_section ON lectures (section, status);",
    )?;
    create_search_index(connection)
}

/// Version 2: lectures record their owning sheikh.
fn add_lecture_ownership(connection: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(connection, "lectures", "sheikh_id", "TEXT")?;
    add_column_if_missing(connection, "lectures", "sheikh_name", "TEXT")?;
    connection.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_lectures_sheikh ON lectures (sheikh_id);
         CREATE INDEX IF NOT EXISTS idx_lectures_schedule
             ON lectures (sheikh_id, category_id, start_time);
         UPDATE lectures SET sheikh_name = (
             SELECT sheikhs.name FROM sheikhs WHERE sheikhs.id = lectures.sheikh_id
         )
         WHERE sheikh_name IS NULL AND sheikh_id IS NOT NULL;",
    )
}

/// Version 3: subcategories link to categories; lectures cache parent names.
fn add_taxonomy_links(connection: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(connection, "subcategories", "category_id", "TEXT")?;
    add_column_if_missing(connection, "lectures", "category_name", "TEXT")?;
    add_column_if_missing(connection, "lectures", "subcategory_name", "TEXT")?;
    connection.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_subcategories_category ON subcategories (category_id);
         UPDATE lectures SET category_name = (
             SELECT categories.name FROM categories WHERE categories.id = lectures.category_id
         )
         WHERE category_name IS NULL AND category_id IS NOT NULL;
         UPDATE lectures SET subcategory_name = (
             SELECT subcategories.name FROM subcategories
             WHERE subcategories.id = lectures.subcategory_id
         )
         WHERE subcategory_name IS NULL AND subcategory_id IS NOT NULL;",
    )
}

/// Version 4: category ordering plus soft-delete flags.
fn add_soft_deletes(connection: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(connection, "categories", "sort_order", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(connection, "categories", "is_deleted", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(connection, "categories", "updated_at", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(connection, "sheikhs", "is_deleted", "INTEGER NOT NULL DEFAULT 0")?;
    connection.execute_batch(
        "UPDATE categories SET updated_at = created_at WHERE updated_at = 0;
         UPDATE lectures SET status = 'published' WHERE status = 'active';",
    )
}

/// Version 5: sheikh numbers are unique and exactly eight ASCII digits;
/// sheikh emails are unique when present.
fn enforce_sheikh_numbers(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_sheikhs_number ON sheikhs (sheikh_number);
         CREATE UNIQUE INDEX IF NOT EXISTS idx_sheikhs_email ON sheikhs (email);
         CREATE TRIGGER IF NOT EXISTS sheikhs_number_insert BEFORE INSERT ON sheikhs
         WHEN length(NEW.sheikh_number) != 8 OR NEW.sheikh_number GLOB '*[^0-9]*'
         BEGIN
             SELECT RAISE(ABORT, '{SHEIKH_NUMBER_TRIGGER_MESSAGE}');
         END;
         CREATE TRIGGER IF NOT EXISTS sheikhs_number_update
         BEFORE UPDATE OF sheikh_number ON sheikhs
         WHEN length(NEW.sheikh_number) != 8 OR NEW.sheikh_number GLOB '*[^0-9]*'
         BEGIN
             SELECT RAISE(ABORT, '{SHEIKH_NUMBER_TRIGGER_MESSAGE}');
         END;"
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
