// crates/lecture-catalog-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Open sequence, shared connection, and provider wiring.
// Purpose: Own the single catalog connection and route every query through it.
// Dependencies: lecture-catalog-core, rusqlite, serde, tracing
// ============================================================================

//! ## Overview
//! [`CatalogStore::open`] runs the full open sequence: configuration and path
//! validation, the integrity guardian, connection setup with best-effort
//! pragmas, then migrations. A migration failure is fatal. Once open, every
//! repository call borrows the connection through
//! [`CatalogStore::with_connection`], which applies the schema
//! repair-and-retry policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use lecture_catalog_core::Clock;
use lecture_catalog_core::IdGenerator;
use lecture_catalog_core::PasswordHasher;
use lecture_catalog_core::Sha256PasswordHasher;
use lecture_catalog_core::SystemClock;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_core::UuidGenerator;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use serde::Serialize;

use crate::config::SqliteStoreConfig;
use crate::error::SqliteStoreError;
use crate::hierarchy::HierarchyCache;
use crate::integrity::IntegrityGuardian;
use crate::integrity::IntegrityOutcome;
use crate::migrations;
use crate::migrations::MigrationReport;
use crate::migrations::SCHEMA_VERSION;
use crate::retry::with_schema_repair;

// ============================================================================
// SECTION: Providers
// ============================================================================

/// Injected clock, identifier source, and password hasher.
#[derive(Clone)]
pub struct StoreProviders {
    /// Source of timestamps.
    pub clock: Arc<dyn Clock>,
    /// Source of record identifiers.
    pub ids: Arc<dyn IdGenerator>,
    /// Password hashing scheme.
    pub hasher: Arc<dyn PasswordHasher>,
}

impl Default for StoreProviders {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            hasher: Arc::new(Sha256PasswordHasher),
        }
    }
}

impl StoreProviders {
    /// Bundles explicit providers.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            clock,
            ids,
            hasher,
        }
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// What happened while the store opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenReport {
    /// Integrity guardian decision.
    pub integrity: IntegrityOutcome,
    /// Migration pass result.
    pub migration: MigrationReport,
}

impl OpenReport {
    /// Returns true when the guardian replaced a corrupt file.
    #[must_use]
    pub const fn store_was_reset(&self) -> bool {
        matches!(self.integrity, IntegrityOutcome::Reset { .. })
    }
}

/// Current schema state of an open store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    /// Version recorded in the file.
    pub version: u32,
    /// Latest version known to this build.
    pub latest: u32,
    /// Whether full-text search is in use.
    pub search_index: bool,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Open catalog store sharing one `SQLite` connection.
///
/// # Invariants
/// - The schema is at [`SCHEMA_VERSION`] once construction succeeds.
/// - Connection access is serialized through a mutex.
pub struct CatalogStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
    /// Injected providers.
    providers: StoreProviders,
    /// Whether the full-text index is usable.
    search_index: AtomicBool,
    /// Cached catalog hierarchy.
    pub(crate) hierarchy_cache: HierarchyCache,
    /// Open sequence outcome.
    open_report: OpenReport,
}

impl CatalogStore {
    /// Opens the store with the default integrity probe.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when validation, the guardian, the
    /// connection, or migrations fail.
    pub fn open(
        config: SqliteStoreConfig,
        providers: StoreProviders,
    ) -> Result<Self, SqliteStoreError> {
        Self::open_with_guardian(config, providers, &IntegrityGuardian::default())
    }

    /// Opens the store using `guardian` for the integrity check.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when validation, the guardian, the
    /// connection, or migrations fail.
    pub fn open_with_guardian(
        config: SqliteStoreConfig,
        providers: StoreProviders,
        guardian: &IntegrityGuardian,
    ) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        ensure_parent_dir(&config.path)?;
        let integrity = if config.integrity_check {
            guardian.guard(&config.path, providers.clock.now())?
        } else {
            IntegrityOutcome::Skipped
        };
        let mut connection = open_connection(&config)?;
        apply_pragmas(&connection, &config);
        let migration = migrations::migrate(&mut connection)?;
        tracing::info!(
            path = %config.path.display(),
            schema_version = migration.to_version,
            search_index = migration.search_index,
            "catalog store opened"
        );
        Ok(Self {
            search_index: AtomicBool::new(migration.search_index),
            hierarchy_cache: HierarchyCache::new(Duration::from_millis(
                config.hierarchy_cache_ttl_ms,
            )),
            connection: Mutex::new(connection),
            config,
            providers,
            open_report: OpenReport {
                integrity,
                migration,
            },
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns what happened while the store opened.
    #[must_use]
    pub const fn open_report(&self) -> &OpenReport {
        &self.open_report
    }

    /// Returns true when searches use the full-text index.
    #[must_use]
    pub fn search_index_enabled(&self) -> bool {
        self.search_index.load(Ordering::Acquire)
    }

    /// Reports the recorded schema version.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the metadata cannot be read.
    pub fn schema_status(&self) -> Result<SchemaStatus, SqliteStoreError> {
        let version = self.with_connection("schema_status", |conn| migrations::schema_version(conn))?;
        Ok(SchemaStatus {
            version,
            latest: SCHEMA_VERSION,
            search_index: self.search_index_enabled(),
        })
    }

    /// Replays every migration step against the open file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when a step fails.
    pub fn repair_schema(&self) -> Result<MigrationReport, SqliteStoreError> {
        let mut guard = self.lock_connection()?;
        let report = migrations::reassert_schema(&mut guard)?;
        drop(guard);
        self.search_index.store(report.search_index, Ordering::Release);
        self.invalidate_hierarchy();
        Ok(report)
    }

    /// Runs `op` on the shared connection with one schema repair on drift.
    pub(crate) fn with_connection<T>(
        &self,
        operation: &'static str,
        op: impl FnMut(&mut Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self.lock_connection()?;
        with_schema_repair(operation, &mut guard, op, |conn| {
            let report = migrations::reassert_schema(conn)?;
            self.search_index.store(report.search_index, Ordering::Release);
            self.hierarchy_cache.invalidate();
            Ok(())
        })
    }

    /// Marks the full-text index unusable after a failed search.
    pub(crate) fn disable_search_index(&self) {
        self.search_index.store(false, Ordering::Release);
    }

    /// Returns the current instant from the injected clock.
    pub(crate) fn now(&self) -> UnixMillis {
        self.providers.clock.now()
    }

    /// Returns a fresh identifier from the injected generator.
    pub(crate) fn next_id(&self) -> String {
        self.providers.ids.next_id()
    }

    /// Returns the injected password hasher.
    pub(crate) fn hasher(&self) -> &dyn PasswordHasher {
        self.providers.hasher.as_ref()
    }

    /// Locks the shared connection.
    fn lock_connection(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens the read-write connection.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    Ok(Connection::open_with_flags(&config.path, flags)?)
}

/// Applies connection pragmas; a failing pragma is logged and skipped.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) {
    let statements = [
        "PRAGMA foreign_keys = ON;".to_string(),
        format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()),
        format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()),
    ];
    for statement in &statements {
        if let Err(err) = connection.execute_batch(statement) {
            tracing::warn!(pragma = %statement, error = %err, "sqlite pragma not applied");
        }
    }
    if let Err(err) = connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)) {
        tracing::warn!(error = %err, "sqlite busy timeout not applied");
    }
}
