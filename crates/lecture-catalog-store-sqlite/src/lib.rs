// crates/lecture-catalog-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: Durable lecture catalog backend using SQLite WAL.
// Purpose: Provide crash-safe persistence, migrations, and catalog queries.
// Dependencies: lecture-catalog-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! This crate persists the lecture catalog in a single `SQLite` file. Opening
//! the store runs a read-only integrity check with a two-strike reset policy,
//! applies pending schema migrations in one transaction, and hands out one
//! shared connection. Every query passes through a repair-and-retry wrapper
//! that re-asserts the schema once when a table, column, or index is
//! missing.
//!
//! [`CatalogStoreHandle`] is the lazily-initialized entry point owned by the
//! application's composition root; [`CatalogStore`] exposes the record
//! repository, the hierarchy aggregator, and the scheduling conflict check.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod conflict;
pub mod error;
pub mod hierarchy;
pub mod integrity;
pub mod lifecycle;
pub mod migrations;
pub mod repository;
pub mod retry;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::SqliteStoreConfig;
pub use config::SqliteStoreMode;
pub use config::SqliteSyncMode;
pub use error::SqliteStoreError;
pub use integrity::IntegrityGuardian;
pub use integrity::IntegrityOutcome;
pub use integrity::IntegrityProbe;
pub use integrity::ProbeResult;
pub use integrity::QuickCheckProbe;
pub use lifecycle::CatalogStoreHandle;
pub use migrations::MigrationReport;
pub use migrations::SCHEMA_VERSION;
pub use repository::LectureQuery;
pub use store::CatalogStore;
pub use store::OpenReport;
pub use store::SchemaStatus;
pub use store::StoreProviders;
