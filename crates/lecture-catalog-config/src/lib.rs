// crates/lecture-catalog-config/src/lib.rs
// ============================================================================
// Module: Lecture Catalog Config Library
// Description: Configuration model, loading, and validation.
// Purpose: Single source of truth for lecture-catalog.toml semantics.
// Dependencies: lecture-catalog-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `lecture-catalog-config` defines the configuration consumed by the catalog
//! binary: the `[store]` table handed to the `SQLite` store and the
//! `[logging]` table used to build the tracing subscriber. Loading is
//! fail-closed: oversized, non-UTF-8, or out-of-range files are rejected
//! before any database file is touched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CatalogConfig;
pub use config::ConfigError;
pub use config::LogLevel;
pub use config::LoggingConfig;
pub use examples::config_toml_example;
