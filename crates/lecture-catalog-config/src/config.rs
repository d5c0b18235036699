// crates/lecture-catalog-config/src/config.rs
// ============================================================================
// Module: Catalog Configuration
// Description: Configuration model and loader for lecture-catalog.toml.
// Purpose: Resolve, bound, parse, and validate the catalog configuration.
// Dependencies: lecture-catalog-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! [`CatalogConfig::load`] resolves the configuration path (explicit argument,
//! then the `LECTURE_CATALOG_CONFIG` environment variable, then
//! `lecture-catalog.toml` in the working directory), enforces path and size
//! limits, parses TOML, anchors a relative store path to the directory of
//! the file, and validates every table before returning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use lecture_catalog_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_NAME: &str = "lecture-catalog.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "LECTURE_CATALOG_CONFIG";
/// Database file used when `[store]` is omitted.
const DEFAULT_STORE_PATH: &str = "lecture-catalog.sqlite";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// The file is not valid TOML for this model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Minimum level of emitted log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-row detail.
    Trace,
    /// Cache hits and repair attempts.
    Debug,
    /// Opens, migrations, and resets.
    #[default]
    Info,
    /// Degraded paths only.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Returns the level as an env-filter directive.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level; `RUST_LOG` overrides it at runtime.
    #[serde(default)]
    pub level: LogLevel,
    /// Colorize log output.
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            ansi: default_ansi(),
        }
    }
}

/// Returns the default ANSI toggle.
const fn default_ansi() -> bool {
    true
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Root configuration for the catalog binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// `SQLite` store settings.
    #[serde(default = "default_store")]
    pub store: SqliteStoreConfig,
    /// Log subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Returns the store settings used when `[store]` is omitted.
fn default_store() -> SqliteStoreConfig {
    SqliteStoreConfig::new(DEFAULT_STORE_PATH)
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("{}: {err}", resolved.display()))
        })?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        if let Some(base) = resolved.parent() {
            config.anchor_store_path(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate().map_err(|err| ConfigError::Invalid(format!("store: {err}")))
    }

    /// Resolves a relative store path against `base`.
    fn anchor_store_path(&mut self, base: &Path) {
        if self.store.path.is_relative() && !base.as_os_str().is_empty() {
            self.store.path = base.join(&self.store.path);
        }
    }
}

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the config path from the argument, environment, or default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
