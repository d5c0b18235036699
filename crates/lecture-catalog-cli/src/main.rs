// crates/lecture-catalog-cli/src/main.rs
// ============================================================================
// Module: Lecture Catalog CLI Entry Point
// Description: Command dispatcher for catalog maintenance and queries.
// Purpose: Open the configured store once and expose its operations as JSON.
// Dependencies: clap, lecture-catalog-config, lecture-catalog-store-sqlite,
//               serde_json, thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `lecture-catalog` binary loads `lecture-catalog.toml`, installs a
//! stderr log subscriber, opens the catalog through the lazy store handle,
//! and writes one JSON document per command to stdout. Opening the store
//! runs the integrity guardian and any pending migrations, so every store
//! command doubles as a migration trigger.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use lecture_catalog_config::CatalogConfig;
use lecture_catalog_config::ConfigError;
use lecture_catalog_config::LoggingConfig;
use lecture_catalog_config::config_toml_example;
use lecture_catalog_core::CategoryId;
use lecture_catalog_core::LectureId;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_store_sqlite::CatalogStore;
use lecture_catalog_store_sqlite::CatalogStoreHandle;
use lecture_catalog_store_sqlite::IntegrityOutcome;
use lecture_catalog_store_sqlite::SchemaStatus;
use lecture_catalog_store_sqlite::SqliteStoreError;
use lecture_catalog_store_sqlite::StoreProviders;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit status for configuration failures.
const EXIT_CONFIG: u8 = 2;
/// Exit status when the file was written by a newer build.
const EXIT_VERSION_MISMATCH: u8 = 3;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Maintenance and query tool for the lecture catalog.
#[derive(Parser, Debug)]
#[command(name = "lecture-catalog", version, about)]
struct Cli {
    /// Config file; defaults to `$LECTURE_CATALOG_CONFIG` or
    /// `./lecture-catalog.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration helpers that never open the store.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Commands that run against the open store.
    #[command(flatten)]
    Store(StoreCommand),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigCommand {
    /// Print an example configuration listing every default.
    Example,
    /// Load and validate the configuration, then print the resolved store path.
    Validate,
}

/// Commands executed against the catalog store.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum StoreCommand {
    /// Open the store, apply pending migrations, and report the open sequence.
    Migrate,
    /// Report schema version, search index state, and integrity outcome.
    Check,
    /// Replay every migration step to restore missing tables or columns.
    RepairSchema,
    /// Print the whole catalog hierarchy or a single section.
    Tree(TreeCommand),
    /// Search published lectures by title and description.
    Search(SearchCommand),
    /// Check whether a sheikh already has a lecture in a category at an instant.
    Conflict(ConflictCommand),
    /// Attach orphaned subcategories to a category in the same section.
    RepairOrphans,
}

/// Arguments for `tree`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct TreeCommand {
    /// Section key or localized label; omitted prints every section.
    section: Option<String>,
}

/// Arguments for `search`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct SearchCommand {
    /// Search terms; every term must match.
    text: String,
}

/// Arguments for `conflict`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ConflictCommand {
    /// Sheikh identifier.
    sheikh: String,
    /// Category identifier.
    category: String,
    /// Start instant in RFC 3339; seconds are truncated.
    start: String,
    /// Lecture to ignore, for checking an edit of an existing lecture.
    #[arg(long, value_name = "LECTURE_ID")]
    exclude: Option<String>,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Output of `check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    /// Schema state.
    schema: SchemaStatus,
    /// Integrity decision taken while opening.
    integrity: &'a IntegrityOutcome,
    /// Whether a corrupt file was replaced.
    store_was_reset: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// Store operation failed.
    #[error("{0}")]
    Store(#[from] SqliteStoreError),
    /// A command argument is malformed.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// Output could not be encoded.
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Output could not be written.
    #[error("failed to write {stream}: {source}")]
    Output {
        /// Stream name.
        stream: &'static str,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl CliError {
    /// Returns the process exit status for this failure.
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(EXIT_CONFIG),
            Self::Store(SqliteStoreError::VersionMismatch { .. }) => {
                ExitCode::from(EXIT_VERSION_MISMATCH)
            }
            _ => ExitCode::FAILURE,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the parsed command.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Config {
            command,
        } => command_config(command, cli.config.as_deref()),
        Commands::Store(command) => {
            let config = CatalogConfig::load(cli.config.as_deref())?;
            init_tracing(&config.logging);
            let handle = CatalogStoreHandle::new(config.store, StoreProviders::default());
            let store = handle.get()?;
            if store.open_report().store_was_reset() {
                tracing::warn!("catalog store was reset; corrupt file preserved");
            }
            let output = execute(&command, &store)?;
            write_json(&output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs a configuration subcommand.
fn command_config(command: ConfigCommand, path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Example => write_stdout(&config_toml_example())?,
        ConfigCommand::Validate => {
            let config = CatalogConfig::load(path)?;
            write_json(&json!({
                "valid": true,
                "storePath": config.store.path.display().to_string(),
                "logLevel": config.logging.level.as_str(),
            }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Runs a store command and returns its JSON output.
fn execute(command: &StoreCommand, store: &CatalogStore) -> CliResult<Value> {
    let value = match command {
        StoreCommand::Migrate => serde_json::to_value(store.open_report())?,
        StoreCommand::Check => {
            let report = store.open_report();
            serde_json::to_value(CheckReport {
                schema: store.schema_status()?,
                integrity: &report.integrity,
                store_was_reset: report.store_was_reset(),
            })?
        }
        StoreCommand::RepairSchema => serde_json::to_value(store.repair_schema()?)?,
        StoreCommand::Tree(tree) => match &tree.section {
            Some(section) => serde_json::to_value(store.section_hierarchy(section)?)?,
            None => serde_json::to_value(store.catalog_hierarchy()?.as_ref())?,
        },
        StoreCommand::Search(search) => serde_json::to_value(store.search_lectures(&search.text)?)?,
        StoreCommand::Conflict(conflict) => {
            let start = UnixMillis::parse_rfc3339(&conflict.start)
                .map_err(|err| CliError::Argument(format!("start: {err}")))?
                .truncate_to_minute();
            let exclude = conflict.exclude.as_deref().map(LectureId::from);
            let found = store.has_schedule_conflict(
                &SheikhId::from(conflict.sheikh.as_str()),
                &CategoryId::from(conflict.category.as_str()),
                start,
                exclude.as_ref(),
            )?;
            json!({ "conflict": found, "startTime": start.as_i64() })
        }
        StoreCommand::RepairOrphans => json!({ "repaired": store.repair_orphan_subcategories()? }),
    };
    Ok(value)
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the stderr log subscriber; `RUST_LOG` overrides the config level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(logging.ansi)
        .try_init();
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a JSON document to stdout.
fn write_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_stdout(&text)
}

/// Writes a line to stdout.
fn write_stdout(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{}", message.trim_end()).map_err(|source| CliError::Output {
        stream: "stdout",
        source,
    })
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&format!("lecture-catalog: {err}"));
    err.exit_code()
}
