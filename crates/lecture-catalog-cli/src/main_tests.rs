// crates/lecture-catalog-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Tests
// Description: Argument parsing and command execution against a temp store.
// Purpose: Ensure each command maps onto the store and yields stable JSON.
// Dependencies: lecture-catalog-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Parses representative command lines and runs store commands through
//! [`super::execute`] against a fresh file in a temporary directory.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use clap::CommandFactory;
use clap::Parser;
use lecture_catalog_core::CategoryInput;
use lecture_catalog_core::LectureInput;
use lecture_catalog_core::LectureStatus;
use lecture_catalog_core::NewSheikh;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_store_sqlite::CatalogStore;
use lecture_catalog_store_sqlite::SqliteStoreConfig;
use lecture_catalog_store_sqlite::SqliteStoreError;
use lecture_catalog_store_sqlite::StoreProviders;
use tempfile::TempDir;

use super::Cli;
use super::CliError;
use super::Commands;
use super::ConfigCommand;
use super::ConflictCommand;
use super::SearchCommand;
use super::StoreCommand;
use super::TreeCommand;
use super::execute;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Store holding one sheikh, one fiqh category, and one published lecture.
struct Seeded {
    store: CatalogStore,
    sheikh: String,
    category: String,
    _dir: TempDir,
}

fn seeded() -> Seeded {
    let dir = TempDir::new().unwrap();
    let config = SqliteStoreConfig::new(dir.path().join("catalog.sqlite"));
    let store = CatalogStore::open(config, StoreProviders::default()).unwrap();
    let sheikh = store
        .create_sheikh(&NewSheikh {
            number: "12345678".to_string(),
            name: "Sheikh Cli".to_string(),
            email: None,
            phone: None,
            category: None,
            password: "secret".to_string(),
        })
        .unwrap();
    let category = store
        .create_category(&CategoryInput {
            section: SectionKey::normalize("fiqh"),
            name: "Purification".to_string(),
            description: None,
            sort_order: 0,
        })
        .unwrap();
    store
        .create_lecture(
            &LectureInput {
                title: "Rulings of water".to_string(),
                description: String::new(),
                section: SectionKey::normalize("fiqh"),
                category_id: Some(category.id.clone()),
                subcategory_id: None,
                sheikh_id: Some(sheikh.id.clone()),
                start_time: UnixMillis::parse_rfc3339("2024-01-15T10:00:00Z").unwrap(),
                end_time: None,
                location: None,
                media: None,
            },
            LectureStatus::Published,
        )
        .unwrap();
    Seeded {
        store,
        sheikh: sheikh.id.to_string(),
        category: category.id.to_string(),
        _dir: dir,
    }
}

fn conflict(seeded: &Seeded, start: &str) -> StoreCommand {
    StoreCommand::Conflict(ConflictCommand {
        sheikh: seeded.sheikh.clone(),
        category: seeded.category.clone(),
        start: start.to_string(),
        exclude: None,
    })
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_store_commands_with_global_config() {
    let cli = Cli::try_parse_from(["lecture-catalog", "tree", "fiqh", "--config", "cat.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("cat.toml")));
    let Commands::Store(command) = cli.command else {
        panic!("tree must be a store command");
    };
    assert_eq!(
        command,
        StoreCommand::Tree(TreeCommand {
            section: Some("fiqh".to_string()),
        })
    );
}

#[test]
fn parses_conflict_with_exclusion() {
    let cli = Cli::try_parse_from([
        "lecture-catalog",
        "conflict",
        "sheikh-1",
        "category-1",
        "2024-01-15T10:00:00Z",
        "--exclude",
        "lecture-1",
    ])
    .unwrap();
    let Commands::Store(StoreCommand::Conflict(args)) = cli.command else {
        panic!("expected conflict command");
    };
    assert_eq!(args.exclude.as_deref(), Some("lecture-1"));
    assert_eq!(args.start, "2024-01-15T10:00:00Z");
}

#[test]
fn parses_config_subcommands() {
    let cli = Cli::try_parse_from(["lecture-catalog", "config", "example"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommand::Example
        }
    ));
    let cli = Cli::try_parse_from(["lecture-catalog", "repair-orphans"]).unwrap();
    assert!(matches!(cli.command, Commands::Store(StoreCommand::RepairOrphans)));
}

#[test]
fn conflict_requires_start_instant() {
    assert!(Cli::try_parse_from(["lecture-catalog", "conflict", "sheikh-1", "category-1"]).is_err());
}

// ============================================================================
// SECTION: Execution
// ============================================================================

#[test]
fn check_reports_latest_schema() {
    let seeded = seeded();
    let value = execute(&StoreCommand::Check, &seeded.store).unwrap();
    assert_eq!(value["schema"]["version"], value["schema"]["latest"]);
    assert_eq!(value["integrity"]["status"], "missing");
    assert_eq!(value["storeWasReset"], false);
}

#[test]
fn migrate_reports_open_sequence() {
    let seeded = seeded();
    let value = execute(&StoreCommand::Migrate, &seeded.store).unwrap();
    assert_eq!(value["migration"]["from_version"], 0);
    assert!(value["migration"]["applied"].as_array().is_some_and(|steps| !steps.is_empty()));
}

#[test]
fn conflict_matches_exact_slot_after_truncation() {
    let seeded = seeded();
    let exact = execute(&conflict(&seeded, "2024-01-15T10:00:45Z"), &seeded.store).unwrap();
    assert_eq!(exact["conflict"], true);
    let later = execute(&conflict(&seeded, "2024-01-15T10:01:00Z"), &seeded.store).unwrap();
    assert_eq!(later["conflict"], false);
}

#[test]
fn conflict_rejects_malformed_start() {
    let seeded = seeded();
    let err = execute(&conflict(&seeded, "next tuesday"), &seeded.store).unwrap_err();
    assert!(matches!(err, CliError::Argument(_)), "{err:?}");
}

#[test]
fn tree_and_search_return_the_lecture() {
    let seeded = seeded();
    let section = StoreCommand::Tree(TreeCommand {
        section: Some("الفقه".to_string()),
    });
    let tree = execute(&section, &seeded.store).unwrap();
    assert_eq!(tree["categories"][0]["lectures"][0]["title"], "Rulings of water");

    let whole = execute(&StoreCommand::Tree(TreeCommand { section: None }), &seeded.store).unwrap();
    assert_eq!(whole["fiqh"]["categories"][0]["category"]["name"], "Purification");

    let search = StoreCommand::Search(SearchCommand {
        text: "water".to_string(),
    });
    let found = execute(&search, &seeded.store).unwrap();
    assert_eq!(found.as_array().map(Vec::len), Some(1));
}

#[test]
fn repair_commands_report_counts() {
    let seeded = seeded();
    let orphans = execute(&StoreCommand::RepairOrphans, &seeded.store).unwrap();
    assert_eq!(orphans["repaired"], 0);
    let schema = execute(&StoreCommand::RepairSchema, &seeded.store).unwrap();
    assert_eq!(schema["search_index"], true);
}

#[test]
fn exit_codes_distinguish_failure_classes() {
    let mismatch = CliError::Store(SqliteStoreError::VersionMismatch {
        found: 9,
        supported: 5,
    });
    assert_eq!(mismatch.exit_code(), ExitCode::from(3));
    let argument = CliError::Argument("start".to_string());
    assert_eq!(argument.exit_code(), ExitCode::FAILURE);
}
