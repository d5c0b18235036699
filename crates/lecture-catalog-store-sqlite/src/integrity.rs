// crates/lecture-catalog-store-sqlite/src/integrity.rs
// ============================================================================
// Module: Integrity Guardian
// Description: Pre-open corruption check with a two-strike reset policy.
// Purpose: Recover from a corrupt catalog file without losing it outright.
// Dependencies: rusqlite, serde, tracing, lecture-catalog-core
// ============================================================================

//! ## Overview
//! Before the store opens its connection, [`IntegrityGuardian::guard`] runs a
//! read-only probe against the file. The first failed probe only records a
//! strike in a sentinel file next to the database and lets the open proceed,
//! since the failure may be transient. A failure on a later run, while the
//! earlier run's sentinel is still present, moves the database (and its
//! `-wal`/`-shm` companions) to a timestamped backup so the store starts from
//! an empty file. A passing probe clears the strike.
//!
//! The sentinel records the run that wrote it. Repeated failures within one
//! run never escalate past the first strike.
//!
//! Busy and locked errors are inconclusive: they never count as a strike.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use lecture_catalog_core::UnixMillis;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use serde::Serialize;

use crate::error::SqliteStoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Suffix of the strike sentinel written next to the database.
const SENTINEL_SUFFIX: &str = ".integrity-pending";
/// Infix of the backup written when the store is reset.
const BACKUP_INFIX: &str = ".corrupt-";
/// Companion files moved together with the database.
const COMPANION_SUFFIXES: [&str; 2] = ["-wal", "-shm"];
/// Prefix of the sentinel line naming the run that wrote it.
const RUN_PREFIX: &str = "run=";

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Result of one integrity probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The file passed the check.
    Healthy,
    /// The file is damaged.
    Corrupt(String),
    /// The check could not run to completion.
    Inconclusive(String),
}

/// Read-only integrity check against a database file.
pub trait IntegrityProbe: Send + Sync {
    /// Checks the file at `path` without modifying it.
    fn probe(&self, path: &Path) -> ProbeResult;
}

/// Probe running `PRAGMA quick_check` over a read-only connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuickCheckProbe;

impl IntegrityProbe for QuickCheckProbe {
    fn probe(&self, path: &Path) -> ProbeResult {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = match Connection::open_with_flags(path, flags) {
            Ok(connection) => connection,
            Err(err) => return classify_probe_error(&err),
        };
        match run_quick_check(&connection) {
            Ok(rows) if rows == ["ok"] => ProbeResult::Healthy,
            Ok(rows) => ProbeResult::Corrupt(rows.join("; ")),
            Err(err) => classify_probe_error(&err),
        }
    }
}

/// Collects every row reported by `PRAGMA quick_check`.
fn run_quick_check(connection: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = connection.prepare("PRAGMA quick_check")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Maps an engine error raised during the probe.
fn classify_probe_error(error: &rusqlite::Error) -> ProbeResult {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase) => {
            ProbeResult::Corrupt(error.to_string())
        }
        _ => ProbeResult::Inconclusive(error.to_string()),
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// What the guardian decided before the store opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrityOutcome {
    /// Integrity checking is disabled in configuration.
    Skipped,
    /// No database file exists yet.
    Missing,
    /// The probe passed.
    Healthy,
    /// The probe could not decide; no strike recorded.
    Inconclusive {
        /// Engine message.
        reason: String,
    },
    /// First strike recorded; the open proceeds.
    Deferred {
        /// Probe findings.
        details: String,
    },
    /// Second strike; the file was moved aside.
    Reset {
        /// Location of the preserved corrupt file.
        backup: PathBuf,
        /// Probe findings.
        details: String,
    },
}

// ============================================================================
// SECTION: Guardian
// ============================================================================

/// Returns the identifier of the current process run.
///
/// Fixed for the lifetime of the process.
#[must_use]
pub fn process_run_id() -> &'static str {
    static RUN_ID: OnceLock<String> = OnceLock::new();
    RUN_ID.get_or_init(|| {
        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        format!("{}-{started}", std::process::id())
    })
}

/// Strike found in the sentinel before the current probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorStrike {
    /// No sentinel.
    None,
    /// Written earlier in this run.
    ThisRun,
    /// Left behind by an earlier run.
    EarlierRun,
}

/// Applies the two-strike policy around an [`IntegrityProbe`].
#[derive(Clone)]
pub struct IntegrityGuardian {
    /// Probe used for each check.
    probe: Arc<dyn IntegrityProbe>,
    /// Run recorded in sentinels this guardian writes.
    run_id: String,
}

impl Default for IntegrityGuardian {
    fn default() -> Self {
        Self::new(Arc::new(QuickCheckProbe))
    }
}

impl IntegrityGuardian {
    /// Creates a guardian around `probe`.
    #[must_use]
    pub fn new(probe: Arc<dyn IntegrityProbe>) -> Self {
        Self {
            probe,
            run_id: process_run_id().to_string(),
        }
    }

    /// Replaces the run identifier recorded in the sentinel.
    ///
    /// Guardians with different run ids behave like separate startups.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Returns the run identifier recorded in the sentinel.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Checks the database at `path` and applies the strike policy.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Io`] when a corrupt file cannot be moved
    /// aside on the second strike.
    pub fn guard(&self, path: &Path, now: UnixMillis) -> Result<IntegrityOutcome, SqliteStoreError> {
        let sentinel = sentinel_path(path);
        if !path.exists() {
            clear_sentinel(&sentinel);
            return Ok(IntegrityOutcome::Missing);
        }
        match self.probe.probe(path) {
            ProbeResult::Healthy => {
                clear_sentinel(&sentinel);
                Ok(IntegrityOutcome::Healthy)
            }
            ProbeResult::Inconclusive(reason) => {
                tracing::warn!(path = %path.display(), reason = %reason, "integrity check inconclusive");
                Ok(IntegrityOutcome::Inconclusive {
                    reason,
                })
            }
            ProbeResult::Corrupt(details) => match prior_strike(&sentinel, &self.run_id) {
                PriorStrike::EarlierRun => {
                    let backup = move_aside(path, now)?;
                    clear_sentinel(&sentinel);
                    tracing::error!(
                        path = %path.display(),
                        backup = %backup.display(),
                        details = %details,
                        "integrity check failed on two runs; database reset"
                    );
                    Ok(IntegrityOutcome::Reset {
                        backup,
                        details,
                    })
                }
                PriorStrike::ThisRun => {
                    tracing::warn!(
                        path = %path.display(),
                        details = %details,
                        "integrity check failed again in this run; reset stays deferred"
                    );
                    Ok(IntegrityOutcome::Deferred {
                        details,
                    })
                }
                PriorStrike::None => {
                    let record = format!("{RUN_PREFIX}{}\n{now}\n{details}\n", self.run_id);
                    if let Err(err) = fs::write(&sentinel, record) {
                        tracing::warn!(error = %err, "failed to record integrity strike");
                    }
                    tracing::warn!(
                        path = %path.display(),
                        details = %details,
                        "integrity check failed; deferring reset to the next run"
                    );
                    Ok(IntegrityOutcome::Deferred {
                        details,
                    })
                }
            },
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns `path` with `suffix` appended to its file name.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Returns the strike sentinel path for a database file.
#[must_use]
pub fn sentinel_path(path: &Path) -> PathBuf {
    with_suffix(path, SENTINEL_SUFFIX)
}

/// Classifies the sentinel left before this probe.
///
/// An unreadable or unstamped sentinel counts as an earlier run's strike.
fn prior_strike(sentinel: &Path, run_id: &str) -> PriorStrike {
    if !sentinel.exists() {
        return PriorStrike::None;
    }
    let written_by = fs::read_to_string(sentinel).ok().and_then(|record| {
        record.lines().next().and_then(|line| line.strip_prefix(RUN_PREFIX)).map(str::to_string)
    });
    match written_by {
        Some(writer) if writer == run_id => PriorStrike::ThisRun,
        _ => PriorStrike::EarlierRun,
    }
}

/// Removes the strike sentinel if present.
fn clear_sentinel(sentinel: &Path) {
    if sentinel.exists()
        && let Err(err) = fs::remove_file(sentinel)
    {
        tracing::warn!(error = %err, "failed to clear integrity strike");
    }
}

/// Moves the database and its companions to an unused backup name.
fn move_aside(path: &Path, now: UnixMillis) -> Result<PathBuf, SqliteStoreError> {
    let mut backup = with_suffix(path, &format!("{BACKUP_INFIX}{now}"));
    let mut attempt = 1_u32;
    while backup.exists() {
        backup = with_suffix(path, &format!("{BACKUP_INFIX}{now}-{attempt}"));
        attempt = attempt.saturating_add(1);
    }
    fs::rename(path, &backup)?;
    for suffix in COMPANION_SUFFIXES {
        let companion = with_suffix(path, suffix);
        if companion.exists() {
            fs::rename(&companion, with_suffix(&backup, suffix))?;
        }
    }
    Ok(backup)
}
