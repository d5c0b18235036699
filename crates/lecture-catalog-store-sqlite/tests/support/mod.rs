// crates/lecture-catalog-store-sqlite/tests/support/mod.rs
// ============================================================================
// Module: Store Test Support
// Description: Shared fixtures for SQLite catalog store tests.
// Purpose: Open isolated stores with deterministic providers.
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures; not every test binary uses every helper."
)]

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::CategoryInput;
use lecture_catalog_core::Clock;
use lecture_catalog_core::FixedClock;
use lecture_catalog_core::LectureInput;
use lecture_catalog_core::NewSheikh;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::SequentialIdGenerator;
use lecture_catalog_core::Sha256PasswordHasher;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_store_sqlite::CatalogStore;
use lecture_catalog_store_sqlite::SqliteStoreConfig;
use lecture_catalog_store_sqlite::StoreProviders;
use rusqlite::Connection;
use tempfile::TempDir;

/// 2024-01-15T10:00:00Z.
pub const MORNING: UnixMillis = UnixMillis::new(1_705_312_800_000);

/// An open store inside its own temporary directory.
pub struct TestStore {
    pub dir: TempDir,
    pub clock: Arc<FixedClock>,
    pub store: CatalogStore,
}

impl TestStore {
    pub fn path(&self) -> PathBuf {
        db_path(&self.dir)
    }

    /// Opens a second raw connection to the same file.
    pub fn raw(&self) -> Connection {
        Connection::open(self.path()).unwrap()
    }
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("catalog.sqlite")
}

pub fn config_for(path: &Path) -> SqliteStoreConfig {
    let mut config = SqliteStoreConfig::new(path);
    config.busy_timeout_ms = 2_000;
    config
}

pub fn providers(clock: &Arc<FixedClock>) -> StoreProviders {
    StoreProviders::new(
        Arc::clone(clock) as Arc<dyn Clock>,
        Arc::new(SequentialIdGenerator::new("id")),
        Arc::new(Sha256PasswordHasher),
    )
}

pub fn open_store() -> TestStore {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(MORNING));
    let store = CatalogStore::open(config_for(&db_path(&dir)), providers(&clock)).unwrap();
    TestStore {
        dir,
        clock,
        store,
    }
}

pub fn category(store: &CatalogStore, section: &str, name: &str, sort_order: i64) -> CategoryId {
    store
        .create_category(&CategoryInput {
            section: SectionKey::normalize(section),
            name: name.to_string(),
            description: None,
            sort_order,
        })
        .unwrap()
        .id
}

pub fn sheikh(store: &CatalogStore, number: &str, name: &str) -> SheikhId {
    store
        .create_sheikh(&NewSheikh {
            number: number.to_string(),
            name: name.to_string(),
            email: None,
            phone: None,
            category: None,
            password: "secret".to_string(),
        })
        .unwrap()
        .id
}

pub fn lecture_input(title: &str, section: &str, start_time: UnixMillis) -> LectureInput {
    LectureInput {
        title: title.to_string(),
        description: String::new(),
        section: SectionKey::normalize(section),
        category_id: None,
        subcategory_id: None,
        sheikh_id: None,
        start_time,
        end_time: None,
        location: None,
        media: None,
    }
}

/// Returns `(type, name, sql)` for every schema object, sorted by name.
pub fn schema_dump(connection: &Connection) -> Vec<(String, String, Option<String>)> {
    let mut stmt = connection
        .prepare("SELECT type, name, sql FROM sqlite_master ORDER BY type, name")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}
