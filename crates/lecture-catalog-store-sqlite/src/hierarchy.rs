// crates/lecture-catalog-store-sqlite/src/hierarchy.rs
// ============================================================================
// Module: Hierarchy Aggregator
// Description: Section trees built from a consistent snapshot, with a cache.
// Purpose: Serve the nested catalog view without per-node queries.
// Dependencies: lecture-catalog-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! For each section the aggregator reads three flat lists (categories,
//! subcategories, published lectures) inside one read transaction and
//! joins them in memory with [`assemble_section`]. The result is cached for
//! the configured lifetime. Every repository write that changes what the
//! tree shows bumps the cache generation; a build that started before the
//! bump is returned to its caller but not cached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use lecture_catalog_core::CatalogHierarchy;
use lecture_catalog_core::Section;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::SectionTree;
use lecture_catalog_core::assemble_section;
use rusqlite::Connection;

use crate::error::SqliteStoreError;
use crate::repository::LectureQuery;
use crate::repository::categories::select_categories;
use crate::repository::lectures::select_lectures;
use crate::repository::subcategories::select_subcategories;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Cached hierarchy and the generation it was built for.
struct CachedHierarchy {
    /// Generation current when the build started.
    generation: u64,
    /// When the build finished.
    built_at: Instant,
    /// Shared tree.
    value: Arc<CatalogHierarchy>,
}

/// Time-bounded, generation-checked hierarchy cache.
pub(crate) struct HierarchyCache {
    /// Entry lifetime; zero disables caching.
    ttl: Duration,
    /// Bumped on every invalidation.
    generation: AtomicU64,
    /// Current entry.
    slot: Mutex<Option<CachedHierarchy>>,
}

impl HierarchyCache {
    /// Creates an empty cache.
    pub(crate) const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    /// Locks the slot, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Option<CachedHierarchy>> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns the generation a new build should record.
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns the cached tree when it is fresh.
    fn get(&self) -> Option<Arc<CatalogHierarchy>> {
        if self.ttl.is_zero() {
            return None;
        }
        let current = self.generation();
        let slot = self.lock();
        slot.as_ref()
            .filter(|entry| entry.generation == current && entry.built_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Stores a tree unless an invalidation happened since `generation`.
    fn put(&self, generation: u64, value: &Arc<CatalogHierarchy>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut slot = self.lock();
        if self.generation() == generation {
            *slot = Some(CachedHierarchy {
                generation,
                built_at: Instant::now(),
                value: Arc::clone(value),
            });
        }
    }

    /// Drops the cached tree and fences in-flight builds.
    pub(crate) fn invalidate(&self) {
        let mut slot = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
    }
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Builds one section's tree from flat queries.
fn build_section(
    connection: &Connection,
    section: Section,
) -> Result<SectionTree, SqliteStoreError> {
    let key = SectionKey::from(section);
    let categories = select_categories(connection, &key)?;
    let subcategories = select_subcategories(connection, &key, None)?;
    let lectures = select_lectures(connection, &LectureQuery::section(key.as_str()))?;
    Ok(assemble_section(categories, subcategories, lectures))
}

impl CatalogStore {
    /// Returns the full catalog hierarchy, keyed by section.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when a query fails.
    pub fn catalog_hierarchy(&self) -> Result<Arc<CatalogHierarchy>, SqliteStoreError> {
        if let Some(cached) = self.hierarchy_cache.get() {
            tracing::debug!("hierarchy cache hit");
            return Ok(cached);
        }
        let generation = self.hierarchy_cache.generation();
        let sections = self.with_connection("catalog_hierarchy", |conn| {
            let tx = conn.transaction()?;
            let mut sections = BTreeMap::new();
            for section in Section::ALL {
                sections.insert(section, build_section(&tx, section)?);
            }
            tx.commit()?;
            Ok(sections)
        })?;
        let hierarchy = Arc::new(CatalogHierarchy {
            sections,
        });
        self.hierarchy_cache.put(generation, &hierarchy);
        Ok(hierarchy)
    }

    /// Returns one section's tree; `section` may be a key or a label.
    ///
    /// Unknown sections yield an empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when a query fails.
    pub fn section_hierarchy(&self, section: &str) -> Result<SectionTree, SqliteStoreError> {
        let key = SectionKey::normalize(section);
        let Some(section) = key.section() else {
            return Ok(SectionTree::default());
        };
        let hierarchy = self.catalog_hierarchy()?;
        Ok(hierarchy.section(section).cloned().unwrap_or_default())
    }

    /// Drops the cached hierarchy.
    pub fn invalidate_hierarchy(&self) {
        self.hierarchy_cache.invalidate();
    }
}
