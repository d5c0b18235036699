// crates/lecture-catalog-store-sqlite/src/lifecycle.rs
// ============================================================================
// Module: Store Lifecycle
// Description: Lazily opened, process-wide catalog store handle.
// Purpose: Guarantee a single open sequence under concurrent first access.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`CatalogStoreHandle`] is created by the composition root and shared by
//! reference. The first [`CatalogStoreHandle::get`] runs the open sequence
//! while holding the handle's lock, so concurrent first callers wait for and
//! receive the same outcome: the opened store, or the error of the attempt
//! they queued behind. A failed open leaves the handle empty; a call made
//! after that failure tries again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::config::SqliteStoreConfig;
use crate::error::SqliteStoreError;
use crate::integrity::IntegrityGuardian;
use crate::integrity::IntegrityProbe;
use crate::store::CatalogStore;
use crate::store::StoreProviders;

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Result of the latest open attempt.
#[derive(Default)]
struct HandleState {
    /// Opened store, if any.
    store: Option<Arc<CatalogStore>>,
    /// Error from the latest failed attempt.
    last_failure: Option<SqliteStoreError>,
}

/// Lazily-initialized shared catalog store.
///
/// # Invariants
/// - At most one successful open per handle until [`CatalogStoreHandle::close`].
/// - Callers waiting on an in-flight attempt never start another one.
pub struct CatalogStoreHandle {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Providers handed to the store.
    providers: StoreProviders,
    /// Guardian used during the open sequence.
    guardian: IntegrityGuardian,
    /// Opened store or latest failure.
    state: Mutex<HandleState>,
    /// Count of open sequences that ran; also the attempt generation.
    open_attempts: AtomicUsize,
}

impl CatalogStoreHandle {
    /// Creates an unopened handle.
    #[must_use]
    pub fn new(config: SqliteStoreConfig, providers: StoreProviders) -> Self {
        Self {
            config,
            providers,
            guardian: IntegrityGuardian::default(),
            state: Mutex::new(HandleState::default()),
            open_attempts: AtomicUsize::new(0),
        }
    }

    /// Replaces the integrity probe used when opening.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn IntegrityProbe>) -> Self {
        self.guardian = IntegrityGuardian::new(probe);
        self
    }

    /// Replaces the guardian used when opening.
    #[must_use]
    pub fn with_guardian(mut self, guardian: IntegrityGuardian) -> Self {
        self.guardian = guardian;
        self
    }

    /// Returns the shared store, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns the open sequence error; the handle stays unopened. Callers
    /// that waited on a failing attempt receive that attempt's error.
    pub fn get(&self) -> Result<Arc<CatalogStore>, SqliteStoreError> {
        let arrived_at = self.open_attempts.load(Ordering::Acquire);
        let mut state = self
            .state
            .lock()
            .map_err(|_| SqliteStoreError::Db("store handle mutex poisoned".to_string()))?;
        if let Some(store) = state.store.as_ref() {
            return Ok(Arc::clone(store));
        }
        if self.open_attempts.load(Ordering::Acquire) != arrived_at
            && let Some(failure) = state.last_failure.as_ref()
        {
            return Err(failure.clone());
        }
        self.open_attempts.fetch_add(1, Ordering::AcqRel);
        match CatalogStore::open_with_guardian(
            self.config.clone(),
            self.providers.clone(),
            &self.guardian,
        ) {
            Ok(store) => {
                let store = Arc::new(store);
                state.store = Some(Arc::clone(&store));
                state.last_failure = None;
                drop(state);
                Ok(store)
            }
            Err(err) => {
                state.last_failure = Some(err.clone());
                drop(state);
                Err(err)
            }
        }
    }

    /// Returns true once a store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().is_ok_and(|state| state.store.is_some())
    }

    /// Returns how many open sequences have run.
    #[must_use]
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::Acquire)
    }

    /// Drops the handle's reference so the next call reopens the file.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.store = None;
            state.last_failure = None;
        }
    }
}
