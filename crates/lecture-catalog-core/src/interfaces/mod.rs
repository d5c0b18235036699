// crates/lecture-catalog-core/src/interfaces/mod.rs
// ============================================================================
// Module: Lecture Catalog Interfaces
// Description: Provider seams consumed by storage backends.
// Purpose: Keep time, identity, and hashing injectable and testable.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The catalog consumes exactly three external capabilities: a clock, an
//! identifier source, and a one-way password hash. Each is a trait so the
//! composition root decides the implementation and tests can make them
//! deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::UnixMillis;

// ============================================================================
// SECTION: Providers
// ============================================================================

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant in milliseconds since the epoch.
    fn now(&self) -> UnixMillis;
}

/// Source of unique record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier that has not been issued before.
    fn next_id(&self) -> String;
}

/// One-way password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plain-text password for storage.
    fn hash(&self, password: &str) -> String;

    /// Returns true when `password` matches a stored hash.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}
