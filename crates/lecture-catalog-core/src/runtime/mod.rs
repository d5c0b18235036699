// crates/lecture-catalog-core/src/runtime/mod.rs
// ============================================================================
// Module: Lecture Catalog Runtime
// Description: Default provider implementations.
// Purpose: Supply production and deterministic test providers.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime helpers implementing the provider interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod providers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use providers::FixedClock;
pub use providers::SequentialIdGenerator;
pub use providers::Sha256PasswordHasher;
pub use providers::SystemClock;
pub use providers::UuidGenerator;
