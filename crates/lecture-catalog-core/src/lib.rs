// crates/lecture-catalog-core/src/lib.rs
// ============================================================================
// Module: Lecture Catalog Core Library
// Description: Public API surface for the lecture catalog core.
// Purpose: Expose domain types, provider interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Lecture catalog core models the section, category, subcategory, and
//! lecture taxonomy along with the sheikh and user accounts that own it. It
//! performs no I/O: storage backends consume these types and the provider
//! seams (clock, identifiers, password hashing) declared in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Clock;
pub use interfaces::IdGenerator;
pub use interfaces::PasswordHasher;
pub use runtime::FixedClock;
pub use runtime::SequentialIdGenerator;
pub use runtime::Sha256PasswordHasher;
pub use runtime::SystemClock;
pub use runtime::UuidGenerator;
