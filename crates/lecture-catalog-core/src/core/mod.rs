// crates/lecture-catalog-core/src/core/mod.rs
// ============================================================================
// Module: Lecture Catalog Core Types
// Description: Domain model for the lecture catalog taxonomy and accounts.
// Purpose: Group identifiers, sections, timestamps, records, and hierarchy views.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Core domain types shared by every storage backend. Validation that must
//! hold at the storage boundary (section normalization, sheikh numbers) lives
//! here so every writer applies the same rules.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod blobs;
pub mod error;
pub mod hierarchy;
pub mod identifiers;
pub mod records;
pub mod section;
pub mod timestamp;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use blobs::Location;
pub use blobs::Media;
pub use blobs::PdfType;
pub use blobs::decode_location;
pub use blobs::decode_media;
pub use blobs::encode_location;
pub use blobs::encode_media;
pub use error::ValidationError;
pub use error::require_text;
pub use hierarchy::CatalogHierarchy;
pub use hierarchy::CategoryNode;
pub use hierarchy::SectionTree;
pub use hierarchy::SubcategoryNode;
pub use hierarchy::assemble_section;
pub use identifiers::CategoryId;
pub use identifiers::LectureId;
pub use identifiers::SheikhId;
pub use identifiers::SheikhNumber;
pub use identifiers::SubcategoryId;
pub use identifiers::UserId;
pub use records::Category;
pub use records::CategoryInput;
pub use records::Lecture;
pub use records::LectureInput;
pub use records::LectureStatus;
pub use records::NewSheikh;
pub use records::NewUser;
pub use records::Sheikh;
pub use records::SheikhProfile;
pub use records::Subcategory;
pub use records::SubcategoryInput;
pub use records::User;
pub use records::UserProfile;
pub use section::Section;
pub use section::SectionKey;
pub use timestamp::UnixMillis;
