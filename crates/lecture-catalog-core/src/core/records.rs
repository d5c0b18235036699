// crates/lecture-catalog-core/src/core/records.rs
// ============================================================================
// Module: Lecture Catalog Records
// Description: Typed entities for categories, lectures, sheikhs, and users.
// Purpose: Replace loosely typed storage rows with explicit domain structs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each stored entity has one record struct (what reads return) and one
//! input struct (what writes accept). Storage identifiers, timestamps, and
//! derived names are assigned by the store, never by callers.
//!
//! Lecture lifecycle is a single [`LectureStatus`]; the published and
//! soft-deleted flags are derived from it and cannot disagree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::blobs::Location;
use crate::core::blobs::Media;
use crate::core::error::ValidationError;
use crate::core::identifiers::CategoryId;
use crate::core::identifiers::LectureId;
use crate::core::identifiers::SheikhId;
use crate::core::identifiers::SheikhNumber;
use crate::core::identifiers::SubcategoryId;
use crate::core::identifiers::UserId;
use crate::core::section::SectionKey;
use crate::core::timestamp::UnixMillis;

// ============================================================================
// SECTION: Categories
// ============================================================================

/// A category within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Owning section key.
    pub section: SectionKey,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the section (ascending).
    pub sort_order: i64,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Creation time.
    pub created_at: UnixMillis,
    /// Last update time.
    pub updated_at: UnixMillis,
}

/// Editable category fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    /// Owning section key.
    pub section: SectionKey,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the section.
    pub sort_order: i64,
}

// ============================================================================
// SECTION: Subcategories
// ============================================================================

/// A subcategory, normally nested under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    /// Subcategory identifier.
    pub id: SubcategoryId,
    /// Display name.
    pub name: String,
    /// Owning section key.
    pub section: SectionKey,
    /// Parent category; `None` marks an orphan awaiting repair.
    pub category_id: Option<CategoryId>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional icon reference.
    pub icon: Option<String>,
    /// Creation time.
    pub created_at: UnixMillis,
}

/// Editable subcategory fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryInput {
    /// Display name.
    pub name: String,
    /// Owning section key.
    pub section: SectionKey,
    /// Parent category.
    pub category_id: Option<CategoryId>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional icon reference.
    pub icon: Option<String>,
}

// ============================================================================
// SECTION: Lectures
// ============================================================================

/// Lecture lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LectureStatus {
    /// Not yet visible publicly.
    Draft,
    /// Publicly listed.
    Published,
    /// Hidden from public listings, visible to the owning sheikh.
    Archived,
    /// Soft-deleted; hidden from every listing.
    Deleted,
}

impl LectureStatus {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    /// Returns true when the lecture is publicly listed.
    #[must_use]
    pub const fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }

    /// Returns true when the lecture is soft-deleted.
    #[must_use]
    pub const fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for LectureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LectureStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" | "active" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            other => Err(ValidationError::Status(other.to_string())),
        }
    }
}

/// A scheduled lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    /// Lecture identifier.
    pub id: LectureId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Section key.
    pub section: SectionKey,
    /// Category reference.
    pub category_id: Option<CategoryId>,
    /// Category name captured at write time.
    pub category_name: Option<String>,
    /// Subcategory reference.
    pub subcategory_id: Option<SubcategoryId>,
    /// Subcategory name captured at write time.
    pub subcategory_name: Option<String>,
    /// Owning sheikh.
    pub sheikh_id: Option<SheikhId>,
    /// Sheikh name captured at write time.
    pub sheikh_name: Option<String>,
    /// Start instant.
    pub start_time: UnixMillis,
    /// Optional end instant.
    pub end_time: Option<UnixMillis>,
    /// Optional venue.
    pub location: Option<Location>,
    /// Optional attached media.
    pub media: Option<Media>,
    /// Lifecycle status.
    pub status: LectureStatus,
    /// Creation time.
    pub created_at: UnixMillis,
    /// Last update time.
    pub updated_at: UnixMillis,
}

impl Lecture {
    /// Returns true when the lecture has neither a category nor a subcategory.
    #[must_use]
    pub const fn is_uncategorized(&self) -> bool {
        self.category_id.is_none() && self.subcategory_id.is_none()
    }
}

/// Editable lecture fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureInput {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Section key.
    pub section: SectionKey,
    /// Category reference.
    pub category_id: Option<CategoryId>,
    /// Subcategory reference.
    pub subcategory_id: Option<SubcategoryId>,
    /// Owning sheikh.
    pub sheikh_id: Option<SheikhId>,
    /// Start instant; callers normalize seconds before submitting.
    pub start_time: UnixMillis,
    /// Optional end instant.
    pub end_time: Option<UnixMillis>,
    /// Optional venue.
    pub location: Option<Location>,
    /// Optional attached media.
    pub media: Option<Media>,
}

impl LectureInput {
    /// Validates field-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the title or section is blank or the
    /// end time precedes the start time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        crate::core::error::require_text("title", &self.title)?;
        crate::core::error::require_text("section", self.section.as_str())?;
        if let Some(end_time) = self.end_time
            && end_time < self.start_time
        {
            return Err(ValidationError::EndBeforeStart);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Sheikhs
// ============================================================================

/// A lecturer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheikh {
    /// Record identifier.
    pub id: SheikhId,
    /// External eight digit number.
    pub number: SheikhNumber,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Specialty label.
    pub category: Option<String>,
    /// One-way password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// Creation time.
    pub created_at: UnixMillis,
    /// Last update time.
    pub updated_at: UnixMillis,
}

/// Registration input for a sheikh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSheikh {
    /// Raw number input; validated at the storage boundary.
    pub number: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Specialty label.
    pub category: Option<String>,
    /// Plain-text password; hashed before storage.
    pub password: String,
}

/// Editable sheikh profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheikhProfile {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Specialty label.
    pub category: Option<String>,
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// An application user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Record identifier.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Unique email (stored lowercase).
    pub email: String,
    /// One-way password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Administrator flag.
    pub is_admin: bool,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional biography.
    pub bio: Option<String>,
    /// Optional avatar reference.
    pub avatar_url: Option<String>,
    /// Creation time.
    pub created_at: UnixMillis,
    /// Last update time.
    pub updated_at: UnixMillis,
}

/// Registration input for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique username.
    pub username: String,
    /// Unique email.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
    /// Administrator flag.
    pub is_admin: bool,
    /// Optional display name.
    pub display_name: Option<String>,
}

/// Editable user profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Optional display name.
    pub display_name: Option<String>,
    /// Optional biography.
    pub bio: Option<String>,
    /// Optional avatar reference.
    pub avatar_url: Option<String>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
