// crates/lecture-catalog-core/src/core/section.rs
// ============================================================================
// Module: Lecture Catalog Sections
// Description: Top-level subject buckets and key normalization.
// Purpose: Map canonical keys and localized labels onto one stored key.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Sections form a fixed set of four subject buckets. Inputs may arrive as
//! the canonical key (`fiqh`) or a localized label (`الفقه`); both normalize
//! to the canonical key. Unknown inputs never fail: they are trimmed and
//! lowercased and stored as-is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Section
// ============================================================================

/// Known catalog sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Jurisprudence.
    Fiqh,
    /// Prophetic traditions.
    Hadith,
    /// Prophetic biography.
    Seerah,
    /// Quranic exegesis.
    Tafsir,
}

impl Section {
    /// Every known section in display order.
    pub const ALL: [Self; 4] = [Self::Fiqh, Self::Hadith, Self::Seerah, Self::Tafsir];

    /// Returns the canonical storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fiqh => "fiqh",
            Self::Hadith => "hadith",
            Self::Seerah => "seerah",
            Self::Tafsir => "tafsir",
        }
    }

    /// Returns the localized display label.
    #[must_use]
    pub const fn localized_label(self) -> &'static str {
        match self {
            Self::Fiqh => "الفقه",
            Self::Hadith => "الحديث",
            Self::Seerah => "السيرة",
            Self::Tafsir => "التفسير",
        }
    }

    /// Alternate spellings accepted as the same section.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Fiqh => &["فقه"],
            Self::Hadith => &["حديث"],
            Self::Seerah => &["سيرة", "السيرة النبوية", "sira", "seera"],
            Self::Tafsir => &["تفسير", "tafseer"],
        }
    }

    /// Resolves a canonical key or localized label to a known section.
    #[must_use]
    pub fn from_label(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let lowered = trimmed.to_lowercase();
        Self::ALL.into_iter().find(|section| {
            section.as_str() == lowered
                || section.localized_label() == trimmed
                || section.aliases().iter().any(|alias| *alias == trimmed || *alias == lowered)
        })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Section Key
// ============================================================================

/// Normalized section key as stored and queried.
///
/// # Invariants
/// - Known sections are always represented by their canonical key.
/// - Unknown inputs are trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKey(String);

impl SectionKey {
    /// Normalizes a canonical key, localized label, or arbitrary input.
    #[must_use]
    pub fn normalize(input: &str) -> Self {
        match Section::from_label(input) {
            Some(section) => Self(section.as_str().to_string()),
            None => Self(input.trim().to_lowercase()),
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the known section for this key, if any.
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        Section::from_label(&self.0)
    }

    /// Returns true when the key is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Section> for SectionKey {
    fn from(value: Section) -> Self {
        Self(value.as_str().to_string())
    }
}

impl From<&str> for SectionKey {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
