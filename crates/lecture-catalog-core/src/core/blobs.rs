// crates/lecture-catalog-core/src/core/blobs.rs
// ============================================================================
// Module: Lecture Catalog Structured Blobs
// Description: Location and media payloads stored as serialized columns.
// Purpose: Encode blobs deterministically and decode them defensively.
// Dependencies: serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Location and media details are persisted as JSON text columns but handled
//! in memory as structs with named optional fields. Decoding never fails: a
//! malformed or non-JSON blob degrades to `None` and is logged. Location
//! decoding also accepts the legacy `locationUrl` and `googleMapsUrl` keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Location
// ============================================================================

/// Keys accepted for the location URL, in priority order.
const LOCATION_URL_KEYS: [&str; 3] = ["url", "locationUrl", "googleMapsUrl"];

/// Where a lecture takes place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable place name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Map link for the place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Location {
    /// Returns true when neither field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.label.is_none() && self.url.is_none()
    }
}

// ============================================================================
// SECTION: Media
// ============================================================================

/// Whether a PDF reference points at a remote URL or a local file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfType {
    /// Local file reference.
    File,
    /// Remote URL.
    Url,
}

/// Media attached to a lecture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Audio recording URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Video URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Video identifier derived by the caller from `video_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// PDF location (URL or local path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Original PDF file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_file_name: Option<String>,
    /// PDF reference kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_type: Option<PdfType>,
}

impl Media {
    /// Returns true when no media field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.audio_url.is_none()
            && self.video_url.is_none()
            && self.video_id.is_none()
            && self.pdf_url.is_none()
            && self.pdf_file_name.is_none()
            && self.pdf_type.is_none()
    }

    /// Returns the PDF kind, inferring it from the reference when unset.
    #[must_use]
    pub fn pdf_kind(&self) -> Option<PdfType> {
        if self.pdf_type.is_some() {
            return self.pdf_type;
        }
        let reference = self.pdf_url.as_deref()?;
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Some(PdfType::Url)
        } else {
            Some(PdfType::File)
        }
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes a location for storage; empty locations store as `NULL`.
#[must_use]
pub fn encode_location(location: Option<&Location>) -> Option<String> {
    let location = location.filter(|location| !location.is_empty())?;
    encode_blob("location", location)
}

/// Encodes media for storage; empty media stores as `NULL`.
#[must_use]
pub fn encode_media(media: Option<&Media>) -> Option<String> {
    let media = media.filter(|media| !media.is_empty())?;
    encode_blob("media", media)
}

/// Serializes a blob, logging instead of failing.
fn encode_blob<T: Serialize>(kind: &'static str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(encoded) => Some(encoded),
        Err(err) => {
            tracing::warn!(blob = kind, error = %err, "failed to encode blob; storing NULL");
            None
        }
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a stored location blob.
///
/// Blank input yields `None`. Malformed input yields `None` and a warning.
#[must_use]
pub fn decode_location(raw: Option<&str>) -> Option<Location> {
    let object = decode_object("location", raw)?;
    let label = string_field(&object, "label");
    let url = LOCATION_URL_KEYS
        .iter()
        .find_map(|key| string_field(&object, key).filter(|url| !url.is_empty()))
        .or_else(|| LOCATION_URL_KEYS.iter().find_map(|key| string_field(&object, key)));
    Some(Location {
        label,
        url,
    })
}

/// Decodes a stored media blob.
///
/// Blank input yields `None`. Malformed input yields `None` and a warning.
#[must_use]
pub fn decode_media(raw: Option<&str>) -> Option<Media> {
    let object = decode_object("media", raw)?;
    match serde_json::from_value::<Media>(Value::Object(object)) {
        Ok(media) => Some(media),
        Err(err) => {
            tracing::warn!(blob = "media", error = %err, "malformed blob; treating as absent");
            None
        }
    }
}

/// Parses a blob into a JSON object, logging malformed payloads.
fn decode_object(kind: &'static str, raw: Option<&str>) -> Option<Map<String, Value>> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Some(object),
        Ok(Value::Null) => None,
        Ok(_) => {
            tracing::warn!(blob = kind, "blob is not a JSON object; treating as absent");
            None
        }
        Err(err) => {
            tracing::warn!(blob = kind, error = %err, "malformed blob; treating as absent");
            None
        }
    }
}

/// Returns a string field from a JSON object; empty strings are kept.
fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(value)) => Some(value.clone()),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
