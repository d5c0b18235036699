// crates/lecture-catalog-store-sqlite/src/repository/lectures.rs
// ============================================================================
// Module: Lecture Repository
// Description: Scheduled lectures with status, placement, and search.
// Purpose: Persist lectures while enforcing the scheduling conflict rule.
// Dependencies: lecture-catalog-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Creating or rescheduling a lecture runs the conflict check and the write
//! inside one immediate transaction, so two writers cannot both claim the
//! same sheikh, category, and start instant. Parent names are copied onto
//! the lecture at write time; the category and subcategory repositories
//! refresh them on rename.
//!
//! Public reads return published lectures only. A sheikh-scoped query with
//! `include_unpublished` also returns that sheikh's drafts and archived
//! lectures. Soft-deleted lectures never appear.
//!
//! Location and media are stored as JSON text and decoded defensively: a
//! malformed value reads as absent instead of failing the query.

// ============================================================================
// SECTION: Imports
// ============================================================================

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::Lecture;
use lecture_catalog_core::LectureId;
use lecture_catalog_core::LectureInput;
use lecture_catalog_core::LectureStatus;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::SubcategoryId;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_core::decode_location;
use lecture_catalog_core::decode_media;
use lecture_catalog_core::encode_location;
use lecture_catalog_core::encode_media;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::categories::select_active_category;
use super::clean_optional;
use super::require_found;
use super::sheikhs::select_active_sheikh;
use super::subcategories::select_subcategory;
use crate::conflict::schedule_conflict_exists;
use crate::error::SqliteStoreError;
use crate::store::CatalogStore;

// ============================================================================
// SECTION: Query
// ============================================================================

/// Filters for listing lectures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LectureQuery {
    /// Section key or label.
    pub section: Option<String>,
    /// Category filter.
    pub category_id: Option<CategoryId>,
    /// Subcategory filter.
    pub subcategory_id: Option<SubcategoryId>,
    /// Owning sheikh filter.
    pub sheikh_id: Option<SheikhId>,
    /// Includes drafts and archived lectures; only honored with `sheikh_id`.
    pub include_unpublished: bool,
    /// Maximum number of rows.
    pub limit: Option<u32>,
}

impl LectureQuery {
    /// Public lectures of one section.
    #[must_use]
    pub fn section(section: &str) -> Self {
        Self {
            section: Some(section.to_string()),
            ..Self::default()
        }
    }

    /// Every non-deleted lecture owned by `sheikh_id`.
    #[must_use]
    pub fn owned_by(sheikh_id: SheikhId) -> Self {
        Self {
            sheikh_id: Some(sheikh_id),
            include_unpublished: true,
            ..Self::default()
        }
    }

    /// Returns true when the query sees more than published lectures.
    const fn is_owner_view(&self) -> bool {
        self.include_unpublished && self.sheikh_id.is_some()
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Column list matching [`map_lecture_row`].
const LECTURE_COLUMNS: &str = "id, title, description, section, category_id, category_name, \
                               subcategory_id, subcategory_name, sheikh_id, sheikh_name, \
                               start_time, end_time, location_json, media_json, status, \
                               created_at, updated_at";

/// Maps a `lectures` row.
fn map_lecture_row(row: &Row<'_>) -> rusqlite::Result<Lecture> {
    let id: String = row.get(0)?;
    let raw_status: String = row.get(14)?;
    let status = raw_status.parse().unwrap_or_else(|_| {
        tracing::warn!(lecture_id = %id, status = %raw_status, "unknown lecture status; reading as draft");
        LectureStatus::Draft
    });
    let location: Option<String> = row.get(12)?;
    let media: Option<String> = row.get(13)?;
    let category_id: Option<String> = row.get(4)?;
    let subcategory_id: Option<String> = row.get(6)?;
    let sheikh_id: Option<String> = row.get(8)?;
    Ok(Lecture {
        id: LectureId::new(id),
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        section: SectionKey::normalize(&row.get::<_, String>(3)?),
        category_id: clean_optional(category_id.as_deref()).map(CategoryId::new),
        category_name: row.get(5)?,
        subcategory_id: clean_optional(subcategory_id.as_deref()).map(SubcategoryId::new),
        subcategory_name: row.get(7)?,
        sheikh_id: clean_optional(sheikh_id.as_deref()).map(SheikhId::new),
        sheikh_name: row.get(9)?,
        start_time: UnixMillis::new(row.get(10)?),
        end_time: row.get::<_, Option<i64>>(11)?.map(UnixMillis::new),
        location: decode_location(location.as_deref()),
        media: decode_media(media.as_deref()),
        status,
        created_at: UnixMillis::new(row.get(15)?),
        updated_at: UnixMillis::new(row.get(16)?),
    })
}

/// Loads one non-deleted lecture.
fn select_lecture(
    connection: &Connection,
    id: &LectureId,
) -> Result<Option<Lecture>, SqliteStoreError> {
    Ok(connection
        .query_row(
            &format!(
                "SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = ?1 AND status != 'deleted'"
            ),
            params![id.as_str()],
            map_lecture_row,
        )
        .optional()?)
}

/// Loads lectures matching `query`, ordered by start time.
pub(crate) fn select_lectures(
    connection: &Connection,
    query: &LectureQuery,
) -> Result<Vec<Lecture>, SqliteStoreError> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(section) = &query.section {
        values.push(Value::Text(SectionKey::normalize(section).as_str().to_string()));
        clauses.push(format!("section = ?{}", values.len()));
    }
    if let Some(category_id) = &query.category_id {
        values.push(Value::Text(category_id.as_str().to_string()));
        clauses.push(format!("category_id = ?{}", values.len()));
    }
    if let Some(subcategory_id) = &query.subcategory_id {
        values.push(Value::Text(subcategory_id.as_str().to_string()));
        clauses.push(format!("subcategory_id = ?{}", values.len()));
    }
    if let Some(sheikh_id) = &query.sheikh_id {
        values.push(Value::Text(sheikh_id.as_str().to_string()));
        clauses.push(format!("sheikh_id = ?{}", values.len()));
    }
    if query.is_owner_view() {
        clauses.push("status != 'deleted'".to_string());
    } else {
        clauses.push("status = 'published'".to_string());
    }
    let limit = query.limit.map(|limit| format!(" LIMIT {limit}")).unwrap_or_default();
    let mut stmt = connection.prepare(&format!(
        "SELECT {LECTURE_COLUMNS} FROM lectures WHERE {} ORDER BY start_time, id{limit}",
        clauses.join(" AND ")
    ))?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_lecture_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ============================================================================
// SECTION: Write Helpers
// ============================================================================

/// Parent references and names resolved for a write.
struct ResolvedParents {
    /// Category reference, inherited from the subcategory when omitted.
    category_id: Option<CategoryId>,
    /// Cached category name.
    category_name: Option<String>,
    /// Cached subcategory name.
    subcategory_name: Option<String>,
    /// Cached sheikh name.
    sheikh_name: Option<String>,
}

/// Looks up parent names; a missing sheikh is an error, missing taxonomy
/// rows only leave the cached name empty.
fn resolve_parents(
    connection: &Connection,
    input: &LectureInput,
) -> Result<ResolvedParents, SqliteStoreError> {
    let mut category_id = input.category_id.clone();
    let mut subcategory_name = None;
    if let Some(subcategory_id) = &input.subcategory_id {
        match select_subcategory(connection, subcategory_id)? {
            Some(subcategory) => {
                subcategory_name = Some(subcategory.name);
                if category_id.is_none() {
                    category_id = subcategory.category_id;
                }
            }
            None => tracing::warn!(subcategory_id = %subcategory_id, "lecture references unknown subcategory"),
        }
    }
    let mut category_name = None;
    if let Some(id) = &category_id {
        match select_active_category(connection, id)? {
            Some(category) => category_name = Some(category.name),
            None => tracing::warn!(category_id = %id, "lecture references unknown category"),
        }
    }
    let sheikh_name = match &input.sheikh_id {
        Some(sheikh_id) => Some(
            require_found(select_active_sheikh(connection, sheikh_id)?, "sheikh", sheikh_id.as_str())?
                .name,
        ),
        None => None,
    };
    Ok(ResolvedParents {
        category_id,
        category_name,
        subcategory_name,
        sheikh_name,
    })
}

/// Fails with [`SqliteStoreError::Conflict`] when the slot is taken.
fn ensure_slot_free(
    connection: &Connection,
    sheikh_id: Option<&SheikhId>,
    category_id: Option<&CategoryId>,
    start_time: UnixMillis,
    exclude: Option<&LectureId>,
) -> Result<(), SqliteStoreError> {
    let (Some(sheikh_id), Some(category_id)) = (sheikh_id, category_id) else {
        return Ok(());
    };
    if schedule_conflict_exists(connection, sheikh_id, category_id, start_time, exclude)? {
        return Err(SqliteStoreError::Conflict {
            sheikh_id: sheikh_id.to_string(),
            category_id: category_id.to_string(),
            start_time: start_time.as_i64(),
        });
    }
    Ok(())
}

/// Builds an FTS5 match expression of quoted prefix terms.
fn fts_expression(terms: &[&str]) -> String {
    terms
        .iter()
        .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes `LIKE` wildcards in a search term.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Searches published lectures through the full-text index.
fn search_indexed(connection: &Connection, terms: &[&str]) -> Result<Vec<Lecture>, SqliteStoreError> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {LECTURE_COLUMNS} FROM lectures WHERE status = 'published' AND id IN (
             SELECT lecture_id FROM lectures_fts WHERE lectures_fts MATCH ?1
         ) ORDER BY start_time, id"
    ))?;
    let rows = stmt.query_map(params![fts_expression(terms)], map_lecture_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Searches published lectures with a substring scan.
fn search_scan(connection: &Connection, terms: &[&str]) -> Result<Vec<Lecture>, SqliteStoreError> {
    let patterns: Vec<String> = terms.iter().map(|term| like_pattern(term)).collect();
    let clauses: Vec<String> = (1 ..= patterns.len())
        .map(|index| {
            format!("(title LIKE ?{index} ESCAPE '\\' OR description LIKE ?{index} ESCAPE '\\')")
        })
        .collect();
    let mut stmt = connection.prepare(&format!(
        "SELECT {LECTURE_COLUMNS} FROM lectures WHERE status = 'published' AND {} \
         ORDER BY start_time, id",
        clauses.join(" AND ")
    ))?;
    let rows = stmt.query_map(params_from_iter(patterns.iter()), map_lecture_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl CatalogStore {
    /// Creates a lecture with `status`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] for invalid input,
    /// [`SqliteStoreError::NotFound`] for an unknown sheikh, and
    /// [`SqliteStoreError::Conflict`] when the sheikh already has a lecture
    /// in the category at the same start time.
    pub fn create_lecture(
        &self,
        input: &LectureInput,
        status: LectureStatus,
    ) -> Result<Lecture, SqliteStoreError> {
        input.validate()?;
        if status.is_deleted() {
            return Err(SqliteStoreError::Invalid(
                "lectures cannot be created deleted".to_string(),
            ));
        }
        let section = SectionKey::normalize(input.section.as_str());
        let id = LectureId::new(self.next_id());
        let now = self.now();
        let location = encode_location(input.location.as_ref());
        let media = encode_media(input.media.as_ref());
        let lecture = self.with_connection("create_lecture", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let parents = resolve_parents(&tx, input)?;
            ensure_slot_free(
                &tx,
                input.sheikh_id.as_ref(),
                parents.category_id.as_ref(),
                input.start_time,
                None,
            )?;
            tx.execute(
                &format!(
                    "INSERT INTO lectures ({LECTURE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
                     ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
                ),
                params![
                    id.as_str(),
                    input.title.trim(),
                    input.description,
                    section.as_str(),
                    parents.category_id.as_ref().map(CategoryId::as_str),
                    parents.category_name,
                    input.subcategory_id.as_ref().map(SubcategoryId::as_str),
                    parents.subcategory_name,
                    input.sheikh_id.as_ref().map(SheikhId::as_str),
                    parents.sheikh_name,
                    input.start_time.as_i64(),
                    input.end_time.map(UnixMillis::as_i64),
                    location,
                    media,
                    status.as_str(),
                    now.as_i64(),
                    now.as_i64(),
                ],
            )?;
            let lecture = require_found(select_lecture(&tx, &id)?, "lecture", id.as_str())?;
            tx.commit()?;
            Ok(lecture)
        })?;
        self.invalidate_hierarchy();
        tracing::debug!(lecture_id = %lecture.id, status = %lecture.status, "lecture created");
        Ok(lecture)
    }

    /// Loads a non-deleted lecture.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn get_lecture(&self, id: &LectureId) -> Result<Option<Lecture>, SqliteStoreError> {
        self.with_connection("get_lecture", |conn| select_lecture(conn, id))
    }

    /// Replaces a lecture's editable fields, keeping its status.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the lecture does not exist
    /// and [`SqliteStoreError::Conflict`] when the new slot is taken by
    /// another lecture.
    pub fn update_lecture(
        &self,
        id: &LectureId,
        input: &LectureInput,
    ) -> Result<Lecture, SqliteStoreError> {
        input.validate()?;
        let section = SectionKey::normalize(input.section.as_str());
        let now = self.now();
        let location = encode_location(input.location.as_ref());
        let media = encode_media(input.media.as_ref());
        let lecture = self.with_connection("update_lecture", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            require_found(select_lecture(&tx, id)?, "lecture", id.as_str())?;
            let parents = resolve_parents(&tx, input)?;
            ensure_slot_free(
                &tx,
                input.sheikh_id.as_ref(),
                parents.category_id.as_ref(),
                input.start_time,
                Some(id),
            )?;
            tx.execute(
                "UPDATE lectures SET title = ?1, description = ?2, section = ?3, \
                 category_id = ?4, category_name = ?5, subcategory_id = ?6, \
                 subcategory_name = ?7, sheikh_id = ?8, sheikh_name = ?9, start_time = ?10, \
                 end_time = ?11, location_json = ?12, media_json = ?13, updated_at = ?14 \
                 WHERE id = ?15",
                params![
                    input.title.trim(),
                    input.description,
                    section.as_str(),
                    parents.category_id.as_ref().map(CategoryId::as_str),
                    parents.category_name,
                    input.subcategory_id.as_ref().map(SubcategoryId::as_str),
                    parents.subcategory_name,
                    input.sheikh_id.as_ref().map(SheikhId::as_str),
                    parents.sheikh_name,
                    input.start_time.as_i64(),
                    input.end_time.map(UnixMillis::as_i64),
                    location,
                    media,
                    now.as_i64(),
                    id.as_str(),
                ],
            )?;
            let lecture = require_found(select_lecture(&tx, id)?, "lecture", id.as_str())?;
            tx.commit()?;
            Ok(lecture)
        })?;
        self.invalidate_hierarchy();
        Ok(lecture)
    }

    /// Moves a lecture between draft, published, and archived.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] for [`LectureStatus::Deleted`]
    /// and [`SqliteStoreError::NotFound`] when the lecture does not exist.
    pub fn set_lecture_status(
        &self,
        id: &LectureId,
        status: LectureStatus,
    ) -> Result<Lecture, SqliteStoreError> {
        if status.is_deleted() {
            return Err(SqliteStoreError::Invalid(
                "use delete_lecture to remove a lecture".to_string(),
            ));
        }
        let now = self.now();
        let lecture = self.with_connection("set_lecture_status", |conn| {
            conn.execute(
                "UPDATE lectures SET status = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND status != 'deleted'",
                params![status.as_str(), now.as_i64(), id.as_str()],
            )?;
            require_found(select_lecture(conn, id)?, "lecture", id.as_str())
        })?;
        self.invalidate_hierarchy();
        Ok(lecture)
    }

    /// Publishes a lecture.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the lecture does not exist.
    pub fn publish_lecture(&self, id: &LectureId) -> Result<Lecture, SqliteStoreError> {
        self.set_lecture_status(id, LectureStatus::Published)
    }

    /// Archives a lecture.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the lecture does not exist.
    pub fn archive_lecture(&self, id: &LectureId) -> Result<Lecture, SqliteStoreError> {
        self.set_lecture_status(id, LectureStatus::Archived)
    }

    /// Soft-deletes a lecture; returns false when none matched.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the update fails.
    pub fn delete_lecture(&self, id: &LectureId) -> Result<bool, SqliteStoreError> {
        let now = self.now();
        let changed = self.with_connection("delete_lecture", |conn| {
            Ok(conn.execute(
                "UPDATE lectures SET status = 'deleted', updated_at = ?1 \
                 WHERE id = ?2 AND status != 'deleted'",
                params![now.as_i64(), id.as_str()],
            )?)
        })?;
        if changed > 0 {
            self.invalidate_hierarchy();
        }
        Ok(changed > 0)
    }

    /// Removes a lecture permanently on behalf of its owning sheikh.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when no lecture with that id is
    /// owned by `owner`.
    pub fn delete_lecture_permanently(
        &self,
        id: &LectureId,
        owner: &SheikhId,
    ) -> Result<(), SqliteStoreError> {
        let removed = self.with_connection("delete_lecture_permanently", |conn| {
            Ok(conn.execute(
                "DELETE FROM lectures WHERE id = ?1 AND sheikh_id = ?2",
                params![id.as_str(), owner.as_str()],
            )?)
        })?;
        require_found((removed > 0).then_some(()), "lecture", id.as_str())?;
        self.invalidate_hierarchy();
        tracing::info!(lecture_id = %id, sheikh_id = %owner, "lecture permanently deleted");
        Ok(())
    }

    /// Lists lectures matching `query`, ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_lectures(&self, query: &LectureQuery) -> Result<Vec<Lecture>, SqliteStoreError> {
        self.with_connection("list_lectures", |conn| select_lectures(conn, query))
    }

    /// Lists every non-deleted lecture owned by `sheikh_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn list_lectures_by_sheikh(
        &self,
        sheikh_id: &SheikhId,
    ) -> Result<Vec<Lecture>, SqliteStoreError> {
        self.list_lectures(&LectureQuery::owned_by(sheikh_id.clone()))
    }

    /// Searches published lectures by title and description.
    ///
    /// Every whitespace-separated term must match. The full-text index is
    /// used when present; if it fails the store switches to substring scans.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the scan fails.
    pub fn search_lectures(&self, text: &str) -> Result<Vec<Lecture>, SqliteStoreError> {
        let terms: Vec<&str> = text.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        if self.search_index_enabled() {
            let indexed =
                self.with_connection("search_lectures", |conn| Ok(search_indexed(conn, &terms)))?;
            match indexed {
                Ok(lectures) => return Ok(lectures),
                Err(err) => {
                    tracing::warn!(error = %err, "full-text search failed; switching to scan search");
                    self.disable_search_index();
                }
            }
        }
        self.with_connection("search_lectures", |conn| search_scan(conn, &terms))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
