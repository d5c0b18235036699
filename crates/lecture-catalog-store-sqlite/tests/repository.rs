// crates/lecture-catalog-store-sqlite/tests/repository.rs
// ============================================================================
// Module: Repository Tests
// Description: Users, sheikhs, taxonomy, and lecture operations.
// Purpose: Validate persistence rules against a real SQLite file.
// Dependencies: lecture-catalog-store-sqlite, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Covers uniqueness, visibility, denormalized name refreshes, soft deletes,
//! and defensive decoding of stored blobs.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::CategoryInput;
use lecture_catalog_core::LectureStatus;
use lecture_catalog_core::Location;
use lecture_catalog_core::NewSheikh;
use lecture_catalog_core::NewUser;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::SheikhProfile;
use lecture_catalog_core::SubcategoryInput;
use lecture_catalog_core::UserId;
use lecture_catalog_core::UserProfile;
use lecture_catalog_store_sqlite::LectureQuery;
use lecture_catalog_store_sqlite::SqliteStoreError;
use support::MORNING;
use support::category;
use support::lecture_input;
use support::open_store;
use support::sheikh;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        is_admin: false,
        display_name: None,
    }
}

fn subcategory_input(section: &str, name: &str, parent: Option<&CategoryId>) -> SubcategoryInput {
    SubcategoryInput {
        name: name.to_string(),
        section: SectionKey::normalize(section),
        category_id: parent.cloned(),
        description: None,
        icon: None,
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

#[test]
fn users_are_unique_by_username_and_email() {
    let fixture = open_store();
    let store = &fixture.store;
    let user = store.create_user(&new_user("amina", "Amina@Example.com")).unwrap();
    assert_eq!(user.email, "amina@example.com");
    assert_ne!(user.password_hash, "correct horse");

    let err = store.create_user(&new_user("amina", "other@example.com")).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Duplicate(_)), "{err:?}");
    let err = store.create_user(&new_user("other", "AMINA@example.com")).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Duplicate(_)), "{err:?}");
    let err = store.create_user(&new_user("  ", "blank@example.com")).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");
}

#[test]
fn user_login_accepts_username_or_email() {
    let fixture = open_store();
    let store = &fixture.store;
    let user = store.create_user(&new_user("yusuf", "yusuf@example.com")).unwrap();

    let by_email = store.verify_user_credentials(" YUSUF@example.com ", "correct horse").unwrap();
    assert_eq!(by_email.map(|found| found.id), Some(user.id.clone()));
    let by_name = store.verify_user_credentials("yusuf", "correct horse").unwrap();
    assert_eq!(by_name.map(|found| found.id), Some(user.id));
    assert!(store.verify_user_credentials("yusuf", "wrong").unwrap().is_none());
    assert!(store.verify_user_credentials("nobody", "correct horse").unwrap().is_none());
}

#[test]
fn user_profile_and_admin_flag_update() {
    let fixture = open_store();
    let store = &fixture.store;
    let user = store.create_user(&new_user("maryam", "maryam@example.com")).unwrap();
    fixture.clock.advance(1_000);

    let updated = store
        .update_user_profile(&user.id, &UserProfile {
            display_name: Some(" Maryam ".to_string()),
            bio: Some("   ".to_string()),
            avatar_url: None,
        })
        .unwrap();
    assert_eq!(updated.display_name.as_deref(), Some("Maryam"));
    assert!(updated.bio.is_none());
    assert!(updated.updated_at > user.updated_at);

    store.set_user_admin(&user.id, true).unwrap();
    assert!(store.get_user(&user.id).unwrap().unwrap().is_admin);
    let err = store.set_user_admin(&UserId::new("missing"), true).unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");

    assert_eq!(store.list_users().unwrap().len(), 1);
    assert!(store.delete_user(&user.id).unwrap());
    assert!(!store.delete_user(&user.id).unwrap());
    assert!(store.get_user(&user.id).unwrap().is_none());
}

// ============================================================================
// SECTION: Sheikhs
// ============================================================================

#[test]
fn sheikh_numbers_are_normalized_and_unique() {
    let fixture = open_store();
    let store = &fixture.store;
    let created = store
        .create_sheikh(&NewSheikh {
            number: "1234-5678".to_string(),
            name: "Sheikh Ahmad".to_string(),
            email: Some("Ahmad@Example.com".to_string()),
            phone: None,
            category: None,
            password: "pw".to_string(),
        })
        .unwrap();
    assert_eq!(created.number.as_str(), "12345678");
    assert_eq!(created.email.as_deref(), Some("ahmad@example.com"));

    let err = store
        .create_sheikh(&NewSheikh {
            number: "12345678".to_string(),
            name: "Someone Else".to_string(),
            email: None,
            phone: None,
            category: None,
            password: "pw".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::Duplicate(_)), "{err:?}");

    let err = store
        .create_sheikh(&NewSheikh {
            number: "1234567".to_string(),
            name: "Short Number".to_string(),
            email: None,
            phone: None,
            category: None,
            password: "pw".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");

    let found = store.get_sheikh_by_number("12 34 56 78").unwrap().unwrap();
    assert_eq!(found.id, created.id);
}

#[test]
fn sheikh_login_requires_number_and_password() {
    let fixture = open_store();
    let store = &fixture.store;
    let id = sheikh(store, "87654321", "Sheikh Bilal");

    let found = store.verify_sheikh_credentials("87654321", "secret").unwrap();
    assert_eq!(found.map(|sheikh| sheikh.id), Some(id.clone()));
    assert!(store.verify_sheikh_credentials("87654321", "wrong").unwrap().is_none());
    assert!(store.verify_sheikh_credentials("8765", "secret").unwrap().is_none());

    store.change_sheikh_password(&id, "rotated").unwrap();
    assert!(store.verify_sheikh_credentials("87654321", "secret").unwrap().is_none());
    assert!(store.verify_sheikh_credentials("87654321", "rotated").unwrap().is_some());
}

#[test]
fn sheikh_rename_refreshes_lecture_names() {
    let fixture = open_store();
    let store = &fixture.store;
    let id = sheikh(store, "11112222", "Sheikh Old");
    let mut input = lecture_input("Tawheed", "fiqh", MORNING);
    input.sheikh_id = Some(id.clone());
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();
    assert_eq!(lecture.sheikh_name.as_deref(), Some("Sheikh Old"));

    store
        .update_sheikh_profile(&id, &SheikhProfile {
            name: "Sheikh New".to_string(),
            email: None,
            phone: Some("+1 555".to_string()),
            category: None,
        })
        .unwrap();
    let reloaded = store.get_lecture(&lecture.id).unwrap().unwrap();
    assert_eq!(reloaded.sheikh_name.as_deref(), Some("Sheikh New"));
}

#[test]
fn deleted_sheikh_is_hidden_and_cannot_own_lectures() {
    let fixture = open_store();
    let store = &fixture.store;
    let id = sheikh(store, "33334444", "Sheikh Gone");
    assert!(store.delete_sheikh(&id).unwrap());
    assert!(!store.delete_sheikh(&id).unwrap());
    assert!(store.get_sheikh(&id).unwrap().is_none());
    assert!(store.list_sheikhs().unwrap().is_empty());
    assert!(store.verify_sheikh_credentials("33334444", "secret").unwrap().is_none());

    let mut input = lecture_input("Orphaned", "fiqh", MORNING);
    input.sheikh_id = Some(id);
    let err = store.create_lecture(&input, LectureStatus::Draft).unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
}

// ============================================================================
// SECTION: Taxonomy
// ============================================================================

#[test]
fn categories_follow_sort_order_and_labels() {
    let fixture = open_store();
    let store = &fixture.store;
    let second = category(store, "fiqh", "Zakat", 2);
    let first = category(store, "الفقه", "Prayer", 1);
    category(store, "hadith", "Forty", 0);

    let names: Vec<_> =
        store.list_categories("fiqh").unwrap().into_iter().map(|category| category.name).collect();
    assert_eq!(names, vec!["Prayer", "Zakat"]);

    store.reorder_categories("fiqh", &[second.clone(), first.clone()]).unwrap();
    let ids: Vec<_> =
        store.list_categories("fiqh").unwrap().into_iter().map(|category| category.id).collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);

    let err = store
        .reorder_categories("fiqh", &[first.clone(), CategoryId::new("missing")])
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
    let ids: Vec<_> =
        store.list_categories("fiqh").unwrap().into_iter().map(|category| category.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[test]
fn category_rename_and_soft_delete() {
    let fixture = open_store();
    let store = &fixture.store;
    let id = category(store, "seerah", "Makkah", 0);
    let mut input = lecture_input("Early years", "seerah", MORNING);
    input.category_id = Some(id.clone());
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();
    assert_eq!(lecture.category_name.as_deref(), Some("Makkah"));

    store
        .update_category(&id, &CategoryInput {
            section: SectionKey::normalize("seerah"),
            name: "Makkan Period".to_string(),
            description: Some("Before the migration".to_string()),
            sort_order: 3,
        })
        .unwrap();
    let reloaded = store.get_lecture(&lecture.id).unwrap().unwrap();
    assert_eq!(reloaded.category_name.as_deref(), Some("Makkan Period"));

    assert!(store.delete_category(&id).unwrap());
    assert!(store.get_category(&id).unwrap().is_none());
    assert!(store.list_categories("seerah").unwrap().is_empty());
    let err = store
        .update_category(&id, &CategoryInput {
            section: SectionKey::normalize("seerah"),
            name: "Revived".to_string(),
            description: None,
            sort_order: 0,
        })
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
}

#[test]
fn subcategory_delete_clears_lecture_references() {
    let fixture = open_store();
    let store = &fixture.store;
    let parent = category(store, "tafsir", "Juz Amma", 0);
    let sub = store.create_subcategory(&subcategory_input("tafsir", "An-Naba", Some(&parent))).unwrap();

    let mut input = lecture_input("Verse one", "tafsir", MORNING);
    input.subcategory_id = Some(sub.id.clone());
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();
    assert_eq!(lecture.category_id.as_ref(), Some(&parent));
    assert_eq!(lecture.subcategory_name.as_deref(), Some("An-Naba"));

    assert!(store.delete_subcategory(&sub.id).unwrap());
    assert!(!store.delete_subcategory(&sub.id).unwrap());
    let reloaded = store.get_lecture(&lecture.id).unwrap().unwrap();
    assert!(reloaded.subcategory_id.is_none());
    assert!(reloaded.subcategory_name.is_none());
    assert_eq!(reloaded.category_id, Some(parent));
}

#[test]
fn orphan_subcategories_attach_to_first_category() {
    let fixture = open_store();
    let store = &fixture.store;
    let later = category(store, "hadith", "Later", 5);
    let first = category(store, "hadith", "First", 1);
    let orphan = store.create_subcategory(&subcategory_input("hadith", "Loose", None)).unwrap();
    let stranded = store.create_subcategory(&subcategory_input("seerah", "Stranded", None)).unwrap();
    let attached = store.create_subcategory(&subcategory_input("hadith", "Kept", Some(&later))).unwrap();

    assert_eq!(store.repair_orphan_subcategories().unwrap(), 1);
    assert_eq!(store.get_subcategory(&orphan.id).unwrap().unwrap().category_id, Some(first));
    assert!(store.get_subcategory(&stranded.id).unwrap().unwrap().category_id.is_none());
    assert_eq!(store.get_subcategory(&attached.id).unwrap().unwrap().category_id, Some(later));
    assert_eq!(store.repair_orphan_subcategories().unwrap(), 0);
}

// ============================================================================
// SECTION: Lectures
// ============================================================================

#[test]
fn lecture_visibility_depends_on_status_and_viewer() {
    let fixture = open_store();
    let store = &fixture.store;
    let owner = sheikh(store, "55556666", "Sheikh Owner");
    let mut ids = Vec::new();
    for (offset, status) in [LectureStatus::Draft, LectureStatus::Published, LectureStatus::Archived]
        .into_iter()
        .enumerate()
    {
        let mut input = lecture_input(&format!("Lecture {status}"), "fiqh", MORNING.plus_minutes(
            i64::try_from(offset).unwrap() * 60,
        ));
        input.sheikh_id = Some(owner.clone());
        ids.push(store.create_lecture(&input, status).unwrap().id);
    }

    let public = store.list_lectures(&LectureQuery::section("fiqh")).unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].status, LectureStatus::Published);

    let owned = store.list_lectures_by_sheikh(&owner).unwrap();
    assert_eq!(owned.len(), 3);

    assert!(store.delete_lecture(&ids[0]).unwrap());
    assert!(store.get_lecture(&ids[0]).unwrap().is_none());
    assert_eq!(store.list_lectures_by_sheikh(&owner).unwrap().len(), 2);

    let republished = store.publish_lecture(&ids[2]).unwrap();
    assert_eq!(republished.status, LectureStatus::Published);
    assert_eq!(store.list_lectures(&LectureQuery::section("fiqh")).unwrap().len(), 2);
    let limited = LectureQuery {
        limit: Some(1),
        ..LectureQuery::section("fiqh")
    };
    assert_eq!(store.list_lectures(&limited).unwrap().len(), 1);
}

#[test]
fn lecture_status_rules() {
    let fixture = open_store();
    let store = &fixture.store;
    let input = lecture_input("Status", "hadith", MORNING);
    let err = store.create_lecture(&input, LectureStatus::Deleted).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");

    let lecture = store.create_lecture(&input, LectureStatus::Draft).unwrap();
    let err = store.set_lecture_status(&lecture.id, LectureStatus::Deleted).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");
    assert_eq!(store.archive_lecture(&lecture.id).unwrap().status, LectureStatus::Archived);

    store.delete_lecture(&lecture.id).unwrap();
    let err = store.publish_lecture(&lecture.id).unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
}

#[test]
fn lecture_input_is_validated() {
    let fixture = open_store();
    let store = &fixture.store;
    let mut input = lecture_input("   ", "fiqh", MORNING);
    let err = store.create_lecture(&input, LectureStatus::Draft).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");

    input.title = "Backwards".to_string();
    input.end_time = Some(MORNING.plus_minutes(-30));
    let err = store.create_lecture(&input, LectureStatus::Draft).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)), "{err:?}");
}

#[test]
fn permanent_delete_requires_the_owner() {
    let fixture = open_store();
    let store = &fixture.store;
    let owner = sheikh(store, "77778888", "Sheikh Owner");
    let other = sheikh(store, "99990000", "Sheikh Other");
    let mut input = lecture_input("Owned", "fiqh", MORNING);
    input.sheikh_id = Some(owner.clone());
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();

    let err = store.delete_lecture_permanently(&lecture.id, &other).unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
    store.delete_lecture_permanently(&lecture.id, &owner).unwrap();
    let remaining: i64 = fixture
        .raw()
        .query_row("SELECT count(*) FROM lectures", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    let err = store
        .delete_lecture_permanently(&lecture.id, &SheikhId::new("nobody"))
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::NotFound(_)), "{err:?}");
}

#[test]
fn malformed_blobs_read_as_absent() {
    let fixture = open_store();
    let store = &fixture.store;
    let mut input = lecture_input("Blobs", "fiqh", MORNING);
    input.location = Some(Location {
        label: Some("Main hall".to_string()),
        url: None,
    });
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();
    assert_eq!(lecture.location.as_ref().and_then(|location| location.label.as_deref()), Some(
        "Main hall"
    ));

    fixture
        .raw()
        .execute(
            "UPDATE lectures SET location_json = '[1, 2', media_json = '\"just text\"', \
             status = 'mystery' WHERE id = ?1",
            [lecture.id.as_str()],
        )
        .unwrap();
    let reloaded = store.get_lecture(&lecture.id).unwrap().unwrap();
    assert!(reloaded.location.is_none());
    assert!(reloaded.media.is_none());
    assert_eq!(reloaded.status, LectureStatus::Draft);
}

// ============================================================================
// SECTION: Schema Repair
// ============================================================================

#[test]
fn dropped_table_is_restored_on_use() {
    let fixture = open_store();
    let store = &fixture.store;
    category(store, "fiqh", "Prayer", 0);
    fixture.raw().execute_batch("DROP TABLE categories;").unwrap();

    assert!(store.list_categories("fiqh").unwrap().is_empty());
    category(store, "fiqh", "Prayer again", 0);
    assert_eq!(store.list_categories("fiqh").unwrap().len(), 1);
}

#[test]
fn dropped_column_is_restored_on_write() {
    let fixture = open_store();
    let store = &fixture.store;
    let owner = sheikh(store, "24682468", "Sheikh Repair");
    fixture.raw().execute_batch("ALTER TABLE lectures DROP COLUMN sheikh_name;").unwrap();

    let mut input = lecture_input("After drift", "fiqh", MORNING);
    input.sheikh_id = Some(owner);
    let lecture = store.create_lecture(&input, LectureStatus::Published).unwrap();
    assert_eq!(lecture.sheikh_name.as_deref(), Some("Sheikh Repair"));
}

#[test]
fn constraint_errors_are_not_repaired() {
    let fixture = open_store();
    let store = &fixture.store;
    store.create_user(&new_user("once", "once@example.com")).unwrap();
    let before = store.schema_status().unwrap();
    let err = store.create_user(&new_user("once", "twice@example.com")).unwrap_err();
    assert!(!err.is_schema_drift());
    assert_eq!(store.schema_status().unwrap(), before);
}
