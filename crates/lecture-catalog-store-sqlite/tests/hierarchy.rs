// crates/lecture-catalog-store-sqlite/tests/hierarchy.rs
// ============================================================================
// Module: Hierarchy Aggregation Tests
// Description: Section trees read from the store and their cache.
// Purpose: Ensure writes are visible in the next tree and empty nodes remain.
// Dependencies: lecture-catalog-store-sqlite, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use std::sync::Arc;

use lecture_catalog_core::LectureStatus;
use lecture_catalog_core::Section;
use lecture_catalog_core::SectionKey;
use lecture_catalog_core::SubcategoryInput;
use support::MORNING;
use support::category;
use support::lecture_input;
use support::open_store;

#[test]
fn every_section_is_present_and_empty_categories_survive() {
    let fixture = open_store();
    let store = &fixture.store;
    category(store, "hadith", "Forty Hadith", 0);

    let hierarchy = store.catalog_hierarchy().unwrap();
    assert_eq!(hierarchy.sections.len(), Section::ALL.len());
    let hadith = hierarchy.section(Section::Hadith).unwrap();
    assert_eq!(hadith.categories.len(), 1);
    assert!(hadith.categories[0].lectures.is_empty());
    assert_eq!(hierarchy.section(Section::Fiqh).unwrap().lecture_count(), 0);
}

#[test]
fn lectures_land_under_their_nodes() {
    let fixture = open_store();
    let store = &fixture.store;
    let parent = category(store, "fiqh", "Prayer", 0);
    let sub = store
        .create_subcategory(&SubcategoryInput {
            name: "Friday".to_string(),
            section: SectionKey::normalize("fiqh"),
            category_id: Some(parent.clone()),
            description: None,
            icon: None,
        })
        .unwrap();

    let mut direct = lecture_input("Conditions of prayer", "fiqh", MORNING);
    direct.category_id = Some(parent.clone());
    store.create_lecture(&direct, LectureStatus::Published).unwrap();
    let mut nested = lecture_input("The Friday sermon", "fiqh", MORNING.plus_minutes(60));
    nested.subcategory_id = Some(sub.id.clone());
    store.create_lecture(&nested, LectureStatus::Published).unwrap();
    store.create_lecture(&lecture_input("General advice", "fiqh", MORNING), LectureStatus::Published).unwrap();
    store.create_lecture(&lecture_input("Unpublished", "fiqh", MORNING), LectureStatus::Draft).unwrap();

    let tree = store.section_hierarchy("الفقه").unwrap();
    let node = tree.category(&parent).unwrap();
    assert_eq!(node.lectures.len(), 1);
    assert_eq!(node.lectures[0].title, "Conditions of prayer");
    assert_eq!(node.subcategories.len(), 1);
    assert_eq!(node.subcategories[0].lectures[0].title, "The Friday sermon");
    assert_eq!(tree.uncategorized_lectures.len(), 1);
    assert_eq!(tree.lecture_count(), 3);
}

#[test]
fn writes_invalidate_the_cached_tree() {
    let fixture = open_store();
    let store = &fixture.store;
    let first = store.catalog_hierarchy().unwrap();
    let again = store.catalog_hierarchy().unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    let id = category(store, "tafsir", "Al-Fatiha", 0);
    let after_create = store.catalog_hierarchy().unwrap();
    assert!(!Arc::ptr_eq(&first, &after_create));
    assert_eq!(after_create.section(Section::Tafsir).unwrap().categories.len(), 1);

    store.delete_category(&id).unwrap();
    let after_delete = store.catalog_hierarchy().unwrap();
    assert!(after_delete.section(Section::Tafsir).unwrap().categories.is_empty());
}

#[test]
fn external_writes_appear_after_explicit_invalidation() {
    let fixture = open_store();
    let store = &fixture.store;
    assert!(store.catalog_hierarchy().unwrap().section(Section::Seerah).unwrap().categories.is_empty());

    fixture
        .raw()
        .execute_batch(
            "INSERT INTO categories (id, section, name, description, sort_order, is_deleted, \
             created_at, updated_at) VALUES ('external', 'seerah', 'Madinah', NULL, 0, 0, 0, 0);",
        )
        .unwrap();
    assert!(store.catalog_hierarchy().unwrap().section(Section::Seerah).unwrap().categories.is_empty());

    store.invalidate_hierarchy();
    assert_eq!(store.catalog_hierarchy().unwrap().section(Section::Seerah).unwrap().categories.len(), 1);
}

#[test]
fn unknown_section_yields_an_empty_tree() {
    let fixture = open_store();
    let tree = fixture.store.section_hierarchy("astronomy").unwrap();
    assert!(tree.categories.is_empty());
    assert!(tree.uncategorized_lectures.is_empty());
}
