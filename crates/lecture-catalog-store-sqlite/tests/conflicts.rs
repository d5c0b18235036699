// crates/lecture-catalog-store-sqlite/tests/conflicts.rs
// ============================================================================
// Module: Scheduling Conflict Tests
// Description: Exact-match slot detection for sheikh lectures.
// Purpose: Ensure only identical sheikh, category, and start instants clash.
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

use std::thread;

use lecture_catalog_core::CategoryId;
use lecture_catalog_core::LectureInput;
use lecture_catalog_core::LectureStatus;
use lecture_catalog_core::SheikhId;
use lecture_catalog_core::UnixMillis;
use lecture_catalog_store_sqlite::CatalogStore;
use lecture_catalog_store_sqlite::SqliteStoreError;
use support::MORNING;
use support::TestStore;
use support::category;
use support::lecture_input;
use support::open_store;
use support::sheikh;

/// Store with sheikh `12345678` and categories `C1`, `C2` in one section.
struct Scenario {
    fixture: TestStore,
    sheikh: SheikhId,
    c1: CategoryId,
    c2: CategoryId,
}

fn scenario() -> Scenario {
    let fixture = open_store();
    let sheikh = sheikh(&fixture.store, "12345678", "Sheikh Scheduled");
    let c1 = category(&fixture.store, "fiqh", "C1", 0);
    let c2 = category(&fixture.store, "fiqh", "C2", 1);
    Scenario {
        fixture,
        sheikh,
        c1,
        c2,
    }
}

fn slot(sheikh: &SheikhId, category: &CategoryId, start_time: UnixMillis) -> LectureInput {
    let mut input = lecture_input("Scheduled", "fiqh", start_time);
    input.sheikh_id = Some(sheikh.clone());
    input.category_id = Some(category.clone());
    input
}

fn store(scenario: &Scenario) -> &CatalogStore {
    &scenario.fixture.store
}

#[test]
fn same_sheikh_category_and_instant_conflict() {
    let scenario = scenario();
    let store = store(&scenario);
    let start = UnixMillis::parse_rfc3339("2024-01-15T10:00:00Z").unwrap();
    assert_eq!(start, MORNING);
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, start), LectureStatus::Published).unwrap();

    assert!(store.has_schedule_conflict(&scenario.sheikh, &scenario.c1, start, None).unwrap());
    let err = store
        .create_lecture(&slot(&scenario.sheikh, &scenario.c1, start), LectureStatus::Draft)
        .unwrap_err();
    assert_eq!(
        err,
        SqliteStoreError::Conflict {
            sheikh_id: scenario.sheikh.to_string(),
            category_id: scenario.c1.to_string(),
            start_time: start.as_i64(),
        }
    );
}

#[test]
fn other_category_or_instant_does_not_conflict() {
    let scenario = scenario();
    let store = store(&scenario);
    let mut first = slot(&scenario.sheikh, &scenario.c1, MORNING);
    first.end_time = Some(MORNING.plus_minutes(90));
    store.create_lecture(&first, LectureStatus::Published).unwrap();

    assert!(!store.has_schedule_conflict(&scenario.sheikh, &scenario.c2, MORNING, None).unwrap());
    let half_past = MORNING.plus_minutes(30);
    assert!(!store.has_schedule_conflict(&scenario.sheikh, &scenario.c1, half_past, None).unwrap());

    store.create_lecture(&slot(&scenario.sheikh, &scenario.c2, MORNING), LectureStatus::Published).unwrap();
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, half_past), LectureStatus::Published).unwrap();
}

#[test]
fn other_sheikh_does_not_conflict() {
    let scenario = scenario();
    let store = store(&scenario);
    let other = sheikh(store, "87654321", "Sheikh Other");
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, MORNING), LectureStatus::Published).unwrap();
    store.create_lecture(&slot(&other, &scenario.c1, MORNING), LectureStatus::Published).unwrap();
}

#[test]
fn unpublished_lectures_hold_their_slot_until_deleted() {
    let scenario = scenario();
    let store = store(&scenario);
    let draft = store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, MORNING), LectureStatus::Draft).unwrap();
    store.archive_lecture(&draft.id).unwrap();
    assert!(store.has_schedule_conflict(&scenario.sheikh, &scenario.c1, MORNING, None).unwrap());

    store.delete_lecture(&draft.id).unwrap();
    assert!(!store.has_schedule_conflict(&scenario.sheikh, &scenario.c1, MORNING, None).unwrap());
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, MORNING), LectureStatus::Published).unwrap();
}

#[test]
fn update_ignores_the_lecture_itself() {
    let scenario = scenario();
    let store = store(&scenario);
    let lecture = store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, MORNING), LectureStatus::Published).unwrap();
    assert!(!store.has_schedule_conflict(&scenario.sheikh, &scenario.c1, MORNING, Some(&lecture.id)).unwrap());

    let mut retitled = slot(&scenario.sheikh, &scenario.c1, MORNING);
    retitled.title = "Retitled".to_string();
    let updated = store.update_lecture(&lecture.id, &retitled).unwrap();
    assert_eq!(updated.title, "Retitled");

    let later = store
        .create_lecture(&slot(&scenario.sheikh, &scenario.c1, MORNING.plus_minutes(60)), LectureStatus::Published)
        .unwrap();
    let err = store.update_lecture(&later.id, &slot(&scenario.sheikh, &scenario.c1, MORNING)).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Conflict { .. }), "{err:?}");
}

#[test]
fn lectures_without_owner_or_category_never_conflict() {
    let scenario = scenario();
    let store = store(&scenario);
    let mut unowned = slot(&scenario.sheikh, &scenario.c1, MORNING);
    unowned.sheikh_id = None;
    store.create_lecture(&unowned, LectureStatus::Published).unwrap();
    store.create_lecture(&unowned, LectureStatus::Published).unwrap();

    let mut uncategorized = slot(&scenario.sheikh, &scenario.c1, MORNING);
    uncategorized.category_id = None;
    store.create_lecture(&uncategorized, LectureStatus::Published).unwrap();
    store.create_lecture(&uncategorized, LectureStatus::Published).unwrap();
}

#[test]
fn concurrent_creates_admit_one_lecture_per_slot() {
    let scenario = scenario();
    let store = store(&scenario);
    let input = slot(&scenario.sheikh, &scenario.c1, MORNING);

    let results = thread::scope(|scope| {
        let workers: Vec<_> = (0 .. 6)
            .map(|_| scope.spawn(|| store.create_lecture(&input, LectureStatus::Published)))
            .collect();
        workers.into_iter().map(|worker| worker.join().unwrap()).collect::<Vec<_>>()
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|result| result.as_ref().err()).all(|err| matches!(
        err,
        SqliteStoreError::Conflict { .. }
    )));
    assert_eq!(store.list_lectures_by_sheikh(&scenario.sheikh).unwrap().len(), 1);
}

#[test]
fn scheduled_lectures_appear_under_their_categories() {
    let scenario = scenario();
    let store = store(&scenario);
    let ten = UnixMillis::parse_rfc3339("2024-01-15T10:00:00Z").unwrap();
    let ten_oh_one = UnixMillis::parse_rfc3339("2024-01-15T10:01:00Z").unwrap();
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, ten), LectureStatus::Published).unwrap();

    let err = store
        .create_lecture(&slot(&scenario.sheikh, &scenario.c1, ten), LectureStatus::Published)
        .unwrap_err();
    assert!(matches!(err, SqliteStoreError::Conflict { .. }), "{err:?}");
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c1, ten_oh_one), LectureStatus::Published).unwrap();
    store.create_lecture(&slot(&scenario.sheikh, &scenario.c2, ten), LectureStatus::Published).unwrap();

    let tree = store.section_hierarchy("fiqh").unwrap();
    let c1: Vec<_> = tree.category(&scenario.c1).unwrap().lectures.iter().map(|lecture| lecture.start_time).collect();
    let c2: Vec<_> = tree.category(&scenario.c2).unwrap().lectures.iter().map(|lecture| lecture.start_time).collect();
    assert_eq!(c1, vec![ten, ten_oh_one]);
    assert_eq!(c2, vec![ten]);
}
