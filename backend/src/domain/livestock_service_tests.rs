//! Tests for the livestock service.

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockLivestockLogRepository, MockLivestockRepository};
use crate::domain::service_test_helpers::{farmer, fixture_clock, fixture_now};
use crate::domain::ErrorCode;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[fixture]
fn user() -> User {
    farmer()
}

fn animal(user: &User) -> Livestock {
    let details = LivestockDetails::new("Daisy", "cow", "Rift", "Friesian", "2022-01-01")
        .expect("details");
    Livestock::from_details(LivestockId::random(), *user.id(), details)
}

fn log_for(livestock_id: LivestockId, log_date: NaiveDate) -> LivestockLog {
    LivestockLog {
        id: LogId::random(),
        livestock_id,
        entry: LogEntry::new(log_date, Some("hay"), Some(12.0), None).expect("entry"),
    }
}

fn service(livestock: MockLivestockRepository, logs: MockLivestockLogRepository) -> LivestockService {
    LivestockService::new(Arc::new(livestock), Arc::new(logs), fixture_clock())
}

fn owning(animal: Livestock) -> MockLivestockRepository {
    let mut livestock = MockLivestockRepository::new();
    livestock
        .expect_find_owned()
        .return_once(move |_, _| Ok(Some(animal)));
    livestock
}

fn not_owning() -> MockLivestockRepository {
    let mut livestock = MockLivestockRepository::new();
    livestock.expect_find_owned().return_once(|_, _| Ok(None));
    livestock
}

#[rstest]
#[tokio::test]
async fn list_with_logs_groups_logs_per_animal(user: User) {
    let first = animal(&user);
    let second = animal(&user);
    let (first_id, second_id) = (first.id, second.id);
    let mut livestock = MockLivestockRepository::new();
    livestock
        .expect_list_for_user()
        .return_once(move |_| Ok(vec![first, second]));
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_list_for_livestock()
        .withf(move |ids| ids == [first_id, second_id])
        .return_once(move |_| {
            Ok(vec![
                log_for(first_id, date(2024, 1, 10)),
                log_for(first_id, date(2024, 1, 5)),
            ])
        });

    let listed = service(livestock, logs)
        .list_with_logs(&user)
        .await
        .expect("listed");

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].livestock.id, first_id);
    let dates: Vec<_> = listed[0].logs.iter().map(|log| log.entry.log_date).collect();
    assert_eq!(dates, vec![date(2024, 1, 10), date(2024, 1, 5)]);
    assert_eq!(listed[1].livestock.id, second_id);
    assert!(listed[1].logs.is_empty());
}

#[rstest]
#[tokio::test]
async fn list_with_logs_skips_log_query_without_animals(user: User) {
    let mut livestock = MockLivestockRepository::new();
    livestock.expect_list_for_user().return_once(|_| Ok(Vec::new()));
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_list_for_livestock().times(0);

    let listed = service(livestock, logs)
        .list_with_logs(&user)
        .await
        .expect("listed");
    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn add_log_requires_ownership(user: User) {
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_insert().times(0);

    let entry = LogEntry::new(date(2024, 1, 1), None, None, None).expect("entry");
    let err = service(not_owning(), logs)
        .add_log(&user, &LivestockId::random(), entry)
        .await
        .expect_err("not owned");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), LIVESTOCK_NOT_FOUND_MESSAGE);
}

#[rstest]
#[tokio::test]
async fn list_logs_for_owned_animal_without_logs_is_empty(user: User) {
    let owned = animal(&user);
    let id = owned.id;
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_list()
        .withf(|_, range| range.is_none())
        .return_once(|_, _| Ok(Vec::new()));

    let listed = service(owning(owned), logs)
        .list_logs(&user, &id)
        .await
        .expect("listed");
    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn filter_logs_passes_inclusive_range(user: User) {
    let owned = animal(&user);
    let id = owned.id;
    let range = LogDateRange::new(date(2024, 1, 1), date(2024, 1, 31)).expect("range");
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_list()
        .withf(move |_, requested| *requested == Some(range))
        .return_once(move |_, _| Ok(vec![log_for(id, date(2024, 1, 31))]));

    let listed = service(owning(owned), logs)
        .filter_logs(&user, &id, range)
        .await
        .expect("filtered");
    assert_eq!(listed.len(), 1);
}

#[rstest]
#[tokio::test]
async fn quick_log_is_dated_today(user: User) {
    let owned = animal(&user);
    let id = owned.id;
    let today = fixture_now().date_naive();
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_insert()
        .withf(move |log| log.entry.log_date == today && log.entry.feed.as_deref() == Some("hay"))
        .return_once(|_| Ok(()));

    let fields = QuickLog {
        feed: Some("hay"),
        production: Some(8.5),
        symptoms: None,
    };
    let log = service(owning(owned), logs)
        .quick_log(&user, &id, fields)
        .await
        .expect("logged");
    assert_eq!(log.livestock_id, id);
}

#[rstest]
#[tokio::test]
async fn quick_log_rejects_negative_production(user: User) {
    let fields = QuickLog {
        production: Some(-1.0),
        ..QuickLog::default()
    };
    let err = service(MockLivestockRepository::new(), MockLivestockLogRepository::new())
        .quick_log(&user, &LivestockId::random(), fields)
        .await
        .expect_err("invalid production");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case::update(true)]
#[case::delete(false)]
#[tokio::test]
async fn unmatched_log_mutations_are_not_found(user: User, #[case] update: bool) {
    let mut logs = MockLivestockLogRepository::new();
    logs.expect_update().returning(|_, _, _| Ok(false));
    logs.expect_delete().returning(|_, _| Ok(false));
    let service = service(MockLivestockRepository::new(), logs);

    let entry = LogEntry::new(date(2024, 1, 1), None, None, None).expect("entry");
    let result = if update {
        service.update_log(&user, &LogId::random(), &entry).await
    } else {
        service.delete_log(&user, &LogId::random()).await
    };
    let err = result.expect_err("no rows");
    assert_eq!(err.message(), LOG_NOT_FOUND_MESSAGE);
}
