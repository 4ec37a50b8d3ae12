//! Tests for the rental workflow service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::MockRentalRepository;
use crate::domain::service_test_helpers::{farmer, fixture_clock, fixture_now, owner};
use crate::domain::{
    EquipmentId, ErrorCode, MoneyError, RentalContact, RentalPeriod, RentalQuote, UserId,
};

fn request() -> RentalRequest {
    RentalRequest {
        equipment_id: EquipmentId::random(),
        farmer_id: *farmer().id(),
        period: RentalPeriod::parse("2024-01-01", "2024-01-04").expect("period"),
        contact: RentalContact::default(),
    }
}

fn rental(owner_id: UserId, status: RentalStatus, cents: i64) -> Rental {
    let period = RentalPeriod::parse("2024-01-01", "2024-01-04").expect("period");
    Rental {
        id: RentalId::random(),
        equipment_id: EquipmentId::random(),
        farmer_id: UserId::random(),
        owner_id,
        start_date: period.start(),
        end_date: period.end(),
        quote: RentalQuote {
            duration_days: period.duration_days(),
            total_cost: Money::from_cents(cents).expect("amount"),
        },
        status,
        contact: RentalContact::default(),
        created_at: fixture_now(),
    }
}

fn summary(rental: Rental) -> RentalSummary {
    RentalSummary {
        rental,
        equipment_name: "Tractor".to_owned(),
        farmer_username: "alice".to_owned(),
    }
}

fn service(repo: MockRentalRepository) -> RentalService {
    RentalService::new(Arc::new(repo), fixture_clock())
}

#[rstest]
#[tokio::test]
async fn create_returns_priced_rental() {
    let stored = rental(UserId::random(), RentalStatus::Pending, 300_000);
    let expected = stored.clone();
    let mut repo = MockRentalRepository::new();
    repo.expect_create()
        .withf(|_, _, created_at| *created_at == fixture_now())
        .return_once(move |_, _, _| Ok(RentalCreation::Created(stored)));

    let created = service(repo).create(&request()).await.expect("created");
    assert_eq!(created, expected);
    assert_eq!(created.quote.total_cost.to_string(), "3000.00");
}

#[rstest]
#[case::missing(RentalCreation::EquipmentMissing, ErrorCode::NotFound)]
#[case::overflow(RentalCreation::Rejected(MoneyError::Overflow), ErrorCode::InvalidRequest)]
#[tokio::test]
async fn create_reports_refusals(#[case] creation: RentalCreation, #[case] expected: ErrorCode) {
    let mut repo = MockRentalRepository::new();
    repo.expect_create().return_once(move |_, _, _| Ok(creation));

    let err = service(repo).create(&request()).await.expect_err("refused");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn decide_returns_updated_rental() {
    let owner = owner();
    let approved = rental(*owner.id(), RentalStatus::Approved, 100);
    let id = approved.id;
    let mut repo = MockRentalRepository::new();
    repo.expect_decide()
        .withf(|_, _, decision| *decision == RentalDecision::Approve)
        .return_once(move |_, _, _| Ok(Some(approved)));
    repo.expect_find().times(0);

    let rental = service(repo)
        .decide(&owner, &id, RentalDecision::Approve)
        .await
        .expect("approved");
    assert_eq!(rental.status, RentalStatus::Approved);
}

#[rstest]
#[case::approve_after_reject(RentalStatus::Rejected, RentalDecision::Approve, "rental already rejected")]
#[case::reject_after_approve(RentalStatus::Approved, RentalDecision::Reject, "rental already approved")]
#[tokio::test]
async fn decide_on_terminal_rental_conflicts(
    #[case] current: RentalStatus,
    #[case] decision: RentalDecision,
    #[case] message: &str,
) {
    let owner = owner();
    let existing = rental(*owner.id(), current, 100);
    let id = existing.id;
    let mut repo = MockRentalRepository::new();
    repo.expect_decide().return_once(|_, _, _| Ok(None));
    repo.expect_find().return_once(move |_| Ok(Some(existing)));

    let err = service(repo)
        .decide(&owner, &id, decision)
        .await
        .expect_err("terminal rental");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), message);
}

#[rstest]
#[case::absent(None)]
#[case::foreign(Some(UserId::random()))]
#[tokio::test]
async fn decide_hides_absent_or_foreign_rental(#[case] stored_owner: Option<UserId>) {
    let mut repo = MockRentalRepository::new();
    repo.expect_decide().return_once(|_, _, _| Ok(None));
    repo.expect_find().return_once(move |_| {
        Ok(stored_owner.map(|owner_id| rental(owner_id, RentalStatus::Pending, 100)))
    });

    let err = service(repo)
        .decide(&owner(), &RentalId::random(), RentalDecision::Reject)
        .await
        .expect_err("not visible");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn earnings_sum_approved_rentals_only() {
    let owner = owner();
    let owner_id = *owner.id();
    let mut repo = MockRentalRepository::new();
    repo.expect_list_for_owner().return_once(move |_| {
        Ok(vec![
            summary(rental(owner_id, RentalStatus::Approved, 300_000)),
            summary(rental(owner_id, RentalStatus::Pending, 50_000)),
            summary(rental(owner_id, RentalStatus::Approved, 1_050)),
            summary(rental(owner_id, RentalStatus::Rejected, 70_000)),
        ])
    });

    let earnings = service(repo).earnings(&owner).await.expect("earnings");
    assert_eq!(earnings.total.to_string(), "3010.50");
    assert_eq!(earnings.approved_rentals, 2);
}

#[rstest]
#[tokio::test]
async fn listing_maps_connection_failures() {
    let mut repo = MockRentalRepository::new();
    repo.expect_list_for_farmer()
        .return_once(|_| Err(RentalRepositoryError::connection("refused")));

    let err = service(repo)
        .list_for_farmer(&farmer())
        .await
        .expect_err("offline");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
