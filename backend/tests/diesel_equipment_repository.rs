//! Integration tests for `DieselEquipmentRepository`.
//!
//! Edits and deletes only match listings of the calling owner, and an edit
//! without an image clears the stored one.

use agroai::domain::ports::EquipmentRepository;
use agroai::domain::{Equipment, EquipmentDetails, EquipmentId, Money, Role, User};
use agroai::outbound::persistence::DieselEquipmentRepository;
use rstest::{fixture, rstest};

#[allow(dead_code)]
#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::{TestDatabase, test_database};

struct TestContext {
    db: TestDatabase,
    listings: DieselEquipmentRepository,
    owner: User,
    rival: User,
    tractor: Equipment,
}

fn setup_context(db: TestDatabase) -> TestContext {
    let owner = db.seed_user("olive", Role::Owner);
    let rival = db.seed_user("oscar", Role::Owner);
    let tractor = Equipment {
        id: EquipmentId::random(),
        owner_id: *owner.id(),
        name: "Tractor".to_owned(),
        description: "Four-wheel drive".to_owned(),
        price_per_day: Money::parse("1000").expect("fixture price"),
        image: Some("tractor.jpg".to_owned()),
    };
    let listings = DieselEquipmentRepository::new(db.pool.clone());
    db.runtime
        .block_on(listings.insert(&tractor))
        .expect("equipment stored");
    TestContext {
        db,
        listings,
        owner,
        rival,
        tractor,
    }
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    test_database().map(setup_context)
}

fn stored(ctx: &TestContext) -> Option<Equipment> {
    ctx.db
        .runtime
        .block_on(ctx.listings.find(&ctx.tractor.id))
        .expect("find succeeds")
}

fn repainted() -> EquipmentDetails {
    EquipmentDetails::new(
        "Red tractor",
        "Freshly serviced",
        Money::parse("1250.50").expect("price"),
        None,
    )
    .expect("valid details")
}

#[rstest]
fn owner_edit_replaces_fields_and_clears_the_image(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: owner_edit_replaces_fields_and_clears_the_image skipped");
        return;
    };

    let matched = ctx
        .db
        .runtime
        .block_on(ctx.listings.update(ctx.owner.id(), &ctx.tractor.id, &repainted()))
        .expect("update runs");

    assert!(matched);
    let listing = stored(&ctx).expect("listing exists");
    assert_eq!(listing.name, "Red tractor");
    assert_eq!(listing.price_per_day, Money::parse("1250.50").expect("price"));
    assert_eq!(listing.image, None);
}

#[rstest]
fn other_owners_cannot_edit_or_delete(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: other_owners_cannot_edit_or_delete skipped");
        return;
    };

    let (updated, deleted) = ctx.db.runtime.block_on(async {
        (
            ctx.listings
                .update(ctx.rival.id(), &ctx.tractor.id, &repainted())
                .await
                .expect("update runs"),
            ctx.listings
                .delete(ctx.rival.id(), &ctx.tractor.id)
                .await
                .expect("delete runs"),
        )
    });

    assert!(!updated);
    assert!(!deleted);
    assert_eq!(stored(&ctx), Some(ctx.tractor.clone()));
}
