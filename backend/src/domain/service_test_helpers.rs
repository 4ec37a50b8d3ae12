//! Shared fixtures for domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    EmailAddress, PlanType, Role, Subscription, User, UserDraft, UserId, Username,
};

pub(crate) fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    clock_at(fixture_now())
}

pub(crate) fn clock_at(utc_now: DateTime<Utc>) -> Arc<dyn Clock> {
    Arc::new(FixtureClock { utc_now })
}

pub(crate) fn user_with(role: Role, subscription: Subscription) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        username: Username::new("alice").expect("valid username"),
        email: EmailAddress::new("alice@example.com").expect("valid email"),
        phone: None,
        role,
        subscription,
    })
}

pub(crate) fn farmer() -> User {
    user_with(Role::Farmer, Subscription::default())
}

pub(crate) fn owner() -> User {
    user_with(Role::Owner, Subscription::default())
}

pub(crate) fn trial_until(trial_end: DateTime<Utc>) -> Subscription {
    Subscription {
        plan_type: PlanType::Trial,
        trial_end: Some(trial_end),
        expiry_date: None,
    }
}
