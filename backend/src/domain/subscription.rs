//! Subscription standing derived from a user's plan window.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{PlanType, Subscription};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Number of calendar days covered by `delta`, rounded up.
///
/// Any positive remainder, however small, counts as a whole day.
pub(crate) fn ceil_days(delta: TimeDelta) -> i64 {
    let millis = delta.num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) > 0)
}

/// Whether a user may currently use subscription-gated features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    TrialActive,
    PremiumActive,
    Expired,
}

impl Standing {
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Expired)
    }
}

impl Subscription {
    /// Standing at `now`: trial with a future `trial_end`, or premium with a
    /// future `expiry_date`, is active; everything else is expired.
    #[must_use]
    pub fn standing(&self, now: DateTime<Utc>) -> Standing {
        match (self.plan_type, self.trial_end, self.expiry_date) {
            (PlanType::Trial, Some(end), _) if end > now => Standing::TrialActive,
            (PlanType::Premium, _, Some(expiry)) if expiry > now => Standing::PremiumActive,
            _ => Standing::Expired,
        }
    }

    /// Days left in the trial, rounded up and never negative.
    ///
    /// `None` when no trial end is recorded.
    #[must_use]
    pub fn remaining_trial_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.trial_end.map(|end| ceil_days(end - now).max(0))
    }

    /// Days left in the premium window, rounded up and never negative.
    #[must_use]
    pub fn remaining_premium_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry_date.map(|expiry| ceil_days(expiry - now).max(0))
    }

    /// Extend the premium window by `days`, starting from the later of `now`
    /// and the current expiry so unused time is never lost.
    #[must_use]
    pub fn extended_premium(&self, now: DateTime<Utc>, days: i64) -> Self {
        let start = self.expiry_date.filter(|expiry| *expiry > now).unwrap_or(now);
        Self {
            plan_type: PlanType::Premium,
            trial_end: self.trial_end,
            expiry_date: Some(start + TimeDelta::days(days)),
        }
    }
}
