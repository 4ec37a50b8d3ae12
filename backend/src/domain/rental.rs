//! Rental requests: booking period, pricing and the approval state machine.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::subscription::ceil_days;
use super::{EquipmentId, Money, MoneyError, RentalId, UserId};

/// Message returned when either rental date cannot be parsed.
pub const UNPARSEABLE_DATES_MESSAGE: &str =
    "Invalid rental dates: start_date and end_date must be valid dates.";
/// Message returned when the end date precedes the start date.
pub const END_BEFORE_START_MESSAGE: &str = "Invalid rental dates: End must be after Start.";
/// Message returned when the rental spans no time at all.
pub const NON_POSITIVE_DURATION_MESSAGE: &str = "Rental duration must be at least 1 day.";

/// Reasons a requested rental period is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalPeriodError {
    /// The named field could not be parsed as a date or timestamp.
    Unparseable { field: &'static str, value: String },
    /// The end precedes the start.
    EndBeforeStart,
    /// The end equals the start, so no day is booked.
    NonPositiveDuration,
}

impl fmt::Display for RentalPeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable { .. } => f.write_str(UNPARSEABLE_DATES_MESSAGE),
            Self::EndBeforeStart => f.write_str(END_BEFORE_START_MESSAGE),
            Self::NonPositiveDuration => f.write_str(NON_POSITIVE_DURATION_MESSAGE),
        }
    }
}

impl std::error::Error for RentalPeriodError {}

fn parse_instant(field: &'static str, raw: &str) -> Result<DateTime<Utc>, RentalPeriodError> {
    let value = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    // `datetime-local` form inputs omit seconds and the offset.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| RentalPeriodError::Unparseable {
            field,
            value: raw.to_owned(),
        })
}

/// Validated booking window with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RentalPeriod {
    /// Parse `YYYY-MM-DD` (midnight UTC), RFC 3339, or `YYYY-MM-DDTHH:MM`.
    ///
    /// # Examples
    /// ```
    /// use agroai::domain::RentalPeriod;
    ///
    /// let period = RentalPeriod::parse("2024-01-01", "2024-01-04").unwrap();
    /// assert_eq!(period.duration_days(), 3);
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Self, RentalPeriodError> {
        let start = parse_instant("start_date", start)?;
        let end = parse_instant("end_date", end)?;
        Self::new(start, end)
    }

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RentalPeriodError> {
        if end < start {
            return Err(RentalPeriodError::EndBeforeStart);
        }
        if ceil_days(end - start) <= 0 {
            return Err(RentalPeriodError::NonPositiveDuration);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Booked days, with any partial day charged as a whole one. Always >= 1.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        ceil_days(self.end - self.start)
    }
}

/// Price computed for a rental at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalQuote {
    pub duration_days: i64,
    pub total_cost: Money,
}

impl RentalQuote {
    /// `total_cost = price_per_day * duration_days`.
    pub fn for_period(price_per_day: Money, period: &RentalPeriod) -> Result<Self, MoneyError> {
        let duration_days = period.duration_days();
        Ok(Self {
            duration_days,
            total_cost: price_per_day.checked_times(duration_days)?,
        })
    }
}

/// Contact details captured with a rental request. Stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalContact {
    pub customer_email: String,
    pub customer_address: String,
    pub rental_purpose: String,
}

/// Approval state of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Owner decision on a pending rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalDecision {
    Approve,
    Reject,
}

impl RentalDecision {
    /// Status reached by applying the decision to a pending rental.
    #[must_use]
    pub const fn target(self) -> RentalStatus {
        match self {
            Self::Approve => RentalStatus::Approved,
            Self::Reject => RentalStatus::Rejected,
        }
    }
}

/// Attempted transition out of a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rental already {current}")]
pub struct RentalTransitionError {
    pub current: RentalStatus,
}

impl RentalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Only `pending` may move, and only once.
    pub fn apply(self, decision: RentalDecision) -> Result<Self, RentalTransitionError> {
        match self {
            Self::Pending => Ok(decision.target()),
            current => Err(RentalTransitionError { current }),
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RentalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown rental status: {other}")),
        }
    }
}

/// Persisted rental request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: RentalId,
    pub equipment_id: EquipmentId,
    pub farmer_id: UserId,
    pub owner_id: UserId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(flatten)]
    pub quote: RentalQuote,
    pub status: RentalStatus,
    #[serde(flatten)]
    pub contact: RentalContact,
    pub created_at: DateTime<Utc>,
}

/// Rental joined with display names for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalSummary {
    #[serde(flatten)]
    pub rental: Rental,
    pub equipment_name: String,
    pub farmer_username: String,
}

/// Farmer-supplied rental request after date validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalRequest {
    pub equipment_id: EquipmentId,
    pub farmer_id: UserId,
    pub period: RentalPeriod,
    pub contact: RentalContact,
}
