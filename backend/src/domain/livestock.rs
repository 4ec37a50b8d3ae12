//! Livestock records and their health/production log entries.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::{LivestockId, LogId, UserId};

/// Message used whenever a livestock registration field is missing.
pub const ALL_FIELDS_REQUIRED_MESSAGE: &str = "All fields are required.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LivestockValidationError {
    #[error("All fields are required.")]
    MissingField { field: &'static str },
    #[error("{field} must be a YYYY-MM-DD date")]
    InvalidDate { field: &'static str },
    #[error("production must be a non-negative number")]
    InvalidProduction,
    #[error("start date must not be after end date")]
    InvertedRange,
}

pub(crate) fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, LivestockValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| LivestockValidationError::InvalidDate { field })
}

fn required(field: &'static str, raw: &str) -> Result<String, LivestockValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LivestockValidationError::MissingField { field });
    }
    Ok(value.to_owned())
}

/// Validated registration of an animal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivestockDetails {
    pub name: String,
    pub livestock_type: String,
    pub region: String,
    pub breed: String,
    pub dob: NaiveDate,
}

impl LivestockDetails {
    /// Every field is mandatory; `dob` must be `YYYY-MM-DD`.
    pub fn new(
        name: &str,
        livestock_type: &str,
        region: &str,
        breed: &str,
        dob: &str,
    ) -> Result<Self, LivestockValidationError> {
        Ok(Self {
            name: required("name", name)?,
            livestock_type: required("livestock_type", livestock_type)?,
            region: required("region", region)?,
            breed: required("breed", breed)?,
            dob: parse_date("dob", &required("dob", dob)?)?,
        })
    }
}

/// Animal owned by a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Livestock {
    pub id: LivestockId,
    pub user_id: UserId,
    pub name: String,
    pub livestock_type: String,
    pub region: String,
    pub breed: String,
    pub dob: NaiveDate,
}

impl Livestock {
    #[must_use]
    pub fn from_details(id: LivestockId, user_id: UserId, details: LivestockDetails) -> Self {
        let LivestockDetails {
            name,
            livestock_type,
            region,
            breed,
            dob,
        } = details;
        Self {
            id,
            user_id,
            name,
            livestock_type,
            region,
            breed,
            dob,
        }
    }
}

/// Observed values recorded in a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub log_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl LogEntry {
    /// Validate entry fields. Blank free-text fields are stored as absent.
    pub fn new(
        log_date: NaiveDate,
        feed: Option<&str>,
        production: Option<f64>,
        symptoms: Option<&str>,
    ) -> Result<Self, LivestockValidationError> {
        if production.is_some_and(|value| !value.is_finite() || value.is_sign_negative()) {
            return Err(LivestockValidationError::InvalidProduction);
        }
        Ok(Self {
            log_date,
            feed: optional_text(feed),
            production,
            symptoms: optional_text(symptoms),
        })
    }
}

/// Persisted log entry.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivestockLog {
    pub id: LogId,
    pub livestock_id: LivestockId,
    #[serde(flatten)]
    pub entry: LogEntry,
}

/// Animal together with its log history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LivestockWithLogs {
    #[serde(flatten)]
    pub livestock: Livestock,
    pub logs: Vec<LivestockLog>,
}

/// Inclusive date range used to filter log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl LogDateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, LivestockValidationError> {
        if start > end {
            return Err(LivestockValidationError::InvertedRange);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
