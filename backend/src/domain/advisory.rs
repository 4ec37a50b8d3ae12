//! Agricultural advisory: crop/livestock diagnosis and yield prediction.
//!
//! The domain decides which questions reach the completion API and how its
//! free-text replies are shaped into responses.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use super::user::compiled;

/// Answer returned for questions unrelated to agriculture.
pub const OFF_TOPIC_ANSWER: &str = "I'm here to answer agriculture-related questions only. \
Please ask about crops, pests, livestock, soil, or weather.";
/// Answer returned when the completion API replies with nothing.
pub const NO_ANSWER_MESSAGE: &str = "No answer received from AI.";
/// Yield estimate used when the completion API replies with nothing.
pub const NO_PREDICTION_MESSAGE: &str = "No prediction received.";
/// Message returned when a yield prediction field is missing.
pub const YIELD_FIELDS_REQUIRED_MESSAGE: &str = "All fields are required.";

pub const DIAGNOSIS_SYSTEM_PROMPT: &str =
    "You are an expert agriculture assistant. ONLY answer agriculture-related questions.";
pub const YIELD_SYSTEM_PROMPT: &str = "You are an expert in agricultural yield predictions.";

const AGRICULTURE_KEYWORDS: &[&str] = &[
    "crop",
    "pest",
    "fertilizer",
    "soil",
    "livestock",
    "plant",
    "disease",
    "weather",
    "farming",
    "agriculture",
    "harvest",
    "yield",
    "pesticide",
    "drought",
    "cow",
    "goat",
    "sheep",
    "chicken",
    "animal",
    "veterinary",
    "calf",
    "pasture",
    "maize",
    "beans",
    "potatoes",
    "grass",
    "napier",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisoryValidationError {
    #[error("Missing question or query.")]
    MissingQuestion,
    #[error("All fields are required.")]
    MissingField { field: &'static str },
}

/// Non-empty question submitted for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn new(raw: &str) -> Result<Self, AdvisoryValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AdvisoryValidationError::MissingQuestion);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match against the agriculture vocabulary.
    #[must_use]
    pub fn is_agricultural(&self) -> bool {
        let lowered = self.0.to_lowercase();
        AGRICULTURE_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
    }
}

/// System and user messages sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    pub system: &'static str,
    pub user: String,
}

impl CompletionPrompt {
    #[must_use]
    pub fn diagnosis(question: &Question) -> Self {
        Self {
            system: DIAGNOSIS_SYSTEM_PROMPT,
            user: question.as_str().to_owned(),
        }
    }
}

/// Diagnosis reply returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Diagnosis {
    pub answer: String,
}

impl Diagnosis {
    /// Blank replies become [`NO_ANSWER_MESSAGE`].
    #[must_use]
    pub fn from_reply(reply: Option<String>) -> Self {
        let answer = reply
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| NO_ANSWER_MESSAGE.to_owned());
        Self { answer }
    }

    #[must_use]
    pub fn off_topic() -> Self {
        Self {
            answer: OFF_TOPIC_ANSWER.to_owned(),
        }
    }
}

/// Planting details submitted for a yield prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YieldPredictionRequest {
    crop: String,
    plant_month: String,
    plant_year: String,
    land_size: String,
    harvest_month: String,
    harvest_year: String,
}

/// Raw yield prediction form, field by field.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldPredictionParts<'a> {
    pub crop: Option<&'a str>,
    pub plant_month: Option<&'a str>,
    pub plant_year: Option<&'a str>,
    pub land_size: Option<&'a str>,
    pub harvest_month: Option<&'a str>,
    pub harvest_year: Option<&'a str>,
}

fn required(field: &'static str, raw: Option<&str>) -> Result<String, AdvisoryValidationError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(AdvisoryValidationError::MissingField { field })
}

impl YieldPredictionRequest {
    pub fn try_from_parts(parts: YieldPredictionParts<'_>) -> Result<Self, AdvisoryValidationError> {
        Ok(Self {
            crop: required("crop", parts.crop)?,
            plant_month: required("plantMonth", parts.plant_month)?,
            plant_year: required("plantYear", parts.plant_year)?,
            land_size: required("landSize", parts.land_size)?,
            harvest_month: required("harvestMonth", parts.harvest_month)?,
            harvest_year: required("harvestYear", parts.harvest_year)?,
        })
    }

    pub fn crop(&self) -> &str {
        &self.crop
    }

    #[must_use]
    pub fn prompt(&self) -> CompletionPrompt {
        let user = format!(
            "Predict the expected crop yield and give 3 recommendations using the following details:\n\
             - Crop: {}\n\
             - Land Size: {} hectares\n\
             - Planting Date: {} {}\n\
             - Harvest Date: {} {}\n\
             Respond in format: Yield: ... Recommendations: 1. ... 2. ... 3. ...",
            self.crop,
            self.land_size,
            self.plant_month,
            self.plant_year,
            self.harvest_month,
            self.harvest_year,
        );
        CompletionPrompt {
            system: YIELD_SYSTEM_PROMPT,
            user,
        }
    }
}

static NUMBERED_ITEM_RE: OnceLock<Regex> = OnceLock::new();

fn numbered_item_marker() -> &'static Regex {
    compiled(&NUMBERED_ITEM_RE, r"\d+\.\s+")
}

/// Yield estimate and recommendations parsed from a completion reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct YieldPrediction {
    #[serde(rename = "yield")]
    pub yield_estimate: String,
    pub recommendations: Vec<String>,
}

impl YieldPrediction {
    /// Split a `Yield: ... Recommendations: 1. ... 2. ...` reply.
    ///
    /// # Examples
    /// ```
    /// use agroai::domain::YieldPrediction;
    ///
    /// let parsed = YieldPrediction::from_reply(Some(
    ///     "Yield: 20 bags Recommendations: 1. Weed early 2. Top dress".to_owned(),
    /// ));
    /// assert_eq!(parsed.yield_estimate, "20 bags");
    /// assert_eq!(parsed.recommendations, vec!["Weed early", "Top dress"]);
    /// ```
    #[must_use]
    pub fn from_reply(reply: Option<String>) -> Self {
        let reply = reply
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| NO_PREDICTION_MESSAGE.to_owned());
        let (estimate, recommendations) = match reply.split_once("Recommendations:") {
            Some((estimate, rest)) => (estimate, Some(rest)),
            None => (reply.as_str(), None),
        };
        let yield_estimate = estimate.replacen("Yield:", "", 1).trim().to_owned();
        let recommendations = recommendations
            .map(|rest| {
                numbered_item_marker()
                    .split(rest)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            yield_estimate,
            recommendations,
        }
    }
}
