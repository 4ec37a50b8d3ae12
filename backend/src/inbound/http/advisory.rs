//! AI advisory endpoints, available while the caller's plan window is open.

use actix_web::{post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Diagnosis, Error, Question, YieldPrediction, YieldPredictionParts, YieldPredictionRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::FormOrJson;
use crate::inbound::http::identity::SubscribedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{NumberOrText, map_advisory_validation_error};

#[derive(Debug, Deserialize, ToSchema)]
pub struct DiagnosisRequest {
    pub question: Option<String>,
    /// Accepted in place of `question`.
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YieldForm {
    pub crop: Option<String>,
    pub plant_month: Option<String>,
    #[schema(value_type = Option<String>, example = "2024")]
    pub plant_year: Option<NumberOrText>,
    /// Hectares.
    #[schema(value_type = Option<String>, example = "2.5")]
    pub land_size: Option<NumberOrText>,
    pub harvest_month: Option<String>,
    #[schema(value_type = Option<String>, example = "2024")]
    pub harvest_year: Option<NumberOrText>,
}

fn as_text(value: Option<&NumberOrText>) -> Option<String> {
    value.map(|value| match value {
        NumberOrText::Number(number) => number.to_string(),
        NumberOrText::Text(text) => text.clone(),
    })
}

/// Answer an agriculture question.
#[utoipa::path(
    post,
    path = "/diagnosis",
    request_body = DiagnosisRequest,
    responses(
        (status = 200, description = "Answer", body = Diagnosis),
        (status = 400, description = "Missing question", body = Error),
        (status = 303, description = "Login required or plan lapsed"),
        (status = 500, description = "Assistant unavailable", body = Error)
    ),
    tags = ["advisory"],
    operation_id = "diagnose"
)]
#[post("/diagnosis")]
pub async fn diagnose(
    state: web::Data<HttpState>,
    _user: SubscribedUser,
    payload: FormOrJson<DiagnosisRequest>,
) -> ApiResult<web::Json<Diagnosis>> {
    let DiagnosisRequest { question, query } = payload.body;
    let raw = question.or(query).unwrap_or_default();
    let question = Question::new(&raw).map_err(map_advisory_validation_error)?;
    Ok(web::Json(state.advisory.diagnose(&question).await?))
}

/// Estimate a harvest and suggest improvements.
#[utoipa::path(
    post,
    path = "/predict-yield",
    request_body = YieldForm,
    responses(
        (status = 200, description = "Prediction", body = YieldPrediction),
        (status = 400, description = "All fields are required.", body = Error),
        (status = 303, description = "Login required or plan lapsed"),
        (status = 500, description = "Assistant unavailable", body = Error)
    ),
    tags = ["advisory"],
    operation_id = "predictYield"
)]
#[post("/predict-yield")]
pub async fn predict_yield(
    state: web::Data<HttpState>,
    _user: SubscribedUser,
    payload: FormOrJson<YieldForm>,
) -> ApiResult<web::Json<YieldPrediction>> {
    let form = payload.body;
    let plant_year = as_text(form.plant_year.as_ref());
    let land_size = as_text(form.land_size.as_ref());
    let harvest_year = as_text(form.harvest_year.as_ref());
    let request = YieldPredictionRequest::try_from_parts(YieldPredictionParts {
        crop: form.crop.as_deref(),
        plant_month: form.plant_month.as_deref(),
        plant_year: plant_year.as_deref(),
        land_size: land_size.as_deref(),
        harvest_month: form.harvest_month.as_deref(),
        harvest_year: harvest_year.as_deref(),
    })
    .map_err(map_advisory_validation_error)?;
    Ok(web::Json(state.advisory.predict_yield(&request).await?))
}
