//! Livestock records and health logs.
//!
//! Page routes answer form posts with redirects; the `/logs` routes are the
//! JSON surface used by the monitoring screens.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, Livestock, LivestockDetails, LivestockId, LivestockLog, LivestockWithLogs, LogDateRange,
    LogEntry, LogId, QuickLog,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{FormOrJson, see_other};
use crate::inbound::http::identity::{CurrentUser, PageUser};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    NumberOrText, map_livestock_validation_error, optional_number, path_id, require_id,
    required_date,
};

const LIVESTOCK_PATH: &str = "/livestock";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LivestockForm {
    pub name: Option<String>,
    #[serde(rename = "type", alias = "livestock_type")]
    pub livestock_type: Option<String>,
    pub region: Option<String>,
    pub breed: Option<String>,
    /// Date of birth, `YYYY-MM-DD`.
    pub dob: Option<String>,
}

impl LivestockForm {
    fn into_details(self) -> Result<LivestockDetails, Error> {
        LivestockDetails::new(
            self.name.as_deref().unwrap_or_default(),
            self.livestock_type.as_deref().unwrap_or_default(),
            self.region.as_deref().unwrap_or_default(),
            self.breed.as_deref().unwrap_or_default(),
            self.dob.as_deref().unwrap_or_default(),
        )
        .map_err(map_livestock_validation_error)
    }
}

/// Quick observation recorded from the monitor form, dated today.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MonitorForm {
    pub livestock_id: Option<String>,
    pub feed: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub production: Option<NumberOrText>,
    pub symptoms: Option<String>,
}

/// Log entry body; `livestock_id` is only read when adding.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LogForm {
    pub livestock_id: Option<String>,
    /// `YYYY-MM-DD`.
    pub log_date: Option<String>,
    pub feed: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub production: Option<NumberOrText>,
    pub symptoms: Option<String>,
}

impl LogForm {
    fn entry(&self) -> Result<LogEntry, Error> {
        let log_date = required_date("log_date", self.log_date.as_deref())?;
        let production = optional_number("production", self.production.as_ref())?;
        LogEntry::new(
            log_date,
            self.feed.as_deref(),
            production,
            self.symptoms.as_deref(),
        )
        .map_err(map_livestock_validation_error)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

impl LogFilter {
    fn range(&self) -> Result<LogDateRange, Error> {
        let start = required_date("startDate", self.start_date.as_deref())?;
        let end = required_date("endDate", self.end_date.as_deref())?;
        LogDateRange::new(start, end).map_err(map_livestock_validation_error)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogCreated {
    pub message: &'static str,
    pub log_id: LogId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogMessage {
    pub message: &'static str,
}

/// The caller's animals with their logs.
#[utoipa::path(
    get,
    path = "/livestock",
    responses(
        (status = 200, description = "Livestock with logs", body = [LivestockWithLogs]),
        (status = 303, description = "No session; continue at /login")
    ),
    tags = ["livestock"],
    operation_id = "listLivestock"
)]
#[get("/livestock")]
pub async fn list_livestock(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Vec<LivestockWithLogs>>> {
    let user = user.into_inner();
    Ok(web::Json(state.livestock.list_with_logs(&user).await?))
}

/// Register an animal.
#[utoipa::path(
    post,
    path = "/livestock/add",
    request_body = LivestockForm,
    responses(
        (status = 303, description = "Registered; continue at /livestock"),
        (status = 400, description = "Missing field or malformed date", body = Error)
    ),
    tags = ["livestock"],
    operation_id = "addLivestock"
)]
#[post("/livestock/add")]
pub async fn add_livestock(
    state: web::Data<HttpState>,
    user: PageUser,
    payload: FormOrJson<LivestockForm>,
) -> ApiResult<HttpResponse> {
    let user = user.into_inner();
    let FormOrJson { body, kind } = payload;
    let animal: Livestock = state.livestock.register(&user, body.into_details()?).await?;
    Ok(kind.respond(LIVESTOCK_PATH, || HttpResponse::Created().json(animal)))
}

/// One animal with its full log history.
#[utoipa::path(
    get,
    path = "/livestock/logs/{id}",
    params(("id" = String, Path, description = "Livestock identifier")),
    responses(
        (status = 200, description = "Livestock with logs", body = LivestockWithLogs),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["livestock"],
    operation_id = "getLivestock"
)]
#[get("/livestock/logs/{id}")]
pub async fn livestock_logs(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<LivestockWithLogs>> {
    let user = user.into_inner();
    let id: LivestockId = path_id("id", &path)?;
    Ok(web::Json(state.livestock.get_with_logs(&user, &id).await?))
}

/// Record today's observation.
#[utoipa::path(
    post,
    path = "/monitor",
    request_body = MonitorForm,
    responses(
        (status = 303, description = "Logged; continue at /livestock"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["livestock"],
    operation_id = "monitorLivestock"
)]
#[post("/monitor")]
pub async fn monitor(
    state: web::Data<HttpState>,
    user: PageUser,
    payload: FormOrJson<MonitorForm>,
) -> ApiResult<HttpResponse> {
    let user = user.into_inner();
    let form = payload.body;
    let livestock_id: LivestockId = require_id("livestock_id", form.livestock_id.as_deref())?;
    let production = optional_number("production", form.production.as_ref())?;
    let fields = QuickLog {
        feed: form.feed.as_deref(),
        production,
        symptoms: form.symptoms.as_deref(),
    };
    state
        .livestock
        .quick_log(&user, &livestock_id, fields)
        .await?;
    Ok(see_other(LIVESTOCK_PATH))
}

/// Add a dated log entry.
#[utoipa::path(
    post,
    path = "/logs",
    request_body = LogForm,
    responses(
        (status = 201, description = "Log added", body = LogCreated),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["logs"],
    operation_id = "addLog"
)]
#[post("/logs")]
pub async fn add_log(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: FormOrJson<LogForm>,
) -> ApiResult<HttpResponse> {
    let user = user.into_inner();
    let form = payload.body;
    let livestock_id: LivestockId = require_id("livestock_id", form.livestock_id.as_deref())?;
    let log = state
        .livestock
        .add_log(&user, &livestock_id, form.entry()?)
        .await?;
    Ok(HttpResponse::Created().json(LogCreated {
        message: "Log added successfully",
        log_id: log.id,
    }))
}

/// Logs of one animal, newest first.
#[utoipa::path(
    get,
    path = "/logs/{livestock_id}",
    params(("livestock_id" = String, Path, description = "Livestock identifier")),
    responses(
        (status = 200, description = "Logs", body = [LivestockLog]),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["logs"],
    operation_id = "listLogs"
)]
#[get("/logs/{livestock_id}")]
pub async fn list_logs(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<LivestockLog>>> {
    let user = user.into_inner();
    let id: LivestockId = path_id("livestock_id", &path)?;
    Ok(web::Json(state.livestock.list_logs(&user, &id).await?))
}

/// Logs dated within an inclusive range.
#[utoipa::path(
    post,
    path = "/logs/filter/{livestock_id}",
    params(("livestock_id" = String, Path, description = "Livestock identifier")),
    request_body = LogFilter,
    responses(
        (status = 200, description = "Logs in range", body = [LivestockLog]),
        (status = 400, description = "Missing, malformed or inverted dates", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["logs"],
    operation_id = "filterLogs"
)]
#[post("/logs/filter/{livestock_id}")]
pub async fn filter_logs(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
    payload: FormOrJson<LogFilter>,
) -> ApiResult<web::Json<Vec<LivestockLog>>> {
    let user = user.into_inner();
    let id: LivestockId = path_id("livestock_id", &path)?;
    let range = payload.body.range()?;
    Ok(web::Json(
        state.livestock.filter_logs(&user, &id, range).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/logs/{log_id}",
    params(("log_id" = String, Path, description = "Log identifier")),
    request_body = LogForm,
    responses(
        (status = 200, description = "Log updated", body = LogMessage),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["logs"],
    operation_id = "updateLog"
)]
#[put("/logs/{log_id}")]
pub async fn update_log(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
    payload: FormOrJson<LogForm>,
) -> ApiResult<web::Json<LogMessage>> {
    let user = user.into_inner();
    let id: LogId = path_id("log_id", &path)?;
    let entry = payload.body.entry()?;
    state.livestock.update_log(&user, &id, &entry).await?;
    Ok(web::Json(LogMessage {
        message: "Log updated successfully",
    }))
}

#[utoipa::path(
    delete,
    path = "/logs/{log_id}",
    params(("log_id" = String, Path, description = "Log identifier")),
    responses(
        (status = 200, description = "Log deleted", body = LogMessage),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["logs"],
    operation_id = "deleteLog"
)]
#[delete("/logs/{log_id}")]
pub async fn delete_log(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<LogMessage>> {
    let user = user.into_inner();
    let id: LogId = path_id("log_id", &path)?;
    state.livestock.delete_log(&user, &id).await?;
    Ok(web::Json(LogMessage {
        message: "Log deleted successfully",
    }))
}
