//! Rental workflow handlers.
//!
//! ```text
//! POST /rental-form                         farmer books equipment
//! GET  /dash/owner/requests                 rentals of the owner's equipment
//! POST /dash/owner/requests/{id}/approve
//! POST /dash/owner/requests/{id}/reject
//! GET  /dash/owner/earnings
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Earnings, EquipmentId, Error, Money, RentalContact, RentalDecision, RentalId, RentalPeriod,
    RentalRequest, RentalStatus, RentalSummary, Role,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{FormOrJson, see_other};
use crate::inbound::http::identity::{CurrentUser, PageUser};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_rental_period_error, path_id, require_id};

const OWNER_REQUESTS_PATH: &str = "/dash/owner/requests";

/// Booking form submitted from the rent-equipment page.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RentalForm {
    pub equipment_id: Option<String>,
    /// `YYYY-MM-DD`, RFC 3339 or `YYYY-MM-DDTHH:MM`.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub rental_purpose: Option<String>,
}

/// Stored rental with its price.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalCreated {
    pub rental_id: RentalId,
    pub duration_days: i64,
    pub total_cost: Money,
    pub status: RentalStatus,
}

/// Book equipment for a period.
#[utoipa::path(
    post,
    path = "/rental-form",
    request_body = RentalForm,
    responses(
        (status = 201, description = "Rental requested", body = RentalCreated),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Farmer role required", body = Error),
        (status = 404, description = "Equipment not found", body = Error)
    ),
    tags = ["rentals"],
    operation_id = "requestRental"
)]
#[post("/rental-form")]
pub async fn request_rental(
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: FormOrJson<RentalForm>,
) -> ApiResult<HttpResponse> {
    let farmer = user.require(Role::Farmer)?;
    let form = payload.body;
    let equipment_id: EquipmentId = require_id("equipment_id", form.equipment_id.as_deref())?;
    // A missing listing is reported before any date problem.
    state.equipment.get(&equipment_id).await?;
    let period = RentalPeriod::parse(
        form.start_date.as_deref().unwrap_or_default(),
        form.end_date.as_deref().unwrap_or_default(),
    )
    .map_err(map_rental_period_error)?;
    let request = RentalRequest {
        equipment_id,
        farmer_id: *farmer.id(),
        period,
        contact: RentalContact {
            customer_email: form.customer_email.unwrap_or_default(),
            customer_address: form.customer_address.unwrap_or_default(),
            rental_purpose: form.rental_purpose.unwrap_or_default(),
        },
    };
    let rental = state.rentals.create(&request).await?;
    Ok(HttpResponse::Created().json(RentalCreated {
        rental_id: rental.id,
        duration_days: rental.quote.duration_days,
        total_cost: rental.quote.total_cost,
        status: rental.status,
    }))
}

/// Rental requests for the owner's equipment, newest first.
#[utoipa::path(
    get,
    path = "/dash/owner/requests",
    responses(
        (status = 200, description = "Rental requests", body = [RentalSummary]),
        (status = 303, description = "No session; continue at /login"),
        (status = 403, description = "Owner role required", body = Error)
    ),
    tags = ["rentals"],
    operation_id = "listRentalRequests"
)]
#[get("/dash/owner/requests")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Vec<RentalSummary>>> {
    let owner = user.require(Role::Owner)?;
    Ok(web::Json(state.rentals.list_for_owner(&owner).await?))
}

async fn decide(
    state: &HttpState,
    user: PageUser,
    raw_id: &str,
    decision: RentalDecision,
) -> ApiResult<HttpResponse> {
    let owner = user.require(Role::Owner)?;
    let id: RentalId = path_id("id", raw_id)?;
    state.rentals.decide(&owner, &id, decision).await?;
    Ok(see_other(OWNER_REQUESTS_PATH))
}

/// Approve a pending rental.
#[utoipa::path(
    post,
    path = "/dash/owner/requests/{id}/approve",
    params(("id" = String, Path, description = "Rental identifier")),
    responses(
        (status = 303, description = "Approved; continue at /dash/owner/requests"),
        (status = 403, description = "Owner role required", body = Error),
        (status = 404, description = "Rental not found", body = Error),
        (status = 409, description = "Rental already decided", body = Error)
    ),
    tags = ["rentals"],
    operation_id = "approveRental"
)]
#[post("/dash/owner/requests/{id}/approve")]
pub async fn approve(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    decide(&state, user, &path, RentalDecision::Approve).await
}

/// Reject a pending rental.
#[utoipa::path(
    post,
    path = "/dash/owner/requests/{id}/reject",
    params(("id" = String, Path, description = "Rental identifier")),
    responses(
        (status = 303, description = "Rejected; continue at /dash/owner/requests"),
        (status = 403, description = "Owner role required", body = Error),
        (status = 404, description = "Rental not found", body = Error),
        (status = 409, description = "Rental already decided", body = Error)
    ),
    tags = ["rentals"],
    operation_id = "rejectRental"
)]
#[post("/dash/owner/requests/{id}/reject")]
pub async fn reject(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    decide(&state, user, &path, RentalDecision::Reject).await
}

/// Sum of approved rentals of the owner's equipment.
#[utoipa::path(
    get,
    path = "/dash/owner/earnings",
    responses(
        (status = 200, description = "Earnings", body = Earnings),
        (status = 403, description = "Owner role required", body = Error)
    ),
    tags = ["rentals"],
    operation_id = "ownerEarnings"
)]
#[get("/dash/owner/earnings")]
pub async fn earnings(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Earnings>> {
    let owner = user.require(Role::Owner)?;
    Ok(web::Json(state.rentals.earnings(&owner).await?))
}
