//! Equipment catalogue handlers.
//!
//! ```text
//! GET  /equipment                           public catalogue
//! GET  /rent-equipment?id=                  one listing
//! GET  /dash/owner/equipment                owner's listings
//! POST /dash/owner/equipment/add            {"name","description","price_per_day","image"?}
//! GET  /dash/owner/equipment/{id}/edit
//! POST /dash/owner/equipment/{id}/edit
//! POST /dash/owner/equipment/{id}/delete
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Equipment, EquipmentDetails, EquipmentId, Error, Money, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{BodyKind, FormOrJson, see_other};
use crate::inbound::http::identity::PageUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    NumberOrText, map_equipment_validation_error, map_price_error, path_id, require_id,
};

const OWNER_EQUIPMENT_PATH: &str = "/dash/owner/equipment";

#[derive(Debug, Deserialize, IntoParams)]
pub struct RentEquipmentQuery {
    /// Listing identifier.
    pub id: Option<String>,
}

/// Listing form used for both creation and edits.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EquipmentForm {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Decimal price with at most two fractional digits.
    #[schema(value_type = Option<String>, example = "1500.00")]
    pub price_per_day: Option<NumberOrText>,
    /// Image reference; storage of the file itself is out of scope.
    pub image: Option<String>,
}

impl EquipmentForm {
    fn into_details(self) -> Result<EquipmentDetails, Error> {
        let price = match &self.price_per_day {
            None => String::new(),
            Some(NumberOrText::Number(value)) => value.to_string(),
            Some(NumberOrText::Text(text)) => text.clone(),
        };
        let price = Money::parse(&price).map_err(map_price_error)?;
        EquipmentDetails::new(
            self.name.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default(),
            price,
            self.image.as_deref(),
        )
        .map_err(map_equipment_validation_error)
    }
}

/// Public catalogue.
#[utoipa::path(
    get,
    path = "/equipment",
    responses(
        (status = 200, description = "All listings", body = [Equipment]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "listEquipment",
    security([])
)]
#[get("/equipment")]
pub async fn list_equipment(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Equipment>>> {
    Ok(web::Json(state.equipment.list_all().await?))
}

/// One listing, as shown on the rental form.
#[utoipa::path(
    get,
    path = "/rent-equipment",
    params(RentEquipmentQuery),
    responses(
        (status = 200, description = "Listing", body = Equipment),
        (status = 400, description = "Missing or malformed id", body = Error),
        (status = 404, description = "Equipment not found", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "getEquipment",
    security([])
)]
#[get("/rent-equipment")]
pub async fn rent_equipment(
    state: web::Data<HttpState>,
    query: web::Query<RentEquipmentQuery>,
) -> ApiResult<web::Json<Equipment>> {
    let id: EquipmentId = require_id("id", query.id.as_deref())?;
    Ok(web::Json(state.equipment.get(&id).await?))
}

/// Listings owned by the signed-in owner.
#[utoipa::path(
    get,
    path = "/dash/owner/equipment",
    responses(
        (status = 200, description = "Owner listings", body = [Equipment]),
        (status = 303, description = "No session; continue at /login"),
        (status = 403, description = "Owner role required", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "listOwnerEquipment"
)]
#[get("/dash/owner/equipment")]
pub async fn list_owned(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Vec<Equipment>>> {
    let owner = user.require(Role::Owner)?;
    Ok(web::Json(state.equipment.list_owned(&owner).await?))
}

/// Publish a new listing.
#[utoipa::path(
    post,
    path = "/dash/owner/equipment/add",
    request_body = EquipmentForm,
    responses(
        (status = 201, description = "Listing created", body = Equipment),
        (status = 303, description = "Form accepted; continue at /dash/owner/equipment"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Owner role required", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "createEquipment"
)]
#[post("/dash/owner/equipment/add")]
pub async fn create_equipment(
    state: web::Data<HttpState>,
    user: PageUser,
    payload: FormOrJson<EquipmentForm>,
) -> ApiResult<HttpResponse> {
    let owner = user.require(Role::Owner)?;
    let FormOrJson { body, kind } = payload;
    let equipment = state.equipment.create(&owner, body.into_details()?).await?;
    Ok(kind.respond(OWNER_EQUIPMENT_PATH, || {
        HttpResponse::Created().json(equipment)
    }))
}

/// Listing prepared for editing.
#[utoipa::path(
    get,
    path = "/dash/owner/equipment/{id}/edit",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 200, description = "Listing", body = Equipment),
        (status = 403, description = "Owner role required", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "editEquipmentForm"
)]
#[get("/dash/owner/equipment/{id}/edit")]
pub async fn edit_form(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Equipment>> {
    let owner = user.require(Role::Owner)?;
    let id: EquipmentId = path_id("id", &path)?;
    Ok(web::Json(state.equipment.get_owned(&owner, &id).await?))
}

/// Save edits to an owned listing.
#[utoipa::path(
    post,
    path = "/dash/owner/equipment/{id}/edit",
    params(("id" = String, Path, description = "Listing identifier")),
    request_body = EquipmentForm,
    responses(
        (status = 200, description = "Listing updated", body = Equipment),
        (status = 303, description = "Form accepted; continue at /dash/owner/equipment"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found or not owned", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "updateEquipment"
)]
#[post("/dash/owner/equipment/{id}/edit")]
pub async fn update_equipment(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
    payload: FormOrJson<EquipmentForm>,
) -> ApiResult<HttpResponse> {
    let owner = user.require(Role::Owner)?;
    let id: EquipmentId = path_id("id", &path)?;
    let FormOrJson { body, kind } = payload;
    state
        .equipment
        .update(&owner, &id, &body.into_details()?)
        .await?;
    let updated = match kind {
        BodyKind::Json => {
            Some(state.equipment.get_owned(&owner, &id).await?)
        }
        BodyKind::Form => None,
    };
    Ok(kind.respond(OWNER_EQUIPMENT_PATH, || HttpResponse::Ok().json(updated)))
}

/// Remove an owned listing that no rental references.
#[utoipa::path(
    post,
    path = "/dash/owner/equipment/{id}/delete",
    params(("id" = String, Path, description = "Listing identifier")),
    responses(
        (status = 303, description = "Deleted; continue at /dash/owner/equipment"),
        (status = 404, description = "Not found or not owned", body = Error),
        (status = 409, description = "Listing has rentals", body = Error)
    ),
    tags = ["equipment"],
    operation_id = "deleteEquipment"
)]
#[post("/dash/owner/equipment/{id}/delete")]
pub async fn delete_equipment(
    state: web::Data<HttpState>,
    user: PageUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = user.require(Role::Owner)?;
    let id: EquipmentId = path_id("id", &path)?;
    state.equipment.delete(&owner, &id).await?;
    Ok(see_other(OWNER_EQUIPMENT_PATH))
}
