//! Subscription payments and plan status.
//!
//! ```text
//! POST /subscription/subscribe           {"phone","plan"} -> STK push
//! POST /subscription/callback            gateway webhook, always 200
//! GET  /subscription/callback            landing page after payment
//! GET  /subscription/upgrade             available plans
//! GET  /subscription/status              caller's standing
//! GET  /subscription/attempts/{ref}      stored attempt
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::domain::{
    CallbackDisposition, ChargeAcknowledgement, ChargeRequest, Error, PaymentAttempt, PlanOffer,
    SubscriptionStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::FormOrJson;
use crate::inbound::http::identity::CurrentUser;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::map_payment_validation_error;

/// Reply the gateway expects for every webhook delivery.
pub const CALLBACK_ACK: &str = "Received";
pub const PAYMENT_COMPLETED_MESSAGE: &str = "Payment completed. Thank you!";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    /// Subscriber phone, `07XXXXXXXX` or `2547XXXXXXXX`.
    pub phone: Option<String>,
    /// `monthly` or `yearly`.
    pub plan: Option<String>,
}

/// Push a payment prompt to the subscriber's phone.
///
/// A signed-in caller is recorded on the attempt so the callback can extend
/// their premium window.
#[utoipa::path(
    post,
    path = "/subscription/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Gateway acknowledgement", body = ChargeAcknowledgement),
        (status = 400, description = "Missing fields, unknown plan or bad phone", body = Error),
        (status = 500, description = "Failed to initiate payment", body = Error)
    ),
    tags = ["subscription"],
    operation_id = "subscribe",
    security([])
)]
#[post("/subscription/subscribe")]
pub async fn subscribe(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: FormOrJson<SubscribeRequest>,
) -> ApiResult<web::Json<ChargeAcknowledgement>> {
    let body = payload.body;
    let request = ChargeRequest::try_from_parts(body.phone.as_deref(), body.plan.as_deref())
        .map_err(map_payment_validation_error)?;
    let user_id = session.user_id()?;
    Ok(web::Json(state.payments.subscribe(user_id, request).await?))
}

/// Gateway webhook. Every delivery is acknowledged, whatever it contains.
#[utoipa::path(
    post,
    path = "/subscription/callback",
    request_body(content = Object, description = "STK callback envelope"),
    responses((status = 200, description = "Delivery received", body = String)),
    tags = ["subscription"],
    operation_id = "paymentCallback",
    security([])
)]
#[post("/subscription/callback")]
pub async fn payment_callback(state: web::Data<HttpState>, body: web::Bytes) -> HttpResponse {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, bytes = body.len(), "payment callback is not JSON");
            return HttpResponse::Ok().body(CALLBACK_ACK);
        }
    };
    info!(payload = %payload, "payment callback received");
    match state.payments.handle_callback(&payload).await {
        Ok(CallbackDisposition::Resolved {
            attempt: resolved,
            premium_until,
        }) => {
            info!(
                checkout_request_id = %resolved.checkout_request_id,
                state = %resolved.state,
                premium_until = ?premium_until,
                "payment callback applied"
            );
        }
        Ok(CallbackDisposition::Ignored { .. } | CallbackDisposition::Unrecognised) => {}
        // The attempt is still `requested`; a redelivery can apply it.
        Err(err) => error!(error = %err, "payment callback could not be applied"),
    }
    HttpResponse::Ok().body(CALLBACK_ACK)
}

/// Page the subscriber returns to after paying.
#[utoipa::path(
    get,
    path = "/subscription/callback",
    responses((status = 200, description = "Thank-you message", body = String)),
    tags = ["subscription"],
    operation_id = "paymentCompleted",
    security([])
)]
#[get("/subscription/callback")]
pub async fn payment_completed() -> HttpResponse {
    HttpResponse::Ok().body(PAYMENT_COMPLETED_MESSAGE)
}

#[utoipa::path(
    get,
    path = "/subscription/upgrade",
    responses((status = 200, description = "Available plans", body = [PlanOffer])),
    tags = ["subscription"],
    operation_id = "listPlans",
    security([])
)]
#[get("/subscription/upgrade")]
pub async fn upgrade(state: web::Data<HttpState>) -> web::Json<Vec<PlanOffer>> {
    web::Json(state.payments.plans())
}

#[utoipa::path(
    get,
    path = "/subscription/status",
    responses(
        (status = 200, description = "Plan standing", body = SubscriptionStatus),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["subscription"],
    operation_id = "subscriptionStatus"
)]
#[get("/subscription/status")]
pub async fn status(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> web::Json<SubscriptionStatus> {
    web::Json(state.payments.status(&user.into_inner()))
}

/// Stored attempt, looked up by the gateway's checkout request id.
#[utoipa::path(
    get,
    path = "/subscription/attempts/{reference}",
    params(("reference" = String, Path, description = "CheckoutRequestID")),
    responses(
        (status = 200, description = "Payment attempt", body = PaymentAttempt),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Unknown or not the caller's", body = Error)
    ),
    tags = ["subscription"],
    operation_id = "paymentAttempt"
)]
#[get("/subscription/attempts/{reference}")]
pub async fn attempt(
    state: web::Data<HttpState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<PaymentAttempt>> {
    let user = user.into_inner();
    Ok(web::Json(
        state.payments.attempt_status(&user, &path).await?,
    ))
}
