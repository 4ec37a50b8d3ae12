//! OpenAPI document for the portal.
//!
//! Schemas referenced by request and response bodies are collected from the
//! handler annotations; the list below only names the ones that should be
//! present even when no path mentions them directly. Swagger UI serves the
//! document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Error, ErrorCode, PaymentState, PlanType, RentalStatus, Role, Standing, Subscription, User,
};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;

/// Session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by POST /login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "AgroAI portal API",
        description = "Equipment rentals, livestock monitoring, subscriptions and AI advisory for farmers."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::dashboard,
        crate::inbound::http::accounts::admin_landing,
        crate::inbound::http::accounts::owner_landing,
        crate::inbound::http::accounts::farmer_profile,
        crate::inbound::http::equipment::list_equipment,
        crate::inbound::http::equipment::rent_equipment,
        crate::inbound::http::equipment::list_owned,
        crate::inbound::http::equipment::create_equipment,
        crate::inbound::http::equipment::edit_form,
        crate::inbound::http::equipment::update_equipment,
        crate::inbound::http::equipment::delete_equipment,
        crate::inbound::http::rentals::request_rental,
        crate::inbound::http::rentals::list_requests,
        crate::inbound::http::rentals::approve,
        crate::inbound::http::rentals::reject,
        crate::inbound::http::rentals::earnings,
        crate::inbound::http::livestock::list_livestock,
        crate::inbound::http::livestock::add_livestock,
        crate::inbound::http::livestock::livestock_logs,
        crate::inbound::http::livestock::monitor,
        crate::inbound::http::livestock::add_log,
        crate::inbound::http::livestock::list_logs,
        crate::inbound::http::livestock::filter_logs,
        crate::inbound::http::livestock::update_log,
        crate::inbound::http::livestock::delete_log,
        crate::inbound::http::subscription::subscribe,
        crate::inbound::http::subscription::payment_callback,
        crate::inbound::http::subscription::payment_completed,
        crate::inbound::http::subscription::upgrade,
        crate::inbound::http::subscription::status,
        crate::inbound::http::subscription::attempt,
        crate::inbound::http::advisory::diagnose,
        crate::inbound::http::advisory::predict_yield,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        PlanType,
        Subscription,
        Standing,
        RentalStatus,
        PaymentState,
    )),
    tags(
        (name = "health", description = "Liveness and readiness checks"),
        (name = "accounts", description = "Registration, login and dashboards"),
        (name = "equipment", description = "Equipment catalogue and owner listings"),
        (name = "rentals", description = "Rental requests and owner decisions"),
        (name = "livestock", description = "Livestock records"),
        (name = "logs", description = "Livestock health and production logs"),
        (name = "subscription", description = "Plans, payments and standing"),
        (name = "advisory", description = "Subscription-gated AI advice")
    )
)]
pub struct ApiDoc;
