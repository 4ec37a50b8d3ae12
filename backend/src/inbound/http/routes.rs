//! Route table for the portal.

use actix_web::web;

use super::{accounts, advisory, equipment, health, livestock, rentals, subscription};

/// Register every portal endpoint on `cfg`.
///
/// Callers supply `web::Data<HttpState>`, `web::Data<HealthState>` and the
/// session middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::ready)
        .service(health::live)
        .service(accounts::home)
        .service(accounts::register)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::dashboard)
        .service(accounts::admin_landing)
        .service(accounts::owner_landing)
        .service(accounts::farmer_profile)
        .service(equipment::list_equipment)
        .service(equipment::rent_equipment)
        .service(equipment::list_owned)
        .service(equipment::create_equipment)
        .service(equipment::edit_form)
        .service(equipment::update_equipment)
        .service(equipment::delete_equipment)
        .service(rentals::request_rental)
        .service(rentals::list_requests)
        .service(rentals::approve)
        .service(rentals::reject)
        .service(rentals::earnings)
        .service(livestock::list_livestock)
        .service(livestock::add_livestock)
        .service(livestock::livestock_logs)
        .service(livestock::monitor)
        .service(livestock::add_log)
        .service(livestock::filter_logs)
        .service(livestock::list_logs)
        .service(livestock::update_log)
        .service(livestock::delete_log)
        .service(subscription::subscribe)
        .service(subscription::payment_callback)
        .service(subscription::payment_completed)
        .service(subscription::upgrade)
        .service(subscription::status)
        .service(subscription::attempt)
        .service(advisory::diagnose)
        .service(advisory::predict_yield);
}
