//! Builders wiring PostgreSQL repositories and outbound adapters into the
//! shared HTTP state.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use mockable::DefaultClock;
use tracing::warn;

use agroai::domain::ports::{
    AdvisoryAssistant, FixtureAdvisoryAssistant, FixturePaymentGateway, PaymentGateway,
};
use agroai::inbound::http::state::{HttpState, HttpStatePorts};
use agroai::outbound::bcrypt_hasher::BcryptPasswordHasher;
use agroai::outbound::completion::{CompletionHttpClient, CompletionSettings};
use agroai::outbound::daraja::{DarajaCredentials, DarajaHttpGateway};
use agroai::outbound::persistence::{
    DieselEquipmentRepository, DieselLivestockLogRepository, DieselLivestockRepository,
    DieselPaymentAttemptRepository, DieselRentalRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Build the live adapter when `settings` are present, otherwise fall back to
/// `fixture` and say so once.
fn adapter_or_fixture<S, A, E>(
    settings: Option<S>,
    build: impl FnOnce(S) -> Result<Arc<A>, E>,
    fixture: Arc<A>,
    adapter: &'static str,
) -> std::io::Result<Arc<A>>
where
    A: ?Sized,
    E: std::fmt::Display,
{
    match settings {
        Some(settings) => build(settings).map_err(|err| {
            std::io::Error::other(format!("failed to build {adapter} client: {err}"))
        }),
        None => {
            warn!(adapter, "credentials not configured; requests will fail as unavailable");
            Ok(fixture)
        }
    }
}

fn build_payment_gateway(
    credentials: Option<DarajaCredentials>,
    timeout: Duration,
) -> std::io::Result<Arc<dyn PaymentGateway>> {
    adapter_or_fixture(
        credentials,
        |credentials| {
            DarajaHttpGateway::new(credentials, timeout)
                .map(|gateway| Arc::new(gateway) as Arc<dyn PaymentGateway>)
        },
        Arc::new(FixturePaymentGateway),
        "payment gateway",
    )
}

fn build_advisory_assistant(
    settings: Option<CompletionSettings>,
    timeout: Duration,
) -> std::io::Result<Arc<dyn AdvisoryAssistant>> {
    adapter_or_fixture(
        settings,
        |settings| {
            CompletionHttpClient::new(settings, timeout)
                .map(|client| Arc::new(client) as Arc<dyn AdvisoryAssistant>)
        },
        Arc::new(FixtureAdvisoryAssistant),
        "completion",
    )
}

/// Build the shared HTTP state from the configured pool and adapters.
///
/// # Errors
/// Returns [`std::io::Error`] when an outbound HTTP client cannot be built.
pub(super) fn build_http_state(config: &mut ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let pool = config.db_pool.clone();
    let gateway = build_payment_gateway(config.daraja.take(), config.outbound_timeout)?;
    let assistant = build_advisory_assistant(config.completion.take(), config.outbound_timeout)?;

    Ok(web::Data::new(HttpState::new(HttpStatePorts {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        hasher: Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
        equipment: Arc::new(DieselEquipmentRepository::new(pool.clone())),
        rentals: Arc::new(DieselRentalRepository::new(pool.clone())),
        livestock: Arc::new(DieselLivestockRepository::new(pool.clone())),
        logs: Arc::new(DieselLivestockLogRepository::new(pool.clone())),
        attempts: Arc::new(DieselPaymentAttemptRepository::new(pool)),
        gateway,
        assistant,
        clock: Arc::new(DefaultClock),
    })))
}
