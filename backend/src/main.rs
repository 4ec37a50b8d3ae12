//! Portal entry-point: loads settings, applies migrations and serves HTTP.

mod server;

use std::ffi::OsString;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use agroai::inbound::http::health::HealthState;
use agroai::inbound::http::session_config::{BuildMode, session_settings_from_env};
use agroai::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use agroai::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let database_url = settings.database_url()?;

    let applied = run_pending_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    info!(applied, "database migrations complete");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_size()))
        .await
        .wrap_err("failed to build database pool")?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let bind_addr = settings.bind_addr()?;
    let config = ServerConfig::new(session, bind_addr, pool)
        .with_daraja(settings.daraja_credentials()?)
        .with_completion(settings.completion_settings()?)
        .with_outbound_timeout(settings.http_timeout())
        .with_bcrypt_cost(settings.bcrypt_cost());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)
        .wrap_err_with(|| format!("failed to start server on {bind_addr}"))?;
    info!(%bind_addr, "listening");
    server.await.wrap_err("server terminated unexpectedly")
}
