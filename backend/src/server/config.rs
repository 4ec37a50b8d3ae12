//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Key, SameSite};
use agroai::inbound::http::session_config::SessionSettings;
use agroai::outbound::bcrypt_hasher::DEFAULT_BCRYPT_COST;
use agroai::outbound::completion::CompletionSettings;
use agroai::outbound::daraja::DarajaCredentials;
use agroai::outbound::persistence::DbPool;

const DEFAULT_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) session_ttl: CookieDuration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) daraja: Option<DarajaCredentials>,
    pub(crate) completion: Option<CompletionSettings>,
    pub(crate) outbound_timeout: Duration,
    pub(crate) bcrypt_cost: u32,
}

impl ServerConfig {
    /// Construct a server configuration from session settings and a pool.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
            ttl,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            session_ttl: ttl,
            bind_addr,
            db_pool,
            daraja: None,
            completion: None,
            outbound_timeout: DEFAULT_OUTBOUND_TIMEOUT,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Use the live payment gateway instead of the failing fixture.
    #[must_use]
    pub fn with_daraja(mut self, credentials: Option<DarajaCredentials>) -> Self {
        self.daraja = credentials;
        self
    }

    /// Use the live completion API instead of the failing fixture.
    #[must_use]
    pub fn with_completion(mut self, settings: Option<CompletionSettings>) -> Self {
        self.completion = settings;
        self
    }

    /// Timeout applied to gateway and completion requests.
    #[must_use]
    pub fn with_outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
