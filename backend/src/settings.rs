//! Application settings loaded via OrthoConfig.
//!
//! Values come from `AGROAI_*` environment variables, an optional
//! configuration file and command-line flags. Only the database URL is
//! mandatory; gateway and AI credentials are optional and their adapters
//! fall back to failing fixtures when absent.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::outbound::bcrypt_hasher::DEFAULT_BCRYPT_COST;
use crate::outbound::completion::{
    CompletionSettings, DEFAULT_COMPLETION_ENDPOINT, DEFAULT_COMPLETION_MODEL,
};
use crate::outbound::daraja::DarajaCredentials;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DARAJA_OAUTH_URL: &str =
    "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials";
const DEFAULT_DARAJA_STK_URL: &str =
    "https://sandbox.safaricom.co.ke/mpesa/stkpush/v1/processrequest";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("AGROAI_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid URL for {setting} '{value}': {source}")]
    Url {
        setting: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{setting} is required once AGROAI_DARAJA_CONSUMER_KEY is set")]
    IncompleteDaraja { setting: &'static str },
}

/// Runtime settings for the portal server.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "AGROAI")]
pub struct AppSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Listener address, `0.0.0.0:3000` by default.
    pub bind_addr: Option<String>,
    /// Maximum pooled database connections.
    pub pool_size: Option<u32>,
    /// Timeout applied to gateway and AI requests, in seconds.
    pub http_timeout_secs: Option<u64>,
    pub bcrypt_cost: Option<u32>,
    pub daraja_consumer_key: Option<String>,
    pub daraja_consumer_secret: Option<String>,
    pub daraja_shortcode: Option<String>,
    pub daraja_passkey: Option<String>,
    pub daraja_oauth_url: Option<String>,
    pub daraja_stk_url: Option<String>,
    /// Public URL the gateway posts STK results to.
    pub daraja_callback_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_endpoint: Option<String>,
    pub ai_model: Option<String>,
}

fn parse_url(setting: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|source| SettingsError::Url {
        setting,
        value: value.to_owned(),
        source,
    })
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl AppSettings {
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        non_empty(self.database_url.as_ref()).ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = non_empty(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE).max(1)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST)
    }

    /// Gateway credentials, or `None` when no consumer key is configured.
    ///
    /// Once a consumer key is present the remaining secrets become
    /// mandatory, so a half-configured gateway fails at startup.
    pub fn daraja_credentials(&self) -> Result<Option<DarajaCredentials>, SettingsError> {
        let Some(consumer_key) = non_empty(self.daraja_consumer_key.as_ref()) else {
            return Ok(None);
        };
        let require = |value: &Option<String>, setting: &'static str| {
            non_empty(value.as_ref())
                .map(str::to_owned)
                .ok_or(SettingsError::IncompleteDaraja { setting })
        };
        let consumer_secret = require(&self.daraja_consumer_secret, "AGROAI_DARAJA_CONSUMER_SECRET")?;
        let shortcode = require(&self.daraja_shortcode, "AGROAI_DARAJA_SHORTCODE")?;
        let passkey = require(&self.daraja_passkey, "AGROAI_DARAJA_PASSKEY")?;
        let callback = require(&self.daraja_callback_url, "AGROAI_DARAJA_CALLBACK_URL")?;
        let oauth = non_empty(self.daraja_oauth_url.as_ref()).unwrap_or(DEFAULT_DARAJA_OAUTH_URL);
        let stk = non_empty(self.daraja_stk_url.as_ref()).unwrap_or(DEFAULT_DARAJA_STK_URL);

        Ok(Some(DarajaCredentials {
            consumer_key: Zeroizing::new(consumer_key.to_owned()),
            consumer_secret: Zeroizing::new(consumer_secret),
            shortcode,
            passkey: Zeroizing::new(passkey),
            oauth_url: parse_url("AGROAI_DARAJA_OAUTH_URL", oauth)?,
            stk_url: parse_url("AGROAI_DARAJA_STK_URL", stk)?,
            callback_url: parse_url("AGROAI_DARAJA_CALLBACK_URL", &callback)?,
        }))
    }

    /// Completion API settings, or `None` when no API key is configured.
    pub fn completion_settings(&self) -> Result<Option<CompletionSettings>, SettingsError> {
        let Some(api_key) = non_empty(self.ai_api_key.as_ref()) else {
            return Ok(None);
        };
        let endpoint = non_empty(self.ai_endpoint.as_ref()).unwrap_or(DEFAULT_COMPLETION_ENDPOINT);
        Ok(Some(CompletionSettings {
            api_key: Zeroizing::new(api_key.to_owned()),
            endpoint: parse_url("AGROAI_AI_ENDPOINT", endpoint)?,
            model: non_empty(self.ai_model.as_ref())
                .unwrap_or(DEFAULT_COMPLETION_MODEL)
                .to_owned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "AGROAI_DATABASE_URL",
        "AGROAI_BIND_ADDR",
        "AGROAI_POOL_SIZE",
        "AGROAI_DARAJA_CONSUMER_KEY",
        "AGROAI_AI_API_KEY",
        "AGROAI_AI_MODEL",
    ];

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("agroai")]).expect("settings load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();

        assert!(matches!(
            settings.database_url(),
            Err(SettingsError::MissingDatabaseUrl)
        ));
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:3000".parse::<SocketAddr>().expect("literal")
        );
        assert_eq!(settings.pool_size(), DEFAULT_POOL_SIZE);
        assert!(settings.daraja_credentials().expect("no gateway").is_none());
        assert!(settings.completion_settings().expect("no assistant").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("AGROAI_DATABASE_URL", Some("postgres://db/agroai".to_owned())),
            ("AGROAI_BIND_ADDR", Some("127.0.0.1:8080".to_owned())),
            ("AGROAI_POOL_SIZE", Some("4".to_owned())),
            ("AGROAI_DARAJA_CONSUMER_KEY", None),
            ("AGROAI_AI_API_KEY", Some("sk-test".to_owned())),
            ("AGROAI_AI_MODEL", None),
        ]);

        let settings = load();

        assert_eq!(settings.database_url().expect("url"), "postgres://db/agroai");
        assert_eq!(settings.bind_addr().expect("addr").port(), 8080);
        assert_eq!(settings.pool_size(), 4);
        let completion = settings
            .completion_settings()
            .expect("valid completion settings")
            .expect("api key set");
        assert_eq!(completion.model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(completion.endpoint.as_str(), DEFAULT_COMPLETION_ENDPOINT);
    }

    #[rstest]
    fn half_configured_gateway_is_rejected() {
        let settings = AppSettings {
            daraja_consumer_key: Some("key".to_owned()),
            daraja_consumer_secret: Some("secret".to_owned()),
            ..AppSettings::default()
        };

        let error = settings
            .daraja_credentials()
            .err()
            .expect("missing shortcode is reported");

        assert!(matches!(
            error,
            SettingsError::IncompleteDaraja {
                setting: "AGROAI_DARAJA_SHORTCODE"
            }
        ));
    }

    #[rstest]
    fn complete_gateway_uses_sandbox_defaults() {
        let settings = AppSettings {
            daraja_consumer_key: Some("key".to_owned()),
            daraja_consumer_secret: Some("secret".to_owned()),
            daraja_shortcode: Some("174379".to_owned()),
            daraja_passkey: Some("passkey".to_owned()),
            daraja_callback_url: Some("https://portal.example/subscription/callback".to_owned()),
            ..AppSettings::default()
        };

        let credentials = settings
            .daraja_credentials()
            .expect("valid gateway")
            .expect("gateway configured");

        assert_eq!(credentials.shortcode, "174379");
        assert_eq!(credentials.stk_url.as_str(), DEFAULT_DARAJA_STK_URL);
    }
}
