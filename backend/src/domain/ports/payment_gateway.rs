//! Driven port for the mobile-money STK push gateway.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::{ChargeAcknowledgement, ChargeRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The OAuth exchange failed or returned a non-2xx status.
        Auth { message: String } => "payment gateway authentication failed: {message}",
        /// The STK push failed or returned a non-2xx status.
        Request { message: String } => "payment gateway request failed: {message}",
        /// No gateway credentials are configured.
        Unavailable { message: String } => "payment gateway unavailable: {message}",
    }
}

/// Short-lived bearer token issued by the gateway.
#[derive(Clone)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Exchange the configured client credentials for a bearer token.
    async fn authenticate(&self) -> Result<AccessToken, PaymentGatewayError>;

    /// Send an STK push for `request`, timestamped at `now`.
    async fn initiate_charge(
        &self,
        token: &AccessToken,
        request: &ChargeRequest,
        now: DateTime<Utc>,
    ) -> Result<ChargeAcknowledgement, PaymentGatewayError>;
}

/// Stand-in used when no gateway credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn authenticate(&self) -> Result<AccessToken, PaymentGatewayError> {
        Err(PaymentGatewayError::unavailable(
            "gateway credentials are not configured",
        ))
    }

    async fn initiate_charge(
        &self,
        _token: &AccessToken,
        _request: &ChargeRequest,
        _now: DateTime<Utc>,
    ) -> Result<ChargeAcknowledgement, PaymentGatewayError> {
        Err(PaymentGatewayError::unavailable(
            "gateway credentials are not configured",
        ))
    }
}
