//! Port for persisted payment attempts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AttemptResolution, CallbackOutcome, NewPaymentAttempt, PaymentAttempt};

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment attempt repository adapters.
    pub enum PaymentAttemptRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payment attempt repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payment attempt repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentAttemptRepository: Send + Sync {
    /// Store a freshly requested attempt.
    async fn insert(
        &self,
        attempt: &NewPaymentAttempt,
    ) -> Result<PaymentAttempt, PaymentAttemptRepositoryError>;

    /// Move the attempt referenced by `outcome` out of `requested` and, when
    /// it was paid for by a known user, extend that user's premium window
    /// from the later of `resolved_at` and the current expiry.
    ///
    /// Both writes commit together or not at all: on error the attempt is
    /// still `requested`, so a redelivered callback can apply it. Returns
    /// `None` when the reference is unknown or already resolved.
    async fn resolve_and_extend(
        &self,
        outcome: &CallbackOutcome,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<AttemptResolution>, PaymentAttemptRepositoryError>;

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentAttempt>, PaymentAttemptRepositoryError>;
}
