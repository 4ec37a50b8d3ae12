//! Subscription payments: STK push initiation, webhook handling and
//! premium activation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::domain::ports::{
    PaymentAttemptRepository, PaymentAttemptRepositoryError, PaymentGateway, PaymentGatewayError,
};
use crate::domain::{
    AttemptResolution, CallbackOutcome, ChargeAcknowledgement, ChargeRequest, Error, Money,
    NewPaymentAttempt, PAYMENT_INITIATION_FAILED_MESSAGE, PaymentAttempt, PaymentAttemptId,
    PaymentPlan, PaymentState, PlanType, Standing, User, UserId,
};

pub const ATTEMPT_NOT_FOUND_MESSAGE: &str = "Payment attempt not found";

fn map_attempt_error(error: PaymentAttemptRepositoryError) -> Error {
    match error {
        PaymentAttemptRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        other => Error::internal(format!("payment repository error: {other}")),
    }
}

/// Plan shown on the upgrade page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanOffer {
    pub plan: PaymentPlan,
    pub amount: Money,
    pub premium_days: i64,
}

/// Caller's subscription standing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub plan_type: PlanType,
    pub standing: Standing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    /// Days left in whichever window is currently active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_days: Option<i64>,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackDisposition {
    /// The body was not an STK callback.
    Unrecognised,
    /// The reference is unknown or was already resolved.
    Ignored { checkout_request_id: String },
    /// The attempt left `requested`; `premium_until` is set when a user's
    /// premium window was extended.
    Resolved {
        attempt: PaymentAttempt,
        premium_until: Option<DateTime<Utc>>,
    },
}

#[derive(Clone)]
pub struct SubscriptionPaymentService {
    gateway: Arc<dyn PaymentGateway>,
    attempts: Arc<dyn PaymentAttemptRepository>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionPaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        attempts: Arc<dyn PaymentAttemptRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            attempts,
            clock,
        }
    }

    #[must_use]
    pub fn plans(&self) -> Vec<PlanOffer> {
        PaymentPlan::ALL
            .into_iter()
            .map(|plan| PlanOffer {
                plan,
                amount: plan.amount(),
                premium_days: plan.premium_days(),
            })
            .collect()
    }

    /// Push a charge to the subscriber's phone and record the attempt.
    ///
    /// Gateway failures are logged in full; the caller only sees
    /// [`PAYMENT_INITIATION_FAILED_MESSAGE`].
    pub async fn subscribe(
        &self,
        user_id: Option<UserId>,
        request: ChargeRequest,
    ) -> Result<ChargeAcknowledgement, Error> {
        let now = self.clock.utc();
        let acknowledgement = match self.push(&request, now).await {
            Ok(acknowledgement) => acknowledgement,
            Err(detail) => {
                error!(plan = %request.plan, error = %detail, "payment initiation failed");
                return Err(Error::upstream(PAYMENT_INITIATION_FAILED_MESSAGE));
            }
        };

        let stored = self
            .attempts
            .insert(&NewPaymentAttempt {
                id: PaymentAttemptId::random(),
                user_id,
                request,
                acknowledgement: acknowledgement.clone(),
                created_at: now,
            })
            .await;
        let attempt = match stored {
            Ok(attempt) => attempt,
            Err(err) => {
                // The phone has already been prompted; keep the references
                // so the charge can be reconciled by hand.
                error!(
                    checkout_request_id = %acknowledgement.checkout_request_id,
                    merchant_request_id = %acknowledgement.merchant_request_id,
                    user_id = ?user_id,
                    error = %err,
                    "payment pushed but attempt not recorded"
                );
                return Err(map_attempt_error(err));
            }
        };
        info!(
            attempt_id = %attempt.id,
            checkout_request_id = %attempt.checkout_request_id,
            plan = %attempt.plan,
            "payment requested"
        );
        Ok(acknowledgement)
    }

    async fn push(
        &self,
        request: &ChargeRequest,
        now: DateTime<Utc>,
    ) -> Result<ChargeAcknowledgement, PaymentGatewayError> {
        let token = self.gateway.authenticate().await?;
        self.gateway.initiate_charge(&token, request, now).await
    }

    /// Apply a webhook delivery.
    ///
    /// Resolution is a guarded transition out of `requested` that commits
    /// together with any premium extension, so a redelivered callback never
    /// extends twice and a failed delivery can be replayed.
    pub async fn handle_callback(&self, payload: &Value) -> Result<CallbackDisposition, Error> {
        let Some(outcome) = CallbackOutcome::from_payload(payload) else {
            warn!("payment callback is not an STK result");
            return Ok(CallbackDisposition::Unrecognised);
        };
        let resolution = self
            .attempts
            .resolve_and_extend(&outcome, self.clock.utc())
            .await
            .map_err(map_attempt_error)?;
        let Some(AttemptResolution {
            attempt,
            premium_until,
        }) = resolution
        else {
            warn!(
                checkout_request_id = %outcome.checkout_request_id,
                "payment callback for unknown or resolved attempt"
            );
            return Ok(CallbackDisposition::Ignored {
                checkout_request_id: outcome.checkout_request_id,
            });
        };
        info!(
            attempt_id = %attempt.id,
            state = %attempt.state,
            result_code = outcome.result_code,
            "payment attempt resolved"
        );
        match (attempt.state, attempt.user_id, premium_until) {
            (PaymentState::Acknowledged, Some(user_id), Some(until)) => {
                info!(user_id = %user_id, plan = %attempt.plan, %until, "premium activated");
            }
            (PaymentState::Acknowledged, Some(user_id), None) => {
                warn!(user_id = %user_id, "paid attempt references a missing user");
            }
            _ => {}
        }
        Ok(CallbackDisposition::Resolved {
            attempt,
            premium_until,
        })
    }

    /// Stored state of an attempt. Attempts recorded for another user read
    /// as absent.
    pub async fn attempt_status(
        &self,
        caller: &User,
        checkout_request_id: &str,
    ) -> Result<PaymentAttempt, Error> {
        let attempt = self
            .attempts
            .find_by_checkout_request_id(checkout_request_id)
            .await
            .map_err(map_attempt_error)?;
        match attempt {
            Some(attempt) if attempt.user_id.is_none_or(|owner| owner == *caller.id()) => {
                Ok(attempt)
            }
            _ => Err(Error::not_found(ATTEMPT_NOT_FOUND_MESSAGE)),
        }
    }

    #[must_use]
    pub fn status(&self, user: &User) -> SubscriptionStatus {
        let now = self.clock.utc();
        let subscription = user.subscription();
        let standing = subscription.standing(now);
        let remaining_days = match standing {
            Standing::TrialActive => subscription.remaining_trial_days(now),
            Standing::PremiumActive => subscription.remaining_premium_days(now),
            Standing::Expired => None,
        };
        SubscriptionStatus {
            plan_type: subscription.plan_type,
            standing,
            trial_end: subscription.trial_end,
            expiry_date: subscription.expiry_date,
            remaining_days,
        }
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
