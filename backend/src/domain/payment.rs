//! Subscription payments initiated through a mobile-money STK push.
//!
//! Each push is recorded as a [`PaymentAttempt`] keyed by the gateway's
//! checkout reference. The gateway later reports the outcome through a
//! webhook, which moves the attempt out of [`PaymentState::Requested`]
//! exactly once.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::{Money, PaymentAttemptId, PhoneNumber, UserId};

/// Message returned when either subscription field is missing.
pub const PHONE_AND_PLAN_REQUIRED_MESSAGE: &str = "Phone and plan required";
/// Message returned for plans other than `monthly` and `yearly`.
pub const INVALID_PLAN_MESSAGE: &str = "Invalid plan";
/// Message returned when the phone number cannot be charged.
pub const INVALID_PHONE_MESSAGE: &str = "Invalid phone number";
/// Generic message shown when the gateway rejects or fails a push.
pub const PAYMENT_INITIATION_FAILED_MESSAGE: &str = "Failed to initiate payment";

/// Offset of the gateway's local clock (East Africa Time, UTC+3).
pub const GATEWAY_UTC_OFFSET_SECONDS: i32 = 3 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentValidationError {
    #[error("Phone and plan required")]
    MissingFields,
    #[error("Invalid plan")]
    InvalidPlan,
    #[error("Invalid phone number")]
    InvalidPhone,
}

/// Paid subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentPlan {
    Monthly,
    Yearly,
}

impl PaymentPlan {
    pub const ALL: [Self; 2] = [Self::Monthly, Self::Yearly];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Whole-unit price charged through the gateway.
    #[must_use]
    pub const fn amount_units(self) -> u32 {
        match self {
            Self::Monthly => 500,
            Self::Yearly => 4500,
        }
    }

    #[must_use]
    pub const fn amount(self) -> Money {
        Money::from_whole_units(self.amount_units())
    }

    /// Premium days granted by a successful payment.
    #[must_use]
    pub const fn premium_days(self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }
}

impl fmt::Display for PaymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentPlan {
    type Err = PaymentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(PaymentValidationError::InvalidPlan),
        }
    }
}

/// Validated subscribe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub phone: PhoneNumber,
    pub plan: PaymentPlan,
}

impl ChargeRequest {
    /// Missing fields are reported before an unknown plan, which is reported
    /// before a malformed phone number.
    pub fn try_from_parts(
        phone: Option<&str>,
        plan: Option<&str>,
    ) -> Result<Self, PaymentValidationError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }
        let (Some(phone), Some(plan)) = (present(phone), present(plan)) else {
            return Err(PaymentValidationError::MissingFields);
        };
        let plan = plan.parse()?;
        let phone = PhoneNumber::new(phone).map_err(|_| PaymentValidationError::InvalidPhone)?;
        Ok(Self { phone, plan })
    }

    pub fn amount_units(&self) -> u32 {
        self.plan.amount_units()
    }

    /// Free-text description sent with the push.
    pub fn description(&self) -> String {
        format!("Payment for {} plan", self.plan)
    }
}

/// Gateway timestamp `YYYYMMDDHHmmss` in the gateway's local time.
#[must_use]
pub fn gateway_timestamp(now: DateTime<Utc>) -> String {
    let local = now.naive_utc() + TimeDelta::seconds(i64::from(GATEWAY_UTC_OFFSET_SECONDS));
    local.format("%Y%m%d%H%M%S").to_string()
}

/// Gateway response to an accepted STK push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChargeAcknowledgement {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub response_code: String,
    pub response_description: String,
    pub customer_message: String,
}

/// Lifecycle of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    /// Push sent, awaiting the gateway callback.
    Requested,
    /// Gateway reported a successful payment.
    Acknowledged,
    /// Gateway reported a cancelled or failed payment.
    Failed,
}

impl PaymentState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Acknowledged => "acknowledged",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "acknowledged" => Ok(Self::Acknowledged),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment state: {other}")),
        }
    }
}

/// Persisted record of one STK push and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttempt {
    pub id: PaymentAttemptId,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub phone: String,
    pub plan: PaymentPlan,
    pub amount: Money,
    pub state: PaymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Fields stored when a push is accepted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentAttempt {
    pub id: PaymentAttemptId,
    pub user_id: Option<UserId>,
    pub request: ChargeRequest,
    pub acknowledgement: ChargeAcknowledgement,
    pub created_at: DateTime<Utc>,
}

/// Attempt moved out of `requested` by a webhook delivery.
///
/// `premium_until` is the new expiry when a paid attempt extended its
/// user's premium window in the same transaction. It stays `None` for
/// failed payments, anonymous attempts and users that no longer exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResolution {
    pub attempt: PaymentAttempt,
    pub premium_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CallbackEnvelope {
    #[serde(rename = "Body")]
    body: CallbackBody,
}

#[derive(Debug, Deserialize)]
struct CallbackBody {
    #[serde(rename = "stkCallback")]
    stk_callback: StkCallbackPayload,
}

#[derive(Debug, Deserialize)]
struct StkCallbackPayload {
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    result_code: i32,
    #[serde(rename = "ResultDesc", default)]
    result_description: String,
}

/// Outcome reported by the gateway webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub result_code: i32,
    pub result_description: String,
}

impl CallbackOutcome {
    /// Extract the STK result from an arbitrary webhook body.
    ///
    /// Returns `None` for payloads that are not STK callbacks.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let envelope = CallbackEnvelope::deserialize(payload).ok()?;
        let StkCallbackPayload {
            merchant_request_id,
            checkout_request_id,
            result_code,
            result_description,
        } = envelope.body.stk_callback;
        Some(Self {
            merchant_request_id,
            checkout_request_id,
            result_code,
            result_description,
        })
    }

    /// `ResultCode` 0 means paid; any other code is a failure.
    #[must_use]
    pub const fn resolution(&self) -> PaymentState {
        if self.result_code == 0 {
            PaymentState::Acknowledged
        } else {
            PaymentState::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("monthly", 500, 30)]
    #[case("yearly", 4500, 365)]
    fn plans_map_to_fixed_amounts(#[case] raw: &str, #[case] amount: u32, #[case] days: i64) {
        let plan: PaymentPlan = raw.parse().expect("known plan");
        assert_eq!(plan.amount_units(), amount);
        assert_eq!(plan.amount().cents(), i64::from(amount) * 100);
        assert_eq!(plan.premium_days(), days);
    }

    #[rstest]
    #[case(None, Some("monthly"), PaymentValidationError::MissingFields)]
    #[case(Some("254700000000"), None, PaymentValidationError::MissingFields)]
    #[case(Some(" "), Some("monthly"), PaymentValidationError::MissingFields)]
    #[case(Some("254700000000"), Some("weekly"), PaymentValidationError::InvalidPlan)]
    #[case(Some("07-00"), Some("yearly"), PaymentValidationError::InvalidPhone)]
    fn charge_request_validation(
        #[case] phone: Option<&str>,
        #[case] plan: Option<&str>,
        #[case] expected: PaymentValidationError,
    ) {
        assert_eq!(
            ChargeRequest::try_from_parts(phone, plan).expect_err("must fail"),
            expected
        );
    }

    #[rstest]
    fn invalid_plan_message_is_stable() {
        let err = ChargeRequest::try_from_parts(Some("254700000000"), Some("weekly"))
            .expect_err("must fail");
        assert_eq!(err.to_string(), INVALID_PLAN_MESSAGE);
    }

    #[rstest]
    fn description_names_the_plan() {
        let request = ChargeRequest::try_from_parts(Some("254700000000"), Some("yearly"))
            .expect("valid request");
        assert_eq!(request.description(), "Payment for yearly plan");
    }

    #[rstest]
    fn timestamp_uses_gateway_local_time() {
        let now = Utc
            .with_ymd_and_hms(2024, 12, 31, 22, 30, 5)
            .single()
            .expect("timestamp");
        assert_eq!(gateway_timestamp(now), "20250101013005");
    }

    #[rstest]
    #[case(0, PaymentState::Acknowledged)]
    #[case(1032, PaymentState::Failed)]
    fn callback_resolution_follows_result_code(#[case] code: i32, #[case] expected: PaymentState) {
        let payload = json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": code,
                    "ResultDesc": "done"
                }
            }
        });
        let outcome = CallbackOutcome::from_payload(&payload).expect("stk callback");
        assert_eq!(outcome.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(outcome.resolution(), expected);
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"Body": {"stkCallback": {"ResultCode": 0}}}))]
    #[case(json!("hello"))]
    fn non_stk_payloads_are_ignored(#[case] payload: Value) {
        assert!(CallbackOutcome::from_payload(&payload).is_none());
    }
}
