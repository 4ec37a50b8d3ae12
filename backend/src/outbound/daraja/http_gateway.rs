//! Reqwest-backed Daraja STK push adapter.
//!
//! Owns transport details only: credential encoding, request bodies,
//! status mapping and JSON decoding into [`ChargeAcknowledgement`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{OAuthResponseDto, StkPushRequestDto, StkPushResponseDto};
use crate::domain::ports::{AccessToken, PaymentGateway, PaymentGatewayError};
use crate::domain::{ChargeAcknowledgement, ChargeRequest, gateway_timestamp};

const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Merchant credentials and endpoints for the gateway.
pub struct DarajaCredentials {
    pub consumer_key: Zeroizing<String>,
    pub consumer_secret: Zeroizing<String>,
    pub shortcode: String,
    pub passkey: Zeroizing<String>,
    pub oauth_url: Url,
    pub stk_url: Url,
    pub callback_url: Url,
}

pub struct DarajaHttpGateway {
    client: Client,
    credentials: DarajaCredentials,
}

impl DarajaHttpGateway {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(credentials: DarajaCredentials, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn basic_auth(&self) -> Zeroizing<String> {
        let pair = Zeroizing::new(format!(
            "{}:{}",
            self.credentials.consumer_key.as_str(),
            self.credentials.consumer_secret.as_str()
        ));
        Zeroizing::new(format!("Basic {}", STANDARD.encode(pair.as_bytes())))
    }
}

/// `base64(shortcode + passkey + timestamp)`.
fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    let raw = Zeroizing::new(format!("{shortcode}{passkey}{timestamp}"));
    STANDARD.encode(raw.as_bytes())
}

fn stk_body<'a>(
    credentials: &'a DarajaCredentials,
    request: &'a ChargeRequest,
    now: DateTime<Utc>,
) -> StkPushRequestDto<'a> {
    let timestamp = gateway_timestamp(now);
    let password = stk_password(
        &credentials.shortcode,
        credentials.passkey.as_str(),
        &timestamp,
    );
    StkPushRequestDto {
        business_short_code: &credentials.shortcode,
        password,
        timestamp,
        transaction_type: TRANSACTION_TYPE,
        amount: request.amount_units(),
        party_a: request.phone.digits(),
        party_b: &credentials.shortcode,
        phone_number: request.phone.digits(),
        callback_url: credentials.callback_url.as_str(),
        account_reference: request.plan.as_str(),
        transaction_desc: request.description(),
    }
}

#[async_trait]
impl PaymentGateway for DarajaHttpGateway {
    async fn authenticate(&self) -> Result<AccessToken, PaymentGatewayError> {
        let response = self
            .client
            .get(self.credentials.oauth_url.clone())
            .header(reqwest::header::AUTHORIZATION, self.basic_auth().as_str())
            .send()
            .await
            .map_err(|error| PaymentGatewayError::auth(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| PaymentGatewayError::auth(error.to_string()))?;
        if !status.is_success() {
            return Err(PaymentGatewayError::auth(status_message(status, &body)));
        }
        let decoded: OAuthResponseDto = serde_json::from_slice(&body).map_err(|error| {
            PaymentGatewayError::auth(format!("invalid token payload: {error}"))
        })?;
        Ok(AccessToken::new(decoded.access_token))
    }

    async fn initiate_charge(
        &self,
        token: &AccessToken,
        request: &ChargeRequest,
        now: DateTime<Utc>,
    ) -> Result<ChargeAcknowledgement, PaymentGatewayError> {
        let body = stk_body(&self.credentials, request, now);
        let response = self
            .client
            .post(self.credentials.stk_url.clone())
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|error| PaymentGatewayError::request(error.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| PaymentGatewayError::request(error.to_string()))?;
        if !status.is_success() {
            return Err(PaymentGatewayError::request(status_message(status, &bytes)));
        }
        let decoded: StkPushResponseDto = serde_json::from_slice(&bytes).map_err(|error| {
            PaymentGatewayError::request(format!("invalid STK push payload: {error}"))
        })?;
        Ok(decoded.into())
    }
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if compact.is_empty() {
        return format!("status {}", status.as_u16());
    }
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    format!("status {}: {preview}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use crate::domain::{PaymentPlan, PhoneNumber};

    #[fixture]
    fn credentials() -> DarajaCredentials {
        let url = |raw: &str| Url::parse(raw).expect("valid url");
        DarajaCredentials {
            consumer_key: Zeroizing::new("key".to_owned()),
            consumer_secret: Zeroizing::new("secret".to_owned()),
            shortcode: "174379".to_owned(),
            passkey: Zeroizing::new("passkey".to_owned()),
            oauth_url: url("https://sandbox.invalid/oauth"),
            stk_url: url("https://sandbox.invalid/stk"),
            callback_url: url("https://portal.invalid/subscription/callback"),
        }
    }

    #[rstest]
    fn password_encodes_shortcode_passkey_and_timestamp() {
        assert_eq!(
            stk_password("174379", "passkey", "20250101120000"),
            STANDARD.encode("174379passkey20250101120000")
        );
    }

    #[rstest]
    fn basic_auth_encodes_consumer_pair(credentials: DarajaCredentials) {
        let gateway = DarajaHttpGateway::new(credentials, Duration::from_secs(5))
            .expect("client builds");
        assert_eq!(
            gateway.basic_auth().as_str(),
            format!("Basic {}", STANDARD.encode("key:secret"))
        );
    }

    #[rstest]
    fn stk_body_uses_gateway_field_names(credentials: DarajaCredentials) {
        let request = ChargeRequest {
            phone: PhoneNumber::new("+254700000001").expect("valid phone"),
            plan: PaymentPlan::Yearly,
        };
        let now = Utc
            .with_ymd_and_hms(2025, 1, 1, 21, 30, 0)
            .single()
            .expect("valid instant");

        let body = serde_json::to_value(stk_body(&credentials, &request, now))
            .expect("body serialises");

        assert_eq!(body["BusinessShortCode"], json!("174379"));
        assert_eq!(body["Timestamp"], json!("20250102003000"));
        assert_eq!(body["TransactionType"], json!("CustomerPayBillOnline"));
        assert_eq!(body["Amount"], json!(4500));
        assert_eq!(body["PartyA"], json!("254700000001"));
        assert_eq!(body["PartyB"], json!("174379"));
        assert_eq!(body["PhoneNumber"], json!("254700000001"));
        assert_eq!(
            body["CallBackURL"],
            json!("https://portal.invalid/subscription/callback")
        );
        assert_eq!(body["AccountReference"], json!("yearly"));
        assert_eq!(body["TransactionDesc"], json!("Payment for yearly plan"));
    }

    #[rstest]
    fn acknowledgement_decodes_from_gateway_reply() {
        let reply = json!({
            "MerchantRequestID": "m-1",
            "CheckoutRequestID": "ws_CO_1",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "Success. Request accepted for processing"
        });
        let dto: StkPushResponseDto = serde_json::from_value(reply).expect("reply decodes");
        let ack = ChargeAcknowledgement::from(dto);

        assert_eq!(ack.checkout_request_id, "ws_CO_1");
        assert_eq!(ack.response_code, "0");
    }

    #[rstest]
    #[case(b"".as_slice(), "status 500")]
    #[case(b"{\"errorMessage\":  \"Invalid Access Token\"}".as_slice(), "status 500: {\"errorMessage\": \"Invalid Access Token\"}")]
    fn status_message_compacts_body(#[case] body: &[u8], #[case] expected: &str) {
        assert_eq!(status_message(StatusCode::INTERNAL_SERVER_ERROR, body), expected);
    }
}
