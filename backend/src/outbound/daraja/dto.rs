//! Wire shapes for the Daraja OAuth and STK push endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::ChargeAcknowledgement;

#[derive(Debug, Deserialize)]
pub(super) struct OAuthResponseDto {
    pub(super) access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct StkPushRequestDto<'a> {
    pub(super) business_short_code: &'a str,
    pub(super) password: String,
    pub(super) timestamp: String,
    pub(super) transaction_type: &'static str,
    pub(super) amount: u32,
    pub(super) party_a: &'a str,
    pub(super) party_b: &'a str,
    pub(super) phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    pub(super) callback_url: &'a str,
    pub(super) account_reference: &'static str,
    pub(super) transaction_desc: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct StkPushResponseDto {
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    customer_message: String,
}

impl From<StkPushResponseDto> for ChargeAcknowledgement {
    fn from(dto: StkPushResponseDto) -> Self {
        Self {
            merchant_request_id: dto.merchant_request_id,
            checkout_request_id: dto.checkout_request_id,
            response_code: dto.response_code,
            response_description: dto.response_description,
            customer_message: dto.customer_message,
        }
    }
}
