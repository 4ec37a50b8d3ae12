//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("Invalid credentials"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("owner role required"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("Equipment not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("rental already approved"), StatusCode::CONFLICT)]
#[case(Error::upstream("Failed to initiate payment"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::service_unavailable("pool exhausted"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn client_view(error: Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(&error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body()).await.expect("read body");
    let payload = serde_json::from_slice(&bytes).expect("error JSON");
    (status, header, payload)
}

#[rstest]
#[case(Error::internal("db password wrong"), ErrorCode::InternalError, "Internal server error")]
#[case(
    Error::service_unavailable("connection refused on 10.0.0.3"),
    ErrorCode::ServiceUnavailable,
    "Service temporarily unavailable"
)]
#[case(
    Error::upstream("Failed to initiate payment"),
    ErrorCode::UpstreamError,
    "Failed to initiate payment"
)]
#[actix_web::test]
async fn server_side_errors_are_sanitised(
    trace_id: String,
    #[case] error: Error,
    #[case] code: ErrorCode,
    #[case] message: &str,
) {
    let error = error
        .with_trace_id(trace_id.clone())
        .with_details(json!({"secret": "x"}));

    let (_, header, payload) = client_view(error).await;

    assert_eq!(header.as_deref(), Some(trace_id.as_str()));
    assert_eq!(payload.code(), code);
    assert_eq!(payload.message(), message);
    assert_eq!(payload.trace_id(), Some(trace_id.as_str()));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details(trace_id: String) {
    let error = Error::conflict("Email already exists. Please login instead.")
        .with_trace_id(trace_id)
        .with_details(json!({"field": "email"}));

    let (status, _, payload) = client_view(error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload.message(), "Email already exists. Please login instead.");
    assert_eq!(payload.details(), Some(&json!({"field": "email"})));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_header() {
    let (status, header, payload) = client_view(Error::invalid_request("bad")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(header.is_none());
    assert_eq!(payload.trace_id(), None);
}

#[rstest]
fn actix_errors_become_redacted_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}
