//! HTTP mapping for domain errors.
//!
//! Server-side failures are logged here with their full message, then
//! reduced to a generic payload before they reach the client.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const INTERNAL_MESSAGE: &str = "Internal server error";
const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UpstreamError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing copy of `error`.
///
/// Internal and unavailable messages are replaced; upstream messages are
/// already fixed texts and keep their wording. All three lose their details.
fn client_payload(error: &Error) -> Error {
    let code = error.code();
    if !code.is_server_side() {
        return error.clone();
    }
    let message = match code {
        ErrorCode::ServiceUnavailable => UNAVAILABLE_MESSAGE,
        ErrorCode::UpstreamError => error.message(),
        _ => INTERNAL_MESSAGE,
    };
    let sanitised = Error::new(code, message);
    match error.trace_id() {
        Some(id) => sanitised.with_trace_id(id.to_owned()),
        None => sanitised,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if self.code().is_server_side() {
            error!(
                code = ?self.code(),
                trace_id = self.trace_id().unwrap_or_default(),
                error = %self.message(),
                "request failed"
            );
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(client_payload(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal(INTERNAL_MESSAGE)
    }
}

#[cfg(test)]
mod tests;
