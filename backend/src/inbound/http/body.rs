//! Request bodies submitted either as HTML forms or as JSON.
//!
//! Browser forms expect a redirect on success while API clients expect a
//! JSON document, so handlers keep track of which encoding arrived.

use actix_web::http::header::{CONTENT_TYPE, LOCATION};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::domain::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Form,
    Json,
}

impl BodyKind {
    fn of(req: &HttpRequest) -> Self {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .trim_start()
                    .to_ascii_lowercase()
                    .starts_with("application/json")
            });
        if is_json { Self::Json } else { Self::Form }
    }

    /// Redirect form submissions to `location`; answer JSON submissions with
    /// the response built by `json`.
    pub fn respond(self, location: &str, json: impl FnOnce() -> HttpResponse) -> HttpResponse {
        match self {
            Self::Form => see_other(location),
            Self::Json => json(),
        }
    }
}

/// Body decoded from either `application/x-www-form-urlencoded` or JSON.
#[derive(Debug)]
pub struct FormOrJson<T> {
    pub body: T,
    pub kind: BodyKind,
}

fn body_error(error: &actix_web::Error) -> Error {
    Error::invalid_request(format!("invalid request body: {error}"))
}

impl<T> FromRequest for FormOrJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        match BodyKind::of(req) {
            BodyKind::Json => {
                let fut = web::Json::<T>::from_request(req, payload);
                Box::pin(async move {
                    fut.await
                        .map(|json| Self {
                            body: json.into_inner(),
                            kind: BodyKind::Json,
                        })
                        .map_err(|error| body_error(&error))
                })
            }
            BodyKind::Form => {
                let fut = web::Form::<T>::from_request(req, payload);
                Box::pin(async move {
                    fut.await
                        .map(|form| Self {
                            body: form.into_inner(),
                            kind: BodyKind::Form,
                        })
                        .map_err(|error| body_error(&error))
                })
            }
        }
    }
}

/// `303 See Other` pointing at `location`.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location.to_owned()))
        .finish()
}

/// Extractor rejection that sends the browser elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("redirect to {location}")]
pub struct RedirectTo {
    location: &'static str,
}

pub const LOGIN_PATH: &str = "/login";
pub const UPGRADE_PATH: &str = "/subscription/upgrade";

impl RedirectTo {
    pub const fn login() -> Self {
        Self {
            location: LOGIN_PATH,
        }
    }

    pub const fn upgrade() -> Self {
        Self {
            location: UPGRADE_PATH,
        }
    }

    pub fn location(&self) -> &'static str {
        self.location
    }
}

impl ResponseError for RedirectTo {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        see_other(self.location)
    }
}
