//! Client driving the complete portal app over in-memory ports.
//!
//! Each request builds a fresh app around the same [`TestHarness`] and
//! session key, so cookies issued by one request stay valid for the next.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use agroai::Trace;
use agroai::domain::TRACE_ID_HEADER;
use agroai::inbound::http::health::HealthState;
use agroai::inbound::http::routes;
use agroai::inbound::http::session_config::SESSION_COOKIE_NAME;
use agroai::test_support::TestHarness;

/// Captured response; non-JSON bodies decode to `Value::Null`.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub trace_id: Option<String>,
    pub body: Value,
}

pub struct PortalClient {
    pub harness: TestHarness,
    key: Key,
    cookie: Option<Cookie<'static>>,
}

impl PortalClient {
    pub fn new(harness: TestHarness) -> Self {
        Self {
            harness,
            key: Key::generate(),
            cookie: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub fn forget_session(&mut self) {
        self.cookie = None;
    }

    pub async fn send(&mut self, request: test::TestRequest) -> Reply {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_secure(false)
            .build();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(HealthState::new()))
                .app_data(web::Data::new(self.harness.http_state()))
                .wrap(session)
                .wrap(Trace)
                .configure(routes::configure),
        )
        .await;

        let request = match &self.cookie {
            Some(cookie) => request.cookie(cookie.clone()),
            None => request,
        };
        let res = test::call_service(&app, request.to_request()).await;

        if let Some(cookie) = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        {
            self.cookie = (!cookie.value().is_empty()).then(|| cookie.into_owned());
        }
        let header_text = |name: &str| {
            res.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        let status = res.status();
        let location = header_text(header::LOCATION.as_str());
        let trace_id = header_text(TRACE_ID_HEADER);
        let bytes = test::read_body(res).await;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply {
            status,
            location,
            trace_id,
            body,
        }
    }

    pub async fn post_json(&mut self, uri: &str, body: Value) -> Reply {
        self.send(test::TestRequest::post().uri(uri).set_json(body))
            .await
    }

    pub async fn get(&mut self, uri: &str) -> Reply {
        self.send(test::TestRequest::get().uri(uri)).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Reply {
        self.post_json(
            "/login",
            json!({"username": username, "password": password}),
        )
        .await
    }
}
