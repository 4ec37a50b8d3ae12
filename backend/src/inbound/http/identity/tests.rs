//! Gate behaviour of the identity extractors.

use actix_web::http::{StatusCode, header::LOCATION};
use actix_web::{App, HttpResponse, test, web};
use chrono::TimeDelta;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{PlanType, Subscription};
use crate::inbound::http::session::{SessionContext, USER_ID_KEY};
use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
use crate::test_support::TestHarness;

#[fixture]
fn harness() -> TestHarness {
    TestHarness::new()
}

async fn sign_in(session: SessionContext, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let id = UserId::new(path.into_inner()).map_err(|e| Error::invalid_request(e.to_string()))?;
    session.persist_user(&id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn corrupt_session(session: actix_session::Session) -> Result<HttpResponse, Error> {
    session
        .insert(USER_ID_KEY, 42)
        .map_err(|e| Error::internal(e.to_string()))?;
    Ok(HttpResponse::Ok().finish())
}

async fn json_gate(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().body(user.into_inner().username().as_ref().to_owned())
}

async fn page_gate(user: PageUser) -> HttpResponse {
    HttpResponse::Ok().body(user.into_inner().username().as_ref().to_owned())
}

async fn subscription_gate(user: SubscribedUser) -> HttpResponse {
    HttpResponse::Ok().body(user.into_inner().username().as_ref().to_owned())
}

macro_rules! gate_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new($harness.http_state()))
                .route("/sign-in/{id}", web::get().to(sign_in))
                .route("/corrupt", web::get().to(corrupt_session))
                .route("/json", web::get().to(json_gate))
                .route("/page", web::get().to(page_gate))
                .route("/ai", web::get().to(subscription_gate)),
        )
        .await
    };
}

fn location<B>(res: &actix_web::dev::ServiceResponse<B>) -> Option<&str> {
    res.headers().get(LOCATION).and_then(|v| v.to_str().ok())
}

macro_rules! cookie_for {
    ($app:expr, $id:expr) => {{
        let res = test::call_service(
            &$app,
            test::TestRequest::get()
                .uri(&format!("/sign-in/{}", $id))
                .to_request(),
        )
        .await;
        session_cookie(&res).expect("session cookie")
    }};
}

#[rstest]
#[case("/json", StatusCode::UNAUTHORIZED, None)]
#[case("/page", StatusCode::SEE_OTHER, Some("/login"))]
#[case("/ai", StatusCode::SEE_OTHER, Some("/login"))]
#[actix_web::test]
async fn anonymous_requests_are_rejected_per_gate(
    harness: TestHarness,
    #[case] path: &str,
    #[case] status: StatusCode,
    #[case] redirect: Option<&str>,
) {
    let app = gate_app!(harness);

    let res = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;

    assert_eq!(res.status(), status);
    assert_eq!(location(&res), redirect);
}

#[rstest]
#[actix_web::test]
async fn signed_in_user_passes_json_and_page_gates(harness: TestHarness) {
    let user = harness.seed_user("alice", Role::Farmer, Subscription::default(), "pw1");
    let app = gate_app!(harness);
    let cookie = cookie_for!(app, user.id());

    for path in ["/json", "/page"] {
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(path).cookie(cookie.clone()).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(test::read_body(res).await, "alice");
    }
}

#[rstest]
#[actix_web::test]
async fn session_for_deleted_user_is_unauthenticated(harness: TestHarness) {
    let app = gate_app!(harness);
    let cookie = cookie_for!(app, UserId::random());

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/json").cookie(cookie).to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn subscription_gate_follows_the_clock(harness: TestHarness) {
    let trial_end = harness.now() + TimeDelta::days(1);
    let user = harness.seed_user(
        "alice",
        Role::Farmer,
        Subscription {
            plan_type: PlanType::Trial,
            trial_end: Some(trial_end),
            expiry_date: None,
        },
        "pw1",
    );
    let app = gate_app!(harness);
    let cookie = cookie_for!(app, user.id());

    let open = test::call_service(
        &app,
        test::TestRequest::get().uri("/ai").cookie(cookie.clone()).to_request(),
    )
    .await;
    assert_eq!(open.status(), StatusCode::OK);

    harness.clock.set(trial_end + TimeDelta::seconds(1));
    let lapsed = test::call_service(
        &app,
        test::TestRequest::get().uri("/ai").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(lapsed.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&lapsed), Some("/subscription/upgrade"));
}

#[rstest]
#[actix_web::test]
async fn unreadable_session_fails_closed_at_subscription_gate(harness: TestHarness) {
    let app = gate_app!(harness);
    let res = test::call_service(&app, test::TestRequest::get().uri("/corrupt").to_request()).await;
    let cookie = session_cookie(&res).expect("session cookie");

    let gated = test::call_service(
        &app,
        test::TestRequest::get().uri("/ai").cookie(cookie).to_request(),
    )
    .await;

    assert_eq!(gated.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&gated), Some("/subscription/upgrade"));
}
