//! Behaviour tests for portal login and logout.
//!
//! Requests run through the full route table on a current-thread runtime;
//! the world keeps the client so session cookies carry across steps.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

#[allow(dead_code)]
mod support;

use std::cell::RefCell;
use std::future::Future;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::{Builder, Runtime};
use tokio::task::LocalSet;

use agroai::domain::{Role, Subscription};
use agroai::test_support::TestHarness;
use support::{PortalClient, Reply};

struct LoginWorld {
    runtime: Runtime,
    client: RefCell<PortalClient>,
    last: RefCell<Option<Reply>>,
}

impl LoginWorld {
    fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        Self {
            runtime,
            client: RefCell::new(PortalClient::new(TestHarness::new())),
            last: RefCell::new(None),
        }
    }

    fn block_on<T>(&self, fut: impl Future<Output = T>) -> T {
        LocalSet::new().block_on(&self.runtime, fut)
    }

    fn record(&self, send: impl AsyncFnOnce(&mut PortalClient) -> Reply) {
        let mut client = self.client.borrow_mut();
        let reply = self.block_on(send(&mut *client));
        *self.last.borrow_mut() = Some(reply);
    }

    fn with_last<T>(&self, check: impl FnOnce(&Reply) -> T) -> T {
        let last = self.last.borrow();
        check(last.as_ref().expect("a request was sent"))
    }

    fn seed(&self, username: &str, role: Role, password: &str) {
        self.client
            .borrow()
            .harness
            .seed_user(username, role, Subscription::default(), password);
    }
}

#[fixture]
fn world() -> LoginWorld {
    LoginWorld::new()
}

#[given("a farmer \"{username}\" with password \"{password}\"")]
fn a_farmer_with_password(world: &LoginWorld, username: String, password: String) {
    world.seed(&username, Role::Farmer, &password);
}

#[given("an owner \"{username}\" with password \"{password}\"")]
fn an_owner_with_password(world: &LoginWorld, username: String, password: String) {
    world.seed(&username, Role::Owner, &password);
}

#[when("\"{username}\" logs in with password \"{password}\"")]
fn logs_in_with_password(world: &LoginWorld, username: String, password: String) {
    world.record(async |client: &mut PortalClient| client.login(&username, &password).await);
}

#[when("\"{username}\" submits the login form with password \"{password}\"")]
fn submits_the_login_form(world: &LoginWorld, username: String, password: String) {
    world.record(async |client: &mut PortalClient| {
        client
            .send(TestRequest::post().uri("/login").set_form([
                ("username", username.as_str()),
                ("password", password.as_str()),
            ]))
            .await
    });
}

#[when("the client logs out")]
fn the_client_logs_out(world: &LoginWorld) {
    world.record(async |client: &mut PortalClient| client.get("/logout").await);
}

#[then("the login succeeds with redirect \"{path}\"")]
fn the_login_succeeds_with_redirect(world: &LoginWorld, path: String) {
    world.with_last(|reply| {
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["redirectTo"].as_str(), Some(path.as_str()));
    });
}

#[then("the response redirects to \"{path}\"")]
fn the_response_redirects_to(world: &LoginWorld, path: String) {
    world.with_last(|reply| {
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some(path.as_str()));
    });
}

#[then("the login is rejected as unauthorised")]
fn the_login_is_rejected(world: &LoginWorld) {
    world.with_last(|reply| {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["message"], "Invalid credentials");
        assert_eq!(reply.body["traceId"].as_str(), reply.trace_id.as_deref());
    });
}

#[then("the client holds a session")]
fn the_client_holds_a_session(world: &LoginWorld) {
    assert!(world.client.borrow().has_session());
}

#[then("the client holds no session")]
fn the_client_holds_no_session(world: &LoginWorld) {
    assert!(!world.client.borrow().has_session());
}

#[then("the dashboard redirects to \"{path}\"")]
fn the_dashboard_redirects_to(world: &LoginWorld, path: String) {
    world.record(async |client: &mut PortalClient| client.get("/dashboard").await);
    world.with_last(|reply| {
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some(path.as_str()));
    });
}

#[scenario(path = "tests/features/login.feature")]
fn login_scenarios(world: LoginWorld) {
    drop(world);
}
