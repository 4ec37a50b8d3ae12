//! Account handlers: registration, login, logout and dashboards.
//!
//! ```text
//! POST /register           {"username","email","password","phone"?}
//! POST /login              {"username","password"}
//! GET  /logout
//! GET  /, /dashboard       signed-in identity with remaining trial days
//! GET  /dash/admin         admin landing
//! GET  /dash/owner         owner landing
//! GET  /dash/farmer/profile
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Dashboard, LivestockWithLogs, LoginCredentials, Registration, RentalSummary, Role, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::body::{FormOrJson, LOGIN_PATH, see_other};
use crate::inbound::http::identity::PageUser;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_login_validation_error, map_registration_error};

/// Registration form. `phone` is optional.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

/// Login form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Where a freshly signed-in user should go.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub role: Role,
    pub redirect_to: String,
}

/// Farmer profile page content.
#[derive(Debug, Serialize, ToSchema)]
pub struct FarmerProfile {
    pub user: User,
    pub rentals: Vec<RentalSummary>,
    pub livestock: Vec<LivestockWithLogs>,
}

fn text(value: Option<&String>) -> &str {
    value.map_or("", String::as_str)
}

/// Create a farmer account.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 303, description = "Form submission accepted; continue at /login"),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 409, description = "Email or username taken", body = crate::domain::Error),
        (status = 500, description = "Internal server error", body = crate::domain::Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: FormOrJson<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let FormOrJson { body, kind } = payload;
    let registration = Registration::try_from_parts(
        text(body.username.as_ref()),
        text(body.email.as_ref()),
        text(body.password.as_ref()),
        body.phone.as_deref(),
    )
    .map_err(map_registration_error)?;
    let user = state.accounts.register(&registration).await?;
    Ok(kind.respond(LOGIN_PATH, || HttpResponse::Created().json(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 303, description = "Form login accepted; continue at the role landing page"),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 401, description = "Invalid credentials", body = crate::domain::Error),
        (status = 500, description = "Internal server error", body = crate::domain::Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: FormOrJson<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let FormOrJson { body, kind } = payload;
    let credentials =
        LoginCredentials::try_from_parts(text(body.username.as_ref()), text(body.password.as_ref()))
            .map_err(map_login_validation_error)?;
    let user = state.accounts.login(&credentials).await?;
    session.persist_user(user.id())?;
    let landing = user.role().landing_path();
    Ok(kind.respond(landing, || {
        HttpResponse::Ok().json(LoginResponse {
            role: user.role(),
            redirect_to: landing.to_owned(),
        })
    }))
}

/// Drop the session and return to the login page.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Signed out; continue at /login")),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[get("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    see_other(LOGIN_PATH)
}

fn dashboard_for(state: &HttpState, user: User) -> web::Json<Dashboard> {
    web::Json(state.accounts.dashboard(user))
}

/// Signed-in identity with the trial countdown.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = Dashboard),
        (status = 303, description = "No session; continue at /login")
    ),
    tags = ["accounts"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(state: web::Data<HttpState>, user: PageUser) -> web::Json<Dashboard> {
    dashboard_for(&state, user.into_inner())
}

/// Home page; same content as `/dashboard`.
#[get("/")]
pub async fn home(state: web::Data<HttpState>, user: PageUser) -> web::Json<Dashboard> {
    dashboard_for(&state, user.into_inner())
}

/// Admin landing page.
#[utoipa::path(
    get,
    path = "/dash/admin",
    responses(
        (status = 200, description = "Admin landing", body = Dashboard),
        (status = 303, description = "No session; continue at /login"),
        (status = 403, description = "Admin role required", body = crate::domain::Error)
    ),
    tags = ["accounts"],
    operation_id = "adminLanding"
)]
#[get("/dash/admin")]
pub async fn admin_landing(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Dashboard>> {
    let user = user.require(Role::Admin)?;
    Ok(dashboard_for(&state, user))
}

/// Owner landing page.
#[utoipa::path(
    get,
    path = "/dash/owner",
    responses(
        (status = 200, description = "Owner landing", body = Dashboard),
        (status = 303, description = "No session; continue at /login"),
        (status = 403, description = "Owner role required", body = crate::domain::Error)
    ),
    tags = ["accounts"],
    operation_id = "ownerLanding"
)]
#[get("/dash/owner")]
pub async fn owner_landing(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<Dashboard>> {
    let user = user.require(Role::Owner)?;
    Ok(dashboard_for(&state, user))
}

/// Farmer profile: identity, rentals and livestock.
#[utoipa::path(
    get,
    path = "/dash/farmer/profile",
    responses(
        (status = 200, description = "Farmer profile", body = FarmerProfile),
        (status = 303, description = "No session; continue at /login"),
        (status = 500, description = "Internal server error", body = crate::domain::Error)
    ),
    tags = ["accounts"],
    operation_id = "farmerProfile"
)]
#[get("/dash/farmer/profile")]
pub async fn farmer_profile(
    state: web::Data<HttpState>,
    user: PageUser,
) -> ApiResult<web::Json<FarmerProfile>> {
    let user = user.into_inner();
    let rentals = state.rentals.list_for_farmer(&user).await?;
    let livestock = state.livestock.list_with_logs(&user).await?;
    Ok(web::Json(FarmerProfile {
        user,
        rentals,
        livestock,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header::LOCATION};
    use actix_web::{App, test};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    use crate::domain::Subscription;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::test_support::TestHarness;

    #[fixture]
    fn harness() -> TestHarness {
        TestHarness::new()
    }

    macro_rules! accounts_app {
        ($harness:expr) => {
            test::init_service(
                App::new()
                    .wrap(test_session_middleware())
                    .app_data(web::Data::new($harness.http_state()))
                    .service(register)
                    .service(login)
                    .service(logout)
                    .service(dashboard)
                    .service(admin_landing),
            )
            .await
        };
    }

    #[rstest]
    #[actix_web::test]
    async fn form_login_redirects_to_role_landing(harness: TestHarness) {
        harness.seed_user("olive", Role::Owner, Subscription::default(), "pw1");
        let app = accounts_app!(harness);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_form([("username", "olive"), ("password", "pw1")])
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/dash/owner")
        );
        assert!(session_cookie(&res).is_some());
    }

    #[rstest]
    #[actix_web::test]
    async fn json_login_reports_role_and_redirect(harness: TestHarness) {
        harness.seed_user("ada", Role::Admin, Subscription::default(), "pw1");
        let app = accounts_app!(harness);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({"username": "ada", "password": "pw1"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"role": "admin", "redirectTo": "/dash/admin"}));
    }

    #[rstest]
    #[case(json!({"username": "", "password": "pw"}), StatusCode::BAD_REQUEST)]
    #[case(json!({"username": "ghost", "password": "pw"}), StatusCode::UNAUTHORIZED)]
    #[case(json!({"username": "alice", "password": "wrong"}), StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn rejected_logins(
        harness: TestHarness,
        #[case] payload: Value,
        #[case] status: StatusCode,
    ) {
        harness.seed_user("alice", Role::Farmer, Subscription::default(), "pw1");
        let app = accounts_app!(harness);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(payload)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), status);
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_email_registration_conflicts(harness: TestHarness) {
        harness.seed_user("alice", Role::Farmer, Subscription::default(), "pw1");
        let app = accounts_app!(harness);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/register")
                .set_json(json!({
                    "username": "alice2",
                    "email": "ALICE@example.com",
                    "password": "pw2"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Email already exists. Please login instead.");
    }

    #[rstest]
    #[actix_web::test]
    async fn farmer_cannot_open_admin_landing(harness: TestHarness) {
        harness.seed_user("alice", Role::Farmer, Subscription::default(), "pw1");
        let app = accounts_app!(harness);
        let signed_in = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({"username": "alice", "password": "pw1"}))
                .to_request(),
        )
        .await;
        let cookie = session_cookie(&signed_in).expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/dash/admin")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn logout_expires_cookie_and_redirects(harness: TestHarness) {
        let app = accounts_app!(harness);

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/logout").to_request()).await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }
}
