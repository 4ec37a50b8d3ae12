//! Extractors resolving the signed-in user for each gate.
//!
//! - [`CurrentUser`]: JSON endpoints, `401` without a session.
//! - [`PageUser`]: page endpoints, `303 /login` without a session.
//! - [`SubscribedUser`]: subscription-gated endpoints, `303 /login` without
//!   a session and `303 /subscription/upgrade` once the plan window lapsed.
//!
//! The user is re-read from the identity store on every request.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::domain::{Error, Role, SubscriptionCheck, User, UserId, AccessGate};
use crate::inbound::http::body::RedirectTo;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const LOGIN_REQUIRED_MESSAGE: &str = "login required";

fn state_of(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

/// Session and state needed by every identity extractor.
struct Resolution {
    session: SessionContext,
    state: web::Data<HttpState>,
}

impl Resolution {
    fn start(
        req: &HttpRequest,
        payload: &mut Payload,
    ) -> impl Future<Output = Result<Self, actix_web::Error>> + 'static {
        let session = SessionContext::from_request(req, payload);
        let state = state_of(req);
        async move {
            let state = state?;
            let session = session.await?;
            Ok(Self { session, state })
        }
    }

    /// User referenced by the session, if it still exists.
    async fn user(&self) -> Result<Option<User>, Error> {
        let Some(id) = self.session.user_id()? else {
            return Ok(None);
        };
        self.lookup(&id).await
    }

    async fn lookup(&self, id: &UserId) -> Result<Option<User>, Error> {
        let user = self.state.gate.identify(id).await?;
        if user.is_none() {
            debug!(user_id = %id, "session references a missing user");
            self.session.purge();
        }
        Ok(user)
    }
}

/// Signed-in user for JSON endpoints.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }

    /// Fail with `forbidden` unless the user holds `role`.
    pub fn require(self, role: Role) -> Result<User, Error> {
        AccessGate::require_role(&self.0, role)?;
        Ok(self.0)
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let resolution = Resolution::start(req, payload);
        Box::pin(async move {
            let resolution = resolution.await?;
            match resolution.user().await? {
                Some(user) => Ok(Self(user)),
                None => Err(Error::unauthorized(LOGIN_REQUIRED_MESSAGE).into()),
            }
        })
    }
}

/// Signed-in user for page endpoints.
#[derive(Debug, Clone)]
pub struct PageUser(pub User);

impl PageUser {
    pub fn into_inner(self) -> User {
        self.0
    }

    pub fn require(self, role: Role) -> Result<User, Error> {
        AccessGate::require_role(&self.0, role)?;
        Ok(self.0)
    }
}

impl FromRequest for PageUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let resolution = Resolution::start(req, payload);
        Box::pin(async move {
            let resolution = resolution.await?;
            match resolution.user().await? {
                Some(user) => Ok(Self(user)),
                None => Err(RedirectTo::login().into()),
            }
        })
    }
}

/// Signed-in user whose trial or premium window is open.
///
/// Identity read failures are treated as a lapsed subscription.
#[derive(Debug, Clone)]
pub struct SubscribedUser(pub User);

impl SubscribedUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for SubscribedUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let resolution = Resolution::start(req, payload);
        Box::pin(async move {
            let resolution = resolution.await?;
            let id = match resolution.session.user_id() {
                Ok(Some(id)) => id,
                Ok(None) => return Err(RedirectTo::login().into()),
                Err(error) => {
                    warn!(%error, "unreadable session at subscription gate");
                    return Err(RedirectTo::upgrade().into());
                }
            };
            match resolution.state.gate.check_subscription(&id).await {
                SubscriptionCheck::Active(user) => Ok(Self(user)),
                SubscriptionCheck::Lapsed => Err(RedirectTo::upgrade().into()),
            }
        })
    }
}

#[cfg(test)]
mod tests;
