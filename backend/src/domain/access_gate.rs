//! Access gate: resolves the caller's identity and enforces role and
//! subscription requirements.
//!
//! The session only carries a user id. Every request re-reads the user from
//! the identity store, so role or plan changes take effect immediately and
//! no authorisation decision is cached between requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::warn;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Error, Role, Standing, User, UserId};

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

/// Result of the subscription sub-gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionCheck {
    /// Trial or premium window is open.
    Active(User),
    /// Window closed, user missing, or identity could not be read.
    Lapsed,
}

#[derive(Clone)]
pub struct AccessGate {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Load the current identity for a session user id.
    ///
    /// `Ok(None)` means the session references a user that no longer exists.
    pub async fn identify(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)
    }

    /// Fail with `forbidden` unless `user` holds `role`.
    pub fn require_role(user: &User, role: Role) -> Result<(), Error> {
        if user.role() == role {
            Ok(())
        } else {
            Err(Error::forbidden(format!("{role} role required")))
        }
    }

    #[must_use]
    pub fn standing(&self, user: &User) -> Standing {
        user.subscription().standing(self.now())
    }

    /// Evaluate the subscription sub-gate, failing closed.
    ///
    /// Storage errors are logged and reported as [`SubscriptionCheck::Lapsed`].
    pub async fn check_subscription(&self, id: &UserId) -> SubscriptionCheck {
        match self.identify(id).await {
            Ok(Some(user)) if self.standing(&user).is_active() => SubscriptionCheck::Active(user),
            Ok(_) => SubscriptionCheck::Lapsed,
            Err(error) => {
                warn!(user_id = %id, error = %error.message(), "subscription check failed closed");
                SubscriptionCheck::Lapsed
            }
        }
    }
}
