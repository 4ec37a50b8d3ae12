//! Account use-cases: registration, login, dashboard and administration.

use std::sync::Arc;

use chrono::TimeDelta;
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::access_gate::map_user_persistence_error;
use crate::domain::ports::{
    PasswordHasher, PasswordHasherError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Error, LoginCredentials, PlanType, Registration, Role, Standing, Subscription, User,
    UserDraft, UserId, Username,
};

/// Conflict message when the email address is already registered.
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already exists. Please login instead.";
/// Conflict message when the username is already registered.
pub const USERNAME_TAKEN_MESSAGE: &str = "Username is already taken";
/// Message for any failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

fn map_insert_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::DuplicateEmail => {
            Error::conflict(EMAIL_TAKEN_MESSAGE).with_details(json!({ "field": "email" }))
        }
        UserPersistenceError::DuplicateUsername => {
            Error::conflict(USERNAME_TAKEN_MESSAGE).with_details(json!({ "field": "username" }))
        }
        other => map_user_persistence_error(other),
    }
}

/// Identity view returned by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub user: User,
    pub standing: Standing,
    /// Whole days left in the trial; absent when no trial was ever granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_days: Option<i64>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }

    /// Create a farmer account with no plan.
    ///
    /// Existing emails are reported before existing usernames. The unique
    /// constraints still catch a concurrent registration racing the checks.
    pub async fn register(&self, registration: &Registration) -> Result<User, Error> {
        if self
            .users
            .email_exists(registration.email())
            .await
            .map_err(map_user_persistence_error)?
        {
            return Err(map_insert_error(UserPersistenceError::DuplicateEmail));
        }
        if self
            .users
            .username_exists(registration.username())
            .await
            .map_err(map_user_persistence_error)?
        {
            return Err(map_insert_error(UserPersistenceError::DuplicateUsername));
        }

        let password_hash = self
            .hasher
            .hash(registration.password())
            .await
            .map_err(map_hasher_error)?;
        let user = User::new(UserDraft {
            id: UserId::random(),
            username: registration.username().clone(),
            email: registration.email().clone(),
            phone: registration.phone().cloned(),
            role: Role::Farmer,
            subscription: Subscription::default(),
        });
        self.users
            .insert(&user, &password_hash)
            .await
            .map_err(map_insert_error)?;
        info!(user_id = %user.id(), "account registered");
        Ok(user)
    }

    /// Verify credentials. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        };
        let Some(stored) = self
            .users
            .find_credentials(&username)
            .await
            .map_err(map_user_persistence_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        };
        let verified = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            return Err(Error::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }
        Ok(stored.user)
    }

    #[must_use]
    pub fn dashboard(&self, user: User) -> Dashboard {
        let now = self.clock.utc();
        Dashboard {
            standing: user.subscription().standing(now),
            remaining_days: user.subscription().remaining_trial_days(now),
            user,
        }
    }

    async fn find_named(&self, username: &Username) -> Result<User, Error> {
        self.users
            .find_by_username(username)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("user {} not found", username.as_ref())))
    }

    /// Administrative role change.
    pub async fn set_role(&self, username: &Username, role: Role) -> Result<User, Error> {
        let user = self.find_named(username).await?;
        let updated = self
            .users
            .update_role(user.id(), role)
            .await
            .map_err(map_user_persistence_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {} not found", username.as_ref())));
        }
        info!(user_id = %user.id(), %role, "role changed");
        self.find_named(username).await
    }

    /// Start a trial of `days` days from now.
    pub async fn grant_trial(&self, username: &Username, days: i64) -> Result<User, Error> {
        if days <= 0 {
            return Err(Error::invalid_request("trial length must be at least one day"));
        }
        let user = self.find_named(username).await?;
        let subscription = Subscription {
            plan_type: PlanType::Trial,
            trial_end: Some(self.clock.utc() + TimeDelta::days(days)),
            expiry_date: user.subscription().expiry_date,
        };
        let updated = self
            .users
            .update_subscription(user.id(), &subscription)
            .await
            .map_err(map_user_persistence_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {} not found", username.as_ref())));
        }
        info!(user_id = %user.id(), days, "trial granted");
        self.find_named(username).await
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
