//! Port abstraction for the identity store.
use async_trait::async_trait;

use crate::domain::{EmailAddress, PasswordHash, Role, Subscription, User, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by identity store adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses this email address.
        DuplicateEmail => "email address already registered",
        /// Another account already uses this username.
        DuplicateUsername => "username already registered",
    }
}

/// User record together with its stored password hash.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Unique violations surface as `Duplicate*` variants.
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by login name.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and password hash by login name.
    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, UserPersistenceError>;

    async fn username_exists(&self, username: &Username) -> Result<bool, UserPersistenceError>;

    /// Change a user's role. Returns `false` when no user matched.
    async fn update_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError>;

    /// Overwrite a user's subscription window. Returns `false` when no user
    /// matched.
    async fn update_subscription(
        &self,
        id: &UserId,
        subscription: &Subscription,
    ) -> Result<bool, UserPersistenceError>;
}
