//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, PasswordHash, Role, Subscription, User, UserId, Username,
};

use super::diesel_basic_error_mapping::{DieselFailure, classify, pool_error_message};
use super::models::{NewUserRow, RowConversionError, SubscriptionUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the identity store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(pool_error_message(error))
}

/// Unique violations are attributed to the column named by the constraint.
fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify(error) {
        DieselFailure::UniqueViolation(Some(constraint)) if constraint.contains("email") => {
            UserPersistenceError::duplicate_email()
        }
        DieselFailure::UniqueViolation(Some(constraint)) if constraint.contains("username") => {
            UserPersistenceError::duplicate_username()
        }
        DieselFailure::UniqueViolation(constraint) => {
            warn!(?constraint, "unrecognised unique violation on users");
            UserPersistenceError::query("unique constraint violated")
        }
        DieselFailure::Connection => UserPersistenceError::connection("database connection error"),
        DieselFailure::ForeignKeyViolation(_) => {
            UserPersistenceError::query("foreign key constraint violated")
        }
        DieselFailure::Query(message) => UserPersistenceError::query(message),
    }
}

fn map_row_error(error: RowConversionError) -> UserPersistenceError {
    UserPersistenceError::query(error.to_string())
}

pub(super) fn subscription_update(
    subscription: &Subscription,
    now: DateTime<Utc>,
) -> SubscriptionUpdate<'static> {
    SubscriptionUpdate {
        plan_type: subscription.plan_type.as_str(),
        trial_end: subscription.trial_end,
        expiry_date: subscription.expiry_date,
        updated_at: now,
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let subscription = user.subscription();
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            phone: user.phone().map(AsRef::as_ref),
            password_hash: password_hash.as_str(),
            role: user.role().as_str(),
            plan_type: subscription.plan_type.as_str(),
            trial_end: subscription.trial_end,
            expiry_date: subscription.expiry_date,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose().map_err(map_row_error)
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(User::try_from).transpose().map_err(map_row_error)
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(UserRow, String)> = users::table
            .filter(users::username.eq(username.as_ref()))
            .select((UserRow::as_select(), users::password_hash))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|(user, hash)| {
            User::try_from(user).map(|user| StoredCredentials {
                user,
                password_hash: PasswordHash::new(hash),
            })
        })
        .transpose()
        .map_err(map_row_error)
    }

    async fn email_exists(&self, email: &EmailAddress) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(email.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn username_exists(&self, username: &Username) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::username.eq(username.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn update_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((users::role.eq(role.as_str()), users::updated_at.eq(Utc::now())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn update_subscription(
        &self,
        id: &UserId,
        subscription: &Subscription,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(subscription_update(subscription, Utc::now()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }
}
