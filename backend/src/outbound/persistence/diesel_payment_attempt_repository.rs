//! PostgreSQL-backed `PaymentAttemptRepository` implementation.
//!
//! Attempts leave `requested` through a guarded `UPDATE ... WHERE state =
//! 'requested'`, so redelivered webhooks resolve nothing the second time.
//! The premium extension of a paid attempt runs in the same transaction,
//! with the user row locked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{PaymentAttemptRepository, PaymentAttemptRepositoryError};
use crate::domain::{
    AttemptResolution, CallbackOutcome, NewPaymentAttempt, PaymentAttempt, PaymentState,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, pool_error_message};
use super::diesel_user_repository::subscription_update;
use super::models::{NewPaymentAttemptRow, PaymentAttemptRow, RowConversionError, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{payment_attempts, users};

#[derive(Clone)]
pub struct DieselPaymentAttemptRepository {
    pool: DbPool,
}

impl DieselPaymentAttemptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PaymentAttemptRepositoryError {
    PaymentAttemptRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentAttemptRepositoryError {
    map_basic_diesel_error(
        error,
        PaymentAttemptRepositoryError::query,
        PaymentAttemptRepositoryError::connection,
    )
}

fn map_row_error(error: RowConversionError) -> PaymentAttemptRepositoryError {
    PaymentAttemptRepositoryError::query(error.to_string())
}

/// Failure inside the resolution transaction; either kind rolls it back.
enum ResolveFailure {
    Diesel(diesel::result::Error),
    Row(RowConversionError),
}

impl From<diesel::result::Error> for ResolveFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl From<ResolveFailure> for PaymentAttemptRepositoryError {
    fn from(failure: ResolveFailure) -> Self {
        match failure {
            ResolveFailure::Diesel(error) => map_diesel_error(error),
            ResolveFailure::Row(error) => map_row_error(error),
        }
    }
}

/// Extend the user's premium window from the later of `now` and the current
/// expiry. Returns the new expiry, or `None` when the user is gone.
async fn extend_premium(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
    days: i64,
) -> Result<Option<DateTime<Utc>>, ResolveFailure> {
    let Some(current) = users::table
        .filter(users::id.eq(user_id))
        .select(UserRow::as_select())
        .for_update()
        .first::<UserRow>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let extended = current
        .subscription()
        .map_err(ResolveFailure::Row)?
        .extended_premium(now, days);
    diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(subscription_update(&extended, now))
        .execute(conn)
        .await?;
    Ok(extended.expiry_date)
}

#[async_trait]
impl PaymentAttemptRepository for DieselPaymentAttemptRepository {
    async fn insert(
        &self,
        attempt: &NewPaymentAttempt,
    ) -> Result<PaymentAttempt, PaymentAttemptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPaymentAttemptRow {
            id: *attempt.id.as_uuid(),
            checkout_request_id: &attempt.acknowledgement.checkout_request_id,
            merchant_request_id: &attempt.acknowledgement.merchant_request_id,
            user_id: attempt.user_id.map(|id| *id.as_uuid()),
            phone: attempt.request.phone.as_ref(),
            plan: attempt.request.plan.as_str(),
            amount_cents: attempt.request.plan.amount().cents(),
            state: PaymentState::Requested.as_str(),
            created_at: attempt.created_at,
        };
        let stored: PaymentAttemptRow = diesel::insert_into(payment_attempts::table)
            .values(&row)
            .returning(PaymentAttemptRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        PaymentAttempt::try_from(stored).map_err(map_row_error)
    }

    async fn resolve_and_extend(
        &self,
        outcome: &CallbackOutcome,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<AttemptResolution>, PaymentAttemptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let resolution = conn
            .transaction::<_, ResolveFailure, _>(|conn| {
                async move {
                    let Some(row) = diesel::update(
                        payment_attempts::table
                            .filter(
                                payment_attempts::checkout_request_id
                                    .eq(&outcome.checkout_request_id),
                            )
                            .filter(payment_attempts::state.eq(PaymentState::Requested.as_str())),
                    )
                    .set((
                        payment_attempts::state.eq(outcome.resolution().as_str()),
                        payment_attempts::result_code.eq(Some(outcome.result_code)),
                        payment_attempts::result_description
                            .eq(Some(&outcome.result_description)),
                        payment_attempts::resolved_at.eq(Some(resolved_at)),
                    ))
                    .returning(PaymentAttemptRow::as_returning())
                    .get_result::<PaymentAttemptRow>(conn)
                    .await
                    .optional()?
                    else {
                        return Ok(None);
                    };
                    let attempt = PaymentAttempt::try_from(row).map_err(ResolveFailure::Row)?;
                    let premium_until = match (attempt.state, attempt.user_id) {
                        (PaymentState::Acknowledged, Some(user_id)) => {
                            extend_premium(
                                conn,
                                *user_id.as_uuid(),
                                resolved_at,
                                attempt.plan.premium_days(),
                            )
                            .await?
                        }
                        _ => None,
                    };
                    Ok(Some(AttemptResolution {
                        attempt,
                        premium_until,
                    }))
                }
                .scope_boxed()
            })
            .await?;
        Ok(resolution)
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentAttempt>, PaymentAttemptRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PaymentAttemptRow> = payment_attempts::table
            .filter(payment_attempts::checkout_request_id.eq(checkout_request_id))
            .select(PaymentAttemptRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(PaymentAttempt::try_from)
            .transpose()
            .map_err(map_row_error)
    }
}
