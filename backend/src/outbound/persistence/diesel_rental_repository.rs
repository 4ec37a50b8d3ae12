//! PostgreSQL-backed `RentalRepository` implementation using Diesel ORM.
//!
//! Rental creation locks the equipment row (`FOR UPDATE`) for the duration
//! of the transaction so the price used for the quote is the price at
//! insert time. Decisions use a single guarded `UPDATE` that only matches
//! pending rows owned by the deciding owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{RentalCreation, RentalRepository, RentalRepositoryError};
use crate::domain::{
    Money, Rental, RentalDecision, RentalId, RentalQuote, RentalRequest, RentalStatus,
    RentalSummary, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, pool_error_message};
use super::models::{NewRentalRow, RentalRow, RowConversionError};
use super::pool::{DbPool, PoolError};
use super::schema::{equipment, rentals, users};

#[derive(Clone)]
pub struct DieselRentalRepository {
    pool: DbPool,
}

impl DieselRentalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RentalRepositoryError {
    RentalRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> RentalRepositoryError {
    map_basic_diesel_error(
        error,
        RentalRepositoryError::query,
        RentalRepositoryError::connection,
    )
}

fn map_row_error(error: RowConversionError) -> RentalRepositoryError {
    RentalRepositoryError::query(error.to_string())
}

fn into_summaries(
    rows: Vec<(RentalRow, String, String)>,
) -> Result<Vec<RentalSummary>, RentalRepositoryError> {
    rows.into_iter()
        .map(|(row, equipment_name, farmer_username)| {
            Rental::try_from(row).map(|rental| RentalSummary {
                rental,
                equipment_name,
                farmer_username,
            })
        })
        .collect::<Result<_, _>>()
        .map_err(map_row_error)
}

#[async_trait]
impl RentalRepository for DieselRentalRepository {
    async fn create(
        &self,
        id: RentalId,
        request: &RentalRequest,
        created_at: DateTime<Utc>,
    ) -> Result<RentalCreation, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let equipment_id = *request.equipment_id.as_uuid();
        let creation: Result<RentalCreation, RowConversionError> = conn
            .transaction(|conn| {
                async move {
                    let Some((owner_id, price_cents)) = equipment::table
                        .filter(equipment::id.eq(equipment_id))
                        .select((equipment::owner_id, equipment::price_per_day_cents))
                        .for_update()
                        .first::<(uuid::Uuid, i64)>(conn)
                        .await
                        .optional()?
                    else {
                        return Ok(Ok(RentalCreation::EquipmentMissing));
                    };

                    let quote = match Money::from_cents(price_cents)
                        .and_then(|price| RentalQuote::for_period(price, &request.period))
                    {
                        Ok(quote) => quote,
                        Err(error) => return Ok(Ok(RentalCreation::Rejected(error))),
                    };

                    let row = NewRentalRow {
                        id: *id.as_uuid(),
                        equipment_id,
                        farmer_id: *request.farmer_id.as_uuid(),
                        owner_id,
                        start_date: request.period.start(),
                        end_date: request.period.end(),
                        duration_days: quote.duration_days,
                        total_cost_cents: quote.total_cost.cents(),
                        status: RentalStatus::Pending.as_str(),
                        customer_email: &request.contact.customer_email,
                        customer_address: &request.contact.customer_address,
                        rental_purpose: &request.contact.rental_purpose,
                        created_at,
                    };
                    let stored = diesel::insert_into(rentals::table)
                        .values(&row)
                        .returning(RentalRow::as_returning())
                        .get_result::<RentalRow>(conn)
                        .await?;
                    Ok(Rental::try_from(stored).map(RentalCreation::Created))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        creation.map_err(map_row_error)
    }

    async fn find(&self, id: &RentalId) -> Result<Option<Rental>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RentalRow> = rentals::table
            .filter(rentals::id.eq(id.as_uuid()))
            .select(RentalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Rental::try_from).transpose().map_err(map_row_error)
    }

    async fn decide(
        &self,
        id: &RentalId,
        owner: &UserId,
        decision: RentalDecision,
    ) -> Result<Option<Rental>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RentalRow> = diesel::update(
            rentals::table
                .filter(rentals::id.eq(id.as_uuid()))
                .filter(rentals::owner_id.eq(owner.as_uuid()))
                .filter(rentals::status.eq(RentalStatus::Pending.as_str())),
        )
        .set((
            rentals::status.eq(decision.target().as_str()),
            rentals::updated_at.eq(Utc::now()),
        ))
        .returning(RentalRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        row.map(Rental::try_from).transpose().map_err(map_row_error)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = rentals::table
            .inner_join(equipment::table)
            .inner_join(users::table.on(users::id.eq(rentals::farmer_id)))
            .filter(rentals::owner_id.eq(owner.as_uuid()))
            .order(rentals::created_at.desc())
            .select((RentalRow::as_select(), equipment::name, users::username))
            .load::<(RentalRow, String, String)>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_summaries(rows)
    }

    async fn list_for_farmer(
        &self,
        farmer: &UserId,
    ) -> Result<Vec<RentalSummary>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = rentals::table
            .inner_join(equipment::table)
            .inner_join(users::table.on(users::id.eq(rentals::farmer_id)))
            .filter(rentals::farmer_id.eq(farmer.as_uuid()))
            .order(rentals::created_at.desc())
            .select((RentalRow::as_select(), equipment::name, users::username))
            .load::<(RentalRow, String, String)>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_summaries(rows)
    }
}
