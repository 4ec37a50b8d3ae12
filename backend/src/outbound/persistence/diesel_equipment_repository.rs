//! PostgreSQL-backed `EquipmentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EquipmentRepository, EquipmentRepositoryError};
use crate::domain::{Equipment, EquipmentDetails, EquipmentId, UserId};

use super::diesel_basic_error_mapping::{DieselFailure, classify, pool_error_message};
use super::models::{EquipmentRow, EquipmentUpdate, NewEquipmentRow, RowConversionError};
use super::pool::{DbPool, PoolError};
use super::schema::equipment;

#[derive(Clone)]
pub struct DieselEquipmentRepository {
    pool: DbPool,
}

impl DieselEquipmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EquipmentRepositoryError {
    EquipmentRepositoryError::connection(pool_error_message(error))
}

/// Rentals reference equipment with `ON DELETE RESTRICT`, so a foreign key
/// violation on delete means the listing is still in use.
fn map_diesel_error(error: diesel::result::Error) -> EquipmentRepositoryError {
    match classify(error) {
        DieselFailure::ForeignKeyViolation(_) => EquipmentRepositoryError::in_use(),
        DieselFailure::Connection => {
            EquipmentRepositoryError::connection("database connection error")
        }
        DieselFailure::UniqueViolation(_) => {
            EquipmentRepositoryError::query("unique constraint violated")
        }
        DieselFailure::Query(message) => EquipmentRepositoryError::query(message),
    }
}

fn map_row_error(error: RowConversionError) -> EquipmentRepositoryError {
    EquipmentRepositoryError::query(error.to_string())
}

fn into_equipment(rows: Vec<EquipmentRow>) -> Result<Vec<Equipment>, EquipmentRepositoryError> {
    rows.into_iter()
        .map(Equipment::try_from)
        .collect::<Result<_, _>>()
        .map_err(map_row_error)
}

#[async_trait]
impl EquipmentRepository for DieselEquipmentRepository {
    async fn list_all(&self) -> Result<Vec<Equipment>, EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = equipment::table
            .order(equipment::created_at.desc())
            .select(EquipmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_equipment(rows)
    }

    async fn find(&self, id: &EquipmentId) -> Result<Option<Equipment>, EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<EquipmentRow> = equipment::table
            .filter(equipment::id.eq(id.as_uuid()))
            .select(EquipmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Equipment::try_from).transpose().map_err(map_row_error)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Equipment>, EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = equipment::table
            .filter(equipment::owner_id.eq(owner.as_uuid()))
            .order(equipment::created_at.desc())
            .select(EquipmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_equipment(rows)
    }

    async fn insert(&self, listing: &Equipment) -> Result<(), EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewEquipmentRow {
            id: *listing.id.as_uuid(),
            owner_id: *listing.owner_id.as_uuid(),
            name: &listing.name,
            description: &listing.description,
            price_per_day_cents: listing.price_per_day.cents(),
            image: listing.image.as_deref(),
        };
        diesel::insert_into(equipment::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &EquipmentId,
        details: &EquipmentDetails,
    ) -> Result<bool, EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = EquipmentUpdate {
            name: details.name(),
            description: details.description(),
            price_per_day_cents: details.price_per_day().cents(),
            image: details.image(),
            updated_at: Utc::now(),
        };
        let affected = diesel::update(
            equipment::table
                .filter(equipment::id.eq(id.as_uuid()))
                .filter(equipment::owner_id.eq(owner.as_uuid())),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: &EquipmentId,
    ) -> Result<bool, EquipmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(
            equipment::table
                .filter(equipment::id.eq(id.as_uuid()))
                .filter(equipment::owner_id.eq(owner.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }
}
