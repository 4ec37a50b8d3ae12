//! PostgreSQL-backed livestock and livestock log repositories.
//!
//! Log mutations are scoped to the owning farmer through a sub-select on
//! `livestock.user_id`, so a single statement both authorises and applies
//! the change.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    LivestockLogRepository, LivestockRepository, LivestockRepositoryError,
};
use crate::domain::{
    Livestock, LivestockId, LivestockLog, LogDateRange, LogEntry, LogId, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, pool_error_message};
use super::models::{
    LivestockLogRow, LivestockLogUpdate, LivestockRow, NewLivestockLogRow, NewLivestockRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{livestock, livestock_logs};

fn map_pool_error(error: PoolError) -> LivestockRepositoryError {
    LivestockRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> LivestockRepositoryError {
    map_basic_diesel_error(
        error,
        LivestockRepositoryError::query,
        LivestockRepositoryError::connection,
    )
}

#[derive(Clone)]
pub struct DieselLivestockRepository {
    pool: DbPool,
}

impl DieselLivestockRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LivestockRepository for DieselLivestockRepository {
    async fn insert(&self, animal: &Livestock) -> Result<(), LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewLivestockRow {
            id: *animal.id.as_uuid(),
            user_id: *animal.user_id.as_uuid(),
            name: &animal.name,
            livestock_type: &animal.livestock_type,
            region: &animal.region,
            breed: &animal.breed,
            dob: animal.dob,
        };
        diesel::insert_into(livestock::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Livestock>, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = livestock::table
            .filter(livestock::user_id.eq(user.as_uuid()))
            .order(livestock::created_at.desc())
            .select(LivestockRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Livestock::from).collect())
    }

    async fn find_owned(
        &self,
        user: &UserId,
        id: &LivestockId,
    ) -> Result<Option<Livestock>, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LivestockRow> = livestock::table
            .filter(livestock::id.eq(id.as_uuid()))
            .filter(livestock::user_id.eq(user.as_uuid()))
            .select(LivestockRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Livestock::from))
    }
}

#[derive(Clone)]
pub struct DieselLivestockLogRepository {
    pool: DbPool,
}

impl DieselLivestockLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LivestockLogRepository for DieselLivestockLogRepository {
    async fn insert(&self, log: &LivestockLog) -> Result<(), LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewLivestockLogRow {
            id: *log.id.as_uuid(),
            livestock_id: *log.livestock_id.as_uuid(),
            log_date: log.entry.log_date,
            feed: log.entry.feed.as_deref(),
            production: log.entry.production,
            symptoms: log.entry.symptoms.as_deref(),
        };
        diesel::insert_into(livestock_logs::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list(
        &self,
        animal: &LivestockId,
        range: Option<LogDateRange>,
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = livestock_logs::table
            .filter(livestock_logs::livestock_id.eq(animal.as_uuid()))
            .into_boxed();
        if let Some(range) = range {
            query = query
                .filter(livestock_logs::log_date.ge(range.start()))
                .filter(livestock_logs::log_date.le(range.end()));
        }
        let rows = query
            .order((livestock_logs::log_date.desc(), livestock_logs::created_at.desc()))
            .select(LivestockLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(LivestockLog::from).collect())
    }

    async fn list_for_livestock(
        &self,
        animals: &[LivestockId],
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<uuid::Uuid> = animals.iter().map(|id| *id.as_uuid()).collect();
        let rows = livestock_logs::table
            .filter(livestock_logs::livestock_id.eq_any(ids))
            .order((livestock_logs::log_date.desc(), livestock_logs::created_at.desc()))
            .select(LivestockLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(LivestockLog::from).collect())
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &LogId,
        entry: &LogEntry,
    ) -> Result<bool, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned_livestock = livestock::table
            .filter(livestock::user_id.eq(*owner.as_uuid()))
            .select(livestock::id);
        let changes = LivestockLogUpdate {
            log_date: entry.log_date,
            feed: entry.feed.as_deref(),
            production: entry.production,
            symptoms: entry.symptoms.as_deref(),
            updated_at: Utc::now(),
        };
        let affected = diesel::update(
            livestock_logs::table
                .filter(livestock_logs::id.eq(id.as_uuid()))
                .filter(livestock_logs::livestock_id.eq_any(owned_livestock)),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }

    async fn delete(&self, owner: &UserId, id: &LogId) -> Result<bool, LivestockRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned_livestock = livestock::table
            .filter(livestock::user_id.eq(*owner.as_uuid()))
            .select(livestock::id);
        let affected = diesel::delete(
            livestock_logs::table
                .filter(livestock_logs::id.eq(id.as_uuid()))
                .filter(livestock_logs::livestock_id.eq_any(owned_livestock)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected > 0)
    }
}
