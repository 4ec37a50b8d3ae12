//! Livestock registry and per-animal log book.
//!
//! Every log operation is scoped to animals owned by the caller. An animal
//! that exists but belongs to someone else is indistinguishable from one
//! that does not exist.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    LivestockLogRepository, LivestockRepository, LivestockRepositoryError,
};
use crate::domain::{
    Error, Livestock, LivestockDetails, LivestockId, LivestockLog, LivestockWithLogs,
    LogDateRange, LogEntry, LogId, User,
};

pub const LIVESTOCK_NOT_FOUND_MESSAGE: &str = "Livestock not found";
pub const LOG_NOT_FOUND_MESSAGE: &str = "Log not found";

fn map_livestock_error(error: LivestockRepositoryError) -> Error {
    match error {
        LivestockRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("livestock repository unavailable: {message}"))
        }
        other => Error::internal(format!("livestock repository error: {other}")),
    }
}

/// Fields of a quick log submitted from the monitor form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickLog<'a> {
    pub feed: Option<&'a str>,
    pub production: Option<f64>,
    pub symptoms: Option<&'a str>,
}

#[derive(Clone)]
pub struct LivestockService {
    livestock: Arc<dyn LivestockRepository>,
    logs: Arc<dyn LivestockLogRepository>,
    clock: Arc<dyn Clock>,
}

impl LivestockService {
    pub fn new(
        livestock: Arc<dyn LivestockRepository>,
        logs: Arc<dyn LivestockLogRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            livestock,
            logs,
            clock,
        }
    }

    pub async fn register(&self, user: &User, details: LivestockDetails) -> Result<Livestock, Error> {
        let animal = Livestock::from_details(LivestockId::random(), *user.id(), details);
        self.livestock
            .insert(&animal)
            .await
            .map_err(map_livestock_error)?;
        info!(livestock_id = %animal.id, user_id = %user.id(), "livestock registered");
        Ok(animal)
    }

    async fn owned(&self, user: &User, id: &LivestockId) -> Result<Livestock, Error> {
        self.livestock
            .find_owned(user.id(), id)
            .await
            .map_err(map_livestock_error)?
            .ok_or_else(|| Error::not_found(LIVESTOCK_NOT_FOUND_MESSAGE))
    }

    /// The caller's animals, each with its logs newest first.
    pub async fn list_with_logs(&self, user: &User) -> Result<Vec<LivestockWithLogs>, Error> {
        let animals = self
            .livestock
            .list_for_user(user.id())
            .await
            .map_err(map_livestock_error)?;
        if animals.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<LivestockId> = animals.iter().map(|animal| animal.id).collect();
        let logs = self
            .logs
            .list_for_livestock(&ids)
            .await
            .map_err(map_livestock_error)?;

        let mut grouped: HashMap<LivestockId, Vec<LivestockLog>> = HashMap::new();
        for log in logs {
            grouped.entry(log.livestock_id).or_default().push(log);
        }
        Ok(animals
            .into_iter()
            .map(|livestock| LivestockWithLogs {
                logs: grouped.remove(&livestock.id).unwrap_or_default(),
                livestock,
            })
            .collect())
    }

    pub async fn get_with_logs(
        &self,
        user: &User,
        id: &LivestockId,
    ) -> Result<LivestockWithLogs, Error> {
        let livestock = self.owned(user, id).await?;
        let logs = self
            .logs
            .list(id, None)
            .await
            .map_err(map_livestock_error)?;
        Ok(LivestockWithLogs { livestock, logs })
    }

    pub async fn add_log(
        &self,
        user: &User,
        livestock_id: &LivestockId,
        entry: LogEntry,
    ) -> Result<LivestockLog, Error> {
        self.owned(user, livestock_id).await?;
        let log = LivestockLog {
            id: LogId::random(),
            livestock_id: *livestock_id,
            entry,
        };
        self.logs.insert(&log).await.map_err(map_livestock_error)?;
        info!(log_id = %log.id, livestock_id = %livestock_id, "livestock log added");
        Ok(log)
    }

    /// Log entry dated today in UTC.
    pub async fn quick_log(
        &self,
        user: &User,
        livestock_id: &LivestockId,
        fields: QuickLog<'_>,
    ) -> Result<LivestockLog, Error> {
        let today = self.clock.utc().date_naive();
        let entry = LogEntry::new(today, fields.feed, fields.production, fields.symptoms)
            .map_err(|error| Error::invalid_request(error.to_string()))?;
        self.add_log(user, livestock_id, entry).await
    }

    /// Logs of one animal. An animal without logs yields an empty list.
    pub async fn list_logs(
        &self,
        user: &User,
        livestock_id: &LivestockId,
    ) -> Result<Vec<LivestockLog>, Error> {
        self.owned(user, livestock_id).await?;
        self.logs
            .list(livestock_id, None)
            .await
            .map_err(map_livestock_error)
    }

    /// Logs whose date falls inside the inclusive `range`.
    pub async fn filter_logs(
        &self,
        user: &User,
        livestock_id: &LivestockId,
        range: LogDateRange,
    ) -> Result<Vec<LivestockLog>, Error> {
        self.owned(user, livestock_id).await?;
        self.logs
            .list(livestock_id, Some(range))
            .await
            .map_err(map_livestock_error)
    }

    pub async fn update_log(&self, user: &User, id: &LogId, entry: &LogEntry) -> Result<(), Error> {
        let updated = self
            .logs
            .update(user.id(), id, entry)
            .await
            .map_err(map_livestock_error)?;
        if !updated {
            return Err(Error::not_found(LOG_NOT_FOUND_MESSAGE));
        }
        Ok(())
    }

    pub async fn delete_log(&self, user: &User, id: &LogId) -> Result<(), Error> {
        let deleted = self
            .logs
            .delete(user.id(), id)
            .await
            .map_err(map_livestock_error)?;
        if !deleted {
            return Err(Error::not_found(LOG_NOT_FOUND_MESSAGE));
        }
        info!(log_id = %id, "livestock log deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "livestock_service_tests.rs"]
mod tests;
