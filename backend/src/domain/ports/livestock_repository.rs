//! Ports for livestock records and their log entries.

use async_trait::async_trait;

use crate::domain::{
    Livestock, LivestockId, LivestockLog, LogDateRange, LogEntry, LogId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by livestock and livestock log adapters.
    pub enum LivestockRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "livestock repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "livestock repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LivestockRepository: Send + Sync {
    async fn insert(&self, livestock: &Livestock) -> Result<(), LivestockRepositoryError>;

    /// Animals owned by `user`, newest first.
    async fn list_for_user(&self, user: &UserId)
    -> Result<Vec<Livestock>, LivestockRepositoryError>;

    /// Fetch an animal only when `user` owns it.
    async fn find_owned(
        &self,
        user: &UserId,
        id: &LivestockId,
    ) -> Result<Option<Livestock>, LivestockRepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LivestockLogRepository: Send + Sync {
    async fn insert(&self, log: &LivestockLog) -> Result<(), LivestockRepositoryError>;

    /// Logs of one animal ordered by `log_date` descending, optionally
    /// restricted to an inclusive date range.
    async fn list(
        &self,
        livestock: &LivestockId,
        range: Option<LogDateRange>,
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError>;

    /// Logs of several animals ordered by `log_date` descending.
    async fn list_for_livestock(
        &self,
        livestock: &[LivestockId],
    ) -> Result<Vec<LivestockLog>, LivestockRepositoryError>;

    /// Replace a log's fields when its animal belongs to `owner`.
    ///
    /// Returns `false` when no row matched.
    async fn update(
        &self,
        owner: &UserId,
        id: &LogId,
        entry: &LogEntry,
    ) -> Result<bool, LivestockRepositoryError>;

    /// Delete a log when its animal belongs to `owner`.
    ///
    /// Returns `false` when no row matched.
    async fn delete(&self, owner: &UserId, id: &LogId) -> Result<bool, LivestockRepositoryError>;
}
