//! Correlation identifier for one portal request.
//!
//! The [`crate::Trace`] middleware opens a [`TraceId`] scope per request.
//! [`crate::domain::Error`] values built inside that scope pick the id up,
//! which is how the `traceId` field of an error body matches the `trace-id`
//! response header.
//!
//! Task-locals stop at task boundaries. Password hashing runs through
//! [`TraceId::spawn_blocking`] so its log lines keep the request's id.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task::JoinError;
use tokio::task_local;
use uuid::Uuid;

/// Response header echoing the request's [`TraceId`].
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// Random UUID naming one request.
///
/// ```
/// use agroai::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id: TraceId = "6f1c1f2e-8d1d-4a53-9f5a-2b0c3c1d4e5f".parse().unwrap();
/// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id of the request being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    pub async fn scope<Fut: Future>(id: TraceId, fut: Fut) -> Fut::Output {
        CURRENT.scope(id, fut).await
    }

    /// Run `work` on the blocking pool inside the caller's trace scope.
    pub async fn spawn_blocking<F, T>(work: F) -> Result<T, JoinError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inherited = Self::current();
        tokio::task::spawn_blocking(move || {
            if let Some(id) = inherited {
                CURRENT.sync_scope(id, work)
            } else {
                work()
            }
        })
        .await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
