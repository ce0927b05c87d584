pub mod model;
pub mod sqlite;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use model::{Event, EventKey};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("stored row is not a valid event: {0}")]
    Corrupt(String),
    #[error("store task did not complete: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Most recent first.
    #[default]
    TimeDescending,
    TimeAscending,
}

/// Selection of stored events: an ordering, an optional inclusive lower
/// bound on `time`, and a row cap. `limit: None` returns every match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub order: Order,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn latest(limit: Option<usize>) -> Self {
        Self {
            order: Order::TimeDescending,
            since: None,
            limit,
        }
    }

    pub fn since(time: DateTime<Utc>, limit: Option<usize>) -> Self {
        Self {
            order: Order::TimeDescending,
            since: Some(time),
            limit,
        }
    }
}

/// An ordered event store. Inserts are atomic per row; reads are not
/// required to observe concurrent writes.
pub trait EventStore: Send + Sync {
    fn insert(&self, event: &Event) -> Result<EventKey, StoreError>;

    /// Events matching `query`; equal timestamps are ordered by insertion,
    /// in the same direction as `query.order`.
    fn query(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError>;
}

/// Runs one store operation on the blocking thread pool.
pub async fn run_blocking<T, F>(store: &Arc<dyn EventStore>, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn EventStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
}
