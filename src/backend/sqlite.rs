use std::fmt::Debug;
use std::path::Path;

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Params, Row};
use tracing::{debug, info, instrument};

use super::model::{Event, EventKey};
use super::{EventQuery, EventStore, Order, StoreError};

pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
}

static CREATE_TABLE_STMT: &str = "CREATE TABLE IF NOT EXISTS Event(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                data TEXT NOT NULL,
                time INTEGER NOT NULL
            )";

static CREATE_INDEX_STMT: &str = "CREATE INDEX IF NOT EXISTS event_time ON Event(time)";

static INSERT_STMT: &str = "INSERT INTO Event(name, data, time) VALUES (?1, ?2, ?3)";

static SELECT_STMT: &str = "SELECT id, name, data, time FROM Event";

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("pool", &self.pool.state())
            .finish()
    }
}

impl SqliteBackend {
    /// In-memory store. Every connection to `:memory:` is a separate
    /// database, so the pool holds exactly one and never recycles it.
    pub fn memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;
        Self::with_pool(pool)
    }

    pub fn open(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
        });
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Self::with_pool(pool)
    }

    fn with_pool(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        let backend = Self { pool };
        backend.init_tables()?;
        info!(pool = ?backend.pool.state(), "sqlite event store ready");
        Ok(backend)
    }

    #[instrument]
    fn init_tables(&self) -> Result<(), StoreError> {
        let _span = tracing::debug_span!("creating tables").entered();
        let conn = self.pool.get()?;
        conn.execute(CREATE_TABLE_STMT, params![])?;
        debug!(executed_query = CREATE_TABLE_STMT, "executed query");
        conn.execute(CREATE_INDEX_STMT, params![])?;
        debug!(executed_query = CREATE_INDEX_STMT, "executed query");
        Ok(())
    }
}

impl EventStore for SqliteBackend {
    #[instrument(skip(self, event), fields(event = %event.name))]
    fn insert(&self, event: &Event) -> Result<EventKey, StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            INSERT_STMT,
            params![event.name, event.data, event.time.timestamp_micros()],
        )?;
        let key = EventKey(conn.last_insert_rowid());
        debug!(%key, "inserted event");
        Ok(key)
    }

    #[instrument(skip(self))]
    fn query(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let direction = match query.order {
            Order::TimeDescending => "DESC",
            Order::TimeAscending => "ASC",
        };
        // sqlite treats a negative LIMIT as unbounded
        let limit = query
            .limit
            .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));

        let conn = self.pool.get()?;
        let rows = match query.since {
            Some(since) => {
                let sql = format!(
                    "{SELECT_STMT} WHERE time >= ?1 ORDER BY time {direction}, id {direction} LIMIT ?2"
                );
                fetch_rows(&conn, &sql, params![since.timestamp_micros(), limit])?
            }
            None => {
                let sql = format!("{SELECT_STMT} ORDER BY time {direction}, id {direction} LIMIT ?1");
                fetch_rows(&conn, &sql, params![limit])?
            }
        };
        debug!(rows = rows.len(), "fetched events");

        rows.into_iter().map(StoredRow::into_event).collect()
    }
}

struct StoredRow {
    id: i64,
    name: String,
    data: String,
    time: i64,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            data: row.get(2)?,
            time: row.get(3)?,
        })
    }

    fn into_event(self) -> Result<Event, StoreError> {
        let time = DateTime::<Utc>::from_timestamp_micros(self.time).ok_or_else(|| {
            StoreError::Corrupt(format!("row {} has out of range time {}", self.id, self.time))
        })?;
        Ok(Event {
            name: self.name,
            data: self.data,
            time,
        })
    }
}

fn fetch_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<StoredRow>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, StoredRow::from_row)?;
    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
