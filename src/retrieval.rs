//! Selecting, ordering and limiting stored events for the query endpoints.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::backend::{run_blocking, EventQuery, EventStore};
use crate::render::{Format, Page};

pub const INDEX_DEFAULT_LIMIT: usize = 20;
pub const METRICS_DEFAULT_LIMIT: usize = 200;
/// Row cap applied whenever a `time` lower bound is given.
pub const TIME_FILTER_LIMIT: usize = 1000;
pub const FETCH_FAILED_NOTICE: &str = "Couldn't get latest events. Refresh?";

/// Raw query-string parameters. Kept as strings so an unparsable value
/// falls back to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalParams {
    pub limit: Option<String>,
    pub time: Option<String>,
}

impl RetrievalParams {
    /// Picks `limit` and `time` out of decoded query pairs. The first
    /// occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "time" => &mut params.time,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

/// One retrieval entry point: how many events to return when the caller
/// doesn't say, and how to encode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retrieval {
    pub default_limit: usize,
    pub format: Format,
}

#[derive(Debug)]
pub struct Retrieved {
    pub status: StatusCode,
    pub page: Page,
}

impl Retrieval {
    pub const INDEX: Self = Self {
        default_limit: INDEX_DEFAULT_LIMIT,
        format: Format::Html,
    };

    pub const METRICS: Self = Self {
        default_limit: METRICS_DEFAULT_LIMIT,
        format: Format::Json,
    };

    /// Most recent first, `limit` or the default; a valid `time` replaces
    /// that with everything since `time`, capped at [`TIME_FILTER_LIMIT`].
    pub fn build_query(&self, params: &RetrievalParams) -> EventQuery {
        match params.time.as_deref().map(parse_time) {
            Some(Ok(since)) => {
                info!(%since, "filtering events by time");
                EventQuery::since(since, Some(TIME_FILTER_LIMIT))
            }
            Some(Err(err)) => {
                debug!(error = %err, "ignoring unparsable time param");
                EventQuery::latest(parse_limit(params.limit.as_deref(), self.default_limit))
            }
            None => EventQuery::latest(parse_limit(params.limit.as_deref(), self.default_limit)),
        }
    }

    pub async fn retrieve(&self, store: &Arc<dyn EventStore>, params: &RetrievalParams) -> Retrieved {
        let query = self.build_query(params);
        match run_blocking(store, move |store| store.query(&query)).await {
            Ok(events) => Retrieved {
                status: StatusCode::OK,
                page: Page::with_events(events),
            },
            Err(err) => {
                error!(error = %err, "getting events");
                Retrieved {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    page: Page::with_notice(FETCH_FAILED_NOTICE),
                }
            }
        }
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|time| time.with_timezone(&Utc))
}

/// A negative limit means no limit at all; anything unparsable means the
/// default.
fn parse_limit(raw: Option<&str>, default: usize) -> Option<usize> {
    match raw.map(str::parse::<i64>) {
        Some(Ok(limit)) if limit < 0 => None,
        Some(Ok(limit)) => Some(usize::try_from(limit).unwrap_or(usize::MAX)),
        Some(Err(_)) | None => Some(default),
    }
}
