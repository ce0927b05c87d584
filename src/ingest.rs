//! Accepting events from the Particle webhook.

use std::sync::Arc;

use axum::http::{header, HeaderMap, Method};
use tracing::{debug, info};

use crate::backend::model::{Event, EventKey};
use crate::backend::{run_blocking, EventStore};
use crate::error::Error;

/// Outcome of an accepted webhook call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Stored(EventKey),
    /// Read-only verbs are accepted and ignored.
    Ignored,
}

/// Checks the credential, then stores the body as one event if `method`
/// is a write. Malformed bodies are rejected, never stored as placeholders.
pub async fn ingest(
    store: &Arc<dyn EventStore>,
    secret: &str,
    method: &Method,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Ingested, Error> {
    authorize(secret, headers)?;

    if *method == Method::GET || *method == Method::HEAD {
        debug!(%method, "ignoring read-only webhook request");
        return Ok(Ingested::Ignored);
    }

    let event = decode(body)?;
    info!(event = %event.name, data = %event.data, published_at = %event.time, "received event");

    let key = run_blocking(store, move |store| store.insert(&event)).await?;
    Ok(Ingested::Stored(key))
}

/// The `Authorization` header must equal `secret` exactly; a missing or
/// non-UTF-8 header never matches.
pub fn authorize(secret: &str, headers: &HeaderMap) -> Result<(), Error> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), secret.as_bytes()) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

pub fn decode(body: &[u8]) -> Result<Event, Error> {
    serde_json::from_slice(body).map_err(Error::Decode)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
