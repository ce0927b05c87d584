//! Storage and HTTP surface for events published by Particle cloud webhooks.
//!
//! Devices publish `{event, data, published_at}` payloads to
//! `/particle-webhook`; `/` and `/metrics` read the most recent ones back as
//! an HTML page or a JSON document.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod render;
pub mod retrieval;

pub use backend::model::{Event, EventKey};
pub use backend::{EventQuery, EventStore, Order, StoreError};
pub use error::Error;
