use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::backend::EventStore;
use crate::error::Error;
use crate::ingest::{self, Ingested};
use crate::render::{self, Format, Renderer};
use crate::retrieval::{Retrieval, RetrievalParams, Retrieved};

static PLOT_JS: &str = include_str!("../static/plot.js");

/// Dependencies shared by every request. Nothing in here is mutated after
/// startup.
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub renderer: Arc<dyn Renderer>,
    pub webhook_secret: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/_ah/health", get(health))
        .route("/particle-webhook", any(particle_webhook))
        .route("/static/plot.js", get(plot_js))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

async fn index(State(state): State<Arc<AppState>>, Query(pairs): Query<Vec<(String, String)>>) -> Response {
    respond(&state, Retrieval::INDEX, &RetrievalParams::from_pairs(pairs)).await
}

async fn metrics(State(state): State<Arc<AppState>>, Query(pairs): Query<Vec<(String, String)>>) -> Response {
    respond(&state, Retrieval::METRICS, &RetrievalParams::from_pairs(pairs)).await
}

async fn respond(state: &AppState, retrieval: Retrieval, params: &RetrievalParams) -> Response {
    let Retrieved { status, page } = retrieval.retrieve(&state.store, params).await;
    match retrieval.format {
        Format::Html => (status, Html(state.renderer.render_html(&page))).into_response(),
        Format::Json => json_response(status, render::to_json(&page)),
    }
}

fn json_response(status: StatusCode, body: Result<Vec<u8>, serde_json::Error>) -> Response {
    let content_type = [(header::CONTENT_TYPE, "application/json")];
    match body {
        Ok(body) => (status, content_type, body).into_response(),
        Err(err) => {
            let err = Error::Encoding(err);
            tracing::error!(error = %err, "marshalling response json");
            (err.status(), content_type, render::ENCODING_FAILED_JSON).into_response()
        }
    }
}

async fn particle_webhook(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, Error> {
    match ingest::ingest(&state.store, &state.webhook_secret, &method, &headers, &body).await? {
        Ingested::Stored(key) => tracing::info!(%key, "stored event"),
        Ingested::Ignored => {}
    }
    Ok(StatusCode::OK)
}

async fn health() -> &'static str {
    "ok"
}

async fn plot_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], PLOT_JS)
}
