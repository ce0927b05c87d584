use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventstore::backend::sqlite::SqliteBackend;
use eventstore::backend::EventStore;
use eventstore::config::Config;
use eventstore::http::{router, AppState};
use eventstore::render::IndexPage;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("eventstore=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn EventStore> = if config.database_path == ":memory:" {
        Arc::new(SqliteBackend::memory()?)
    } else {
        Arc::new(SqliteBackend::open(&config.database_path, config.pool_size)?)
    };

    let state = Arc::new(AppState {
        store,
        renderer: Arc::new(IndexPage::new("Particle events")),
        webhook_secret: config.webhook_secret.clone(),
    });

    let addr = config.bind_addr();
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
