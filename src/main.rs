use anyhow::Context;
use tracing_subscriber::EnvFilter;

use mixer_api::api::{create_router, AppState};
use mixer_api::config::Config;
use mixer_api::storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mixer_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = storage::open(&config)
        .await
        .context("failed to open blend store")?;
    let state = AppState::new(store)
        .await
        .context("failed to initialize application state")?;

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
