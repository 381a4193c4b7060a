use std::net::SocketAddr;

use anyhow::Context;
use common::storage::StagingStore;
use server::config::AppConfig;
use server::state::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    server::telemetry::init(&config.logging)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState::from_config(config)
        .await
        .context("Failed to open storage root")?;
    info!(root = %state.store.root().display(), "Staging store ready");

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
