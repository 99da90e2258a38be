//! Yarn Sort puzzle server.
//!
//! Each WebSocket connection plays its own puzzle session against a shared
//! level catalog.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod levels;
mod protocol;
mod server;
mod session;

use config::ServerConfig;
use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    info!("Starting Yarn Sort server...");

    let catalog = levels::load_catalog(&config.levels_path).await;
    let state = Arc::new(ServerState::new(catalog));

    server::run_server(config.addr, state).await
}
