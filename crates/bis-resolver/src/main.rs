//! BIS Resolver Service - species lookups across biodiversity sources
//!
//! Exposes every source adapter over HTTP with an envelope cache.

mod config;
mod error;
mod server;
mod sources;
mod types;

use crate::config::Config;
use crate::error::Result;
use crate::server::{start_server, ServerState, SharedState};
use crate::sources::Sources;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env().add_directive("bis_resolver=info".parse()?);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_stackdriver::layer())
        .init();

    info!("Starting BIS Resolver Service...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    if config.iucn_token.is_none() {
        info!("IUCN_TOKEN not set, IUCN lookups will fail");
    }

    let state: SharedState = Arc::new(ServerState::new(Sources::new(&config)));

    start_server(state, config.port).await?;

    Ok(())
}
