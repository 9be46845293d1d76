//! Carlist gateway
//!
//! Serves the marketplace client core over a local HTTP API.

use anyhow::{Context, Result};
use carlist::{
    cache, config,
    network::{BackendClient, NetworkMonitor, SessionStore},
    search::Search,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting carlist v{}", carlist::VERSION);

    // Load configuration
    let settings = config::load()?;
    info!("Using backend {}", settings.backend.api_host);

    // Backend client and offline cache
    let client = BackendClient::with_settings(&settings, SessionStore::new())
        .context("failed to build backend client")?;
    let store = cache::open(&settings.cache).context("failed to open offline cache")?;
    info!("Offline cache ready ({:?})", settings.cache.backend);

    // Reachability probe
    let monitor = NetworkMonitor::start(&settings.backend.api_host, &settings.reachability)
        .context("invalid backend host")?;

    let search = Search::new(client, store, Arc::new(monitor)).with_feed_limit(settings.cache.feed_limit);
    let state = AppState::new(settings.clone(), search)?;
    let app = create_router(state);

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
