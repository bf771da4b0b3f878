mod config;
mod errors;
mod explore;
mod models;
mod routes;
mod search_client;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::explore::controller::SystemClock;
use crate::explore::session::SessionStore;
use crate::routes::build_router;
use crate::search_client::HttpSearchClient;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Directory API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize search backend client
    let search = HttpSearchClient::new(
        config.search_backend_url.clone(),
        config.search_api_key.clone(),
        Duration::from_secs(config.search_timeout_secs),
    )?;
    info!(
        "Search client initialized ({}, timeout {}s)",
        config.search_backend_url, config.search_timeout_secs
    );

    // Session registry + idle sweeper
    let sessions = Arc::new(SessionStore::new(
        Arc::new(search),
        Arc::new(SystemClock),
        chrono::Duration::seconds(i64::from(config.session_idle_ttl_secs)),
    ));
    sessions.clone().spawn_sweeper(SESSION_SWEEP_INTERVAL);
    info!(
        "Explore sessions expire after {}s idle",
        config.session_idle_ttl_secs
    );

    let state = AppState { sessions };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
