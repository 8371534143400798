//! Meetgate API server
//!
//! Serves the meeting page, the same-origin join endpoint and the network
//! meeting-link API, and runs the lifecycle worker in the background.

mod render;
mod routes;
mod session;
mod state;
mod worker;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use meetgate_core::AccessConfig;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::session::SessionKeys;
use crate::state::AppState;
use crate::worker::start_lifecycle_worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meetgate_server=debug,meetgate_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("MG_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".mg-data"));
    tracing::info!("Using data directory: {:?}", data_dir);

    let config = AccessConfig::from_env();
    if config.testing_mode {
        tracing::warn!("Testing mode is active: meeting time restrictions are bypassed");
    }
    tracing::info!(site = %config.site_url, "Serving meetings");

    let app_state = AppState::new(data_dir, config, SessionKeys::from_env())
        .await
        .context("Failed to initialize application state")?;

    start_lifecycle_worker(app_state.clone());

    let app = routes::router()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = std::env::var("MG_BIND_ADDR")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8081)));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
