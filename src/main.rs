//! wishwall-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wishwall_gateway::api;
use wishwall_gateway::app_state::AppState;
use wishwall_gateway::config::WallConfig;
use wishwall_gateway::domain::EventBus;
use wishwall_gateway::store::{InMemoryControlsStore, PostgresContentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; LOG_FORMAT=json switches to structured output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config =
        WallConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        persistence = config.persistence_enabled,
        end_of_queue_policy = %config.end_of_queue_policy,
        "starting wishwall-gateway"
    );

    // Build stores and application state
    let app_state = if config.persistence_enabled {
        let content = PostgresContentStore::connect(&config)
            .await
            .context("failed to connect content store")?;
        let event_bus = EventBus::new(config.event_bus_capacity);
        let controls = Arc::new(InMemoryControlsStore::new(event_bus.clone()));
        AppState::new(&config, Arc::new(content), controls, event_bus)
    } else {
        AppState::in_memory(&config)
    };

    // Build router
    let displays = Arc::clone(&app_state.displays);
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    displays.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
