// API Server Binary Entry Point
//
// Purpose: Start the Axum soil analysis server
// Usage: cargo run --bin api_server

use anyhow::Context;
use soil_scorer_rust::{create_router, AppState, Config};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "soil_scorer_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Configuration:");
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  NDVI window start: {}", config.ndvi_start);
    tracing::info!("  Imagery service: {}", config.imagery.is_some());
    tracing::info!("  Hosted database/auth: {}", config.supabase.is_some());
    tracing::info!("  PDF renderer: {}", config.pdf_renderer_url.is_some());

    let state = AppState::from_config(&config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
