//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the report REST API on its own.
//!
//! ## Intended use
//! Useful for development when `.env` loading is not wanted; the workspace's main `medstat-run`
//! binary serves the same router after loading `.env`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Medstat REST API server
///
/// # Environment Variables
/// - `MEDSTAT_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - plus the variables read by [`api_rest::state_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or data directory is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medstat_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr =
        std::env::var("MEDSTAT_REST_ADDR").unwrap_or_else(|_| api_rest::DEFAULT_REST_ADDR.into());
    let state = api_rest::state_from_env()?;

    tracing::info!("-- Starting Medstat REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
