use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Medstat application
///
/// Loads `.env`, then serves the report REST API with OpenAPI/Swagger UI.
///
/// # Environment Variables
/// - `MEDSTAT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDSTAT_DATA_DIR`: Directory holding one `<kind>.json` record file per report kind
///   (default: "data")
/// - `MEDSTAT_REPORT_TIMEOUT_MS`: Per-request report timeout (default: 10000)
/// - `MEDSTAT_MIN_YEAR`, `MEDSTAT_MAX_YEAR`: Supported year range (default: 1900-2100)
/// - `MEDSTAT_ORGANISATION`: Organisation named in narratives
/// - `MEDSTAT_LOG_UNKNOWN`: Log each record with an unknown status
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medstat_run=info".parse()?)
                .add_directive("medstat_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("MEDSTAT_REST_ADDR").unwrap_or_else(|_| api_rest::DEFAULT_REST_ADDR.into());
    let state = api_rest::state_from_env()?;

    tracing::info!("++ Starting Medstat REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state)).await?;

    Ok(())
}
