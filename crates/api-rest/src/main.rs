//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful during development when only the HTTP surface is needed. The workspace's main
//! `pdfshare-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the pdfshare REST API server
///
/// # Environment Variables
/// - `PDFSHARE_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PDFSHARE_DATA_DIR`, `PDFSHARE_PUBLIC_ORIGIN`, `PDFSHARE_MAX_UPLOAD_BYTES`,
///   `PDFSHARE_ORPHAN_POLICY`: see [`api_rest::startup::core_config_from_env`]
/// - `SMTP_*`: see [`api_rest::startup::dispatcher_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration is invalid or the data directory is missing,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = api_rest::startup::rest_addr_from_env();
    tracing::info!("-- Starting pdfshare REST API on {}", addr);

    let state = api_rest::startup::app_state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
