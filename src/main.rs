use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the pdfshare application
///
/// Serves the REST API: uploads, owner listings, shared documents with their comment
/// threads, share links, invites and the `sendShareEmail` callable.
///
/// # Environment Variables
/// - `PDFSHARE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PDFSHARE_DATA_DIR`: data root for documents, share index and blobs; must exist
///   (default: "pdfshare_data")
/// - `PDFSHARE_PUBLIC_ORIGIN`: origin used in share links and content URLs
/// - `PDFSHARE_MAX_UPLOAD_BYTES`: upload ceiling in bytes
/// - `PDFSHARE_ORPHAN_POLICY`: `keep` or `compensate`
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`: invite delivery
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pdfshare_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = api_rest::startup::rest_addr_from_env();
    tracing::info!("++ Starting pdfshare REST on {}", rest_addr);

    let state = api_rest::startup::app_state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
