//! # Plumb Assay
//!
//! Standalone analysis service. Listens on `PORT` (default 8000).

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plumb_assay=info,tower_http=info".into()),
        )
        .init();

    info!("Starting Plumb Assay - The Analysis Service");

    let app = plumb_assay::create_router();

    // Get port from environment or use default
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting analysis API server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
