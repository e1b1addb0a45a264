//! # Plumb Courier - Pipeline Submission
//!
//! Submits a pipeline to the analysis service and prints the outcome.
//!
//! ## Usage
//!
//! ```text
//! plumb-courier [pipeline.json]
//! ```
//!
//! Without an argument the starter pipeline (Input → Text → LLM → Output) is
//! submitted. Endpoints come from the YAML file named by `PLUMB_CONFIG`
//! (default `plumb.yaml`) and can be overridden with a comma-separated
//! `PLUMB_ENDPOINTS`.

use anyhow::Result;
use plumb_courier::{Courier, EditorSession, Notification, Severity};
use plumb_libs::{default_pipeline, load_config, GraphStore, SubmissionConfig, TransportGraph};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolve the submission configuration from file and environment
fn resolve_config() -> Result<SubmissionConfig> {
    let config_path = std::env::var("PLUMB_CONFIG").unwrap_or_else(|_| "plumb.yaml".to_string());

    let mut config = if Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
        load_config(&config_path)?
    } else {
        warn!("{} not found, using default endpoints", config_path);
        SubmissionConfig::default()
    };

    if let Ok(list) = std::env::var("PLUMB_ENDPOINTS") {
        config = config.with_endpoint_override(&list);
    }

    config.validate()?;
    Ok(config)
}

/// Load the graph to submit: a transport JSON file, or the starter pipeline
fn load_graph(path: Option<String>) -> Result<GraphStore> {
    match path {
        Some(path) => {
            info!("Loading pipeline from {}", path);
            let json = std::fs::read_to_string(&path)?;
            Ok(GraphStore::from_transport(TransportGraph::from_json(&json)?)?)
        }
        None => Ok(default_pipeline()?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plumb_courier=info,plumb_libs=info".into()),
        )
        .init();

    info!("Starting Plumb Courier");

    let config = resolve_config()?;
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        info!("  {}. {}", i + 1, endpoint);
    }

    let store = load_graph(std::env::args().nth(1))?;
    info!(
        "Pipeline has {} nodes and {} edges",
        store.nodes().len(),
        store.edges().len()
    );

    let courier = Arc::new(Courier::from_config(&config)?);
    let mut session = EditorSession::new(store, courier);

    let outcome = session.submit()?.outcome().await;
    let notification = Notification::from_outcome(&outcome);

    match notification.severity {
        Severity::Info => println!("{}", notification),
        Severity::Error => eprintln!("{}", notification),
    }

    outcome?;
    Ok(())
}
