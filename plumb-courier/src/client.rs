//! Submission client.
//!
//! Delivers a serialized pipeline to the first reachable analysis endpoint.
//! Endpoints are probed one at a time, in configuration order:
//!
//! 1. `GET <endpoint>/` fails at the network layer: move on to the next one
//! 2. `GET <endpoint>/` answers non-2xx: stop and report the rejection
//! 3. `GET <endpoint>/` answers 2xx: `POST <endpoint>/pipelines/parse`
//!
//! Probes never run in parallel, so a rejection from a reachable backend is
//! never hidden behind a later backend that happens to accept.

use crate::error::SubmissionError;
use async_trait::async_trait;
use plumb_libs::{AnalysisSummary, SubmissionConfig, TransportGraph};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Path of the analysis request, relative to an endpoint
pub const PARSE_PATH: &str = "/pipelines/parse";

/// Failure of a single HTTP exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No HTTP response at all: connection refused, DNS failure, timeout
    #[error("network error: {0}")]
    Network(String),

    /// An HTTP response with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response whose body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The HTTP client itself could not be built
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

/// HTTP exchanges with an analysis endpoint.
///
/// Implemented over `reqwest` by [`HttpTransport`]; tests substitute
/// in-memory transports to observe which endpoints were contacted.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Liveness probe: unauthenticated `GET <endpoint>/`
    async fn probe(&self, endpoint: &str) -> Result<(), TransportError>;

    /// Analysis request: `POST <endpoint>/pipelines/parse` with the graph as JSON
    async fn parse(
        &self,
        endpoint: &str,
        graph: &TransportGraph,
    ) -> Result<AnalysisSummary, TransportError>;
}

/// Root URL of an endpoint, used by the liveness probe
pub fn root_url(endpoint: &str) -> String {
    format!("{}/", endpoint.trim_end_matches('/'))
}

/// URL of the analysis request for an endpoint
pub fn parse_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), PARSE_PATH)
}

/// `reqwest` implementation of [`AnalysisTransport`]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self { client })
    }

    async fn status_error(response: reqwest::Response) -> TransportError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TransportError::Status { status, body }
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn probe(&self, endpoint: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .get(root_url(endpoint))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        Ok(())
    }

    async fn parse(
        &self,
        endpoint: &str,
        graph: &TransportGraph,
    ) -> Result<AnalysisSummary, TransportError> {
        let response = self
            .client
            .post(parse_url(endpoint))
            .json(graph)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        response
            .json::<AnalysisSummary>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Submission client bound to an ordered endpoint list
pub struct Courier {
    transport: Arc<dyn AnalysisTransport>,
    endpoints: Vec<String>,
}

impl Courier {
    /// Create a courier over any transport
    ///
    /// # Arguments
    ///
    /// * `transport` - HTTP layer used for probes and analysis requests
    /// * `endpoints` - Candidate base URLs, tried in order
    pub fn new(transport: Arc<dyn AnalysisTransport>, endpoints: Vec<String>) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Create a `reqwest`-backed courier from a validated configuration
    pub fn from_config(config: &SubmissionConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(Arc::new(transport), config.endpoints.clone()))
    }

    /// Configured endpoints, in the order they are tried
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Submit `graph` to the configured endpoints
    pub async fn submit(&self, graph: &TransportGraph) -> Result<AnalysisSummary, SubmissionError> {
        self.submit_to(graph, &self.endpoints).await
    }

    /// Submit `graph` to the first reachable endpoint of `endpoints`.
    ///
    /// # Returns
    ///
    /// * `Ok(AnalysisSummary)` - The analysis of the first reachable endpoint
    /// * `Err(SubmissionError::ServerRejected)` - A reachable endpoint refused
    ///   the probe or the analysis request; later endpoints are not tried
    /// * `Err(SubmissionError::AllEndpointsUnreachable)` - Every probe failed
    ///   at the network layer (or the list was empty)
    /// * `Err(SubmissionError::ConnectionLost | InvalidResponse)` - The
    ///   analysis request itself failed after a successful probe
    pub async fn submit_to(
        &self,
        graph: &TransportGraph,
        endpoints: &[String],
    ) -> Result<AnalysisSummary, SubmissionError> {
        info!(
            "Submitting pipeline ({} nodes, {} edges) to {} candidate endpoint(s)",
            graph.nodes.len(),
            graph.edges.len(),
            endpoints.len()
        );

        for endpoint in endpoints {
            match self.transport.probe(endpoint).await {
                Ok(()) => {
                    info!("Endpoint {} is live, sending pipeline", endpoint);
                    return self.analyze(endpoint, graph).await;
                }
                Err(TransportError::Network(reason)) => {
                    warn!("Endpoint {} unreachable ({}), trying next", endpoint, reason);
                }
                Err(TransportError::Status { status, body }) => {
                    error!("Endpoint {} failed its probe with status {}", endpoint, status);
                    return Err(SubmissionError::ServerRejected {
                        endpoint: endpoint.clone(),
                        status,
                        body,
                    });
                }
                Err(other) => {
                    error!("Endpoint {} probe failed: {}", endpoint, other);
                    return Err(SubmissionError::InvalidResponse {
                        endpoint: endpoint.clone(),
                        reason: other.to_string(),
                    });
                }
            }
        }

        error!("No analysis endpoint reachable");
        Err(SubmissionError::AllEndpointsUnreachable {
            attempted: endpoints.to_vec(),
        })
    }

    async fn analyze(
        &self,
        endpoint: &str,
        graph: &TransportGraph,
    ) -> Result<AnalysisSummary, SubmissionError> {
        match self.transport.parse(endpoint, graph).await {
            Ok(summary) => {
                info!(
                    "Analysis complete: {} nodes, {} edges, is_dag={}",
                    summary.num_nodes, summary.num_edges, summary.is_dag
                );
                Ok(summary)
            }
            Err(TransportError::Status { status, body }) => {
                error!("Endpoint {} rejected the pipeline with status {}", endpoint, status);
                Err(SubmissionError::ServerRejected {
                    endpoint: endpoint.to_string(),
                    status,
                    body,
                })
            }
            Err(TransportError::Network(reason)) => Err(SubmissionError::ConnectionLost {
                endpoint: endpoint.to_string(),
                reason,
            }),
            Err(other) => Err(SubmissionError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: other.to_string(),
            }),
        }
    }
}
