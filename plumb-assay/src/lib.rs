//! # Plumb Assay - The Analysis Service
//!
//! HTTP service the courier submits pipelines to. Exposes:
//! - `GET /`: liveness probe
//! - `POST /pipelines/parse`: node and edge counts plus cycle detection
//!
//! Malformed pipeline bodies are answered with `500` and an `error` field,
//! the same way any other analysis failure is reported.

pub mod analysis;

use axum::{
    routing::{get, post},
    Json, Router,
};
use plumb_libs::{AnalysisSummary, AppError};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use analysis::{analyze, is_dag, PipelineEdge, PipelineNode, PipelineRequest};

/// Body of `GET /`
#[derive(Debug, Serialize)]
struct StatusResponse {
    message: &'static str,
    status: &'static str,
}

/// Handler for GET / - Liveness probe
async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Pipeline API is running",
        status: "ok",
    })
}

/// Handler for POST /pipelines/parse - Analyze a pipeline
///
/// The body is decoded here rather than through the `Json` extractor so a
/// malformed pipeline goes through `AppError` like every other failure.
async fn parse_pipeline(body: String) -> Result<Json<AnalysisSummary>, AppError> {
    let pipeline: PipelineRequest = serde_json::from_str(&body).map_err(|e| {
        warn!("Rejected pipeline: {}", e);
        AppError::from(e)
    })?;

    let summary = analyze(&pipeline);
    info!(
        "Analyzed pipeline: {} nodes, {} edges, dag={}",
        summary.num_nodes, summary.num_edges, summary.is_dag
    );

    Ok(Json(summary))
}

/// Create the HTTP router with all endpoints
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/pipelines/parse", post(parse_pipeline))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use plumb_libs::{default_pipeline, serialize};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn parse_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/pipelines/parse")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_reports_ok() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = call(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Pipeline API is running", "status": "ok"})
        );
    }

    #[tokio::test]
    async fn test_parse_default_pipeline() {
        let graph = serialize(&default_pipeline().unwrap());
        let (status, body) = call(parse_request(graph.to_json().unwrap())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"num_nodes": 4, "num_edges": 3, "is_dag": true}));
    }

    #[tokio::test]
    async fn test_parse_reports_cycle() {
        let body = json!({
            "nodes": [
                {"id": "a", "type": "llm", "position": {"x": 0, "y": 0}, "data": {}},
                {"id": "b", "type": "llm", "position": {"x": 1, "y": 0}, "data": {}}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "b", "sourceHandle": "a-response", "targetHandle": "b-prompt"},
                {"id": "e2", "source": "b", "target": "a", "sourceHandle": "b-response", "targetHandle": "a-prompt"}
            ]
        });
        let (status, body) = call(parse_request(body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_dag"], json!(false));
        assert_eq!(body["num_edges"], json!(2));
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let (status, body) = call(parse_request("{\"nodes\": 3}".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("JSON error"));
    }

    #[tokio::test]
    async fn test_null_handles_are_accepted() {
        let body = json!({
            "nodes": [
                {"id": "a", "type": "customInput", "position": {"x": 0, "y": 0}, "data": {}},
                {"id": "b", "type": "llm", "position": {"x": 1, "y": 0}, "data": {}}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "b", "sourceHandle": null, "targetHandle": null}
            ]
        });
        let (status, body) = call(parse_request(body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"num_nodes": 2, "num_edges": 1, "is_dag": true}));
    }

    #[tokio::test]
    async fn test_long_chain_within_body_limit() {
        let len = 20_000;
        let nodes: Vec<Value> = (0..len)
            .map(|i| json!({"id": format!("n{}", i), "type": "llm"}))
            .collect();
        let edges: Vec<Value> = (1..len)
            .map(|i| {
                json!({
                    "id": format!("e{}", i),
                    "source": format!("n{}", i - 1),
                    "target": format!("n{}", i)
                })
            })
            .collect();
        let body = json!({"nodes": nodes, "edges": edges}).to_string();
        assert!(body.len() < 2 * 1024 * 1024);

        let (status, body) = call(parse_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"num_nodes": 20_000, "num_edges": 19_999, "is_dag": true})
        );
    }
}
