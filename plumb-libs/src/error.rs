//! Error types for the Plumb workspace.
//!
//! Structural graph errors are raised by the graph store when the canvas
//! asks for a mutation that does not fit the current graph. They are always
//! recoverable: callers log them and drop the mutation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the graph model and its configuration.
#[derive(Error, Debug)]
pub enum AppError {
    /// A drop or add referenced a node type that is not registered
    ///
    /// # Example
    /// ```
    /// use plumb_libs::AppError;
    /// let error = AppError::InvalidNodeType("spreadsheet".to_string());
    /// assert_eq!(error.to_string(), "Invalid node type: spreadsheet");
    /// ```
    #[error("Invalid node type: {0}")]
    InvalidNodeType(String),

    /// A mutation referenced a node id that is not in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A mutation referenced an edge id that is not in the graph
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// A proposed edge does not resolve to a source port and a target port
    ///
    /// # Example
    /// ```
    /// use plumb_libs::AppError;
    /// let error = AppError::InvalidConnection("unknown source port 'input-1-bogus'".to_string());
    /// ```
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// A node or edge id is already taken
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Configuration error - invalid or missing configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    ///
    /// Wraps serde_yaml errors for config file parsing
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the error was caused by a malformed request rather than a
    /// failure on our side
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            AppError::InvalidNodeType(_)
                | AppError::NodeNotFound(_)
                | AppError::EdgeNotFound(_)
                | AppError::InvalidConnection(_)
                | AppError::DuplicateId(_)
                | AppError::ConfigError(_)
        )
    }
}

/// Implement Axum's IntoResponse for AppError so service handlers can
/// return it directly
///
/// Client faults map to 400 Bad Request, everything else to
/// 500 Internal Server Error.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.is_client_fault() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
