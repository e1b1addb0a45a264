//! # Plumb Libraries
//!
//! Core graph model for the Plumb pipeline editor. The canvas raises drop,
//! connect and change events; this crate keeps the resulting nodes and
//! edges, derives each node's ports, and serializes the graph for the
//! analysis service.
//!
//! ## Main Components
//!
//! - `template`: `{{name}}` variable extraction for Text nodes
//! - `registry`: node kinds, default data and port layouts
//! - `graph`: the graph state store
//! - `transport`: the wire representation sent to the analysis service
//! - `config`: endpoint configuration for submissions
//! - `AppError`: standardized error handling

pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod pipeline;
pub mod registry;
pub mod template;
pub mod transport;

// Re-export main types for convenience
pub use config::{load_config, SubmissionConfig};
pub use error::AppError;
pub use graph::{Connection, Edge, EdgeChange, GraphStore, NodeChange};
pub use node::{Node, NodeData, Position};
pub use pipeline::default_pipeline;
pub use registry::{
    default_data, default_data_at, port_layout, ports_for, NodeKind, Port, PortDirection,
    PortSpec, VerticalOffset,
};
pub use template::extract_variables;
pub use transport::{serialize, AnalysisSummary, TransportEdge, TransportGraph, TransportNode};
