//! Pipeline analysis: element counts and cycle detection.
//!
//! The request types here are looser than the editor's transport types.
//! Any `type` string is accepted, handles may be `null` or absent, and
//! `position`/`data` are optional, so the service can analyze pipelines
//! from clients that do not speak the full node registry.

use plumb_libs::AnalysisSummary;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A node as submitted to `POST /pipelines/parse`
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineNode {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub position: HashMap<String, f64>,

    #[serde(default)]
    pub data: Map<String, Value>,
}

/// An edge as submitted to `POST /pipelines/parse`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEdge {
    pub id: String,
    pub source: String,
    pub target: String,

    #[serde(default)]
    pub source_handle: Option<String>,

    #[serde(default)]
    pub target_handle: Option<String>,
}

/// Body of `POST /pipelines/parse`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineRequest {
    pub nodes: Vec<PipelineNode>,
    pub edges: Vec<PipelineEdge>,
}

/// Analyze a submitted pipeline.
///
/// Counts are taken over the pipeline as received, so edges that point at
/// unknown nodes still count toward `num_edges`. They are ignored by the
/// cycle check.
pub fn analyze(pipeline: &PipelineRequest) -> AnalysisSummary {
    AnalysisSummary {
        num_nodes: pipeline.nodes.len(),
        num_edges: pipeline.edges.len(),
        is_dag: is_dag(pipeline),
    }
}

/// Whether the pipeline has no directed cycle.
///
/// Depth-first search over an explicit stack of `(node, next successor)`
/// frames, so path length is bounded by the heap and not the thread stack.
/// `visited` holds finished nodes and `on_path` the nodes of the current
/// path; reaching a node on the path means a back edge. A self-loop is a
/// cycle.
///
/// # Arguments
///
/// * `pipeline` - Submitted pipeline; edges whose source or target is not a
///   listed node are skipped
pub fn is_dag(pipeline: &PipelineRequest) -> bool {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for node in &pipeline.nodes {
        successors.entry(node.id.as_str()).or_default();
    }

    for edge in &pipeline.edges {
        let known = successors.contains_key(edge.source.as_str())
            && successors.contains_key(edge.target.as_str());
        if !known {
            debug!("Skipping edge {} with unknown endpoint", edge.id);
            continue;
        }
        if let Some(next) = successors.get_mut(edge.source.as_str()) {
            next.push(edge.target.as_str());
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_path: HashSet<&str> = HashSet::new();

    for node in &pipeline.nodes {
        let start = node.id.as_str();
        if visited.contains(start) {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        on_path.insert(start);

        while let Some(frame) = stack.last_mut() {
            let (current, index) = *frame;
            let next = successors
                .get(current)
                .and_then(|targets| targets.get(index))
                .copied();

            match next {
                Some(target) => {
                    frame.1 += 1;
                    if on_path.contains(target) {
                        return false;
                    }
                    if !visited.contains(target) {
                        on_path.insert(target);
                        stack.push((target, 0));
                    }
                }
                None => {
                    stack.pop();
                    on_path.remove(current);
                    visited.insert(current);
                }
            }
        }
    }

    true
}
