//! Graph serializer.
//!
//! Produces the transport representation sent to the analysis service:
//! nodes keep `id`, `type`, `position` and `data`; edges keep `id`,
//! `source`, `target`, `sourceHandle` and `targetHandle`. Canvas state
//! (selection, drag, animation) never leaves the process.
//!
//! The analysis service answers with an [`AnalysisSummary`].

use crate::error::AppError;
use crate::graph::{Connection, Edge, GraphStore};
use crate::node::{Node, NodeData, Position};
use crate::registry::NodeKind;
use serde::{Deserialize, Serialize};

/// Transport form of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportNode {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub position: Position,

    #[serde(default)]
    pub data: NodeData,
}

/// Transport form of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportEdge {
    pub id: String,
    pub source: String,
    pub target: String,

    #[serde(default)]
    pub source_handle: String,

    #[serde(default)]
    pub target_handle: String,
}

/// Body of `POST /pipelines/parse`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportGraph {
    pub nodes: Vec<TransportNode>,
    pub edges: Vec<TransportEdge>,
}

/// Body of a successful `POST /pipelines/parse` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub is_dag: bool,
}

impl From<&Node> for TransportNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            position: node.position,
            data: node.data.clone(),
        }
    }
}

impl From<&Edge> for TransportEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_handle: edge.source_handle.clone(),
            target_handle: edge.target_handle.clone(),
        }
    }
}

/// Serialize the store's graph, preserving insertion order.
///
/// Pure and total: the same graph always yields the same transport value.
pub fn serialize(store: &GraphStore) -> TransportGraph {
    TransportGraph {
        nodes: store.nodes().iter().map(TransportNode::from).collect(),
        edges: store.edges().iter().map(TransportEdge::from).collect(),
    }
}

impl TransportGraph {
    /// Encode as the JSON body sent on the wire
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a JSON pipeline description
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GraphStore {
    /// Rebuild an editing graph from its transport form.
    ///
    /// Every edge goes through [`GraphStore::connect`], so a description
    /// naming unknown nodes or ports is rejected as a whole.
    pub fn from_transport(graph: TransportGraph) -> Result<GraphStore, AppError> {
        let mut store = GraphStore::new();

        for node in graph.nodes {
            store.insert_node(Node::new(node.id, node.kind, node.position, node.data))?;
        }

        for edge in graph.edges {
            let connection = Connection::new(
                edge.source,
                edge.source_handle,
                edge.target,
                edge.target_handle,
            )
            .with_id(edge.id);
            store.connect(connection)?;
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeChange, NodeChange};
    use serde_json::json;

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new();
        let input = store.add_node_of(NodeKind::Input, Position::new(0.0, 0.0)).id.clone();
        let output = store.add_node_of(NodeKind::Output, Position::new(300.0, 0.0)).id.clone();
        store
            .connect(
                Connection::new(
                    input.clone(),
                    format!("{}-value", input),
                    output.clone(),
                    format!("{}-value", output),
                )
                .with_id("e1-2"),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_serialize_is_repeatable() {
        let store = sample_store();
        let first = serialize(&store).to_json().unwrap();
        let second = serialize(&store).to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transient_fields_are_dropped() {
        let mut store = sample_store();
        let id = store.nodes()[0].id.clone();
        store.apply_node_changes(vec![
            NodeChange::Select {
                id: id.clone(),
                selected: true,
            },
            NodeChange::Position {
                id,
                position: Position::new(5.0, 6.0),
                dragging: true,
            },
        ]);
        store.apply_edge_changes(vec![EdgeChange::Select {
            id: "e1-2".to_string(),
            selected: true,
        }]);

        let value = serde_json::to_value(serialize(&store)).unwrap();
        let node = value["nodes"][0].as_object().unwrap();
        let mut keys: Vec<_> = node.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["data", "id", "position", "type"]);
        assert_eq!(node["position"], json!({"x": 5.0, "y": 6.0}));

        let edge = value["edges"][0].as_object().unwrap();
        let mut keys: Vec<_> = edge.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["id", "source", "sourceHandle", "target", "targetHandle"]
        );
    }

    #[test]
    fn test_from_transport_rebuilds_graph() {
        let store = sample_store();
        let graph = serialize(&store);

        let rebuilt = GraphStore::from_transport(graph.clone()).unwrap();
        assert_eq!(serialize(&rebuilt), graph);
    }

    #[test]
    fn test_from_transport_rejects_unknown_port() {
        let mut graph = serialize(&sample_store());
        graph.edges[0].source_handle = "nowhere".to_string();
        assert!(matches!(
            GraphStore::from_transport(graph),
            Err(AppError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_from_json_accepts_missing_handles() {
        let graph = TransportGraph::from_json(
            r#"{"nodes":[{"id":"llm-1","type":"llm","position":{"x":1,"y":2}}],
                "edges":[{"id":"e","source":"llm-1","target":"llm-1"}]}"#,
        )
        .unwrap();
        assert_eq!(graph.nodes[0].kind, NodeKind::Llm);
        assert!(graph.nodes[0].data.is_empty());
        assert_eq!(graph.edges[0].source_handle, "");
    }
}
