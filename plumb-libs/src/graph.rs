//! Graph state store.
//!
//! Holds the canonical node and edge sequences of an editing session and
//! applies the mutations raised by the canvas: drops, wiring, field edits,
//! and bulk position/selection changes.
//!
//! The store keeps edges pointing at existing nodes and ports, and nothing
//! more. Cycles, several edges into one target port, and parallel identical
//! edges are all accepted; the analysis service is the only place that
//! checks whether a pipeline is a DAG.

use crate::error::AppError;
use crate::node::{Node, NodeData, Position};
use crate::registry::{default_data_at, resolve_port, NodeKind, Port, PortDirection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// A directed connection from a source port to a target port.
///
/// `selected` and `animated` are canvas state and are not transported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Port id on the source node
    pub source_handle: String,

    /// Port id on the target node
    pub target_handle: String,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub animated: bool,
}

/// A proposed edge, as raised by the canvas when the user drags a wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Explicit edge id; one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub source: String,

    pub target: String,

    pub source_handle: String,

    pub target_handle: String,
}

impl Connection {
    /// Connection without an explicit edge id
    pub fn new(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: source_handle.into(),
            target_handle: target_handle.into(),
        }
    }

    /// Set the edge id to use
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Node change raised by the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum NodeChange {
    /// Node moved; `dragging` tells whether the drag is still in progress
    Position {
        id: String,
        position: Position,
        #[serde(default)]
        dragging: bool,
    },

    Select { id: String, selected: bool },

    /// Node removed from the canvas, taking its edges with it
    Remove { id: String },
}

/// Edge change raised by the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
}

/// Canonical node and edge collections of one editing session.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Last timestamp handed out to a dropped node
    last_stamp: i64,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up a node by id
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    /// Look up an edge by id
    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    /// Ports currently exposed by a node
    pub fn ports(&self, node_id: &str) -> Result<Vec<Port>, AppError> {
        self.node(node_id)
            .map(Node::ports)
            .ok_or_else(|| AppError::NodeNotFound(node_id.to_string()))
    }

    /// Add a node dropped on the canvas.
    ///
    /// # Arguments
    ///
    /// * `type_token` - Node type carried by the drag metadata (e.g. `"apiCall"`)
    /// * `position` - Drop position in canvas coordinates
    ///
    /// # Returns
    ///
    /// * `Ok(&Node)` - The new node, with id `"<type>-<now>"` and default data
    /// * `Err(AppError::InvalidNodeType)` - The token names no registered kind
    pub fn add_node(&mut self, type_token: &str, position: Position) -> Result<&Node, AppError> {
        let kind: NodeKind = type_token.parse()?;
        Ok(self.add_node_of(kind, position))
    }

    /// Add a node of a known kind. See [`GraphStore::add_node`].
    pub fn add_node_of(&mut self, kind: NodeKind, position: Position) -> &Node {
        self.add_node_stamped(kind, position, chrono::Utc::now().timestamp_millis())
    }

    /// Ids of loaded nodes are skipped, so a generated id is never one
    /// already in the graph.
    fn add_node_stamped(&mut self, kind: NodeKind, position: Position, now: i64) -> &Node {
        let mut stamp = self.next_stamp(now);
        while self.node(&format!("{}-{}", kind, stamp)).is_some() {
            stamp = self.next_stamp(stamp);
        }

        let node = Node::new(
            format!("{}-{}", kind, stamp),
            kind,
            position,
            default_data_at(kind, stamp),
        );

        info!("Added node {} at ({}, {})", node.id, position.x, position.y);
        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// Stamps are strictly increasing so two drops in the same millisecond
    /// still get distinct ids.
    fn next_stamp(&mut self, now: i64) -> i64 {
        let stamp = now.max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }

    /// Insert a fully formed node, as done for the initial graph.
    ///
    /// Fails with `DuplicateId` if a node with the same id exists.
    pub fn insert_node(&mut self, node: Node) -> Result<(), AppError> {
        if self.node(&node.id).is_some() {
            return Err(AppError::DuplicateId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Shallow-merge `patch` into a node's data.
    ///
    /// A patch can remove ports (deleting a variable from a Text node).
    /// Edges that no longer resolve to a port afterwards are removed from the
    /// graph and returned.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Edge>)` - Edges pruned because their port disappeared
    /// * `Err(AppError::NodeNotFound)` - No node with that id
    pub fn update_node_data(&mut self, node_id: &str, patch: NodeData) -> Result<Vec<Edge>, AppError> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| AppError::NodeNotFound(node_id.to_string()))?;
        node.merge_data(patch);

        let (kept, pruned): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| {
                (edge.source != node_id && edge.target != node_id) || self.edge_resolves(edge)
            });
        self.edges = kept;

        for edge in &pruned {
            warn!(
                "Removed edge {} after editing node {}: its port no longer exists",
                edge.id, node_id
            );
        }

        Ok(pruned)
    }

    fn edge_resolves(&self, edge: &Edge) -> bool {
        self.resolve_endpoints(&edge.source, &edge.source_handle, &edge.target, &edge.target_handle)
            .is_ok()
    }

    fn resolve_endpoints(
        &self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Result<(), AppError> {
        let source_node = self.node(source).ok_or_else(|| {
            AppError::InvalidConnection(format!("unknown source node '{}'", source))
        })?;
        let target_node = self.node(target).ok_or_else(|| {
            AppError::InvalidConnection(format!("unknown target node '{}'", target))
        })?;

        if resolve_port(source_node, source_handle, PortDirection::Source).is_none() {
            return Err(AppError::InvalidConnection(format!(
                "'{}' is not a source port of '{}'",
                source_handle, source
            )));
        }

        if resolve_port(target_node, target_handle, PortDirection::Target).is_none() {
            return Err(AppError::InvalidConnection(format!(
                "'{}' is not a target port of '{}'",
                target_handle, target
            )));
        }

        Ok(())
    }

    /// Wire a source port to a target port.
    ///
    /// # Arguments
    ///
    /// * `connection` - Proposed edge from the canvas
    ///
    /// # Returns
    ///
    /// * `Ok(&Edge)` - The appended edge
    /// * `Err(AppError::InvalidConnection)` - Unknown node, unknown port or
    ///   direction mismatch
    /// * `Err(AppError::DuplicateId)` - The explicit edge id is taken
    pub fn connect(&mut self, connection: Connection) -> Result<&Edge, AppError> {
        self.resolve_endpoints(
            &connection.source,
            &connection.source_handle,
            &connection.target,
            &connection.target_handle,
        )?;

        let id = match connection.id {
            Some(id) if self.edge(&id).is_some() => return Err(AppError::DuplicateId(id)),
            Some(id) => id,
            None => format!("e-{}", Uuid::new_v4()),
        };

        let edge = Edge {
            id,
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            selected: false,
            animated: true,
        };

        info!(
            "Connected {} -> {} ({})",
            edge.source_handle, edge.target_handle, edge.id
        );
        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, node_id: &str) -> Result<Node, AppError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| AppError::NodeNotFound(node_id.to_string()))?;

        let node = self.nodes.remove(index);
        self.edges
            .retain(|edge| edge.source != node_id && edge.target != node_id);

        info!("Removed node {}", node_id);
        Ok(node)
    }

    /// Remove a single edge
    pub fn remove_edge(&mut self, edge_id: &str) -> Result<Edge, AppError> {
        let index = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| AppError::EdgeNotFound(edge_id.to_string()))?;

        Ok(self.edges.remove(index))
    }

    /// Apply a batch of node changes from the canvas.
    ///
    /// Changes naming unknown nodes are logged and skipped; the rest of the
    /// batch still applies. Ids, kinds and data are never touched.
    ///
    /// # Returns
    ///
    /// Number of changes applied
    pub fn apply_node_changes(&mut self, changes: Vec<NodeChange>) -> usize {
        let mut applied = 0;

        for change in changes {
            let result = match change {
                NodeChange::Position {
                    id,
                    position,
                    dragging,
                } => self
                    .node_mut(&id)
                    .map(|node| {
                        node.position = position;
                        node.dragging = dragging;
                    })
                    .ok_or(AppError::NodeNotFound(id)),
                NodeChange::Select { id, selected } => self
                    .node_mut(&id)
                    .map(|node| node.selected = selected)
                    .ok_or(AppError::NodeNotFound(id)),
                NodeChange::Remove { id } => self.remove_node(&id).map(|_| ()),
            };

            match result {
                Ok(()) => applied += 1,
                Err(e) => warn!("Dropped node change: {}", e),
            }
        }

        applied
    }

    /// Apply a batch of edge changes from the canvas.
    ///
    /// Same contract as [`GraphStore::apply_node_changes`].
    pub fn apply_edge_changes(&mut self, changes: Vec<EdgeChange>) -> usize {
        let mut applied = 0;

        for change in changes {
            let result = match change {
                EdgeChange::Select { id, selected } => self
                    .edges
                    .iter_mut()
                    .find(|e| e.id == id)
                    .map(|edge| edge.selected = selected)
                    .ok_or(AppError::EdgeNotFound(id)),
                EdgeChange::Remove { id } => self.remove_edge(&id).map(|_| ()),
            };

            match result {
                Ok(()) => applied += 1,
                Err(e) => warn!("Dropped edge change: {}", e),
            }
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> NodeData {
        value.as_object().cloned().unwrap()
    }

    fn store_with(nodes: &[(&str, NodeKind)]) -> GraphStore {
        let mut store = GraphStore::new();
        for (id, kind) in nodes {
            store
                .insert_node(Node::new(
                    id.to_string(),
                    *kind,
                    Position::default(),
                    default_data_at(*kind, 0),
                ))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_add_node_assigns_id_and_defaults() {
        let mut store = GraphStore::new();
        let node = store.add_node("math", Position::new(10.0, 20.0)).unwrap().clone();

        assert!(node.id.starts_with("math-"));
        assert_eq!(node.kind, NodeKind::Math);
        assert_eq!(node.data["operation"], json!("add"));
        assert_eq!(node.position, Position::new(10.0, 20.0));
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn test_add_node_rejects_unknown_type() {
        let mut store = GraphStore::new();
        let result = store.add_node("spreadsheet", Position::default());
        assert!(matches!(result, Err(AppError::InvalidNodeType(_))));
        assert!(store.nodes().is_empty());
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut store = GraphStore::new();
        let ids: Vec<String> = (0..50)
            .map(|_| store.add_node_of(NodeKind::Text, Position::default()).id.clone())
            .collect();

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_generated_id_skips_loaded_ids() {
        let mut store = store_with(&[("math-1000", NodeKind::Math), ("math-1001", NodeKind::Math)]);

        let node = store
            .add_node_stamped(NodeKind::Math, Position::default(), 1000)
            .clone();
        assert_eq!(node.id, "math-1002");
        assert_eq!(node.data["operation"], json!("add"));

        // Other kinds do not collide with the loaded ids
        let text = store.add_node_stamped(NodeKind::Text, Position::default(), 1000);
        assert_eq!(text.id, "text-1003");
        assert_eq!(store.nodes().len(), 4);
    }

    #[test]
    fn test_insert_node_rejects_duplicate() {
        let mut store = store_with(&[("input-1", NodeKind::Input)]);
        let dup = Node::new(
            "input-1".to_string(),
            NodeKind::Output,
            Position::default(),
            NodeData::new(),
        );
        assert!(matches!(store.insert_node(dup), Err(AppError::DuplicateId(_))));
    }

    #[test]
    fn test_update_node_data() {
        let mut store = store_with(&[("math-1", NodeKind::Math)]);
        let pruned = store
            .update_node_data("math-1", patch(json!({"operation": "divide"})))
            .unwrap();

        assert!(pruned.is_empty());
        assert_eq!(store.node("math-1").unwrap().data["operation"], json!("divide"));

        let missing = store.update_node_data("math-2", NodeData::new());
        assert!(matches!(missing, Err(AppError::NodeNotFound(_))));
    }

    #[test]
    fn test_connect_validates_ports() {
        let mut store = store_with(&[("input-1", NodeKind::Input), ("text-1", NodeKind::Text)]);
        store
            .update_node_data("text-1", patch(json!({"text": "{{input}}"})))
            .unwrap();

        store
            .connect(Connection::new("input-1", "input-1-value", "text-1", "text-1-input"))
            .unwrap();

        let bogus = store.connect(Connection::new(
            "input-1",
            "input-1-bogus",
            "text-1",
            "text-1-input",
        ));
        assert!(matches!(bogus, Err(AppError::InvalidConnection(_))));
        assert_eq!(store.edges().len(), 1);
    }

    #[test]
    fn test_connect_rejects_direction_mismatch_and_unknown_node() {
        let mut store = store_with(&[("math-1", NodeKind::Math), ("output-1", NodeKind::Output)]);

        let reversed = store.connect(Connection::new("output-1", "output-1-value", "math-1", "math-1-a"));
        assert!(matches!(reversed, Err(AppError::InvalidConnection(_))));

        let target_as_source = store.connect(Connection::new("math-1", "math-1-a", "output-1", "output-1-value"));
        assert!(matches!(target_as_source, Err(AppError::InvalidConnection(_))));

        let ghost = store.connect(Connection::new("math-9", "math-9-result", "output-1", "output-1-value"));
        assert!(matches!(ghost, Err(AppError::InvalidConnection(_))));

        // Port id of another node
        let foreign = store.connect(Connection::new("math-1", "math-2-result", "output-1", "output-1-value"));
        assert!(matches!(foreign, Err(AppError::InvalidConnection(_))));
    }

    #[test]
    fn test_parallel_edges_and_cycles_are_permitted() {
        let mut store = store_with(&[("math-1", NodeKind::Math), ("math-2", NodeKind::Math)]);

        let first = store
            .connect(Connection::new("math-1", "math-1-result", "math-2", "math-2-a"))
            .unwrap()
            .id
            .clone();
        let second = store
            .connect(Connection::new("math-1", "math-1-result", "math-2", "math-2-a"))
            .unwrap()
            .id
            .clone();
        assert_ne!(first, second);

        // Closing the loop is not the store's concern
        store
            .connect(Connection::new("math-2", "math-2-result", "math-1", "math-1-a"))
            .unwrap();
        // Neither is a self-loop
        store
            .connect(Connection::new("math-1", "math-1-result", "math-1", "math-1-b"))
            .unwrap();
        assert_eq!(store.edges().len(), 4);
    }

    #[test]
    fn test_connect_rejects_duplicate_edge_id() {
        let mut store = store_with(&[("input-1", NodeKind::Input), ("output-1", NodeKind::Output)]);
        let conn = Connection::new("input-1", "input-1-value", "output-1", "output-1-value").with_id("e1");

        store.connect(conn.clone()).unwrap();
        assert!(matches!(store.connect(conn), Err(AppError::DuplicateId(_))));
    }

    #[test]
    fn test_editing_text_prunes_dangling_edges() {
        let mut store = store_with(&[
            ("input-1", NodeKind::Input),
            ("input-2", NodeKind::Input),
            ("text-1", NodeKind::Text),
        ]);
        store
            .update_node_data("text-1", patch(json!({"text": "{{a}} {{b}}"})))
            .unwrap();
        store
            .connect(Connection::new("input-1", "input-1-value", "text-1", "text-1-a").with_id("ea"))
            .unwrap();
        store
            .connect(Connection::new("input-2", "input-2-value", "text-1", "text-1-b").with_id("eb"))
            .unwrap();

        let pruned = store
            .update_node_data("text-1", patch(json!({"text": "only {{b}} now"})))
            .unwrap();

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, "ea");
        assert_eq!(store.edges().len(), 1);
        assert_eq!(store.edges()[0].id, "eb");
    }

    #[test]
    fn test_remove_node_removes_incident_edges() {
        let mut store = store_with(&[
            ("input-1", NodeKind::Input),
            ("llm-1", NodeKind::Llm),
            ("output-1", NodeKind::Output),
        ]);
        store
            .connect(Connection::new("input-1", "input-1-value", "llm-1", "llm-1-prompt"))
            .unwrap();
        store
            .connect(Connection::new("llm-1", "llm-1-response", "output-1", "output-1-value"))
            .unwrap();

        store.remove_node("llm-1").unwrap();
        assert!(store.edges().is_empty());
        assert_eq!(store.nodes().len(), 2);
        assert!(matches!(store.remove_node("llm-1"), Err(AppError::NodeNotFound(_))));
    }

    #[test]
    fn test_apply_node_changes_preserves_identity() {
        let mut store = store_with(&[("date-1", NodeKind::Date)]);
        let before = store.node("date-1").unwrap().clone();

        let applied = store.apply_node_changes(vec![
            NodeChange::Position {
                id: "date-1".to_string(),
                position: Position::new(50.0, 75.0),
                dragging: true,
            },
            NodeChange::Select {
                id: "date-1".to_string(),
                selected: true,
            },
            NodeChange::Select {
                id: "ghost".to_string(),
                selected: true,
            },
        ]);

        assert_eq!(applied, 2);
        let after = store.node("date-1").unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.kind, before.kind);
        assert_eq!(after.data, before.data);
        assert_eq!(after.position, Position::new(50.0, 75.0));
        assert!(after.selected);
        assert!(after.dragging);
    }

    #[test]
    fn test_apply_edge_changes() {
        let mut store = store_with(&[("input-1", NodeKind::Input), ("output-1", NodeKind::Output)]);
        store
            .connect(Connection::new("input-1", "input-1-value", "output-1", "output-1-value").with_id("e1"))
            .unwrap();

        assert_eq!(
            store.apply_edge_changes(vec![EdgeChange::Select {
                id: "e1".to_string(),
                selected: true,
            }]),
            1
        );
        assert!(store.edge("e1").unwrap().selected);

        assert_eq!(
            store.apply_edge_changes(vec![
                EdgeChange::Remove { id: "e1".to_string() },
                EdgeChange::Remove { id: "e1".to_string() },
            ]),
            1
        );
        assert!(store.edges().is_empty());
    }
}
