//! Node definition.
//!
//! A node is a typed unit of the pipeline graph. Its `data` is a free-form
//! JSON object whose shape depends on the node kind (see
//! [`crate::registry::default_data`]); the node's own editing controls patch
//! it field by field.

use crate::registry::{ports_for, NodeKind, Port};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type-specific node configuration
pub type NodeData = Map<String, Value>;

/// Position of a node on the canvas, in canvas coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node instance in the editing graph.
///
/// `selected` and `dragging` are canvas state. They are kept here so the
/// canvas can render them, and dropped when the graph is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id, `"<type>-<creation timestamp>"` for dropped nodes
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub position: Position,

    pub data: NodeData,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub dragging: bool,
}

impl Node {
    /// Create an unselected node
    pub fn new(id: String, kind: NodeKind, position: Position, data: NodeData) -> Self {
        Self {
            id,
            kind,
            position,
            data,
            selected: false,
            dragging: false,
        }
    }

    /// Ports derived from the node's kind and current data
    pub fn ports(&self) -> Vec<Port> {
        ports_for(self)
    }

    /// Shallow-merge `patch` into the node's data.
    ///
    /// Top-level keys in `patch` replace the existing values; nested objects
    /// are replaced wholesale, not merged.
    pub fn merge_data(&mut self, patch: NodeData) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
    }
}
