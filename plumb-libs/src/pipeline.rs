//! The starter pipeline loaded into a fresh editor: Input → Text → LLM → Output.

use crate::error::AppError;
use crate::graph::{Connection, GraphStore};
use crate::node::{Node, NodeData, Position};
use crate::registry::NodeKind;
use serde_json::{json, Value};

fn data(value: Value) -> NodeData {
    match value {
        Value::Object(map) => map,
        _ => NodeData::new(),
    }
}

/// Build the four-node starter pipeline, wired in sequence.
///
/// Edges are `e1-2`, `e2-3` and `e3-4`.
pub fn default_pipeline() -> Result<GraphStore, AppError> {
    let mut store = GraphStore::new();

    let nodes = [
        (
            "input-1",
            NodeKind::Input,
            Position::new(100.0, 100.0),
            json!({ "inputName": "input_1", "inputType": "Text" }),
        ),
        (
            "text-1",
            NodeKind::Text,
            Position::new(400.0, 100.0),
            json!({ "text": "Process {{input}} with AI" }),
        ),
        ("llm-1", NodeKind::Llm, Position::new(700.0, 100.0), json!({})),
        (
            "output-1",
            NodeKind::Output,
            Position::new(1000.0, 100.0),
            json!({ "outputName": "result", "outputType": "Text" }),
        ),
    ];

    for (id, kind, position, value) in nodes {
        store.insert_node(Node::new(id.to_string(), kind, position, data(value)))?;
    }

    let edges = [
        ("e1-2", "input-1", "input-1-value", "text-1", "text-1-input"),
        ("e2-3", "text-1", "text-1-output", "llm-1", "llm-1-prompt"),
        ("e3-4", "llm-1", "llm-1-response", "output-1", "output-1-value"),
    ];

    for (id, source, source_handle, target, target_handle) in edges {
        store.connect(Connection::new(source, source_handle, target, target_handle).with_id(id))?;
    }

    Ok(store)
}
