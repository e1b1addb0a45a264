//! Node type registry.
//!
//! Maps every node kind to its default configuration and its port layout.
//! Ports are never stored: they are derived from the node kind and the
//! node's current data on every read, so the same inputs always produce the
//! same ports.

use crate::error::AppError;
use crate::node::{Node, NodeData};
use crate::template::extract_variables;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Text used by a Text node whose data carries no `text` field
pub const FALLBACK_TEXT_TEMPLATE: &str = "{{input}}";

/// Pixel offset of the first variable port on a Text node
const TEXT_PORT_TOP_PX: u32 = 20;

/// Pixel distance between consecutive variable ports on a Text node
const TEXT_PORT_SPACING_PX: u32 = 25;

/// The nine node kinds the editor knows about.
///
/// Serialized with the same tokens the canvas uses for drag metadata
/// (`"input"`, `"apiCall"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Input,
    Output,
    Text,
    Llm,
    Math,
    Date,
    ApiCall,
    Filter,
    Merge,
}

impl NodeKind {
    /// Every kind, in node palette order
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Text,
        NodeKind::Llm,
        NodeKind::Math,
        NodeKind::Date,
        NodeKind::ApiCall,
        NodeKind::Filter,
        NodeKind::Merge,
    ];

    /// Token used in node ids and drag metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Output => "output",
            NodeKind::Text => "text",
            NodeKind::Llm => "llm",
            NodeKind::Math => "math",
            NodeKind::Date => "date",
            NodeKind::ApiCall => "apiCall",
            NodeKind::Filter => "filter",
            NodeKind::Merge => "merge",
        }
    }

    /// Human-readable label shown in the node palette
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Input => "Input",
            NodeKind::Output => "Output",
            NodeKind::Text => "Text",
            NodeKind::Llm => "LLM",
            NodeKind::Math => "Math",
            NodeKind::Date => "Date",
            NodeKind::ApiCall => "API Call",
            NodeKind::Filter => "Filter",
            NodeKind::Merge => "Merge",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = AppError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or_else(|| AppError::InvalidNodeType(token.to_string()))
    }
}

/// Direction of a port: data leaves through a source and enters through a
/// target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Source,
    Target,
}

/// Vertical placement hint for a port. Layout only, no semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum VerticalOffset {
    /// Let the canvas center the port on its side
    Centered,

    /// Percentage of the node height from the top
    Percent(u8),

    /// Absolute pixels from the top of the node
    Pixels(u32),
}

/// A port as laid out by the registry, before it is bound to a node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Suffix appended to the node id to form the port id
    pub suffix: String,

    pub direction: PortDirection,

    /// Label rendered next to the port
    pub label: String,

    pub offset: VerticalOffset,
}

impl PortSpec {
    fn new(suffix: &str, direction: PortDirection, label: &str, offset: VerticalOffset) -> Self {
        Self {
            suffix: suffix.to_string(),
            direction,
            label: label.to_string(),
            offset,
        }
    }

    fn target(suffix: &str, label: &str, offset: VerticalOffset) -> Self {
        Self::new(suffix, PortDirection::Target, label, offset)
    }

    fn source(suffix: &str, label: &str, offset: VerticalOffset) -> Self {
        Self::new(suffix, PortDirection::Source, label, offset)
    }
}

/// A concrete port on a node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// `"<nodeId>-<suffix>"`
    pub id: String,

    pub owner_node_id: String,

    pub direction: PortDirection,

    pub label: String,

    pub offset: VerticalOffset,
}

/// Default configuration for a freshly dropped node, stamped with the
/// current time.
pub fn default_data(kind: NodeKind) -> NodeData {
    default_data_at(kind, chrono::Utc::now().timestamp_millis())
}

/// Default configuration for a node of `kind`.
///
/// The set of keys depends only on `kind`. Input and Output embed `stamp`
/// in their generated names so that every dropped node starts with a
/// distinct name.
///
/// # Arguments
///
/// * `kind` - Kind of node being created
/// * `stamp` - Creation timestamp in milliseconds
pub fn default_data_at(kind: NodeKind, stamp: i64) -> NodeData {
    let value = match kind {
        NodeKind::Input => json!({ "inputName": format!("input_{}", stamp), "inputType": "Text" }),
        NodeKind::Output => {
            json!({ "outputName": format!("output_{}", stamp), "outputType": "Text" })
        }
        NodeKind::Text => json!({ "text": "Enter your text here {{variable}}" }),
        NodeKind::Llm => json!({}),
        NodeKind::Math => json!({ "operation": "add" }),
        NodeKind::Date => json!({ "format": "YYYY-MM-DD" }),
        NodeKind::ApiCall => json!({ "url": "https://api.example.com", "method": "GET" }),
        NodeKind::Filter => json!({ "condition": "contains" }),
        NodeKind::Merge => json!({ "strategy": "concat" }),
    };

    match value {
        Value::Object(map) => map,
        _ => NodeData::new(),
    }
}

/// Port layout for a node of `kind` carrying `data`.
///
/// Targets come before sources. Every kind except Text has a fixed layout;
/// a Text node gets one target port per variable in its `text` field, in
/// first-appearance order, followed by its `output` source port.
pub fn port_layout(kind: NodeKind, data: &NodeData) -> Vec<PortSpec> {
    use VerticalOffset::{Centered, Percent};

    match kind {
        NodeKind::Input => vec![PortSpec::source("value", "Output", Centered)],
        NodeKind::Output => vec![PortSpec::target("value", "Input", Centered)],
        NodeKind::Llm => vec![
            PortSpec::target("system", "System", Percent(33)),
            PortSpec::target("prompt", "Prompt", Percent(66)),
            PortSpec::source("response", "Response", Centered),
        ],
        NodeKind::Math => vec![
            PortSpec::target("a", "A", Percent(33)),
            PortSpec::target("b", "B", Percent(66)),
            PortSpec::source("result", "Result", Centered),
        ],
        NodeKind::Date => vec![
            PortSpec::target("date", "Date Input", Centered),
            PortSpec::source("formatted", "Formatted", Centered),
        ],
        NodeKind::ApiCall => vec![
            PortSpec::target("data", "Data", Percent(33)),
            PortSpec::target("headers", "Headers", Percent(66)),
            PortSpec::source("response", "Response", Centered),
        ],
        NodeKind::Filter => vec![
            PortSpec::target("input", "Input", Percent(33)),
            PortSpec::target("criteria", "Criteria", Percent(66)),
            PortSpec::source("passed", "Passed", Percent(33)),
            PortSpec::source("failed", "Failed", Percent(66)),
        ],
        NodeKind::Merge => vec![
            PortSpec::target("input1", "Input 1", Percent(25)),
            PortSpec::target("input2", "Input 2", Percent(50)),
            PortSpec::target("input3", "Input 3", Percent(75)),
            PortSpec::source("merged", "Merged", Centered),
        ],
        NodeKind::Text => text_port_layout(data),
    }
}

fn text_port_layout(data: &NodeData) -> Vec<PortSpec> {
    let text = data
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or(FALLBACK_TEXT_TEMPLATE);

    let mut specs: Vec<PortSpec> = extract_variables(text)
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let top = TEXT_PORT_TOP_PX + index as u32 * TEXT_PORT_SPACING_PX;
            PortSpec {
                suffix: name.clone(),
                direction: PortDirection::Target,
                label: name,
                offset: VerticalOffset::Pixels(top),
            }
        })
        .collect();

    specs.push(PortSpec::source("output", "Output", VerticalOffset::Centered));
    specs
}

/// Derive the concrete ports of `node` from its kind and current data.
pub fn ports_for(node: &Node) -> Vec<Port> {
    port_layout(node.kind, &node.data)
        .into_iter()
        .map(|spec| Port {
            id: format!("{}-{}", node.id, spec.suffix),
            owner_node_id: node.id.clone(),
            direction: spec.direction,
            label: spec.label,
            offset: spec.offset,
        })
        .collect()
}

/// Find the port of `node` with id `port_id` and the given direction.
///
/// Direction is part of the lookup: a Text variable named `output` yields a
/// target port whose id equals the node's `output` source port.
pub fn resolve_port(node: &Node, port_id: &str, direction: PortDirection) -> Option<Port> {
    ports_for(node)
        .into_iter()
        .find(|port| port.id == port_id && port.direction == direction)
}
