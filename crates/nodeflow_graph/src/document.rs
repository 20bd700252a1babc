// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saved graph format.
//!
//! A graph file is a JSON object with a `nodes` array and a `connections`
//! array. Connections reference nodes by their `index` and pins by name; the
//! start side is always the output pin.

use crate::graph::Graph;
use crate::node::NodeId;
use crate::pin::PinDirection;
use crate::registry::NodeRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Registered type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Canvas X position
    pub x: f32,
    /// Canvas Y position
    pub y: f32,
    /// Stable node ID
    pub index: u32,
    /// Kind-specific settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

/// A saved connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    /// Index of the node owning the output pin
    pub start_id: u32,
    /// Index of the node owning the input pin
    pub end_id: u32,
    /// Output pin name
    pub start_pin: String,
    /// Input pin name
    pub end_pin: String,
}

/// Entry that could not be restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the document's array
    pub position: usize,
    /// Why it was skipped
    pub reason: String,
}

/// What happened while loading a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Node entries that were not restored
    pub skipped_nodes: Vec<SkippedEntry>,
    /// Connection entries that were not restored
    pub skipped_connections: Vec<SkippedEntry>,
}

impl LoadReport {
    /// Whether every entry was restored
    pub fn is_complete(&self) -> bool {
        self.skipped_nodes.is_empty() && self.skipped_connections.is_empty()
    }
}

/// Serializable form of a [`Graph`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes, in graph order
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    /// Connections, in graph order
    #[serde(default)]
    pub connections: Vec<ConnectionEntry>,
}

impl GraphDocument {
    /// Capture a graph
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeEntry {
                type_name: node.type_name.clone(),
                x: node.position[0],
                y: node.position[1],
                index: node.id.0,
                state: node.kind().save_state(),
            })
            .collect();

        let connections = graph
            .connections()
            .filter_map(|c| {
                Some(ConnectionEntry {
                    start_id: c.start_node().0,
                    end_id: c.end_node().0,
                    start_pin: graph.pin(c.start_pin)?.name.clone(),
                    end_pin: graph.pin(c.end_pin)?.name.clone(),
                })
            })
            .collect();

        Self { nodes, connections }
    }

    /// Rebuild a graph, skipping entries that cannot be restored
    pub fn to_graph(&self, registry: &NodeRegistry) -> (Graph, LoadReport) {
        let mut graph = Graph::default();
        let mut report = LoadReport::default();

        for (position, entry) in self.nodes.iter().enumerate() {
            let id = NodeId(entry.index);
            if graph.contains_node(id) {
                skip(&mut report.skipped_nodes, position, format!("duplicate index {}", entry.index));
                continue;
            }

            let mut node = match registry.create(&entry.type_name, id) {
                Ok(node) => node.with_position(entry.x, entry.y),
                Err(err) => {
                    skip(&mut report.skipped_nodes, position, err.to_string());
                    continue;
                }
            };
            if let Some(state) = &entry.state {
                if let Err(err) = node.kind_mut().load_state(state) {
                    tracing::warn!("Node {id} ({}): ignoring saved state: {err}", entry.type_name);
                }
            }
            if let Err(err) = graph.add_node(node) {
                skip(&mut report.skipped_nodes, position, err.to_string());
            }
        }

        for (position, entry) in self.connections.iter().enumerate() {
            let start = graph.find_pin(NodeId(entry.start_id), &entry.start_pin, PinDirection::Output);
            let end = graph.find_pin(NodeId(entry.end_id), &entry.end_pin, PinDirection::Input);
            let result = match (start, end) {
                (Some(start), Some(end)) => {
                    // A later entry must not silently replace an earlier one
                    let taken = [start, end]
                        .into_iter()
                        .find(|pin| graph.pin(*pin).is_some_and(|p| p.is_connected()));
                    match taken {
                        Some(pin) => Err(format!("pin {pin} already connected")),
                        None => graph.connect(start, end).map(|_| ()).map_err(|e| e.to_string()),
                    }
                }
                _ => Err(format!(
                    "cannot resolve {}:{:?} -> {}:{:?}",
                    entry.start_id, entry.start_pin, entry.end_id, entry.end_pin
                )),
            };
            if let Err(reason) = result {
                skip(&mut report.skipped_connections, position, reason);
            }
        }

        (graph, report)
    }

    /// Parse a document from JSON
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a document from a file
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the document to a file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn skip(entries: &mut Vec<SkippedEntry>, position: usize, reason: String) {
    tracing::warn!("Skipping saved entry {position}: {reason}");
    entries.push(SkippedEntry { position, reason });
}

/// Error when reading or writing a graph document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content is not a valid graph document
    #[error("Invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::create_default_registry;

    const SAMPLE: &str = r#"{
        "nodes": [
            { "type": "Scaler", "x": 10.0, "y": 20.0, "index": 4, "state": { "value": 2.5 } },
            { "type": "Print", "x": 200.0, "y": 20.0, "index": 9 }
        ],
        "connections": [
            { "start_id": 4, "end_id": 9, "start_pin": "value", "end_pin": "input" }
        ]
    }"#;

    #[test]
    fn test_load_sample() {
        let registry = create_default_registry();
        let document = GraphDocument::from_json(SAMPLE).unwrap();
        let (graph, report) = document.to_graph(&registry);

        assert!(report.is_complete());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.node(NodeId(4)).unwrap().position, [10.0, 20.0]);
        assert_eq!(
            graph.node(NodeId(4)).unwrap().kind().save_state(),
            Some(serde_json::json!({ "value": 2.5 }))
        );
    }

    #[test]
    fn test_save_after_load_matches() {
        let registry = create_default_registry();
        let document = GraphDocument::from_json(SAMPLE).unwrap();
        let (graph, _) = document.to_graph(&registry);
        assert_eq!(GraphDocument::from_graph(&graph), document);
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let json = r#"{
            "nodes": [
                { "type": "Scaler", "x": 0.0, "y": 0.0, "index": 0 },
                { "type": "Teleporter", "x": 0.0, "y": 0.0, "index": 1 },
                { "type": "Print", "x": 0.0, "y": 0.0, "index": 2 },
                { "type": "Print", "x": 0.0, "y": 0.0, "index": 2 }
            ],
            "connections": [
                { "start_id": 0, "end_id": 1, "start_pin": "value", "end_pin": "input" },
                { "start_id": 0, "end_id": 2, "start_pin": "nope", "end_pin": "input" },
                { "start_id": 0, "end_id": 2, "start_pin": "value", "end_pin": "input" }
            ]
        }"#;
        let registry = create_default_registry();
        let (graph, report) = GraphDocument::from_json(json).unwrap().to_graph(&registry);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 1);
        let skipped_nodes: Vec<usize> = report.skipped_nodes.iter().map(|s| s.position).collect();
        let skipped_connections: Vec<usize> =
            report.skipped_connections.iter().map(|s| s.position).collect();
        assert_eq!(skipped_nodes, vec![1, 3]);
        assert_eq!(skipped_connections, vec![0, 1]);
    }

    #[test]
    fn test_reused_pin_is_skipped() {
        let json = r#"{
            "nodes": [
                { "type": "Scaler", "x": 0.0, "y": 0.0, "index": 0 },
                { "type": "Print", "x": 0.0, "y": 0.0, "index": 1 },
                { "type": "Print", "x": 0.0, "y": 0.0, "index": 2 }
            ],
            "connections": [
                { "start_id": 0, "end_id": 1, "start_pin": "value", "end_pin": "input" },
                { "start_id": 0, "end_id": 2, "start_pin": "value", "end_pin": "input" }
            ]
        }"#;
        let registry = create_default_registry();
        let (graph, report) = GraphDocument::from_json(json).unwrap().to_graph(&registry);

        assert!(!report.is_complete());
        assert_eq!(report.skipped_connections.len(), 1);
        assert_eq!(report.skipped_connections[0].position, 1);
        assert!(report.skipped_connections[0].reason.contains("already connected"));

        // The first entry survives
        assert_eq!(graph.connection_count(), 1);
        let connection = graph.connections().next().unwrap();
        assert_eq!(connection.end_node(), NodeId(1));
    }

    #[test]
    fn test_incompatible_connection_is_skipped() {
        let json = r#"{
            "nodes": [
                { "type": "Button", "x": 0.0, "y": 0.0, "index": 0 },
                { "type": "Print", "x": 0.0, "y": 0.0, "index": 1 }
            ],
            "connections": [
                { "start_id": 0, "end_id": 1, "start_pin": "Ex Out", "end_pin": "input" }
            ]
        }"#;
        let registry = create_default_registry();
        let (graph, report) = GraphDocument::from_json(json).unwrap().to_graph(&registry);
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(report.skipped_connections.len(), 1);
    }

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let document = GraphDocument::from_json("{}").unwrap();
        assert!(document.nodes.is_empty());
        assert!(document.connections.is_empty());
        assert!(GraphDocument::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let document = GraphDocument::from_json(SAMPLE).unwrap();
        document.save(&path).unwrap();
        assert_eq!(GraphDocument::load(&path).unwrap(), document);
        assert!(matches!(
            GraphDocument::load(&dir.path().join("missing.json")),
            Err(DocumentError::Io(_))
        ));
    }
}
