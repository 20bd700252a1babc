// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::pin::PinId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A directed connection from an output pin to an input pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection ID
    pub id: ConnectionId,
    /// Output side
    pub start_pin: PinId,
    /// Input side
    pub end_pin: PinId,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, start_pin: PinId, end_pin: PinId) -> Self {
        Self {
            id,
            start_pin,
            end_pin,
        }
    }

    /// Node on the output side
    pub fn start_node(&self) -> NodeId {
        self.start_pin.node
    }

    /// Node on the input side
    pub fn end_node(&self) -> NodeId {
        self.end_pin.node
    }

    /// Both endpoint nodes, output side first
    pub fn nodes(&self) -> (NodeId, NodeId) {
        (self.start_node(), self.end_node())
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.start_node() == node_id || self.end_node() == node_id
    }

    /// Check if this connection involves a specific pin
    pub fn involves_pin(&self, pin_id: PinId) -> bool {
        self.start_pin == pin_id || self.end_pin == pin_id
    }
}
