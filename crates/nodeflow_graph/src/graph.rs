// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId, NodeStatus};
use crate::pin::{Pin, PinDirection, PinId};
use crate::registry::{NodeRegistry, RegistryError};
use crate::scheduler::topological_sort;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// A node graph
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between pins
    connections: IndexMap<ConnectionId, Connection>,
    // Wider than the IDs so exhaustion is observable
    next_node: u64,
    next_connection: u64,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            next_node: 0,
            next_connection: 0,
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.next_node = self.next_node.max(u64::from(id.0) + 1);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Create a node of a registered type and add it to the graph
    pub fn spawn(&mut self, registry: &NodeRegistry, type_name: &str) -> Result<NodeId, GraphError> {
        let id = u32::try_from(self.next_node)
            .map(NodeId)
            .map_err(|_| GraphError::IdSpaceExhausted)?;
        let node = registry.create(type_name, id)?;
        self.add_node(node)
    }

    /// Remove a node and every connection attached to its pins
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let attached = self.nodes.get(&node_id)?.connection_ids();
        for connection_id in attached {
            self.disconnect(connection_id);
        }
        tracing::debug!("Removed node {node_id}");
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if a node exists
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get a pin by ID
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.nodes.get(&pin_id.node)?.pin(pin_id)
    }

    /// Get a mutable pin by ID
    pub fn pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        self.nodes.get_mut(&pin_id.node)?.pin_mut(pin_id)
    }

    /// Find a pin on a node by name and direction
    pub fn find_pin(&self, node_id: NodeId, name: &str, direction: PinDirection) -> Option<PinId> {
        self.nodes
            .get(&node_id)?
            .find_pin(name, direction)
            .map(|p| p.id)
    }

    /// Overwrite a pin's value and mark its node dirty
    pub fn set_pin_value(&mut self, pin_id: PinId, value: Value) -> Result<(), GraphError> {
        let pin = self
            .pin_mut(pin_id)
            .ok_or(GraphError::PinNotFound(pin_id))?;
        pin.value = value;
        self.mark_dirty(pin_id.node);
        Ok(())
    }

    /// Mark a node as needing a re-run
    pub fn mark_dirty(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            if node.status == NodeStatus::Clean {
                node.status = NodeStatus::Dirty;
            }
        }
    }

    /// Connect two pins.
    ///
    /// The pins may be given in either order; the connection always starts at
    /// the output pin. Any connection already attached to either pin is
    /// removed first.
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<ConnectionId, ConnectError> {
        let pin_a = self.pin(a).ok_or(ConnectError::PinNotFound(a))?;
        let pin_b = self.pin(b).ok_or(ConnectError::PinNotFound(b))?;

        if a.node == b.node {
            return Err(ConnectError::SelfLoop(a.node));
        }
        if pin_a.direction == pin_b.direction {
            return Err(ConnectError::SameDirection(a, b));
        }
        if !pin_a.pin_type.can_connect_to(&pin_b.pin_type) {
            return Err(ConnectError::IncompatibleTypes {
                start: pin_a.pin_type.clone(),
                end: pin_b.pin_type.clone(),
            });
        }

        let (start, end) = if pin_a.is_output() { (a, b) } else { (b, a) };
        let id = u32::try_from(self.next_connection)
            .map(ConnectionId)
            .map_err(|_| ConnectError::IdSpaceExhausted)?;

        // Every pin holds at most one connection
        for pin_id in [start, end] {
            if let Some(existing) = self.pin(pin_id).and_then(|p| p.connection) {
                self.disconnect(existing);
            }
        }

        self.next_connection += 1;
        self.connections.insert(id, Connection::new(id, start, end));

        for pin_id in [start, end] {
            if let Some(pin) = self.pin_mut(pin_id) {
                pin.connection = Some(id);
            }
        }
        self.mark_dirty(end.node);

        tracing::debug!("Connected {start} -> {end} as {id}");
        Ok(id)
    }

    /// Connect an output pin to an input pin, both looked up by name
    pub fn connect_by_name(
        &mut self,
        start_node: NodeId,
        start_pin: &str,
        end_node: NodeId,
        end_pin: &str,
    ) -> Result<ConnectionId, ConnectError> {
        if !self.contains_node(start_node) {
            return Err(ConnectError::NodeNotFound(start_node));
        }
        if !self.contains_node(end_node) {
            return Err(ConnectError::NodeNotFound(end_node));
        }

        let start = self
            .find_pin(start_node, start_pin, PinDirection::Output)
            .ok_or_else(|| ConnectError::PinNameNotFound(start_node, start_pin.to_string()))?;
        let end = self
            .find_pin(end_node, end_pin, PinDirection::Input)
            .ok_or_else(|| ConnectError::PinNameNotFound(end_node, end_pin.to_string()))?;
        self.connect(start, end)
    }

    /// Remove a connection, clearing the back-references on both pins
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;

        for pin_id in [connection.start_pin, connection.end_pin] {
            if let Some(pin) = self.pin_mut(pin_id) {
                if pin.connection == Some(connection_id) {
                    pin.connection = None;
                }
            }
        }
        self.mark_dirty(connection.end_node());

        tracing::debug!("Disconnected {connection_id}");
        Some(connection)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Capture the current nodes and connections for one execution request
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.keys().copied().collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }

    /// Capture what an event at `source` has to run.
    ///
    /// That is `source`, everything reachable downstream of it over any
    /// connection, and every node feeding those through data connections.
    /// Returns `None` if `source` is not in the graph.
    pub fn trigger_snapshot(&self, source: NodeId) -> Option<Snapshot> {
        if !self.contains_node(source) {
            return None;
        }

        let mut reached: HashSet<NodeId> = HashSet::from([source]);
        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            for connection in self
                .connections_for_node(current)
                .filter(|c| c.start_node() == current)
            {
                if reached.insert(connection.end_node()) {
                    queue.push_back(connection.end_node());
                }
            }
        }

        // Pull in data providers of everything that will run
        let mut queue: VecDeque<NodeId> = reached.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            for connection in self
                .connections_for_node(current)
                .filter(|c| c.end_node() == current)
            {
                let is_data = self
                    .pin(connection.end_pin)
                    .is_some_and(|p| !p.is_execution());
                if is_data && reached.insert(connection.start_node()) {
                    queue.push_back(connection.start_node());
                }
            }
        }

        Some(Snapshot {
            nodes: self.node_ids().filter(|id| reached.contains(id)).collect(),
            connections: self
                .connections()
                .filter(|c| reached.contains(&c.start_node()) && reached.contains(&c.end_node()))
                .cloned()
                .collect(),
        })
    }

    /// Get nodes in topological order (for evaluation)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        self.snapshot().execution_order()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// The nodes and connections taking part in one execution request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Nodes, in graph order
    pub nodes: Vec<NodeId>,
    /// Connections, in graph order
    pub connections: Vec<Connection>,
}

impl Snapshot {
    /// Order the snapshot's nodes so every connection points forward.
    ///
    /// Connections with an endpoint outside the snapshot are ignored. A node
    /// listed more than once is scheduled once, at its first position.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut nodes: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(self.nodes.len());
        for id in &self.nodes {
            index.entry(*id).or_insert_with(|| {
                nodes.push(*id);
                nodes.len() - 1
            });
        }

        let edges: Vec<(usize, usize)> = self
            .connections
            .iter()
            .filter_map(|c| Some((*index.get(&c.start_node())?, *index.get(&c.end_node())?)))
            .collect();

        topological_sort(nodes.len(), &edges)
            .map(|order| order.into_iter().map(|i| nodes[i]).collect())
            .map_err(|cycle| CycleError {
                nodes: cycle.vertices.into_iter().map(|i| nodes[i]).collect(),
            })
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// No pin with this name on the node
    #[error("Node {0} has no pin named {1:?}")]
    PinNameNotFound(NodeId, String),

    /// Both pins are inputs, or both are outputs
    #[error("Pins {0} and {1} have the same direction")]
    SameDirection(PinId, PinId),

    /// Incompatible pin types
    #[error("Incompatible pin types: {start} and {end}")]
    IncompatibleTypes {
        /// Type of the first pin
        start: crate::pin::PinType,
        /// Type of the second pin
        end: crate::pin::PinType,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(NodeId),

    /// Every connection ID has been handed out
    #[error("No connection IDs left")]
    IdSpaceExhausted,
}

/// Error when changing the graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A node with this ID is already in the graph
    #[error("Duplicate node ID: {0}")]
    DuplicateNode(NodeId),

    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    /// Node could not be created
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Every node ID has been handed out
    #[error("No node IDs left")]
    IdSpaceExhausted,
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through nodes {nodes:?}")]
pub struct CycleError {
    /// Nodes on the cycle, in path order
    pub nodes: Vec<NodeId>,
}
