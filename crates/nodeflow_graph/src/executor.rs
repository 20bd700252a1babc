// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution.
//!
//! A run walks a [`Snapshot`] in topological order. Each node goes through
//! three phases: its connected data inputs are pulled from the upstream output
//! pins, its kind computes, then its `execute_outputs` hook runs. A node that
//! fails is marked [`NodeStatus::Error`] and the run moves on; nodes
//! downstream of it see whatever its outputs held before.
//!
//! Execution pins only order the run. They are ordinary edges for the
//! scheduler and never trigger nodes on their own; event sources use
//! [`Executor::run_triggered`] to run the part of the graph they feed.

use crate::graph::{CycleError, Graph, Snapshot};
use crate::node::{NodeId, NodeStatus};
use crate::pin::{Pin, PinDirection, PinType};
use crate::value::Value;
use indexmap::IndexMap;

/// Options for an [`Executor`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Log every pin value written during a run at debug level
    pub trace_values: bool,
}

/// Message a node emitted while computing
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMessage {
    /// Emitting node
    pub node: NodeId,
    /// Message text
    pub text: String,
}

/// Access to one node's pins while it computes
pub struct ComputeContext<'a> {
    node: NodeId,
    pins: &'a mut [Pin],
    messages: &'a mut Vec<NodeMessage>,
    trace_values: bool,
}

impl<'a> ComputeContext<'a> {
    /// Create a context over a node's pins
    pub fn new(node: NodeId, pins: &'a mut [Pin], messages: &'a mut Vec<NodeMessage>) -> Self {
        Self {
            node,
            pins,
            messages,
            trace_values: false,
        }
    }

    /// ID of the computing node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    fn find(&self, name: &str, direction: PinDirection) -> Result<&Pin, ComputeError> {
        self.pins
            .iter()
            .find(|p| p.direction == direction && p.name == name)
            .ok_or_else(|| ComputeError::MissingPin(name.to_string()))
    }

    /// Current value of an input pin
    pub fn input(&self, name: &str) -> Result<&Value, ComputeError> {
        self.find(name, PinDirection::Input).map(|p| &p.value)
    }

    /// Input value read as a float
    pub fn input_float(&self, name: &str) -> Result<f64, ComputeError> {
        let value = self.input(name)?;
        value.as_float().ok_or_else(|| ComputeError::TypeMismatch {
            pin: name.to_string(),
            expected: PinType::Float,
            found: value.clone(),
        })
    }

    /// Current value of an output pin
    pub fn output(&self, name: &str) -> Result<&Value, ComputeError> {
        self.find(name, PinDirection::Output).map(|p| &p.value)
    }

    /// Write an output pin, converting to its declared type
    pub fn set_output(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ComputeError> {
        let value = value.into();
        let pin = self
            .pins
            .iter_mut()
            .find(|p| p.direction == PinDirection::Output && p.name == name)
            .ok_or_else(|| ComputeError::MissingPin(name.to_string()))?;

        let converted = value
            .coerce_to(&pin.pin_type)
            .ok_or_else(|| ComputeError::TypeMismatch {
                pin: name.to_string(),
                expected: pin.pin_type.clone(),
                found: value.clone(),
            })?;
        if self.trace_values {
            tracing::debug!("{} {name} = {converted}", self.node);
        }
        pin.value = converted;
        Ok(())
    }

    /// Report a message from this node (e.g. what a Print node printed)
    pub fn emit(&mut self, text: impl Into<String>) {
        self.messages.push(NodeMessage {
            node: self.node,
            text: text.into(),
        });
    }
}

/// How one node fared in a run
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// All three phases completed
    Succeeded,
    /// A phase failed; the node is in [`NodeStatus::Error`]
    Failed(ComputeError),
    /// The node was in the snapshot but no longer in the graph
    Skipped,
}

/// Result of one execution run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    outcomes: IndexMap<NodeId, NodeOutcome>,
    messages: Vec<NodeMessage>,
}

impl ExecutionReport {
    /// Nodes in the order they ran
    pub fn order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.outcomes.keys().copied()
    }

    /// Outcome for a node, if it was part of the run
    pub fn outcome(&self, node: NodeId) -> Option<&NodeOutcome> {
        self.outcomes.get(&node)
    }

    /// Failed nodes with their errors
    pub fn failures(&self) -> impl Iterator<Item = (NodeId, &ComputeError)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            NodeOutcome::Failed(err) => Some((*id, err)),
            _ => None,
        })
    }

    /// Whether every node succeeded
    pub fn succeeded(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| matches!(o, NodeOutcome::Succeeded))
    }

    /// Messages emitted by nodes, in emission order
    pub fn messages(&self) -> &[NodeMessage] {
        &self.messages
    }

    /// Number of nodes that were attempted
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the run had no nodes
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Runs graph snapshots
#[derive(Debug, Clone, Default)]
pub struct Executor {
    options: ExecutorOptions,
}

impl Executor {
    /// Create an executor with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with the given options
    pub fn with_options(options: ExecutorOptions) -> Self {
        Self { options }
    }

    /// Run every node in the graph
    pub fn run_graph(&self, graph: &mut Graph) -> Result<ExecutionReport, ExecutionError> {
        let snapshot = graph.snapshot();
        self.run(graph, &snapshot)
    }

    /// Run `source`, every node downstream of it, and the data providers
    /// those nodes read from
    pub fn run_triggered(
        &self,
        graph: &mut Graph,
        source: NodeId,
    ) -> Result<ExecutionReport, ExecutionError> {
        let snapshot = graph
            .trigger_snapshot(source)
            .ok_or(ExecutionError::NodeNotFound(source))?;
        self.run(graph, &snapshot)
    }

    /// Run a snapshot in topological order.
    ///
    /// Fails without running anything if the snapshot has a cycle. A node
    /// whose kind never implemented `compute` aborts the run; the error then
    /// carries the report of the nodes that ran before it.
    pub fn run(&self, graph: &mut Graph, snapshot: &Snapshot) -> Result<ExecutionReport, ExecutionError> {
        let order = snapshot.execution_order()?;
        tracing::debug!("Executing {} nodes: {order:?}", order.len());

        let mut report = ExecutionReport::default();
        for node_id in order {
            let Some(node) = graph.node(node_id) else {
                tracing::warn!("Node {node_id} was removed before it could run");
                report.outcomes.insert(node_id, NodeOutcome::Skipped);
                continue;
            };
            let type_name = node.type_name.clone();

            let outcome = match self.execute_node(graph, node_id, &mut report.messages) {
                Ok(()) => {
                    set_status(graph, node_id, NodeStatus::Clean);
                    NodeOutcome::Succeeded
                }
                Err(ComputeError::NotImplemented) => {
                    set_status(graph, node_id, NodeStatus::Error);
                    tracing::error!("Node {node_id} ({type_name}) has no compute implementation");
                    return Err(ExecutionError::Unimplemented {
                        node: node_id,
                        type_name,
                        completed: Box::new(report),
                    });
                }
                Err(err) => {
                    set_status(graph, node_id, NodeStatus::Error);
                    tracing::warn!("Node {node_id} ({type_name}) failed: {err}");
                    NodeOutcome::Failed(err)
                }
            };
            report.outcomes.insert(node_id, outcome);
        }

        let failed = report.failures().count();
        tracing::info!(
            "Execution finished: {} nodes run, {failed} failed",
            report.len()
        );
        Ok(report)
    }

    fn execute_node(
        &self,
        graph: &mut Graph,
        node_id: NodeId,
        messages: &mut Vec<NodeMessage>,
    ) -> Result<(), ComputeError> {
        self.execute_inputs(graph, node_id)?;

        let node = graph
            .node_mut(node_id)
            .ok_or_else(|| ComputeError::InvalidInput(format!("node {node_id} disappeared")))?;
        let (kind, pins) = node.parts_mut();
        let mut ctx = ComputeContext::new(node_id, pins, messages);
        ctx.trace_values = self.options.trace_values;

        kind.compute(&mut ctx)?;
        kind.execute_outputs(&mut ctx)
    }

    /// Copy upstream output values into this node's connected data inputs
    fn execute_inputs(&self, graph: &mut Graph, node_id: NodeId) -> Result<(), ComputeError> {
        let Some(node) = graph.node(node_id) else {
            return Ok(());
        };

        let mut incoming = Vec::new();
        for pin in node.inputs().filter(|p| !p.is_execution()) {
            let Some(upstream) = pin
                .connection
                .and_then(|id| graph.connection(id))
                .and_then(|c| graph.pin(c.start_pin))
            else {
                continue;
            };

            let value = upstream
                .value
                .coerce_to(&pin.pin_type)
                .ok_or_else(|| ComputeError::TypeMismatch {
                    pin: pin.name.clone(),
                    expected: pin.pin_type.clone(),
                    found: upstream.value.clone(),
                })?;
            incoming.push((pin.id, value));
        }

        for (pin_id, value) in incoming {
            if self.options.trace_values {
                tracing::debug!("{node_id} <- {pin_id} = {value}");
            }
            if let Some(pin) = graph.pin_mut(pin_id) {
                pin.value = value;
            }
        }
        Ok(())
    }
}

fn set_status(graph: &mut Graph, node_id: NodeId, status: NodeStatus) {
    if let Some(node) = graph.node_mut(node_id) {
        node.status = status;
    }
}

/// Error raised by a single node during a run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputeError {
    /// The node kind does not override `compute`
    #[error("compute is not implemented")]
    NotImplemented,

    /// No pin with this name
    #[error("Missing pin: {0}")]
    MissingPin(String),

    /// Value does not fit the pin's declared type
    #[error("Type mismatch on pin {pin:?}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Pin name
        pin: String,
        /// Declared type
        expected: PinType,
        /// Offending value
        found: Value,
    },

    /// Input values the node cannot work with
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Error that stops a whole run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    /// The snapshot has a dependency cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// Trigger node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node kind never implemented `compute`
    #[error("Node {node} ({type_name}) does not implement compute")]
    Unimplemented {
        /// Offending node
        node: NodeId,
        /// Its type name
        type_name: String,
        /// Nodes that ran before the abort
        completed: Box<ExecutionReport>,
    },
}
