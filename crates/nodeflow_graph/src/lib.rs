// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph execution engine for `nodeflow`.
//!
//! Users place typed nodes, wire their pins together and run the resulting
//! directed graph. This crate holds everything below the editor surface:
//! - Pins, connections and nodes stored in an ID-addressed arena
//! - Connection validation and direction normalization
//! - Dependency scheduling with cycle detection
//! - Per-node execution with failure isolation
//! - The saved graph format
//!
//! ## Architecture
//!
//! A [`Graph`] owns its [`Node`]s, and each node owns its [`Pin`]s. Pins refer
//! to their [`Connection`] by [`ConnectionId`] rather than by reference.
//! Running a graph takes a [`Snapshot`], orders it with the [`scheduler`] and
//! hands each node to its [`NodeKind`] through the [`Executor`].

pub mod value;
pub mod pin;
pub mod connection;
pub mod node;
pub mod registry;
pub mod nodes;
pub mod graph;
pub mod scheduler;
pub mod executor;
pub mod document;

pub use connection::{Connection, ConnectionId};
pub use document::{DocumentError, GraphDocument, LoadReport};
pub use executor::{
    ComputeContext, ComputeError, ExecutionError, ExecutionReport, Executor, ExecutorOptions,
    NodeOutcome,
};
pub use graph::{ConnectError, CycleError, Graph, GraphError, Snapshot};
pub use node::{Node, NodeCategory, NodeId, NodeKind, NodeStatus};
pub use nodes::create_default_registry;
pub use pin::{Pin, PinDirection, PinId, PinSet, PinType};
pub use registry::{NodeDescriptor, NodeRegistry, RegistryError};
pub use value::Value;
