// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::connection::ConnectionId;
use crate::executor::{ComputeContext, ComputeError};
use crate::pin::{Pin, PinDirection, PinError, PinId, PinSet};
use crate::registry::NodeDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node within a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("#{}", self.0))
    }
}

/// Node category, used for grouping in node lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// User inputs (buttons, sliders)
    Input,
    /// Constant values
    Constant,
    /// Math and logic operations
    Logic,
    /// Debugging helpers
    Debug,
    /// Event sources
    Event,
    /// Custom/user-defined
    Custom,
}

impl NodeCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Input => "Inputs",
            Self::Constant => "Constants",
            Self::Logic => "Logic Nodes",
            Self::Debug => "Debug Nodes",
            Self::Event => "GUI Events",
            Self::Custom => "Custom",
        }
    }
}

/// Whether a node's outputs are up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Outputs reflect the current inputs
    Clean,
    /// Inputs or wiring changed since the last successful run
    #[default]
    Dirty,
    /// The last run of this node failed
    Error,
}

/// Behaviour of a concrete node kind.
///
/// `build` declares the pins once, right after construction. `compute` reads
/// the node's input pins and writes its output pins; every kind that is meant
/// to run must override it.
pub trait NodeKind: fmt::Debug {
    /// Declare the pins of this node kind
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError>;

    /// Transform input pin values into output pin values
    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let _ = ctx;
        Err(ComputeError::NotImplemented)
    }

    /// Hook that runs after a successful `compute`
    fn execute_outputs(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let _ = ctx;
        Ok(())
    }

    /// Kind-specific settings to persist alongside the node
    fn save_state(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore settings written by [`NodeKind::save_state`]
    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), serde_json::Error> {
        let _ = state;
        Ok(())
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type name, as registered
    pub type_name: String,
    /// Display title
    pub title: String,
    /// Category
    pub category: NodeCategory,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Whether the outputs are up to date
    pub status: NodeStatus,
    pins: Vec<Pin>,
    kind: Box<dyn NodeKind>,
}

impl Node {
    /// Create a node and build its pins
    pub fn new(
        id: NodeId,
        descriptor: &NodeDescriptor,
        kind: Box<dyn NodeKind>,
    ) -> Result<Self, PinError> {
        let mut pins = PinSet::new(id);
        kind.build(&mut pins)?;

        Ok(Self {
            id,
            type_name: descriptor.type_name.clone(),
            title: descriptor.title.clone(),
            category: descriptor.category,
            position: [0.0, 0.0],
            status: NodeStatus::Dirty,
            pins: pins.into_pins(),
            kind,
        })
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// All pins in declaration order
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Input pins in declaration order
    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.direction == PinDirection::Input)
    }

    /// Output pins in declaration order
    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.direction == PinDirection::Output)
    }

    /// Get a pin by ID
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        if pin_id.node != self.id {
            return None;
        }
        self.pins.get(pin_id.slot)
    }

    /// Get a mutable pin by ID
    pub fn pin_mut(&mut self, pin_id: PinId) -> Option<&mut Pin> {
        if pin_id.node != self.id {
            return None;
        }
        self.pins.get_mut(pin_id.slot)
    }

    /// Find a pin by name and direction
    pub fn find_pin(&self, name: &str, direction: PinDirection) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|p| p.direction == direction && p.name == name)
    }

    /// Find an input pin by name
    pub fn input(&self, name: &str) -> Option<&Pin> {
        self.find_pin(name, PinDirection::Input)
    }

    /// Find an output pin by name
    pub fn output(&self, name: &str) -> Option<&Pin> {
        self.find_pin(name, PinDirection::Output)
    }

    /// Distinct connections attached to any of this node's pins
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = Vec::new();
        for id in self.pins.iter().filter_map(|p| p.connection) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Node kind behaviour
    pub fn kind(&self) -> &dyn NodeKind {
        self.kind.as_ref()
    }

    /// Mutable node kind behaviour
    pub fn kind_mut(&mut self) -> &mut dyn NodeKind {
        self.kind.as_mut()
    }

    /// Split into the behaviour and the pins it operates on
    pub(crate) fn parts_mut(&mut self) -> (&mut dyn NodeKind, &mut [Pin]) {
        (self.kind.as_mut(), &mut self.pins)
    }
}
