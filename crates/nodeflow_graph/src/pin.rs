// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::connection::ConnectionId;
use crate::node::NodeId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a pin: the owning node plus the pin's declaration slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId {
    /// Owning node
    pub node: NodeId,
    /// Position of the pin in the node's declaration order
    pub slot: usize,
}

impl PinId {
    /// Create a pin ID
    pub fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.slot)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

/// Type declared by a pin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinType {
    /// Execution flow ("do this next"), carries no data
    Exec,
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// List of values
    List,
    /// Any data type (for generic nodes)
    Any,
}

impl PinType {
    /// Whether this is a control-flow pin type
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Exec)
    }

    /// Value a freshly built pin of this type holds
    pub fn default_value(&self) -> Value {
        match self {
            Self::Exec | Self::Any => Value::None,
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::List => Value::List(Vec::new()),
        }
    }

    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &PinType) -> bool {
        // Execution pins only ever pair with execution pins
        if self.is_execution() || other.is_execution() {
            return self == other;
        }

        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        if self == other {
            return true;
        }

        // Implicit numeric conversions
        matches!(
            (self, other),
            (Self::Int, Self::Float) | (Self::Float, Self::Int)
        )
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exec => "Exec",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::List => "List",
            Self::Any => "Any",
        };
        f.write_str(name)
    }
}

/// A pin on a node
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    /// Pin ID
    pub id: PinId,
    /// Pin name, unique per node and direction
    pub name: String,
    /// Pin direction
    pub direction: PinDirection,
    /// Declared type
    pub pin_type: PinType,
    /// Current value
    pub value: Value,
    /// Connection attached to this pin, if any
    pub connection: Option<ConnectionId>,
}

impl Pin {
    /// Create a new unconnected pin holding the type's default value
    pub fn new(
        id: PinId,
        name: impl Into<String>,
        direction: PinDirection,
        pin_type: PinType,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            direction,
            value: pin_type.default_value(),
            pin_type,
            connection: None,
        }
    }

    /// Owning node
    pub fn node(&self) -> NodeId {
        self.id.node
    }

    /// Whether this pin carries control flow instead of data
    pub fn is_execution(&self) -> bool {
        self.pin_type.is_execution()
    }

    /// Whether this is an output pin
    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Whether a connection is attached
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Set the value this pin holds until something overwrites it
    pub fn set_default(&mut self, value: Value) -> &mut Self {
        self.value = value;
        self
    }

    /// Check if a connection to another pin is valid
    pub fn can_connect_to(&self, other: &Pin) -> bool {
        self.node() != other.node()
            && self.direction != other.direction
            && self.pin_type.can_connect_to(&other.pin_type)
    }
}

/// Pins declared by a node kind while the node is being built
#[derive(Debug)]
pub struct PinSet {
    node: NodeId,
    pins: Vec<Pin>,
}

impl PinSet {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            pins: Vec::new(),
        }
    }

    /// Declare a pin. Names must be unique per direction.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        direction: PinDirection,
        pin_type: PinType,
    ) -> Result<&mut Pin, PinError> {
        let name = name.into();
        if self
            .pins
            .iter()
            .any(|p| p.direction == direction && p.name == name)
        {
            return Err(PinError::DuplicatePin { name, direction });
        }

        let id = PinId::new(self.node, self.pins.len());
        self.pins.push(Pin::new(id, name, direction, pin_type));
        let index = self.pins.len() - 1;
        Ok(&mut self.pins[index])
    }

    /// Declare a data input pin
    pub fn input(&mut self, name: impl Into<String>, pin_type: PinType) -> Result<&mut Pin, PinError> {
        self.add(name, PinDirection::Input, pin_type)
    }

    /// Declare a data output pin
    pub fn output(&mut self, name: impl Into<String>, pin_type: PinType) -> Result<&mut Pin, PinError> {
        self.add(name, PinDirection::Output, pin_type)
    }

    /// Declare an execution input pin
    pub fn exec_input(&mut self, name: impl Into<String>) -> Result<&mut Pin, PinError> {
        self.add(name, PinDirection::Input, PinType::Exec)
    }

    /// Declare an execution output pin
    pub fn exec_output(&mut self, name: impl Into<String>) -> Result<&mut Pin, PinError> {
        self.add(name, PinDirection::Output, PinType::Exec)
    }

    /// Number of pins declared so far
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Whether no pins were declared
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub(crate) fn into_pins(self) -> Vec<Pin> {
        self.pins
    }
}

/// Error when declaring pins
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PinError {
    /// Pin name already used in this direction
    #[error("Duplicate {direction:?} pin name: {name}")]
    DuplicatePin {
        /// Offending name
        name: String,
        /// Direction the name was reused in
        direction: PinDirection,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_pins_only_pair_with_exec() {
        assert!(PinType::Exec.can_connect_to(&PinType::Exec));
        assert!(!PinType::Exec.can_connect_to(&PinType::Any));
        assert!(!PinType::Float.can_connect_to(&PinType::Exec));
    }

    #[test]
    fn test_data_type_compatibility() {
        assert!(PinType::Int.can_connect_to(&PinType::Float));
        assert!(PinType::String.can_connect_to(&PinType::Any));
        assert!(!PinType::String.can_connect_to(&PinType::Bool));
    }

    #[test]
    fn test_duplicate_names_rejected_per_direction() {
        let mut pins = PinSet::new(NodeId(0));
        pins.input("input A", PinType::Float).unwrap();
        let err = pins.input("input A", PinType::Float).unwrap_err();
        assert_eq!(
            err,
            PinError::DuplicatePin {
                name: "input A".to_string(),
                direction: PinDirection::Input,
            }
        );

        // Same name on the other side is fine
        pins.output("input A", PinType::Float).unwrap();
        assert_eq!(pins.len(), 2);
    }

    #[test]
    fn test_slots_follow_declaration_order() {
        let mut pins = PinSet::new(NodeId(7));
        pins.exec_input("Ex In").unwrap();
        pins.input("value", PinType::Int).unwrap().set_default(Value::Int(5));
        let pins = pins.into_pins();

        assert_eq!(pins[0].id, PinId::new(NodeId(7), 0));
        assert_eq!(pins[1].id, PinId::new(NodeId(7), 1));
        assert!(pins[0].is_execution());
        assert_eq!(pins[1].value, Value::Int(5));
    }

    #[test]
    fn test_can_connect_rejects_same_node() {
        let a = Pin::new(PinId::new(NodeId(1), 0), "out", PinDirection::Output, PinType::Float);
        let b = Pin::new(PinId::new(NodeId(1), 1), "in", PinDirection::Input, PinType::Float);
        let c = Pin::new(PinId::new(NodeId(2), 0), "in", PinDirection::Input, PinType::Float);
        assert!(!a.can_connect_to(&b));
        assert!(a.can_connect_to(&c));
        assert!(c.can_connect_to(&a));
    }
}
