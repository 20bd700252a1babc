// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node kinds, keyed by type name.

use crate::node::{Node, NodeCategory, NodeId, NodeKind};
use crate::pin::PinError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Constructor for a default-configured node kind
pub type NodeFactory = Box<dyn Fn() -> Box<dyn NodeKind>>;

/// Metadata describing a registered node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Unique type name, also used in saved graphs
    pub type_name: String,
    /// Display title
    pub title: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
}

impl NodeDescriptor {
    /// Create a descriptor whose title equals the type name
    pub fn new(type_name: impl Into<String>, category: NodeCategory) -> Self {
        let type_name = type_name.into();
        Self {
            title: type_name.clone(),
            type_name,
            category,
            description: String::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

struct RegistryEntry {
    descriptor: NodeDescriptor,
    factory: NodeFactory,
}

/// Registry of available node kinds
pub struct NodeRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register a node kind under its descriptor's type name
    pub fn register<F>(&mut self, descriptor: NodeDescriptor, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn NodeKind> + 'static,
    {
        if self.entries.contains_key(&descriptor.type_name) {
            return Err(RegistryError::DuplicateType(descriptor.type_name));
        }

        self.entries.insert(
            descriptor.type_name.clone(),
            RegistryEntry {
                descriptor,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Register a node kind built from its `Default` value
    pub fn register_default<K>(&mut self, descriptor: NodeDescriptor) -> Result<(), RegistryError>
    where
        K: NodeKind + Default + 'static,
    {
        self.register(descriptor, || Box::new(K::default()))
    }

    /// Get a descriptor by type name
    pub fn get(&self, type_name: &str) -> Option<&NodeDescriptor> {
        self.entries.get(type_name).map(|e| &e.descriptor)
    }

    /// Check if a type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.entries.values().map(|e| &e.descriptor)
    }

    /// Descriptors in a category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDescriptor> {
        self.descriptors().filter(move |d| d.category == category)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Construct a node of the given type with its full pin set
    pub fn create(&self, type_name: &str, id: NodeId) -> Result<Node, RegistryError> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;
        let kind = (entry.factory)();
        Node::new(id, &entry.descriptor, kind).map_err(|source| RegistryError::Build {
            type_name: type_name.to_string(),
            source,
        })
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when registering or creating node kinds
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Type name registered twice
    #[error("Node type already registered: {0}")]
    DuplicateType(String),

    /// Type name not registered
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    /// Node kind declared an invalid pin set
    #[error("Failed to build node of type {type_name}: {source}")]
    Build {
        /// Type being built
        type_name: String,
        /// Underlying pin error
        source: PinError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{PinSet, PinType};

    #[derive(Debug, Default)]
    struct Passthrough;

    impl NodeKind for Passthrough {
        fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
            pins.input("in", PinType::Any)?;
            pins.output("out", PinType::Any)?;
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Broken;

    impl NodeKind for Broken {
        fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
            pins.input("input A", PinType::Float)?;
            pins.input("input A", PinType::Float)?;
            Ok(())
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = NodeRegistry::new();
        registry
            .register_default::<Passthrough>(NodeDescriptor::new("Pass", NodeCategory::Custom))
            .unwrap();

        let node = registry.create("Pass", NodeId(3)).unwrap();
        assert_eq!(node.type_name, "Pass");
        assert_eq!(node.pins().len(), 2);
        assert!(node.pins().iter().all(|p| p.node() == NodeId(3)));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = NodeRegistry::new();
        let descriptor = NodeDescriptor::new("Pass", NodeCategory::Custom);
        registry.register_default::<Passthrough>(descriptor.clone()).unwrap();

        let err = registry.register_default::<Passthrough>(descriptor).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateType("Pass".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.create("Nope", NodeId(0)),
            Err(RegistryError::UnknownType(_))
        ));
    }

    #[test]
    fn test_duplicate_pin_names_fail_build() {
        let mut registry = NodeRegistry::new();
        registry
            .register_default::<Broken>(NodeDescriptor::new("Broken", NodeCategory::Custom))
            .unwrap();
        assert!(matches!(
            registry.create("Broken", NodeId(0)),
            Err(RegistryError::Build { .. })
        ));
    }
}
