// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node kinds.
//!
//! Data pins use `Float` for arithmetic; every node that takes part in
//! execution flow carries an `Ex In` and/or `Ex Out` pin.

use crate::executor::{ComputeContext, ComputeError};
use crate::node::{NodeCategory, NodeKind};
use crate::pin::{PinError, PinSet, PinType};
use crate::registry::{NodeDescriptor, NodeRegistry};
use serde::{Deserialize, Serialize};

/// Constant float source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    /// Value written to the `value` output
    pub value: f64,
}

impl Scaler {
    /// Create a scaler holding `value`
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl NodeKind for Scaler {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.output("value", PinType::Float)?;
        Ok(())
    }

    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        ctx.set_output("value", self.value)
    }

    fn save_state(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }

    fn load_state(&mut self, state: &serde_json::Value) -> Result<(), serde_json::Error> {
        *self = Scaler::deserialize(state)?;
        Ok(())
    }
}

/// Sum of two floats
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl NodeKind for Add {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.exec_input("Ex In")?;
        pins.exec_output("Ex Out")?;
        pins.input("input A", PinType::Float)?;
        pins.input("input B", PinType::Float)?;
        pins.output("output", PinType::Float)?;
        Ok(())
    }

    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let sum = ctx.input_float("input A")? + ctx.input_float("input B")?;
        ctx.set_output("output", sum)
    }
}

/// Quotient of two floats; fails on a zero divisor
#[derive(Debug, Clone, Copy, Default)]
pub struct Divide;

impl NodeKind for Divide {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.exec_input("Ex In")?;
        pins.exec_output("Ex Out")?;
        pins.input("dividend", PinType::Float)?;
        pins.input("divisor", PinType::Float)?;
        pins.output("quotient", PinType::Float)?;
        Ok(())
    }

    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let divisor = ctx.input_float("divisor")?;
        if divisor == 0.0 {
            return Err(ComputeError::InvalidInput("division by zero".to_string()));
        }
        let quotient = ctx.input_float("dividend")? / divisor;
        ctx.set_output("quotient", quotient)
    }
}

/// Reports its input value
#[derive(Debug, Clone, Copy, Default)]
pub struct Print;

impl NodeKind for Print {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.exec_input("Ex In")?;
        pins.input("input", PinType::Any)?;
        Ok(())
    }

    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let text = ctx.input("input")?.to_string();
        tracing::info!("[Print Node] Value: {text}");
        ctx.emit(text);
        Ok(())
    }
}

/// User-pressed button starting an execution chain
#[derive(Debug, Clone, Copy, Default)]
pub struct Button;

impl NodeKind for Button {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.exec_output("Ex Out")?;
        Ok(())
    }

    fn compute(&mut self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        tracing::debug!("Button {} fired", ctx.node_id());
        Ok(())
    }
}

/// GUI event source starting an execution chain
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonEvent;

impl NodeKind for ButtonEvent {
    fn build(&self, pins: &mut PinSet) -> Result<(), PinError> {
        pins.exec_output("Ex Out")?;
        Ok(())
    }

    fn compute(&mut self, _ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        Ok(())
    }
}

/// Create a registry holding every built-in node kind
pub fn create_default_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_builtin(&mut registry).expect("built-in node types have unique names");
    registry
}

/// Register the built-in node kinds into an existing registry
pub fn register_builtin(registry: &mut NodeRegistry) -> Result<(), crate::registry::RegistryError> {
    registry.register_default::<Scaler>(
        NodeDescriptor::new("Scaler", NodeCategory::Constant)
            .with_description("Constant float value"),
    )?;
    registry.register_default::<Add>(
        NodeDescriptor::new("Add", NodeCategory::Logic).with_description("Adds two floats"),
    )?;
    registry.register_default::<Divide>(
        NodeDescriptor::new("Divide", NodeCategory::Logic)
            .with_description("Divides two floats, failing on a zero divisor"),
    )?;
    registry.register_default::<Print>(
        NodeDescriptor::new("Print", NodeCategory::Debug).with_description("Prints its input"),
    )?;
    registry.register_default::<Button>(
        NodeDescriptor::new("Button", NodeCategory::Input)
            .with_description("Starts execution when pressed"),
    )?;
    registry.register_default::<ButtonEvent>(
        NodeDescriptor::new("Button Event", NodeCategory::Event)
            .with_description("Starts execution on a GUI event"),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Executor, NodeOutcome};
    use crate::graph::Graph;
    use crate::node::NodeStatus;
    use crate::value::Value;

    #[test]
    fn test_default_registry_contents() {
        let registry = create_default_registry();
        assert_eq!(registry.len(), 6);
        assert!(registry.contains("Button Event"));
        assert_eq!(registry.types_in_category(NodeCategory::Logic).count(), 2);
    }

    #[test]
    fn test_register_builtin_twice_fails() {
        let mut registry = create_default_registry();
        assert!(register_builtin(&mut registry).is_err());
    }

    #[test]
    fn test_add_sums_scalers() {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let a = graph.spawn(&registry, "Scaler").unwrap();
        let b = graph.spawn(&registry, "Scaler").unwrap();
        let add = graph.spawn(&registry, "Add").unwrap();
        let print = graph.spawn(&registry, "Print").unwrap();

        graph
            .node_mut(a)
            .unwrap()
            .kind_mut()
            .load_state(&serde_json::json!({ "value": 1.5 }))
            .unwrap();
        graph
            .node_mut(b)
            .unwrap()
            .kind_mut()
            .load_state(&serde_json::json!({ "value": 2.0 }))
            .unwrap();
        graph.connect_by_name(a, "value", add, "input A").unwrap();
        graph.connect_by_name(b, "value", add, "input B").unwrap();
        graph.connect_by_name(add, "output", print, "input").unwrap();

        let report = Executor::new().run_graph(&mut graph).unwrap();
        assert!(report.succeeded());
        assert_eq!(graph.node(add).unwrap().output("output").unwrap().value, Value::Float(3.5));
        assert_eq!(report.messages().last().unwrap().text, "3.5");
    }

    #[test]
    fn test_divide_by_zero_is_isolated() {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let divide = graph.spawn(&registry, "Divide").unwrap();
        let print = graph.spawn(&registry, "Print").unwrap();
        graph.connect_by_name(divide, "quotient", print, "input").unwrap();

        let report = Executor::new().run_graph(&mut graph).unwrap();
        assert_eq!(
            report.outcome(divide),
            Some(&NodeOutcome::Failed(ComputeError::InvalidInput(
                "division by zero".to_string()
            )))
        );
        assert_eq!(report.outcome(print), Some(&NodeOutcome::Succeeded));
        assert_eq!(graph.node(divide).unwrap().status, NodeStatus::Error);
        // Print saw the untouched default output
        assert_eq!(report.messages()[0].text, "0");
    }

    #[test]
    fn test_scaler_state_round_trip() {
        let scaler = Scaler::new(4.25);
        let state = scaler.save_state().unwrap();
        let mut restored = Scaler::default();
        restored.load_state(&state).unwrap();
        assert_eq!(restored, scaler);
        assert!(restored.load_state(&serde_json::json!("nope")).is_err());
    }
}
