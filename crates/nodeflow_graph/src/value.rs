// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamically-typed values carried by pins.

use crate::pin::PinType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value that can be stored in a pin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value (never produced, or an execution pin)
    #[default]
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    String(String),
    /// Ordered list of values
    List(Vec<Value>),
}

impl Value {
    /// Check whether this is [`Value::None`]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Read as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Read as an integer, accepting floats without a fractional part that
    /// fit in an `i64`
    pub fn as_int(&self) -> Option<i64> {
        // 2^63 is exactly representable; i64::MAX is not
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && (-LIMIT..LIMIT).contains(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Convert this value so it fits a pin of the given type.
    ///
    /// Returns `None` when no implicit conversion exists. `Any` accepts every
    /// value unchanged; execution pins never carry data.
    pub fn coerce_to(&self, target: &PinType) -> Option<Value> {
        match (target, self) {
            (PinType::Any, value) => Some(value.clone()),
            (PinType::Exec, _) | (_, Self::None) => None,
            (PinType::Float, Self::Int(_) | Self::Float(_)) => self.as_float().map(Self::Float),
            (PinType::Int, Self::Int(_) | Self::Float(_)) => self.as_int().map(Self::Int),
            (PinType::Bool, Self::Bool(_))
            | (PinType::String, Self::String(_))
            | (PinType::List, Self::List(_)) => Some(self.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(3).coerce_to(&PinType::Float), Some(Value::Float(3.0)));
        assert_eq!(Value::Float(4.0).coerce_to(&PinType::Int), Some(Value::Int(4)));
        assert_eq!(Value::Float(4.5).coerce_to(&PinType::Int), None);
    }

    #[test]
    fn test_out_of_range_float_is_not_an_int() {
        assert_eq!(Value::Float(1e30).coerce_to(&PinType::Int), None);
        assert_eq!(Value::Float(-1e30).coerce_to(&PinType::Int), None);
        assert_eq!(Value::Float(9_223_372_036_854_775_808.0).as_int(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_int(), None);
        assert_eq!(Value::Float(-9_223_372_036_854_775_808.0).as_int(), Some(i64::MIN));
    }

    #[test]
    fn test_mismatched_coercion() {
        assert_eq!(Value::from("text").coerce_to(&PinType::Float), None);
        assert_eq!(Value::Bool(true).coerce_to(&PinType::Int), None);
        assert_eq!(Value::None.coerce_to(&PinType::Float), None);
        assert_eq!(Value::Float(1.0).coerce_to(&PinType::Exec), None);
    }

    #[test]
    fn test_any_accepts_everything() {
        assert_eq!(Value::None.coerce_to(&PinType::Any), Some(Value::None));
        let list = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(list.coerce_to(&PinType::Any), Some(list.clone()));
    }

    #[test]
    fn test_display() {
        let list = Value::List(vec![Value::Int(1), Value::Float(2.5), Value::from("x")]);
        assert_eq!(list.to_string(), "[1, 2.5, x]");
        assert_eq!(Value::None.to_string(), "None");
    }
}
