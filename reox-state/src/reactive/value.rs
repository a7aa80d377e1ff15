//! Typed State Values
//!
//! Every state cell holds a [`Value`] whose variant is fixed by the cell's
//! [`StateType`] at creation. The [`StateValue`] trait is the bridge from
//! plain Rust types to the dynamic representation; the typed accessors on
//! [`Store`](super::Store) are written once against it.
//!
//! # Equality
//!
//! Change detection uses the variant's own `==`. For floats that is IEEE
//! equality: writing NaN always counts as a change, and `-0.0` is equal to
//! `0.0`. Strings compare byte-wise, objects structurally.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type tag of a state cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateType {
    Int,
    Float,
    Bool,
    String,
    Object,
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateType::Int => "int",
            StateType::Float => "float",
            StateType::Bool => "bool",
            StateType::String => "string",
            StateType::Object => "object",
        };
        f.write_str(name)
    }
}

/// The current or previous contents of a state cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Object(serde_json::Value),
}

impl Value {
    /// The type tag matching this variant.
    pub fn state_type(&self) -> StateType {
        match self {
            Value::Int(_) => StateType::Int,
            Value::Float(_) => StateType::Float,
            Value::Bool(_) => StateType::Bool,
            Value::String(_) => StateType::String,
            Value::Object(_) => StateType::Object,
        }
    }

    /// The value an unchecked getter returns when a lookup misses.
    pub fn default_for(state_type: StateType) -> Self {
        match state_type {
            StateType::Int => Value::Int(0),
            StateType::Float => Value::Float(0.0),
            StateType::Bool => Value::Bool(false),
            StateType::String => Value::String(String::new()),
            StateType::Object => Value::Object(serde_json::Value::Null),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{v}'"),
            Value::Object(v) => write!(f, "{v}"),
        }
    }
}

/// A Rust type that can live in a state cell.
pub trait StateValue: Sized {
    /// The cell type this Rust type maps to.
    const STATE_TYPE: StateType;

    fn into_value(self) -> Value;

    /// Project a stored value back out. `None` if the variant differs.
    fn from_value(value: &Value) -> Option<Self>;

    /// The type default returned on a lookup miss.
    fn fallback() -> Self;
}

impl StateValue for i64 {
    const STATE_TYPE: StateType = StateType::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }

    fn fallback() -> Self {
        0
    }
}

impl StateValue for f64 {
    const STATE_TYPE: StateType = StateType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }

    fn fallback() -> Self {
        0.0
    }
}

impl StateValue for bool {
    const STATE_TYPE: StateType = StateType::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn fallback() -> Self {
        false
    }
}

impl StateValue for String {
    const STATE_TYPE: StateType = StateType::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }

    fn fallback() -> Self {
        String::new()
    }
}

impl StateValue for serde_json::Value {
    const STATE_TYPE: StateType = StateType::Object;

    fn into_value(self) -> Value {
        Value::Object(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }

    fn fallback() -> Self {
        serde_json::Value::Null
    }
}
