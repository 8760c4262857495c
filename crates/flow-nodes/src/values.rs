//! Helpers for reading typed values out of a node's pulled inputs

use std::collections::HashMap;

use flow_engine::{FlowError, Result};
use serde_json::Value;

/// Remove an input value, failing when the node was run without it
pub(crate) fn take(inputs: &mut HashMap<String, Value>, node: &str, name: &str) -> Result<Value> {
    inputs
        .remove(name)
        .ok_or_else(|| FlowError::failed(format!("{}: missing input '{}'", node, name)))
}

pub(crate) fn take_i64(inputs: &mut HashMap<String, Value>, node: &str, name: &str) -> Result<i64> {
    let value = take(inputs, node, name)?;
    value
        .as_i64()
        .ok_or_else(|| FlowError::failed(format!("{}: '{}' must be an integer, got {}", node, name, value)))
}

pub(crate) fn take_f64(inputs: &mut HashMap<String, Value>, node: &str, name: &str) -> Result<f64> {
    let value = take(inputs, node, name)?;
    value
        .as_f64()
        .ok_or_else(|| FlowError::failed(format!("{}: '{}' must be a number, got {}", node, name, value)))
}

pub(crate) fn take_string(inputs: &mut HashMap<String, Value>, node: &str, name: &str) -> Result<String> {
    match take(inputs, node, name)? {
        Value::String(s) => Ok(s),
        other => Err(FlowError::failed(format!(
            "{}: '{}' must be a string, got {}",
            node, name, other
        ))),
    }
}

pub(crate) fn take_array(inputs: &mut HashMap<String, Value>, node: &str, name: &str) -> Result<Vec<Value>> {
    match take(inputs, node, name)? {
        Value::Array(items) => Ok(items),
        other => Err(FlowError::failed(format!(
            "{}: '{}' must be an array, got {}",
            node, name, other
        ))),
    }
}

/// Truthiness: null, false, zero, and empty strings or containers are false
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value for humans: strings without quotes, everything else as JSON
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
