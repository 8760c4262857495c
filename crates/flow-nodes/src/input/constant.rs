//! Constant sources
//!
//! Each source pushes the value of its `value` input. Unconnected, that is
//! the default, so the source fires once per run.

use std::collections::HashMap;

use flow_engine::{Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::{take, truthy};

/// Pushes an integer
pub struct IntegerSource;

impl IntegerSource {
    pub const KEY: &'static str = "integer-source";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_INT: &'static str = "int";

    const NAME: &'static str = "Int out";

    pub fn node() -> Node {
        Node::new(Self::NAME, IntegerSource)
            .with_input(Self::PORT_VALUE, Some(json!(0)))
            .with_output(Self::PORT_INT, Some(PortDataType::Int))
    }
}

impl NodeProcessor for IntegerSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let value = take(&mut inputs, Self::NAME, Self::PORT_VALUE)?;
        outputs.push(Self::PORT_INT, value)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: IntegerSource::KEY,
    factory: IntegerSource::node,
});

/// Pushes a float
pub struct FloatSource;

impl FloatSource {
    pub const KEY: &'static str = "float-source";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_FLOAT: &'static str = "float";

    const NAME: &'static str = "Float out";

    pub fn node() -> Node {
        Node::new(Self::NAME, FloatSource)
            .with_input(Self::PORT_VALUE, Some(json!(0.0)))
            .with_output(Self::PORT_FLOAT, Some(PortDataType::Float))
    }
}

impl NodeProcessor for FloatSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let value = take(&mut inputs, Self::NAME, Self::PORT_VALUE)?;
        outputs.push(Self::PORT_FLOAT, value)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: FloatSource::KEY,
    factory: FloatSource::node,
});

/// Pushes the truthiness of its value as a bool
pub struct BooleanSource;

impl BooleanSource {
    pub const KEY: &'static str = "boolean-source";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_BOOL: &'static str = "bool";

    const NAME: &'static str = "Bool out";

    pub fn node() -> Node {
        Node::new(Self::NAME, BooleanSource)
            .with_input(Self::PORT_VALUE, Some(json!(true)))
            .with_output(Self::PORT_BOOL, Some(PortDataType::Bool))
    }
}

impl NodeProcessor for BooleanSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let value = take(&mut inputs, Self::NAME, Self::PORT_VALUE)?;
        outputs.push(Self::PORT_BOOL, truthy(&value))
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: BooleanSource::KEY,
    factory: BooleanSource::node,
});

/// Pushes a string
pub struct StringSource;

impl StringSource {
    pub const KEY: &'static str = "string-source";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_STRING: &'static str = "string";

    const NAME: &'static str = "String out";

    pub fn node() -> Node {
        Node::new(Self::NAME, StringSource)
            .with_input(Self::PORT_VALUE, Some(json!("Hello")))
            .with_output(Self::PORT_STRING, Some(PortDataType::Str))
    }
}

impl NodeProcessor for StringSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let value = take(&mut inputs, Self::NAME, Self::PORT_VALUE)?;
        outputs.push(Self::PORT_STRING, value)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: StringSource::KEY,
    factory: StringSource::node,
});
