//! Print sink
//!
//! Formats incoming data as a string; strings pass through unquoted.

use std::collections::HashMap;

use flow_engine::{Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::Value;

use crate::values::{display, take};

pub struct Print;

impl Print {
    pub const KEY: &'static str = "print";
    pub const PORT_DATA: &'static str = "data";
    pub const PORT_FORMATTED: &'static str = "formatted";

    const NAME: &'static str = "Print";

    pub fn node() -> Node {
        Node::new(Self::NAME, Print)
            .with_input(Self::PORT_DATA, None)
            .with_output(Self::PORT_FORMATTED, Some(PortDataType::Str))
    }
}

impl NodeProcessor for Print {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let data = take(&mut inputs, Self::NAME, Self::PORT_DATA)?;
        let formatted = display(&data);
        log::info!("{}", formatted);
        outputs.push(Self::PORT_FORMATTED, formatted)
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: Print::KEY,
    factory: Print::node,
});
