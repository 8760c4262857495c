//! File source
//!
//! Reads a text file and pushes each line, all within one iteration.

use std::collections::HashMap;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::Value;

use crate::values::take_string;

pub struct FileSource;

impl FileSource {
    pub const KEY: &'static str = "file-source";
    pub const PORT_FILEPATH: &'static str = "filepath";
    pub const PORT_LINE: &'static str = "line";

    const NAME: &'static str = "File source";

    /// The path has no default; set one or connect a string
    pub fn node() -> Node {
        Node::new(Self::NAME, FileSource)
            .with_typed_input(Self::PORT_FILEPATH, None, PortDataType::File)
            .with_output(Self::PORT_LINE, Some(PortDataType::Str))
    }
}

impl NodeProcessor for FileSource {
    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let path = take_string(&mut inputs, Self::NAME, Self::PORT_FILEPATH)?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FlowError::failed(format!("{}: cannot read '{}': {}", Self::NAME, path, e))
        })?;

        let mut count = 0;
        for line in content.lines() {
            outputs.push(Self::PORT_LINE, line)?;
            count += 1;
        }
        log::debug!("{}: read {} lines from {}", Self::NAME, count, path);
        Ok(())
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: FileSource::KEY,
    factory: FileSource::node,
});
