//! File sink
//!
//! Appends incoming data to a text file. The file is opened on first data
//! and stays open for the whole run; `finish` flushes and closes it.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use flow_engine::{FlowError, Node, NodeProcessor, Outputs, PortDataType, Result};
use serde_json::{json, Value};

use crate::values::{display, take, take_string, truthy};

#[derive(Default)]
pub struct FileSink {
    writer: Option<(PathBuf, BufWriter<File>)>,
}

impl FileSink {
    pub const KEY: &'static str = "file-sink";
    pub const PORT_DATA: &'static str = "data";
    pub const PORT_FILEPATH: &'static str = "filepath";
    pub const PORT_LINES: &'static str = "lines";

    const NAME: &'static str = "File sink";

    pub fn node() -> Node {
        Node::new(Self::NAME, FileSink::default())
            .with_input(Self::PORT_DATA, None)
            .with_typed_input(Self::PORT_FILEPATH, None, PortDataType::File)
            .with_input(Self::PORT_LINES, Some(json!(true)))
            .with_output(Self::PORT_FILEPATH, Some(PortDataType::Str))
    }

    fn writer(&mut self, path: &str) -> Result<&mut BufWriter<File>> {
        let reopen = match &self.writer {
            Some((open, _)) => open.as_path() != std::path::Path::new(path),
            None => true,
        };
        if reopen {
            self.close()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| FlowError::failed(format!("{}: cannot open '{}': {}", Self::NAME, path, e)))?;
            log::debug!("{}: opened {}", Self::NAME, path);
            self.writer = Some((PathBuf::from(path), BufWriter::new(file)));
        }
        match self.writer.as_mut() {
            Some((_, writer)) => Ok(writer),
            None => Err(FlowError::failed(format!("{}: no open file", Self::NAME))),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some((path, mut writer)) = self.writer.take() {
            writer.flush()?;
            log::debug!("{}: closed {}", Self::NAME, path.display());
        }
        Ok(())
    }
}

impl NodeProcessor for FileSink {
    fn prepare(&mut self) -> Result<()> {
        self.close()
    }

    fn process(&mut self, mut inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        let data = take(&mut inputs, Self::NAME, Self::PORT_DATA)?;
        let path = take_string(&mut inputs, Self::NAME, Self::PORT_FILEPATH)?;
        let lines = truthy(&take(&mut inputs, Self::NAME, Self::PORT_LINES)?);

        let writer = self.writer(&path)?;
        write!(writer, "{}", display(&data))?;
        if lines {
            writeln!(writer)?;
        }
        outputs.push(Self::PORT_FILEPATH, path)
    }

    fn finish(&mut self) -> Result<()> {
        self.close()
    }
}

inventory::submit!(flow_engine::NodeTypeFn {
    key: FileSink::KEY,
    factory: FileSink::node,
});
