//! Input and output ports
//!
//! Ports hold connection state and data, but never mutate their partners
//! themselves: connecting and disconnecting go through the owning
//! [`Graph`](crate::Graph) so both ends of a link change together.

use std::collections::VecDeque;

use serde_json::Value;

use crate::types::{InputRef, OutputRef, PortDataType};

/// Node input
///
/// Data is obtained either from the buffer filled by the connected output,
/// or from the default value.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub(crate) name: String,
    pub(crate) default: Option<Value>,
    pub(crate) buffer: VecDeque<Value>,
    pub(crate) connection: Option<OutputRef>,
    pub(crate) looped: bool,
    pub(crate) default_used: bool,
    pub(crate) ptype: PortDataType,
    /// Whether `ptype` was given explicitly (otherwise inferred from the default)
    pub(crate) explicit_type: bool,
}

impl InputPort {
    pub(crate) fn new(
        name: impl Into<String>,
        default: Option<Value>,
        ptype: Option<PortDataType>,
    ) -> Self {
        Self {
            name: name.into(),
            default,
            buffer: VecDeque::new(),
            connection: None,
            looped: false,
            default_used: false,
            ptype: ptype.unwrap_or_default(),
            explicit_type: ptype.is_some(),
        }
    }

    /// Port name, unique among the node's inputs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fallback value for unconnected or looped use
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Values delivered by the upstream output, oldest first
    pub fn buffer(&self) -> &VecDeque<Value> {
        &self.buffer
    }

    /// Whether buffered data is waiting
    pub fn has_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// The upstream output, if any
    pub fn connection(&self) -> Option<OutputRef> {
        self.connection
    }

    /// Whether an upstream output feeds this input
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Set by loop analysis on the bootstrap input of a cycle
    pub fn is_looped(&self) -> bool {
        self.looped
    }

    /// Whether the default was pulled since the last reset
    pub fn default_used(&self) -> bool {
        self.default_used
    }

    /// Data type, explicit or inferred from the default
    pub fn ptype(&self) -> PortDataType {
        self.ptype
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.looped = false;
        self.default_used = false;
    }

    /// Readiness given whether any sibling input currently holds data
    pub(crate) fn could_pull(&self, siblings_have_data: bool) -> bool {
        if self.has_data() {
            log::debug!("\t{}: yes, from buffer", self.name);
            return true;
        }

        if self.looped || !self.is_connected() {
            // When not connected or in a loop we might use the default,
            // but only once unless siblings keep delivering data.
            if self.default.is_none() {
                log::debug!("\t{}: no, have no default", self.name);
                return false;
            }
            if !self.default_used {
                log::debug!("\t{}: yes, using default", self.name);
                return true;
            }
            if siblings_have_data {
                log::debug!("\t{}: yes, reusing default alongside sibling data", self.name);
                return true;
            }
            log::debug!("\t{}: no, default used and siblings idle", self.name);
            return false;
        }

        log::debug!("\t{}: no, waiting for upstream data", self.name);
        false
    }

    /// Take the oldest buffered value, or the default when the buffer is empty
    pub fn pull(&mut self) -> Option<Value> {
        if let Some(value) = self.buffer.pop_front() {
            return Some(value);
        }
        self.default_used = true;
        self.default.clone()
    }
}

/// Node output
///
/// Holds the connected downstream inputs in connection order. When nothing
/// is connected, pushed values are kept as the sink `result`.
#[derive(Debug, Clone)]
pub struct OutputPort {
    pub(crate) name: String,
    pub(crate) connections: Vec<InputRef>,
    pub(crate) result: Option<Value>,
    pub(crate) ptype: PortDataType,
}

impl OutputPort {
    pub(crate) fn new(name: impl Into<String>, ptype: Option<PortDataType>) -> Self {
        Self {
            name: name.into(),
            connections: Vec::new(),
            result: None,
            ptype: ptype.unwrap_or_default(),
        }
    }

    /// Port name, unique among the node's outputs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Downstream inputs in connection order
    pub fn connections(&self) -> &[InputRef] {
        &self.connections
    }

    /// Whether any input consumes this output
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Last value pushed while unconnected
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Declared data type
    pub fn ptype(&self) -> PortDataType {
        self.ptype
    }

    pub(crate) fn reset(&mut self) {
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use serde_json::json;

    #[test]
    fn test_pull_prefers_buffer_fifo() {
        let mut input = InputPort::new("x", Some(json!(0)), None);
        input.buffer.push_back(json!(1));
        input.buffer.push_back(json!(2));

        assert_eq!(input.pull(), Some(json!(1)));
        assert_eq!(input.pull(), Some(json!(2)));
        assert!(!input.default_used());

        assert_eq!(input.pull(), Some(json!(0)));
        assert!(input.default_used());
    }

    #[test]
    fn test_could_pull_without_default() {
        let input = InputPort::new("x", None, None);
        assert!(!input.could_pull(true));
    }

    #[test]
    fn test_connected_input_waits_for_upstream() {
        let mut input = InputPort::new("x", Some(json!(5)), None);
        input.connection = Some(OutputRef::new(NodeId(0), 0));

        // Default is ignored while connected and not looped
        assert!(!input.could_pull(true));

        input.looped = true;
        assert!(input.could_pull(false));
    }

    #[test]
    fn test_reset_clears_run_state() {
        let mut input = InputPort::new("x", Some(json!(5)), None);
        input.buffer.push_back(json!(1));
        input.looped = true;
        input.default_used = true;
        input.reset();

        assert!(input.buffer().is_empty());
        assert!(!input.is_looped());
        assert!(!input.default_used());
        assert_eq!(input.default_value(), Some(&json!(5)));

        let mut output = OutputPort::new("y", None);
        output.result = Some(json!("done"));
        output.reset();
        assert!(output.result().is_none());
    }

    #[test]
    fn test_explicit_type_is_remembered() {
        let typed = InputPort::new("x", None, Some(PortDataType::List));
        assert_eq!(typed.ptype(), PortDataType::List);
        assert!(typed.explicit_type);

        let untyped = InputPort::new("y", Some(json!(1)), None);
        assert_eq!(untyped.ptype(), PortDataType::Object);
        assert!(!untyped.explicit_type);
    }
}
