//! Nodes and the per-iteration readiness algorithm
//!
//! A [`Node`] owns its ports and a boxed [`NodeProcessor`] holding the
//! node-type specific behaviour. Every iteration the graph calls
//! [`Node::collect`]: when every input could pull, all inputs are pulled
//! and the processor runs. Values it pushes are returned as [`Emission`]s
//! which the graph delivers before moving on to the next node.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::port::{InputPort, OutputPort};
use crate::types::{PortDataType, PortTypeRegistry};

/// Behaviour of a node type
///
/// `process` receives one value per input, keyed by input name, and pushes
/// results through `outputs`. `prepare` runs once per graph preparation and
/// `finish` once after each run, for resources held across a whole run.
pub trait NodeProcessor: Send {
    fn process(&mut self, inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()>;

    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

type ProcessFn = dyn FnMut(HashMap<String, Value>, &mut Outputs<'_>) -> Result<()> + Send;

/// Closure-backed processor
///
/// Handy for tests and one-off nodes that need no lifecycle hooks.
pub struct CallbackProcessor {
    callback: Box<ProcessFn>,
}

impl CallbackProcessor {
    pub fn new(
        callback: impl FnMut(HashMap<String, Value>, &mut Outputs<'_>) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl NodeProcessor for CallbackProcessor {
    fn process(&mut self, inputs: HashMap<String, Value>, outputs: &mut Outputs<'_>) -> Result<()> {
        (self.callback)(inputs, outputs)
    }
}

/// A value pushed to one of the node's outputs during `process`
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Index into the node's output list
    pub output: usize,
    pub value: Value,
}

/// Output side handed to [`NodeProcessor::process`]
///
/// Besides pushing, a processor can look at what is still queued on its own
/// inputs and put values back in front of the next iteration.
pub struct Outputs<'a> {
    node: &'a str,
    inputs: &'a [InputPort],
    ports: &'a [OutputPort],
    emitted: Vec<Emission>,
    requeued: Vec<(usize, Value)>,
}

impl<'a> Outputs<'a> {
    /// Outputs for a node's ports; useful for driving a processor directly
    pub fn new(node: &'a str, ports: &'a [OutputPort]) -> Self {
        Self::with_inputs(node, &[], ports)
    }

    /// Outputs that can also inspect and refill the node's inputs
    pub fn with_inputs(node: &'a str, inputs: &'a [InputPort], ports: &'a [OutputPort]) -> Self {
        Self {
            node,
            inputs,
            ports,
            emitted: Vec::new(),
            requeued: Vec::new(),
        }
    }

    /// Push a value out of the named output
    pub fn push(&mut self, output: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .ports
            .iter()
            .position(|p| p.name == output)
            .ok_or_else(|| FlowError::unknown_output(self.node, output))?;
        self.emitted.push(Emission {
            output: index,
            value: value.into(),
        });
        Ok(())
    }

    /// Whether a connected consumer will receive pushes on this output
    pub fn is_connected(&self, output: &str) -> bool {
        self.ports
            .iter()
            .any(|p| p.name == output && p.is_connected())
    }

    /// Values still buffered on the named input after this iteration's pull
    ///
    /// Requeued values are not counted. Unknown inputs have nothing pending.
    pub fn pending(&self, input: &str) -> usize {
        self.inputs
            .iter()
            .find(|p| p.name == input)
            .map_or(0, |p| p.buffer.len())
    }

    /// Append a value to the named input's buffer once `process` returns
    pub fn requeue(&mut self, input: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .inputs
            .iter()
            .position(|p| p.name == input)
            .ok_or_else(|| FlowError::unknown_input(self.node, input))?;
        self.requeued.push((index, value.into()));
        Ok(())
    }

    /// Everything pushed so far, in push order
    pub fn into_emissions(self) -> Vec<Emission> {
        self.emitted
    }

    fn into_parts(self) -> (Vec<Emission>, Vec<(usize, Value)>) {
        (self.emitted, self.requeued)
    }
}

/// A named unit of computation with input and output ports
pub struct Node {
    pub(crate) name: String,
    pub(crate) class: Option<String>,
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) outputs: Vec<OutputPort>,
    pub(crate) busy: bool,
    processor: Box<dyn NodeProcessor>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Create a node without ports
    pub fn new(name: impl Into<String>, processor: impl NodeProcessor + 'static) -> Self {
        Self {
            name: name.into(),
            class: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            busy: false,
            processor: Box::new(processor),
        }
    }

    /// Create a node whose behaviour is a closure
    pub fn from_fn(
        name: impl Into<String>,
        callback: impl FnMut(HashMap<String, Value>, &mut Outputs<'_>) -> Result<()> + Send + 'static,
    ) -> Self {
        Self::new(name, CallbackProcessor::new(callback))
    }

    /// Add an input port, replacing any input with the same name
    ///
    /// Without an explicit `ptype` the type is inferred from the default
    /// once the node joins a graph.
    pub fn add_input(
        &mut self,
        name: impl Into<String>,
        default: Option<Value>,
        ptype: Option<PortDataType>,
    ) -> &mut InputPort {
        let port = InputPort::new(name, default, ptype);
        let index = match self.inputs.iter().position(|p| p.name == port.name) {
            Some(index) => {
                self.inputs[index] = port;
                index
            }
            None => {
                self.inputs.push(port);
                self.inputs.len() - 1
            }
        };
        &mut self.inputs[index]
    }

    /// Add an output port, replacing any output with the same name
    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        ptype: Option<PortDataType>,
    ) -> &mut OutputPort {
        let port = OutputPort::new(name, ptype);
        let index = match self.outputs.iter().position(|p| p.name == port.name) {
            Some(index) => {
                self.outputs[index] = port;
                index
            }
            None => {
                self.outputs.push(port);
                self.outputs.len() - 1
            }
        };
        &mut self.outputs[index]
    }

    /// Builder form of [`Node::add_input`]
    pub fn with_input(mut self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.add_input(name, default, None);
        self
    }

    /// Builder form of [`Node::add_input`] with an explicit type
    pub fn with_typed_input(
        mut self,
        name: impl Into<String>,
        default: Option<Value>,
        ptype: PortDataType,
    ) -> Self {
        self.add_input(name, default, Some(ptype));
        self
    }

    /// Builder form of [`Node::add_output`]
    pub fn with_output(mut self, name: impl Into<String>, ptype: Option<PortDataType>) -> Self {
        self.add_output(name, ptype);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key this node was created from
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|p| p.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|p| p.name == name)
    }

    /// Readiness from the last `collect`
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Set the type of every untyped input that has a default
    pub fn infer_port_types(&mut self, port_types: &PortTypeRegistry) {
        for input in &mut self.inputs {
            if input.explicit_type {
                continue;
            }
            input.ptype = match &input.default {
                Some(default) => port_types.classify(default),
                None => PortDataType::Object,
            };
        }
    }

    /// Whether the input at `index` could deliver a value this iteration
    pub fn could_pull(&self, index: usize) -> bool {
        let Some(input) = self.inputs.get(index) else {
            return false;
        };
        let siblings_have_data = self
            .inputs
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && other.has_data());
        input.could_pull(siblings_have_data)
    }

    /// Clear run state and let the processor prepare
    pub fn reset(&mut self) -> Result<()> {
        for input in &mut self.inputs {
            input.reset();
        }
        for output in &mut self.outputs {
            output.reset();
        }
        self.busy = false;
        self.processor.prepare()
    }

    /// Run one iteration: pull and process when every input is ready
    ///
    /// Values pushed by the processor are appended to `emitted` in push
    /// order, including those pushed before the processor failed.
    pub fn collect(&mut self, emitted: &mut Vec<Emission>) -> Result<()> {
        log::debug!("{} is collecting data", self.name);
        let ready = (0..self.inputs.len()).all(|i| self.could_pull(i));
        if !ready {
            self.busy = false;
            log::debug!("{} can NOT process", self.name);
            return Ok(());
        }

        self.busy = true;
        log::debug!("{} can process", self.name);

        let mut data = HashMap::with_capacity(self.inputs.len());
        for input in &mut self.inputs {
            if let Some(value) = input.pull() {
                data.insert(input.name.clone(), value);
            }
        }

        let mut outputs = Outputs::with_inputs(&self.name, &self.inputs, &self.outputs);
        let outcome = self.processor.process(data, &mut outputs);
        let (emissions, requeued) = outputs.into_parts();
        emitted.extend(emissions);
        for (index, value) in requeued {
            if let Some(input) = self.inputs.get_mut(index) {
                log::debug!("{} requeued data on {}", self.name, input.name);
                input.buffer.push_back(value);
            }
        }
        outcome
    }

    pub fn finish(&mut self) -> Result<()> {
        self.processor.finish()
    }

    /// Mutable access to the processor, e.g. to reconfigure it between runs
    pub fn processor_mut(&mut self) -> &mut dyn NodeProcessor {
        self.processor.as_mut()
    }
}
