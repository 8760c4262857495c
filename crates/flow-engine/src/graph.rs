//! Graph storage, naming and connection management
//!
//! The graph owns its nodes in stable slots addressed by [`NodeId`].
//! Connections are recorded on both ends (input -> output and output ->
//! inputs) and only ever change through the methods here, which keeps the
//! two sides symmetric.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::{FlowError, Result};
use crate::node::Node;
use crate::port::{InputPort, OutputPort};
use crate::types::{InputRef, NodeId, OutputRef, PortTypeRegistry};

/// Lifecycle of a graph with respect to running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Unprepared,
    Prepared,
    Running,
    Finished,
}

/// Make `name` unique among `names`
///
/// Colliding names get a numeric suffix: `X`, `X.1`, `X.2`, ...
pub fn unique_name<'a>(names: impl IntoIterator<Item = &'a str> + Clone, name: &str) -> String {
    let mut candidate = name.to_string();
    while names.clone().into_iter().any(|n| n == candidate) {
        candidate = match candidate.rsplit_once('.') {
            Some((prefix, suffix)) => match suffix.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
                Some(n) => format!("{}.{}", prefix, n),
                None => format!("{}.1", candidate),
            },
            None => format!("{}.1", candidate),
        };
    }
    candidate
}

/// Name given to nodes added without one
pub const DEFAULT_NODE_NAME: &str = "Node";

/// A uniquely named collection of connected nodes
pub struct Graph {
    slots: Vec<Option<Node>>,
    names: HashMap<String, NodeId>,
    pub(crate) port_types: Arc<PortTypeRegistry>,
    pub(crate) config: EngineConfig,
    pub(crate) order: Vec<NodeId>,
    pub(crate) loop_inputs: Vec<InputRef>,
    pub(crate) state: GraphState,
    /// Node packages the graph was built against
    pub(crate) packages: Vec<String>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.nodes().map(|(_, node)| node.name()).collect();
        f.debug_struct("Graph")
            .field("nodes", &names)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("packages", &self.packages)
            .finish_non_exhaustive()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph with the standard port types
    pub fn new() -> Self {
        Self::with_port_types(Arc::new(PortTypeRegistry::with_builtins()))
    }

    /// Create an empty graph sharing the given port type registry
    pub fn with_port_types(port_types: Arc<PortTypeRegistry>) -> Self {
        Self {
            slots: Vec::new(),
            names: HashMap::new(),
            port_types,
            config: EngineConfig::default(),
            order: Vec::new(),
            loop_inputs: Vec::new(),
            state: GraphState::Unprepared,
            packages: Vec::new(),
        }
    }

    /// Replace the engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Current engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the engine configuration in place
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Registry used to infer input types
    pub fn port_types(&self) -> &PortTypeRegistry {
        &self.port_types
    }

    /// Where the graph is in its run lifecycle
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Node packages the graph was built against
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    fn invalidate(&mut self) {
        self.state = GraphState::Unprepared;
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Add a node under a collision-free version of its name
    ///
    /// A node without a name is called [`DEFAULT_NODE_NAME`].
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        if node.name.is_empty() {
            node.name = DEFAULT_NODE_NAME.to_string();
        }
        let name = unique_name(self.names.keys().map(String::as_str), &node.name);
        if name != node.name {
            log::debug!("Renamed node '{}' to '{}'", node.name, name);
        }
        node.name = name.clone();
        node.infer_port_types(&self.port_types);

        let id = NodeId(self.slots.len());
        self.slots.push(Some(node));
        self.names.insert(name, id);
        self.invalidate();
        id
    }

    /// Disconnect a node completely and take it out of the graph
    pub fn remove_node(&mut self, name: &str) -> Result<Node> {
        let id = self.require_node_id(name)?;
        self.disconnect_node(id)?;
        self.names.remove(name);
        self.order.retain(|n| *n != id);
        self.loop_inputs.retain(|i| i.node != id);
        self.invalidate();
        self.slots[id.0]
            .take()
            .ok_or_else(|| FlowError::UnknownNode(name.to_string()))
    }

    /// Delete all nodes
    pub fn clear(&mut self) {
        self.slots.clear();
        self.names.clear();
        self.order.clear();
        self.loop_inputs.clear();
        self.packages.clear();
        self.invalidate();
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Node in a slot, `None` once removed
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Slot of the node with this name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Look up a node by its unique name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    pub(crate) fn require_node_id(&self, name: &str) -> Result<NodeId> {
        self.node_id(name)
            .ok_or_else(|| FlowError::UnknownNode(name.to_string()))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i), node)))
    }

    pub(crate) fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|(id, _)| id).collect()
    }

    /// Name of a node, or a placeholder for removed slots (diagnostics only)
    pub(crate) fn name_of(&self, id: NodeId) -> &str {
        self.node(id).map(Node::name).unwrap_or("<removed>")
    }

    // ---------------------------------------------------------------------
    // Ports
    // ---------------------------------------------------------------------

    /// Resolve an input by node and port name
    pub fn input_ref(&self, node: &str, input: &str) -> Result<InputRef> {
        let id = self.require_node_id(node)?;
        let index = self
            .node(id)
            .and_then(|n| n.input_index(input))
            .ok_or_else(|| FlowError::unknown_input(node, input))?;
        Ok(InputRef::new(id, index))
    }

    /// Resolve an output by node and port name
    pub fn output_ref(&self, node: &str, output: &str) -> Result<OutputRef> {
        let id = self.require_node_id(node)?;
        let index = self
            .node(id)
            .and_then(|n| n.output_index(output))
            .ok_or_else(|| FlowError::unknown_output(node, output))?;
        Ok(OutputRef::new(id, index))
    }

    /// Resolve an input reference
    pub fn input(&self, input: InputRef) -> Option<&InputPort> {
        self.node(input.node).and_then(|n| n.inputs.get(input.index))
    }

    /// Resolve an output reference
    pub fn output(&self, output: OutputRef) -> Option<&OutputPort> {
        self.node(output.node).and_then(|n| n.outputs.get(output.index))
    }

    pub(crate) fn input_mut(&mut self, input: InputRef) -> Result<&mut InputPort> {
        self.node_mut(input.node)
            .and_then(|n| n.inputs.get_mut(input.index))
            .ok_or_else(|| FlowError::InvalidPortRef(format!("{:?}", input)))
    }

    pub(crate) fn output_mut(&mut self, output: OutputRef) -> Result<&mut OutputPort> {
        self.node_mut(output.node)
            .and_then(|n| n.outputs.get_mut(output.index))
            .ok_or_else(|| FlowError::InvalidPortRef(format!("{:?}", output)))
    }

    /// Replace the default value of an input (`None` removes it)
    pub fn set_default(&mut self, input: InputRef, default: Option<Value>) -> Result<()> {
        self.input_mut(input)?.default = default;
        self.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    /// Connect an output to an input
    ///
    /// The input is first detached from any previous upstream. Type
    /// mismatches are reported but never block the connection.
    pub fn connect(&mut self, output: OutputRef, input: InputRef) -> Result<()> {
        let out_type = self
            .output(output)
            .map(OutputPort::ptype)
            .ok_or_else(|| FlowError::InvalidPortRef(format!("{:?}", output)))?;
        let in_type = self
            .input(input)
            .map(InputPort::ptype)
            .ok_or_else(|| FlowError::InvalidPortRef(format!("{:?}", input)))?;

        if !out_type.is_compatible_with(&in_type) {
            let out_name = self.output(output).map(OutputPort::name).unwrap_or_default();
            let in_name = self.input(input).map(InputPort::name).unwrap_or_default();
            if self.config.type_warnings {
                log::warn!(
                    "Type of {}.{} ({}) might be incompatible with {}.{} ({})",
                    self.name_of(output.node),
                    out_name,
                    out_type,
                    self.name_of(input.node),
                    in_name,
                    in_type
                );
            } else {
                log::debug!(
                    "Type of {}.{} ({}) might be incompatible with {}.{} ({})",
                    self.name_of(output.node),
                    out_name,
                    out_type,
                    self.name_of(input.node),
                    in_name,
                    in_type
                );
            }
        }

        self.disconnect_input(input)?;
        self.input_mut(input)?.connection = Some(output);
        self.output_mut(output)?.connections.push(input);
        self.invalidate();
        Ok(())
    }

    /// Connect `source.output` to `target.input` by name
    pub fn connect_by_name(
        &mut self,
        source: &str,
        output: &str,
        target: &str,
        input: &str,
    ) -> Result<()> {
        let output = self.output_ref(source, output)?;
        let input = self.input_ref(target, input)?;
        self.connect(output, input)
    }

    /// Detach an input from its upstream output, if any
    pub fn disconnect_input(&mut self, input: InputRef) -> Result<()> {
        let upstream = self
            .input(input)
            .ok_or_else(|| FlowError::InvalidPortRef(format!("{:?}", input)))?
            .connection;
        match upstream {
            Some(output) => self.disconnect_output(output, Some(input)),
            None => Ok(()),
        }
    }

    /// Detach one downstream input, or all of them when `input` is `None`
    pub fn disconnect_output(&mut self, output: OutputRef, input: Option<InputRef>) -> Result<()> {
        match input {
            Some(input) => {
                let port = self.output_mut(output)?;
                let Some(pos) = port.connections.iter().position(|i| *i == input) else {
                    return Ok(());
                };
                port.connections.remove(pos);
                self.input_mut(input)?.connection = None;
                self.invalidate();
                Ok(())
            }
            None => {
                let targets = self.output_mut(output)?.connections.clone();
                for target in targets {
                    self.disconnect_output(output, Some(target))?;
                }
                Ok(())
            }
        }
    }

    /// Detach every connection from or to a node
    pub fn disconnect_node(&mut self, id: NodeId) -> Result<()> {
        let (outputs, inputs) = match self.node(id) {
            Some(node) => (node.outputs.len(), node.inputs.len()),
            None => return Err(FlowError::InvalidPortRef(format!("{:?}", id))),
        };
        for index in 0..outputs {
            self.disconnect_output(OutputRef::new(id, index), None)?;
        }
        for index in 0..inputs {
            self.disconnect_input(InputRef::new(id, index))?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Data flow
    // ---------------------------------------------------------------------

    /// Hand a pushed value to every connected input, or keep it as result
    ///
    /// The first consumer receives the value itself, every further consumer
    /// an independent copy.
    pub(crate) fn deliver(&mut self, from: OutputRef, value: Value) -> Result<()> {
        let targets = self.output_mut(from)?.connections.clone();
        let Some((first, rest)) = targets.split_first() else {
            self.output_mut(from)?.result = Some(value);
            return Ok(());
        };

        for target in rest {
            log::debug!(
                "{} pushing data out to {}",
                self.name_of(from.node),
                self.name_of(target.node)
            );
            self.input_mut(*target)?.buffer.push_back(value.clone());
        }
        log::debug!(
            "{} pushing data out to {}",
            self.name_of(from.node),
            self.name_of(first.node)
        );
        self.input_mut(*first)?.buffer.push_back(value);
        Ok(())
    }

    /// Run `collect` on one node and deliver everything it pushed
    ///
    /// Values pushed before a processing error still reach their consumers;
    /// the error is returned afterwards.
    pub(crate) fn collect_node(&mut self, id: NodeId) -> Result<()> {
        let mut emissions = Vec::new();
        let outcome = match self.node_mut(id) {
            Some(node) => node.collect(&mut emissions),
            None => return Ok(()),
        };
        for emission in emissions {
            self.deliver(OutputRef::new(id, emission.output), emission.value)?;
        }
        outcome
    }
}

impl fmt::Display for Graph {
    /// Overview of nodes, defaults, connections and results
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nodes:")?;
        for (_, node) in self.nodes() {
            write!(f, "\n\n{}", node.name)?;
            for input in &node.inputs {
                write!(f, "\n> {}", input.name)?;
                if let Some(default) = &input.default {
                    write!(f, ":{}", default)?;
                }
                if let Some(conn) = input.connection {
                    let out_name = self.output(conn).map(OutputPort::name).unwrap_or_default();
                    write!(f, " o-o {}.{}", self.name_of(conn.node), out_name)?;
                }
            }
            for output in &node.outputs {
                write!(f, "\n< {}", output.name)?;
                if let Some(result) = &output.result {
                    write!(f, ":{}", result)?;
                }
                if output.is_connected() {
                    let targets: Vec<String> = output
                        .connections
                        .iter()
                        .map(|i| {
                            let in_name = self.input(*i).map(InputPort::name).unwrap_or_default();
                            format!("{}.{}", self.name_of(i.node), in_name)
                        })
                        .collect();
                    write!(f, " o-o {}", targets.join(", "))?;
                }
            }
        }
        Ok(())
    }
}
