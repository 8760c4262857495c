//! Graph description wire format
//!
//! A description names every node, the registry class it is created from,
//! and for each listed input its default value and upstream connection:
//!
//! ```json
//! {
//!   "packages": ["extra"],
//!   "nodes": {
//!     "a": { "class": "integer-source", "inputs": { "value": { "default": 2, "connection": null } } },
//!     "sum": { "class": "add", "inputs": {
//!       "a": { "default": null, "connection": { "node": "a", "output": "value" } }
//!     } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::graph::Graph;
use crate::registry::NodeRegistry;

/// Serializable shape of a whole graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    /// Registry packages to resolve node classes against
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,
    pub nodes: BTreeMap<String, NodeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub class: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputDescription>,
}

/// A listed input replaces the node's default (`null` removes it)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputDescription {
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub connection: Option<ConnectionDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub node: String,
    pub output: String,
}

impl GraphDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Graph {
    /// Build a new graph from a description
    pub fn from_description(desc: &GraphDescription, registry: &NodeRegistry) -> Result<Graph> {
        let mut graph = Graph::new();
        graph.load_description(desc, registry)?;
        Ok(graph)
    }

    /// Replace the contents of this graph with a description
    ///
    /// Nodes are instantiated first, then defaults and connections are
    /// applied, so connections may reference nodes in any order.
    pub fn load_description(&mut self, desc: &GraphDescription, registry: &NodeRegistry) -> Result<()> {
        self.clear();
        let registry = registry.resolve_packages(desc.packages.as_slice())?;
        self.packages = desc.packages.clone();

        for (name, entry) in &desc.nodes {
            let mut node = registry.create(&entry.class)?;
            node.name = name.clone();
            self.add_node(node);
        }

        for (name, entry) in &desc.nodes {
            for (input_name, input) in &entry.inputs {
                let target = self.input_ref(name, input_name)?;
                self.set_default(target, input.default.clone())?;
                if let Some(conn) = &input.connection {
                    let source = self.output_ref(&conn.node, &conn.output)?;
                    self.connect(source, target)?;
                }
            }

            let port_types = Arc::clone(&self.port_types);
            let id = self.require_node_id(name)?;
            if let Some(node) = self.node_mut(id) {
                node.infer_port_types(&port_types);
            }
        }

        log::info!("Built graph with {} nodes", self.len());
        Ok(())
    }

    /// Read a description file and build a graph from it
    pub fn from_json_file(path: impl AsRef<Path>, registry: &NodeRegistry) -> Result<Graph> {
        let desc = GraphDescription::from_json_file(path)?;
        Self::from_description(&desc, registry)
    }

    /// Describe the graph; every node must have been created by a registry
    pub fn to_description(&self) -> Result<GraphDescription> {
        let mut nodes = BTreeMap::new();
        for (_, node) in self.nodes() {
            let class = node
                .class()
                .ok_or_else(|| FlowError::MissingClass(node.name().to_string()))?;

            let mut inputs = BTreeMap::new();
            for input in node.inputs() {
                let connection = input.connection().map(|out| ConnectionDescription {
                    node: self.name_of(out.node).to_string(),
                    output: self
                        .output(out)
                        .map(|o| o.name().to_string())
                        .unwrap_or_default(),
                });
                inputs.insert(
                    input.name().to_string(),
                    InputDescription {
                        default: input.default_value().cloned(),
                        connection,
                    },
                );
            }

            nodes.insert(
                node.name().to_string(),
                NodeDescription {
                    class: class.to_string(),
                    inputs,
                },
            );
        }

        Ok(GraphDescription {
            packages: self.packages.clone(),
            nodes,
        })
    }
}
