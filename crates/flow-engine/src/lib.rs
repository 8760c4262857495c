//! Flow Engine - iterative flow-based graph execution
//!
//! This crate provides the scheduling and data synchronization core of a
//! flow-based programming runtime. It supports:
//!
//! - Nodes with named input and output ports, connected into a graph
//! - Buffered, per-iteration data exchange with FIFO input buffers
//! - Default values that bootstrap sources and loops
//! - Layer-wise run order and loop detection
//! - Cooperative cancellation between iterations
//!
//! # Architecture
//!
//! - `Graph`: owns nodes, maintains connections and drives iterations
//! - `Node`: ports plus a `NodeProcessor` implementing the node type
//! - `NodeRegistry`: factories for node classes, used by graph descriptions
//! - `PortTypeRegistry`: maps port data types to native value shapes
//!
//! # Example
//!
//! ```ignore
//! use flow_engine::{Graph, Node};
//! use serde_json::json;
//!
//! let mut graph = Graph::new();
//! graph.add_node(
//!     Node::from_fn("Two", |inputs, outputs| outputs.push("value", inputs["value"].clone()))
//!         .with_input("value", Some(json!(2)))
//!         .with_output("value", None),
//! );
//! let report = graph.process()?;
//! ```

pub mod config;
pub mod description;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod port;
pub mod registry;
mod schedule;
pub mod types;
mod validation;

// Re-export key types
pub use config::EngineConfig;
pub use description::{ConnectionDescription, GraphDescription, InputDescription, NodeDescription};
pub use error::{FlowError, PortDirection, Result};
pub use executor::{CancelFlag, RunReport, SinkResult};
pub use graph::{unique_name, Graph, GraphState, DEFAULT_NODE_NAME};
pub use node::{CallbackProcessor, Emission, Node, NodeProcessor, Outputs};
pub use port::{InputPort, OutputPort};
pub use registry::{NodeRegistry, NodeTypeFn};
pub use types::{InputRef, NodeId, OutputRef, PortDataType, PortType, PortTypeRegistry, ValueKind};

