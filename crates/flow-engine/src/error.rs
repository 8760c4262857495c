//! Error types for the flow engine

use thiserror::Error;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Which side of a node a port lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Errors that can occur while building or running a graph
#[derive(Debug, Error)]
pub enum FlowError {
    /// No factory is registered under the requested key
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A graph description references a package that was never registered
    #[error("Unknown node package: {0}")]
    UnknownPackage(String),

    /// No node with this name exists in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The node exists but has no port with this name
    #[error("Node '{node}' has no {direction} named '{port}'")]
    UnknownPort {
        node: String,
        port: String,
        direction: PortDirection,
    },

    /// A port reference points at a removed node or an out-of-range index
    #[error("Invalid port reference: {0}")]
    InvalidPortRef(String),

    /// A cycle was found but no input along it carries a default value
    #[error("Loop detected, but no default value was assigned, e.g. at '{input}' of '{node}'")]
    LoopWithoutDefault { node: String, input: String },

    /// The node was not created through a registry and cannot be described
    #[error("Node '{0}' has no registered class")]
    MissingClass(String),

    /// A node failed while processing
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    pub(crate) fn unknown_input(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self::UnknownPort {
            node: node.into(),
            port: port.into(),
            direction: PortDirection::Input,
        }
    }

    pub(crate) fn unknown_output(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self::UnknownPort {
            node: node.into(),
            port: port.into(),
            direction: PortDirection::Output,
        }
    }
}
