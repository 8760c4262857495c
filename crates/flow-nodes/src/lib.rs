//! Flow Nodes
//!
//! Built-in node types for the flow engine. Every type registers itself
//! via `inventory`, so `NodeRegistry::with_builtins()` finds all of them
//! once this crate is linked.
//!
//! # Categories
//!
//! - **Input**: constant, range and file sources
//! - **Processing**: arithmetic, string, array and power level utilities
//! - **Control**: replication, triggering and delays
//! - **Output**: print and file sinks

pub mod control;
pub mod input;
pub mod output;
pub mod processing;
mod values;

// Re-export all nodes for convenience
pub use control::*;
pub use input::*;
pub use output::*;
pub use processing::*;

/// Make sure the node registrations of this crate are linked in
///
/// Call before `NodeRegistry::with_builtins()` in binaries that otherwise
/// never reference this crate.
pub fn link() {}

#[cfg(test)]
mod tests {
    use flow_engine::{Graph, GraphDescription, NodeRegistry};
    use serde_json::json;

    #[test]
    fn test_inventory_collects_all_builtins() {
        let registry = NodeRegistry::with_builtins();
        assert_eq!(registry.node_types().len(), 30, "Expected 30 built-in nodes");

        // Spot-check known types
        for key in [
            "integer-source",
            "range-source",
            "add",
            "div",
            "pack-array",
            "array-max",
            "replicate",
            "trigger",
            "watt-to-dbm",
            "print",
            "file-sink",
        ] {
            assert!(registry.has_node_type(key), "missing {key}");
        }
        assert_eq!(
            registry.create("integer-source").unwrap().class(),
            Some("integer-source")
        );
    }

    #[test]
    fn test_described_graph_with_builtins() {
        let desc = GraphDescription::from_json(
            r#"{
                "nodes": {
                    "a": {"class": "integer-source", "inputs": {"value": {"default": 2}}},
                    "b": {"class": "integer-source", "inputs": {"value": {"default": 3}}},
                    "sum": {"class": "add", "inputs": {
                        "a": {"connection": {"node": "a", "output": "int"}},
                        "b": {"connection": {"node": "b", "output": "int"}}
                    }},
                    "show": {"class": "print", "inputs": {
                        "data": {"connection": {"node": "sum", "output": "c"}}
                    }}
                }
            }"#,
        )
        .unwrap();

        let mut graph = Graph::from_description(&desc, &NodeRegistry::with_builtins()).unwrap();
        let report = graph.process().unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.result("show", "formatted"), Some(&json!("5")));
    }
}
