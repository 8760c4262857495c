//! Node type registry
//!
//! Maps stable node class keys to factories producing fresh [`Node`]s. Graph
//! descriptions name their nodes' classes with these keys.
//!
//! # Usage
//!
//! ```ignore
//! use flow_engine::{Node, NodeRegistry};
//!
//! let mut registry = NodeRegistry::with_builtins();
//! registry.register("my-node", || Node::from_fn("MyNode", |_, _| Ok(())));
//! let node = registry.create("my-node")?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::node::Node;

type NodeFactory = Arc<dyn Fn() -> Node + Send + Sync>;

/// Link-time registration of a node type
///
/// ```ignore
/// inventory::submit!(flow_engine::NodeTypeFn {
///     key: "integer-source",
///     factory: IntegerSource::node,
/// });
/// ```
pub struct NodeTypeFn {
    /// Registry key, also recorded as the class of created nodes
    pub key: &'static str,
    pub factory: fn() -> Node,
}

inventory::collect!(NodeTypeFn);

/// Registry of node factories, plus named packages of further factories
#[derive(Clone, Default)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
    packages: HashMap<String, NodeRegistry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every node type submitted via `inventory`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<NodeTypeFn> {
            registry.register(entry.key, entry.factory);
        }
        log::debug!("Registered {} builtin node types", registry.factories.len());
        registry
    }

    /// Register a factory, replacing any previous one under the same key
    pub fn register(
        &mut self,
        key: impl Into<String>,
        factory: impl Fn() -> Node + Send + Sync + 'static,
    ) {
        self.factories.insert(key.into(), Arc::new(factory));
    }

    /// Instantiate a node and stamp it with its class key
    pub fn create(&self, key: &str) -> Result<Node> {
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| FlowError::UnknownNodeType(key.to_string()))?;
        let mut node = factory();
        node.class = Some(key.to_string());
        Ok(node)
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// All registered keys, sorted
    pub fn node_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` with the same key.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.factories.extend(other.factories);
        self.packages.extend(other.packages);
    }

    /// Make a set of node types available under a package name
    pub fn register_package(&mut self, name: impl Into<String>, package: NodeRegistry) {
        self.packages.insert(name.into(), package);
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// This registry with the named packages merged on top, in order
    pub fn resolve_packages<S: AsRef<str>>(&self, names: &[S]) -> Result<NodeRegistry> {
        let mut resolved = self.clone();
        for name in names {
            let name = name.as_ref();
            let package = self
                .packages
                .get(name)
                .ok_or_else(|| FlowError::UnknownPackage(name.to_string()))?;
            log::debug!("Using node package '{}'", name);
            resolved.factories.extend(
                package
                    .factories
                    .iter()
                    .map(|(key, factory)| (key.clone(), Arc::clone(factory))),
            );
        }
        Ok(resolved)
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut packages: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        packages.sort_unstable();
        f.debug_struct("NodeRegistry")
            .field("node_types", &self.node_types())
            .field("packages", &packages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labelled(label: &'static str) -> impl Fn() -> Node + Send + Sync + 'static {
        move || Node::from_fn(label, |_, _| Ok(())).with_input("x", Some(json!(1)))
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = NodeRegistry::new();
        registry.register("test-node", labelled("Test"));

        assert!(registry.has_node_type("test-node"));
        assert!(!registry.has_node_type("unknown"));

        let node = registry.create("test-node").unwrap();
        assert_eq!(node.name(), "Test");
        assert_eq!(node.class(), Some("test-node"));
        assert_eq!(node.inputs().len(), 1);
    }

    #[test]
    fn test_create_returns_fresh_instances() {
        let mut registry = NodeRegistry::new();
        registry.register("test-node", labelled("Test"));
        let a = registry.create("test-node").unwrap();
        let b = registry.create("test-node").unwrap();
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_unknown_node_type() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.create("nope"),
            Err(FlowError::UnknownNodeType(key)) if key == "nope"
        ));
    }

    #[test]
    fn test_merge_override() {
        let mut registry1 = NodeRegistry::new();
        registry1.register("node-a", labelled("Original"));
        registry1.register("node-b", labelled("B"));

        let mut registry2 = NodeRegistry::new();
        registry2.register("node-a", labelled("Override"));
        registry2.register("node-c", labelled("C"));

        registry1.merge(registry2);
        assert_eq!(registry1.node_types(), vec!["node-a", "node-b", "node-c"]);
        assert_eq!(registry1.create("node-a").unwrap().name(), "Override");
    }

    #[test]
    fn test_resolve_packages() {
        let mut extra = NodeRegistry::new();
        extra.register("node-a", labelled("FromPackage"));
        extra.register("node-x", labelled("X"));

        let mut registry = NodeRegistry::new();
        registry.register("node-a", labelled("Base"));
        registry.register_package("extra", extra);
        assert!(registry.has_package("extra"));

        let resolved = registry.resolve_packages(&["extra"]).unwrap();
        assert_eq!(resolved.create("node-a").unwrap().name(), "FromPackage");
        assert!(resolved.has_node_type("node-x"));

        // The base registry is untouched
        assert_eq!(registry.create("node-a").unwrap().name(), "Base");
        assert!(!registry.has_node_type("node-x"));
    }

    #[test]
    fn test_unknown_package() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.resolve_packages(&["missing"]),
            Err(FlowError::UnknownPackage(_))
        ));
    }
}
