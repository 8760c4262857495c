//! Core types for flow graphs
//!
//! Identifiers for nodes and ports, the closed set of port data types,
//! and the registry that maps those types to native value shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Index of a node slot inside its owning graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Address of an input port: owning node plus position in its input list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputRef {
    pub node: NodeId,
    pub index: usize,
}

impl InputRef {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Address of an output port: owning node plus position in its output list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub node: NodeId,
    pub index: usize,
}

impl OutputRef {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// The data category of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Generic, accepts anything
    #[default]
    Object,
    Bool,
    Int,
    Float,
    Complex,
    Dict,
    List,
    Tuple,
    Str,
    File,
}

impl PortDataType {
    /// Check if this type can connect to another type without a warning
    pub fn is_compatible_with(&self, other: &PortDataType) -> bool {
        // Object is the generic container tag
        if matches!(self, PortDataType::Object) || matches!(other, PortDataType::Object) {
            return true;
        }

        self == other
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Object => "OBJECT",
            Self::Bool => "BOOL",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::Complex => "COMPLEX",
            Self::Dict => "DICT",
            Self::List => "LIST",
            Self::Tuple => "TUPLE",
            Self::Str => "STR",
            Self::File => "FILE",
        }
    }
}

impl std::fmt::Display for PortDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Native shape of a value, used as the hint for a port data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Native shape of a value; `null` has none
    pub fn of(value: &Value) -> Option<ValueKind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ValueKind::Integer),
            Value::Number(_) => Some(ValueKind::Float),
            Value::String(_) => Some(ValueKind::String),
            Value::Array(_) => Some(ValueKind::Array),
            Value::Object(_) => Some(ValueKind::Object),
        }
    }
}

/// A registered port type: tag, display color and optional native hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortType {
    pub data_type: PortDataType,
    /// Hex color for editors, e.g. "#0080FF"
    pub color: String,
    pub hint: Option<ValueKind>,
}

const DEFAULT_COLOR: &str = "#D0D0D0";

/// Lookup table from port data types to native value shapes
///
/// Entries are kept in registration order; `classify` returns the first
/// entry whose hint matches, so earlier registrations win.
#[derive(Debug, Clone, Default)]
pub struct PortTypeRegistry {
    entries: Vec<PortType>,
}

impl PortTypeRegistry {
    /// Create an empty registry (everything classifies as `Object`)
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a registry holding the standard port types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_with_color(PortDataType::Object, "#D0D0D0", None);
        registry.register_with_color(PortDataType::Bool, "#101010", Some(ValueKind::Bool));
        registry.register_with_color(PortDataType::Int, "#0080FF", Some(ValueKind::Integer));
        registry.register_with_color(PortDataType::Float, "#25D4EF", Some(ValueKind::Float));
        registry.register_with_color(PortDataType::Complex, "#AC58FA", None);
        registry.register_with_color(PortDataType::Dict, "#E93333", Some(ValueKind::Object));
        registry.register_with_color(PortDataType::List, "#FF8000", Some(ValueKind::Array));
        registry.register_with_color(PortDataType::Tuple, "#FFD500", None);
        registry.register_with_color(PortDataType::Str, "#7AC137", Some(ValueKind::String));
        registry.register_with_color(PortDataType::File, "#198B4A", None);
        registry
    }

    /// Register (or re-hint) a port data type
    ///
    /// An existing entry keeps its color and position.
    pub fn register(&mut self, data_type: PortDataType, hint: Option<ValueKind>) {
        match self.entries.iter_mut().find(|e| e.data_type == data_type) {
            Some(entry) => entry.hint = hint,
            None => self.entries.push(PortType {
                data_type,
                color: DEFAULT_COLOR.to_string(),
                hint,
            }),
        }
    }

    /// Register a port data type with an explicit display color
    pub fn register_with_color(
        &mut self,
        data_type: PortDataType,
        color: impl Into<String>,
        hint: Option<ValueKind>,
    ) {
        let color = color.into();
        match self.entries.iter_mut().find(|e| e.data_type == data_type) {
            Some(entry) => {
                entry.color = color;
                entry.hint = hint;
            }
            None => self.entries.push(PortType {
                data_type,
                color,
                hint,
            }),
        }
    }

    /// Look up a registered port type
    pub fn get(&self, data_type: PortDataType) -> Option<&PortType> {
        self.entries.iter().find(|e| e.data_type == data_type)
    }

    /// All registered port types in registration order
    pub fn all(&self) -> &[PortType] {
        &self.entries
    }

    /// Best-effort data type for a value, `Object` when nothing matches
    pub fn classify(&self, value: &Value) -> PortDataType {
        let Some(kind) = ValueKind::of(value) else {
            return PortDataType::Object;
        };
        self.entries
            .iter()
            .find(|e| e.hint == Some(kind))
            .map(|e| e.data_type)
            .unwrap_or(PortDataType::Object)
    }
}
