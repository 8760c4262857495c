//! Engine configuration
//!
//! Loaded from JSON; every field is optional in the file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Runtime settings for a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stop after this many productive iterations (None = until idle)
    pub max_iterations: Option<u64>,
    /// Log incompatible port types at warn level (debug level when false)
    pub type_warnings: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            type_warnings: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }
}
