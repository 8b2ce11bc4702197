//! Calculator configuration.
//!
//! Configuration is read once, turned into an immutable
//! [`ProcessorChain`], and shared by every calculator. File format:
//!
//! ```json
//! {
//!   "apply_wildcards": true,
//!   "apply_regex": true,
//!   "apply_default_nodes": true,
//!   "default_nodes": [ { "permission": "chat.send", "value": true } ]
//! }
//! ```
//!
//! Every field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calculator::{PermissionProcessor, ProcessorChain};
use crate::error::{PermissionError, Result};
use crate::node::PermissionNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Resolve `prefix.*` and root wildcard nodes.
    pub apply_wildcards: bool,
    /// Resolve `r=` regex nodes.
    pub apply_regex: bool,
    /// Fall back to `default_nodes` when the holder says nothing.
    pub apply_default_nodes: bool,
    /// Holder-independent fallback assignments.
    pub default_nodes: Vec<PermissionNode>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            apply_wildcards: true,
            apply_regex: true,
            apply_default_nodes: true,
            default_nodes: Vec::new(),
        }
    }
}

impl CalculatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PermissionError::Config(format!("invalid calculator config: {e}")))
    }

    /// Load from a JSON file.
    ///
    /// # Errors
    ///
    /// I/O failures surface as [`PermissionError::Io`], malformed content
    /// as [`PermissionError::Config`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::debug!(
            "loaded calculator config from {} ({} default nodes)",
            path.display(),
            config.default_nodes.len()
        );
        Ok(config)
    }

    /// The processors enabled by this configuration, in priority order.
    /// Exact matching is always on.
    fn matchers(&self) -> Vec<PermissionProcessor> {
        let mut matchers = vec![PermissionProcessor::Exact];
        if self.apply_wildcards {
            matchers.push(PermissionProcessor::Wildcard);
        }
        if self.apply_regex {
            matchers.push(PermissionProcessor::Regex);
        }
        matchers
    }

    /// Build the shared processor chain.
    pub fn build_chain(&self) -> ProcessorChain {
        let matchers = self.matchers();
        let mut processors = matchers.clone();
        let use_defaults = self.apply_default_nodes && !self.default_nodes.is_empty();
        if use_defaults {
            processors.push(PermissionProcessor::Default(matchers));
        }
        let defaults = if use_defaults {
            self.default_nodes.clone()
        } else {
            Vec::new()
        };
        ProcessorChain::new(processors, defaults)
    }
}

impl ProcessorChain {
    pub fn from_config(config: &CalculatorConfig) -> Self {
        config.build_chain()
    }
}
