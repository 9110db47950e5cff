//! Configuration System
//!
//! Layered configuration for the status bar: which contexts to install, per-item
//! overrides and logging. Sources are merged by the `config` crate with built-in
//! defaults first, then the user's global file, then an explicit file, then
//! `STATUSBAR__*` environment variables.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;
use crate::status_bar::Alignment;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBarConfig {
    /// Context sources to install
    #[serde(default)]
    pub contexts: ContextsConfig,

    /// Per-item overrides keyed by status item id
    #[serde(default)]
    pub items: HashMap<String, ItemOverride>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which contexts the status bar registers on startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextsConfig {
    /// Register the always-active `global` context
    #[serde(default = "default_true")]
    pub global: bool,

    /// Focus contexts: context name -> focused widget kind
    #[serde(default = "default_focus")]
    pub focus: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_focus() -> BTreeMap<String, String> {
    ["notebook", "console", "terminal", "editor"]
        .into_iter()
        .map(|kind| (kind.to_string(), kind.to_string()))
        .collect()
}

impl Default for ContextsConfig {
    fn default() -> Self {
        Self {
            global: default_true(),
            focus: default_focus(),
        }
    }
}

/// Override for a single status item's registration options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOverride {
    #[serde(default)]
    pub contexts: Option<Vec<String>>,
    #[serde(default)]
    pub align: Option<Alignment>,
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Context(String, String),
    Item(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Context(name, msg) => write!(f, "Context '{}': {}", name, msg),
            ValidationError::Item(id, msg) => write!(f, "Item '{}': {}", id, msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl StatusBarConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, kind) in &self.contexts.focus {
            if name.trim().is_empty() {
                errors.push(ValidationError::Context(
                    name.clone(),
                    "context name cannot be empty".to_string(),
                ));
            }
            if kind.trim().is_empty() {
                errors.push(ValidationError::Context(
                    name.clone(),
                    "widget kind cannot be empty".to_string(),
                ));
            }
            if self.contexts.global && name == crate::context::global::GLOBAL_CONTEXT {
                errors.push(ValidationError::Context(
                    name.clone(),
                    "name is reserved for the global context".to_string(),
                ));
            }
        }

        let mut item_ids: Vec<&String> = self.items.keys().collect();
        item_ids.sort();
        for id in item_ids {
            let contexts = self.items[id].contexts.as_deref().unwrap_or_default();
            if contexts.iter().any(|name| name.trim().is_empty()) {
                errors.push(ValidationError::Item(
                    id.clone(),
                    "context names cannot be empty".to_string(),
                ));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
