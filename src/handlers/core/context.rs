//! Pipeline context shared by every stage of one invocation.
//!
//! Built once by the bus per `execute` call and passed by mutable reference
//! down the chain. Beyond the command and its category no schema is
//! enforced; middleware may stash extra fields in `extensions`.

use crate::command::Command;
use serde_json::Value;

/// Category used when a registry entry does not name one.
pub const DEFAULT_CATEGORY: &str = "core";

/// Context passed through the middleware chain.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// The invocation being dispatched.
    pub command: Command,
    /// Category of the resolved command (drives cooldown class and audit grouping).
    pub category: String,
    /// Free-form fields attached by middleware.
    pub extensions: serde_json::Map<String, Value>,
}

impl PipelineContext {
    pub fn new(command: Command, category: impl Into<String>) -> Self {
        Self {
            command,
            category: category.into(),
            extensions: serde_json::Map::new(),
        }
    }

    /// Attach an extra field for downstream stages.
    pub fn insert_extension(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.extensions.insert(key.into(), value)
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}
