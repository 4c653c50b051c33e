//! HELP: command introspection.
//!
//! The handler reads a [`HelpCatalog`] snapshot instead of the registry it
//! is registered in, so the registry stays free of self-references.

use crate::command::{Command, CommandResult};
use crate::error::{BusError, BusResult};
use crate::handlers::{CommandInfo, CommandRegistry, Handler};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared, replaceable snapshot of the registry's entries.
#[derive(Debug, Clone, Default)]
pub struct HelpCatalog {
    entries: Arc<RwLock<Vec<CommandInfo>>>,
}

impl HelpCatalog {
    /// Replace the snapshot with the registry's current entries.
    pub fn publish(&self, registry: &CommandRegistry) {
        *self.entries.write() = registry.catalog();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn find(&self, name: &str) -> Option<CommandInfo> {
        self.entries.read().iter().find(|e| e.name == name).cloned()
    }

    /// `{ group: [{name, description, usage}] }`, registration order within
    /// each group.
    fn grouped(&self) -> Value {
        let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for entry in self.entries.read().iter() {
            groups.entry(entry.group.clone()).or_default().push(json!({
                "name": entry.name,
                "description": entry.description,
                "usage": entry.usage,
            }));
        }
        json!(groups)
    }
}

pub struct HelpHandler {
    catalog: HelpCatalog,
}

impl HelpHandler {
    pub fn new(catalog: HelpCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, command: &Command) -> BusResult<CommandResult> {
        match command.arg(0) {
            None => Ok(CommandResult::ok(json!({ "groups": self.catalog.grouped() }))),
            Some(name) => match self.catalog.find(name) {
                Some(info) => Ok(CommandResult::ok(
                    serde_json::to_value(info).map_err(BusError::handler)?,
                )),
                None => Ok(CommandResult::fail(format!("unknown command: {name}"))),
            },
        }
    }
}
