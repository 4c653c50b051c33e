//! Command registry.
//!
//! The `CommandRegistry` maps command names to handlers plus the descriptive
//! and operational metadata transports and help listings need. It is built
//! once at bootstrap and shared read-only afterwards.

use super::context::DEFAULT_CATEGORY;
use super::traits::Handler;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Group used when a registration does not name one.
pub const DEFAULT_GROUP: &str = "general";

/// Expected argument field, as advertised to transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl OptionSpec {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Declarative permission hint for transports (e.g. the platform role a
/// slash command should be restricted to). Not enforced by the pipeline;
/// enforcement is the permission service's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequirement {
    pub required_role: String,
}

/// Registration options. Every field has a default.
#[derive(Debug, Clone)]
pub struct RegisterOptions {
    pub category: String,
    pub group: String,
    pub description: String,
    pub usage: String,
    pub examples: Vec<String>,
    pub options: Vec<OptionSpec>,
    pub permissions: Option<PermissionRequirement>,
    pub cooldown: Option<String>,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            group: DEFAULT_GROUP.to_string(),
            description: String::new(),
            usage: String::new(),
            examples: Vec::new(),
            options: Vec::new(),
            permissions: None,
            cooldown: None,
        }
    }
}

impl RegisterOptions {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn required_role(mut self, role: impl Into<String>) -> Self {
        self.permissions = Some(PermissionRequirement {
            required_role: role.into(),
        });
        self
    }

    pub fn cooldown(mut self, hint: impl Into<String>) -> Self {
        self.cooldown = Some(hint.into());
        self
    }
}

/// A registry entry.
#[derive(Clone)]
pub struct CommandMeta {
    pub name: String,
    pub handler: Arc<dyn Handler>,
    pub category: String,
    pub group: String,
    pub description: String,
    pub usage: String,
    pub examples: Vec<String>,
    pub options: Vec<OptionSpec>,
    pub permissions: Option<PermissionRequirement>,
    pub cooldown: Option<String>,
}

impl std::fmt::Debug for CommandMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandMeta")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// Handler-free description of a command, for help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub category: String,
    pub group: String,
    pub description: String,
    pub usage: String,
    pub examples: Vec<String>,
    pub options: Vec<OptionSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionRequirement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,
}

impl From<&CommandMeta> for CommandInfo {
    fn from(meta: &CommandMeta) -> Self {
        Self {
            name: meta.name.clone(),
            category: meta.category.clone(),
            group: meta.group.clone(),
            description: meta.description.clone(),
            usage: meta.usage.clone(),
            examples: meta.examples.clone(),
            options: meta.options.clone(),
            permissions: meta.permissions.clone(),
            cooldown: meta.cooldown.clone(),
        }
    }
}

/// Registry of command handlers, in registration order.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandMeta>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.
    ///
    /// Registering an existing name replaces the previous entry in place
    /// (it keeps its original listing position) and logs a warning.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
        options: RegisterOptions,
    ) {
        let name = name.into();
        let meta = CommandMeta {
            name: name.clone(),
            handler,
            category: options.category,
            group: options.group,
            description: options.description,
            usage: options.usage,
            examples: options.examples,
            options: options.options,
            permissions: options.permissions,
            cooldown: options.cooldown,
        };

        if let Some(&slot) = self.index.get(&name) {
            warn!(command = %name, "Replacing previously registered command");
            self.entries[slot] = meta;
        } else {
            debug!(command = %name, category = %meta.category, "Registered command");
            self.index.insert(name, self.entries.len());
            self.entries.push(meta);
        }
    }

    pub fn get_handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.get_meta(name).map(|meta| Arc::clone(&meta.handler))
    }

    pub fn get_meta(&self, name: &str) -> Option<&CommandMeta> {
        self.index.get(name).and_then(|&slot| self.entries.get(slot))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All entries in registration order.
    pub fn list_commands(&self) -> &[CommandMeta] {
        &self.entries
    }

    /// Entries grouped by `group`; order within a group follows registration.
    pub fn list_by_group(&self) -> BTreeMap<&str, Vec<&CommandMeta>> {
        let mut groups: BTreeMap<&str, Vec<&CommandMeta>> = BTreeMap::new();
        for meta in &self.entries {
            groups.entry(meta.group.as_str()).or_default().push(meta);
        }
        groups
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|meta| meta.name.as_str())
    }

    /// Handler-free snapshot of every entry, for introspection consumers.
    pub fn catalog(&self) -> Vec<CommandInfo> {
        self.entries.iter().map(CommandInfo::from).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
