//! Allow-list state seeded at startup.

use serde::Deserialize;
use std::collections::HashMap;

use super::defaults::default_true;

/// Startup seed for the enabled-command set and per-command allow-lists.
///
/// Seeding is additive: it never removes state already present in a
/// persistent database.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Enable every registered command (default: true).
    #[serde(default = "default_true")]
    pub enable_registered: bool,
    /// Commands to enable explicitly.
    #[serde(default)]
    pub enabled_commands: Vec<String>,
    /// Command → user ids.
    #[serde(default)]
    pub allow_users: HashMap<String, Vec<String>>,
    /// Command → channel ids.
    #[serde(default)]
    pub allow_channels: HashMap<String, Vec<String>>,
    /// Command → roles.
    #[serde(default)]
    pub allow_roles: HashMap<String, Vec<String>>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enable_registered: true,
            enabled_commands: Vec::new(),
            allow_users: HashMap::new(),
            allow_channels: HashMap::new(),
            allow_roles: HashMap::new(),
        }
    }
}
