//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::collections::HashMap;
use std::net::SocketAddr;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "cmdbus".to_string()
}

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7400))
}

// =============================================================================
// Cooldown Defaults
// =============================================================================

pub fn default_cooldown_ms() -> u64 {
    3000
}

/// Built-in category cooldowns. Configured entries are layered on top.
pub fn default_category_cooldowns() -> HashMap<String, u64> {
    [
        ("core", 0),
        ("messaging", 3000),
        ("operations", 10_000),
        ("admin", 0),
    ]
    .into_iter()
    .map(|(category, ms)| (category.to_string(), ms))
    .collect()
}
