//! Cooldown and category permission configuration.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use super::defaults::{default_category_cooldowns, default_cooldown_ms};

/// Per-category cooldowns, in milliseconds.
///
/// A category mapped to `0` has no cooldown. Categories not in the table use
/// `default_cooldown_ms`.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Cooldown for categories without an explicit entry (default: 3000).
    #[serde(default = "default_cooldown_ms")]
    pub default_cooldown_ms: u64,
    /// Category → cooldown. Configured entries are merged over the built-ins.
    #[serde(
        default = "default_category_cooldowns",
        deserialize_with = "merge_category_cooldowns"
    )]
    pub categories: HashMap<String, u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_cooldown_ms: default_cooldown_ms(),
            categories: default_category_cooldowns(),
        }
    }
}

impl RateLimitConfig {
    /// Cooldown for `category`, falling back to the default.
    pub fn cooldown_for(&self, category: &str) -> u64 {
        self.categories
            .get(category)
            .copied()
            .unwrap_or(self.default_cooldown_ms)
    }

    /// Set a category cooldown (builder style).
    pub fn with_category(mut self, category: impl Into<String>, cooldown_ms: u64) -> Self {
        self.categories.insert(category.into(), cooldown_ms);
        self
    }
}

fn merge_category_cooldowns<'de, D>(deserializer: D) -> Result<HashMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<String, u64>::deserialize(deserializer)?;
    let mut categories = default_category_cooldowns();
    categories.extend(overrides);
    Ok(categories)
}

/// Category-level permission rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsConfig {
    /// Category → rule. Categories without a rule are unrestricted.
    #[serde(default)]
    pub categories: HashMap<String, CategoryRule>,
}

impl PermissionsConfig {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Rule applied to every command in one category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRule {
    /// Caller must hold at least one of these roles.
    #[serde(default)]
    pub required_roles: Vec<String>,
}
