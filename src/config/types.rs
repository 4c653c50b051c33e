//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::bootstrap::BootstrapConfig;
use super::defaults::{default_listen, default_server_name};
use super::security::{PermissionsConfig, RateLimitConfig};
use super::validation::{self, ValidationError};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Daemon identity and listeners.
    #[serde(default)]
    pub server: ServerConfig,
    /// SQLite persistence. In-memory repositories are used when absent.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Per-category cooldowns.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    /// Per-category role requirements.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Allow-list seed applied at startup.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the loaded configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validation::validate(self)
    }
}

/// Daemon identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Address for the JSON-lines command socket.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Port for the Prometheus `/metrics` endpoint. Disabled when absent.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            listen: default_listen(),
            metrics_port: None,
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
}
