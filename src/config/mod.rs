//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, DatabaseConfig)
//! - [`security`]: Cooldown and category permission configuration
//! - [`bootstrap`]: Allow-list state seeded at startup
//! - [`validation`]: Startup checks

mod bootstrap;
mod defaults;
mod security;
mod types;
mod validation;

pub use bootstrap::BootstrapConfig;
pub use security::{CategoryRule, PermissionsConfig, RateLimitConfig};
pub use types::{Config, ConfigError, DatabaseConfig, ServerConfig};
pub use validation::{ValidationError, validate};
