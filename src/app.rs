//! Wiring: config → repositories → services → pipeline → bus.

use crate::bus::CommandBus;
use crate::config::Config;
use crate::db::{Database, Repositories};
use crate::handlers::{CommandRegistry, register_builtins};
use crate::middleware::default_stack;
use crate::security::{PermissionService, RateLimitService};
use std::sync::Arc;
use tracing::info;

/// A fully assembled bus plus the handles admin code needs.
#[derive(Clone)]
pub struct App {
    pub bus: CommandBus,
    pub permissions: PermissionService,
    pub rate_limits: RateLimitService,
    pub repositories: Repositories,
}

impl App {
    /// Assemble with the built-in commands plus anything `extend` registers.
    ///
    /// Opens SQLite when `[database]` is configured, otherwise uses
    /// in-memory repositories, then applies the bootstrap seed.
    pub async fn build(
        config: &Config,
        extend: impl FnOnce(&mut CommandRegistry),
    ) -> anyhow::Result<Self> {
        let repositories = match &config.database {
            Some(db) => Database::new(&db.path).await?.repositories(),
            None => {
                info!("No database configured, using in-memory state");
                Repositories::memory()
            }
        };
        Self::with_repositories(config, repositories, extend).await
    }

    /// Assemble on top of existing repositories.
    pub async fn with_repositories(
        config: &Config,
        repositories: Repositories,
        extend: impl FnOnce(&mut CommandRegistry),
    ) -> anyhow::Result<Self> {
        let mut registry = CommandRegistry::new();
        let catalog = register_builtins(&mut registry);
        extend(&mut registry);
        catalog.publish(&registry);

        let mut permissions = PermissionService::from_repositories(&repositories);
        if let Some(policy) = PermissionService::policy_from_config(&config.permissions) {
            permissions = permissions.with_policy(policy);
        }
        permissions
            .seed(&config.bootstrap, registry.names())
            .await?;

        let rate_limits =
            RateLimitService::from_repositories(&repositories, config.rate_limits.clone());

        let pipeline = default_stack(
            permissions.clone(),
            rate_limits.clone(),
            Arc::clone(&repositories.audit),
        );
        info!(commands = registry.len(), stages = ?pipeline.names(), "Command bus assembled");

        Ok(Self {
            bus: CommandBus::new(Arc::new(registry), pipeline),
            permissions,
            rate_limits,
            repositories,
        })
    }
}
