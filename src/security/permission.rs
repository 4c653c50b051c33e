//! Permission evaluation.
//!
//! A command runs only when every gate passes, checked in this order:
//!
//! 1. Category policy (if configured)
//! 2. Global "enabled" flag
//! 3. User allow-list
//! 4. Channel allow-list
//! 5. Role allow-list
//!
//! Allow-lists are opt-in: an empty list places no restriction of that kind.

use crate::command::Command;
use crate::config::{BootstrapConfig, PermissionsConfig};
use crate::db::{
    AllowListKind, CommandRepository, DbError, PermissionRepository, Repositories,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Category-level gate, called as `policy(category, command)`.
pub type CategoryPolicy = Arc<dyn Fn(&str, &Command) -> bool + Send + Sync>;

/// Decides whether a caller may run a command.
#[derive(Clone)]
pub struct PermissionService {
    commands: Arc<dyn CommandRepository>,
    permissions: Arc<dyn PermissionRepository>,
    policy: Option<CategoryPolicy>,
}

impl PermissionService {
    pub fn new(
        commands: Arc<dyn CommandRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            commands,
            permissions,
            policy: None,
        }
    }

    pub fn from_repositories(repos: &Repositories) -> Self {
        Self::new(Arc::clone(&repos.commands), Arc::clone(&repos.permissions))
    }

    /// Install a category policy (builder style).
    pub fn with_policy(mut self, policy: CategoryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Build a policy from `[permissions.categories.*]` rules.
    ///
    /// Returns `None` when no category carries a rule. A category with
    /// `required_roles` denies callers holding none of them; categories
    /// without a rule pass.
    pub fn policy_from_config(config: &PermissionsConfig) -> Option<CategoryPolicy> {
        if config.is_empty() {
            return None;
        }

        let required: HashMap<String, Vec<String>> = config
            .categories
            .iter()
            .map(|(category, rule)| (category.clone(), rule.required_roles.clone()))
            .collect();

        Some(Arc::new(move |category: &str, command: &Command| {
            match required.get(category) {
                Some(roles) if !roles.is_empty() => command
                    .roles()
                    .iter()
                    .any(|held| roles.iter().any(|r| r == held)),
                _ => true,
            }
        }))
    }

    /// Whether `command` may run in `category`.
    ///
    /// Ordinary denial is `Ok(false)`; only repository faults are errors.
    pub async fn can_execute(&self, command: &Command, category: &str) -> Result<bool, DbError> {
        let name = command.name();

        if let Some(policy) = &self.policy
            && !policy(category, command)
        {
            debug!(command = %name, category = %category, "Denied by category policy");
            return Ok(false);
        }

        if !self.commands.is_allowed(name).await? {
            debug!(command = %name, "Denied: command not enabled");
            return Ok(false);
        }

        let (roles, channels, users) = tokio::try_join!(
            self.permissions.get_roles(name),
            self.permissions.get_channels(name),
            self.permissions.get_users(name),
        )?;

        if !users.is_empty()
            && let Some(user_id) = command.user_id()
            && !users.iter().any(|u| u == user_id)
        {
            debug!(command = %name, user = %user_id, "Denied: user not on allow-list");
            return Ok(false);
        }

        if !channels.is_empty()
            && let Some(channel_id) = command.channel_id()
            && !channels.iter().any(|c| c == channel_id)
        {
            debug!(command = %name, channel = %channel_id, "Denied: channel not on allow-list");
            return Ok(false);
        }

        if !roles.is_empty() {
            let held = command.roles();
            if !held.iter().any(|h| roles.iter().any(|r| r == h)) {
                debug!(command = %name, "Denied: no allowed role");
                return Ok(false);
            }
        }

        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------------

    pub async fn enable(&self, name: &str) -> Result<(), DbError> {
        self.commands.add_allowed(name).await
    }

    pub async fn disable(&self, name: &str) -> Result<(), DbError> {
        self.commands.remove_allowed(name).await
    }

    pub async fn allow_role(&self, name: &str, role: &str) -> Result<(), DbError> {
        self.permissions.add_role(name, role).await
    }

    pub async fn allow_channel(&self, name: &str, channel_id: &str) -> Result<(), DbError> {
        self.permissions.add_channel(name, channel_id).await
    }

    pub async fn allow_user(&self, name: &str, user_id: &str) -> Result<(), DbError> {
        self.permissions.add_user(name, user_id).await
    }

    pub async fn revoke_role(&self, name: &str, role: &str) -> Result<bool, DbError> {
        self.permissions.remove(name, AllowListKind::Role, role).await
    }

    pub async fn revoke_channel(&self, name: &str, channel_id: &str) -> Result<bool, DbError> {
        self.permissions
            .remove(name, AllowListKind::Channel, channel_id)
            .await
    }

    pub async fn revoke_user(&self, name: &str, user_id: &str) -> Result<bool, DbError> {
        self.permissions.remove(name, AllowListKind::User, user_id).await
    }

    /// Apply the startup seed. `registered` lists every registered command
    /// name and is enabled wholesale when `enable_registered` is set.
    pub async fn seed<'a>(
        &self,
        bootstrap: &BootstrapConfig,
        registered: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), DbError> {
        let mut enabled = 0usize;
        if bootstrap.enable_registered {
            for name in registered {
                self.enable(name).await?;
                enabled += 1;
            }
        }
        for name in &bootstrap.enabled_commands {
            self.enable(name).await?;
            enabled += 1;
        }

        let lists = [
            (AllowListKind::User, &bootstrap.allow_users),
            (AllowListKind::Channel, &bootstrap.allow_channels),
            (AllowListKind::Role, &bootstrap.allow_roles),
        ];
        let mut entries = 0usize;
        for (kind, table) in lists {
            for (name, ids) in table {
                for id in ids {
                    self.permissions.add(name, kind, id).await?;
                    entries += 1;
                }
            }
        }

        info!(enabled, allow_list_entries = entries, "Permission state seeded");
        Ok(())
    }
}

impl std::fmt::Debug for PermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService")
            .field("policy", &self.policy.is_some())
            .finish_non_exhaustive()
    }
}
