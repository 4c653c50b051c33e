//! Repository interfaces consumed by the dispatch core.
//!
//! Allow-list, cooldown, and audit state all live behind these traits. The
//! pipeline only reads allow-lists; admin operations write them.

use super::DbError;
use crate::command::{Command, CommandResult};
use async_trait::async_trait;
use serde::Serialize;

/// Globally enabled commands.
#[async_trait]
pub trait CommandRepository: Send + Sync {
    async fn is_allowed(&self, name: &str) -> Result<bool, DbError>;
    async fn add_allowed(&self, name: &str) -> Result<(), DbError>;
    async fn remove_allowed(&self, name: &str) -> Result<(), DbError>;
    /// Enabled command names, sorted.
    async fn list_allowed(&self) -> Result<Vec<String>, DbError>;
}

/// Which per-command allow-list an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowListKind {
    Role,
    Channel,
    User,
}

impl AllowListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Channel => "channel",
            Self::User => "user",
        }
    }
}

/// Per-command allow-lists (roles, channels, users).
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Ids on one list, in insertion order.
    async fn list(&self, name: &str, kind: AllowListKind) -> Result<Vec<String>, DbError>;
    /// Add an id; adding an id already present is a no-op.
    async fn add(&self, name: &str, kind: AllowListKind, id: &str) -> Result<(), DbError>;
    /// Remove an id. Returns whether it was present.
    async fn remove(&self, name: &str, kind: AllowListKind, id: &str) -> Result<bool, DbError>;

    async fn get_roles(&self, name: &str) -> Result<Vec<String>, DbError> {
        self.list(name, AllowListKind::Role).await
    }

    async fn get_channels(&self, name: &str) -> Result<Vec<String>, DbError> {
        self.list(name, AllowListKind::Channel).await
    }

    async fn get_users(&self, name: &str) -> Result<Vec<String>, DbError> {
        self.list(name, AllowListKind::User).await
    }

    async fn add_role(&self, name: &str, role: &str) -> Result<(), DbError> {
        self.add(name, AllowListKind::Role, role).await
    }

    async fn add_channel(&self, name: &str, channel: &str) -> Result<(), DbError> {
        self.add(name, AllowListKind::Channel, channel).await
    }

    async fn add_user(&self, name: &str, user: &str) -> Result<(), DbError> {
        self.add(name, AllowListKind::User, user).await
    }
}

/// Per-command "last used at" timestamps (epoch milliseconds).
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    async fn get_last_used(&self, name: &str) -> Result<Option<i64>, DbError>;
    async fn set_last_used(&self, name: &str, at: i64) -> Result<(), DbError>;

    /// Record `now` if no timestamp exists or the stored one is at least
    /// `cooldown_ms` old. Returns whether it recorded.
    ///
    /// This default is a plain read-then-write and is racy under concurrent
    /// callers; implementations with an atomic primitive should override it.
    async fn try_set_if_older_than(
        &self,
        name: &str,
        now: i64,
        cooldown_ms: i64,
    ) -> Result<bool, DbError> {
        match self.get_last_used(name).await? {
            Some(last) if now - last < cooldown_ms => Ok(false),
            _ => {
                self.set_last_used(name, now).await?;
                Ok(true)
            }
        }
    }
}

/// One audited invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub id: String,
    pub command: String,
    pub source: String,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    pub args: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl AuditEntry {
    pub fn new(command: &Command, result: &CommandResult, created_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            command: command.name().to_string(),
            source: command.source().to_string(),
            user_id: command.user_id().map(str::to_string),
            channel_id: command.channel_id().map(str::to_string),
            args: command.args().to_vec(),
            success: result.success(),
            error: result.error().map(str::to_string),
            created_at,
        }
    }
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn log(&self, command: &Command, result: &CommandResult) -> Result<(), DbError>;
    /// Newest entries first.
    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DbError>;
}
