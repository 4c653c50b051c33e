//! In-process repositories.
//!
//! Used by tests and by the daemon when no database is configured. State
//! lives in `DashMap`s; cooldown consumption is atomic per command name.

use super::DbError;
use super::repository::{
    AllowListKind, AuditEntry, AuditRepository, CommandRepository, PermissionRepository,
    RateLimitRepository,
};
use crate::command::{Command, CommandResult};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;

/// Enabled-command set.
#[derive(Debug, Default)]
pub struct MemoryCommandRepository {
    enabled: DashSet<String>,
}

impl MemoryCommandRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandRepository for MemoryCommandRepository {
    async fn is_allowed(&self, name: &str) -> Result<bool, DbError> {
        Ok(self.enabled.contains(name))
    }

    async fn add_allowed(&self, name: &str) -> Result<(), DbError> {
        self.enabled.insert(name.to_string());
        Ok(())
    }

    async fn remove_allowed(&self, name: &str) -> Result<(), DbError> {
        self.enabled.remove(name);
        Ok(())
    }

    async fn list_allowed(&self) -> Result<Vec<String>, DbError> {
        let mut names: Vec<String> = self.enabled.iter().map(|n| n.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}

/// Allow-lists keyed by (command, kind).
#[derive(Debug, Default)]
pub struct MemoryPermissionRepository {
    lists: DashMap<(String, AllowListKind), Vec<String>>,
}

impl MemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for MemoryPermissionRepository {
    async fn list(&self, name: &str, kind: AllowListKind) -> Result<Vec<String>, DbError> {
        Ok(self
            .lists
            .get(&(name.to_string(), kind))
            .map(|ids| ids.value().clone())
            .unwrap_or_default())
    }

    async fn add(&self, name: &str, kind: AllowListKind, id: &str) -> Result<(), DbError> {
        let mut ids = self.lists.entry((name.to_string(), kind)).or_default();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
        Ok(())
    }

    async fn remove(&self, name: &str, kind: AllowListKind, id: &str) -> Result<bool, DbError> {
        let Some(mut ids) = self.lists.get_mut(&(name.to_string(), kind)) else {
            return Ok(false);
        };
        let before = ids.len();
        ids.retain(|existing| existing != id);
        Ok(ids.len() != before)
    }
}

/// Last-used timestamps.
#[derive(Debug, Default)]
pub struct MemoryRateLimitRepository {
    last_used: DashMap<String, i64>,
}

impl MemoryRateLimitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for MemoryRateLimitRepository {
    async fn get_last_used(&self, name: &str) -> Result<Option<i64>, DbError> {
        Ok(self.last_used.get(name).map(|at| *at))
    }

    async fn set_last_used(&self, name: &str, at: i64) -> Result<(), DbError> {
        self.last_used.insert(name.to_string(), at);
        Ok(())
    }

    async fn try_set_if_older_than(
        &self,
        name: &str,
        now: i64,
        cooldown_ms: i64,
    ) -> Result<bool, DbError> {
        // The entry holds the shard lock for the whole check-and-set.
        match self.last_used.entry(name.to_string()) {
            Entry::Occupied(mut slot) => {
                if now - *slot.get() >= cooldown_ms {
                    slot.insert(now);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                Ok(true)
            }
        }
    }
}

/// Audit trail kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditRepository {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn log(&self, command: &Command, result: &CommandResult) -> Result<(), DbError> {
        let entry = AuditEntry::new(command, result, chrono::Utc::now().timestamp_millis());
        self.entries.write().push(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DbError> {
        Ok(self.entries.read().iter().rev().take(limit).cloned().collect())
    }
}
