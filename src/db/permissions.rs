//! Per-command allow-lists in SQLite.

use super::DbError;
use super::repository::{AllowListKind, PermissionRepository};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for role/channel/user allow-lists.
#[derive(Debug, Clone)]
pub struct SqlitePermissionRepository {
    pool: SqlitePool,
}

impl SqlitePermissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for SqlitePermissionRepository {
    async fn list(&self, name: &str, kind: AllowListKind) -> Result<Vec<String>, DbError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM command_permissions
            WHERE command = ? AND kind = ?
            ORDER BY rowid
            "#,
        )
        .bind(name)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn add(&self, name: &str, kind: AllowListKind, id: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO command_permissions (command, kind, value, added_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(kind.as_str())
        .bind(id)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, name: &str, kind: AllowListKind, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "DELETE FROM command_permissions WHERE command = ? AND kind = ? AND value = ?",
        )
        .bind(name)
        .bind(kind.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
