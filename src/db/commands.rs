//! Enabled-command set in SQLite.

use super::DbError;
use super::repository::CommandRepository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for the global "command enabled" flag.
#[derive(Debug, Clone)]
pub struct SqliteCommandRepository {
    pool: SqlitePool,
}

impl SqliteCommandRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommandRepository for SqliteCommandRepository {
    async fn is_allowed(&self, name: &str) -> Result<bool, DbError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM enabled_commands WHERE command = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn add_allowed(&self, name: &str) -> Result<(), DbError> {
        sqlx::query("INSERT OR IGNORE INTO enabled_commands (command, enabled_at) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_allowed(&self, name: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM enabled_commands WHERE command = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_allowed(&self) -> Result<Vec<String>, DbError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT command FROM enabled_commands ORDER BY command",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}
