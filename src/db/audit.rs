//! Audit trail in SQLite.

use super::DbError;
use super::repository::{AuditEntry, AuditRepository};
use crate::command::{Command, CommandResult};
use async_trait::async_trait;
use sqlx::SqlitePool;

type AuditRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    bool,
    Option<String>,
    i64,
);

/// Append-only audit log table.
#[derive(Debug, Clone)]
pub struct SqliteAuditRepository {
    pool: SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn log(&self, command: &Command, result: &CommandResult) -> Result<(), DbError> {
        let entry = AuditEntry::new(command, result, chrono::Utc::now().timestamp_millis());
        let args = serde_json::to_string(&entry.args)?;

        sqlx::query(
            r#"
            INSERT INTO audit_log
                (id, command, source, user_id, channel_id, args, success, error, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.command)
        .bind(&entry.source)
        .bind(&entry.user_id)
        .bind(&entry.channel_id)
        .bind(args)
        .bind(entry.success)
        .bind(&entry.error)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, command, source, user_id, channel_id, args, success, error, created_at
            FROM audit_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(
                |(id, command, source, user_id, channel_id, args, success, error, created_at)| {
                    Ok(AuditEntry {
                        id,
                        command,
                        source,
                        user_id,
                        channel_id,
                        args: serde_json::from_str(&args)?,
                        success,
                        error,
                        created_at,
                    })
                },
            )
            .collect()
    }
}
