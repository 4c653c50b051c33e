//! Cooldown timestamps in SQLite.

use super::DbError;
use super::repository::RateLimitRepository;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for per-command "last used at" timestamps.
#[derive(Debug, Clone)]
pub struct SqliteRateLimitRepository {
    pool: SqlitePool,
}

impl SqliteRateLimitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for SqliteRateLimitRepository {
    async fn get_last_used(&self, name: &str) -> Result<Option<i64>, DbError> {
        let at = sqlx::query_scalar::<_, i64>(
            "SELECT last_used_at FROM rate_limits WHERE command = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(at)
    }

    async fn set_last_used(&self, name: &str, at: i64) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO rate_limits (command, last_used_at) VALUES (?, ?)
            ON CONFLICT(command) DO UPDATE SET last_used_at = excluded.last_used_at
            "#,
        )
        .bind(name)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn try_set_if_older_than(
        &self,
        name: &str,
        now: i64,
        cooldown_ms: i64,
    ) -> Result<bool, DbError> {
        // Single statement: the conditional upsert is the compare-and-swap.
        let result = sqlx::query(
            r#"
            INSERT INTO rate_limits (command, last_used_at) VALUES (?, ?)
            ON CONFLICT(command) DO UPDATE SET last_used_at = excluded.last_used_at
            WHERE excluded.last_used_at - rate_limits.last_used_at >= ?
            "#,
        )
        .bind(name)
        .bind(now)
        .bind(cooldown_ms)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
