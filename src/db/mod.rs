//! Persistence for allow-list, cooldown, and audit state.
//!
//! The dispatch core only sees the traits in [`repository`]. Two backings are
//! provided:
//! - [`memory`]: `DashMap`-based, process-local
//! - SQLite via SQLx ([`Database`]), with embedded migrations

mod audit;
mod commands;
pub mod memory;
mod permissions;
mod rate_limits;
pub mod repository;

pub use audit::SqliteAuditRepository;
pub use commands::SqliteCommandRepository;
pub use memory::{
    MemoryAuditRepository, MemoryCommandRepository, MemoryPermissionRepository,
    MemoryRateLimitRepository,
};
pub use permissions::SqlitePermissionRepository;
pub use rate_limits::SqliteRateLimitRepository;
pub use repository::{
    AllowListKind, AuditEntry, AuditRepository, CommandRepository, PermissionRepository,
    RateLimitRepository,
};

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Faults raised by a repository backing.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored value is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The four repositories the pipeline needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub commands: Arc<dyn CommandRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub rate_limits: Arc<dyn RateLimitRepository>,
    pub audit: Arc<dyn AuditRepository>,
}

impl Repositories {
    /// Process-local repositories.
    pub fn memory() -> Self {
        Self {
            commands: Arc::new(MemoryCommandRepository::new()),
            permissions: Arc::new(MemoryPermissionRepository::new()),
            rate_limits: Arc::new(MemoryRateLimitRepository::new()),
            audit: Arc::new(MemoryAuditRepository::new()),
        }
    }
}

/// SQLite-backed state shared by the four SQLite repositories.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// `":memory:"` gives a fresh private database per call. It lives as long
    /// as this handle (and its clones) do.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        Self::open(path, Self::IDLE_TIMEOUT).await
    }

    async fn open(path: &str, idle_timeout: Duration) -> Result<Self, DbError> {
        let (options, pooling) = Self::connect_options(path);

        let pool = pooling
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(Some(idle_timeout))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            sqlx::query(pragma).execute(&pool).await?;
        }

        info!(
            path = %path,
            max_connections = pool.options().get_max_connections(),
            "Command store ready"
        );
        Ok(Self { pool })
    }

    fn connect_options(path: &str) -> (SqliteConnectOptions, SqlitePoolOptions) {
        if path == ":memory:" {
            // A bare `:memory:` is per connection, so name a shared-cache
            // database instead. SQLite drops it when its last connection
            // closes: the single pooled connection is never reaped.
            let uri = format!(
                "file:cmdbus-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed)
            );
            let options = SqliteConnectOptions::new()
                .filename(uri)
                .shared_cache(true)
                .create_if_missing(true);
            let pooling = SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .max_lifetime(None);
            return (options, pooling);
        }

        if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty())
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            warn!(dir = %dir.display(), error = %e, "Could not create database directory");
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        (options, SqlitePoolOptions::new().max_connections(5))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn commands(&self) -> SqliteCommandRepository {
        SqliteCommandRepository::new(self.pool.clone())
    }

    pub fn permissions(&self) -> SqlitePermissionRepository {
        SqlitePermissionRepository::new(self.pool.clone())
    }

    pub fn rate_limits(&self) -> SqliteRateLimitRepository {
        SqliteRateLimitRepository::new(self.pool.clone())
    }

    pub fn audit(&self) -> SqliteAuditRepository {
        SqliteAuditRepository::new(self.pool.clone())
    }

    /// All four repositories on this pool.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            commands: Arc::new(self.commands()),
            permissions: Arc::new(self.permissions()),
            rate_limits: Arc::new(self.rate_limits()),
            audit: Arc::new(self.audit()),
        }
    }
}
