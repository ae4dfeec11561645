//! # Shop Database
//!
//! Opens the shop's SQLite file and hands out repositories.
//!
//! ## Opening Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new(path)           DbConfig::in_memory() (tests)            │
//! │          │                              │                               │
//! │          └──────────────┬───────────────┘                               │
//! │                         ▼                                               │
//! │  check_configured ── empty / placeholder path ──► NotConfigured         │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  connect: WAL, foreign_keys=ON, create file ── fails ──► ConnectionFailed│
//! │                         │                                               │
//! │                         ▼                                               │
//! │  migrate (embedded, idempotent)                                         │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  Database ──► items() customers() rentals() site_config()               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys must be on for every connection: the `RESTRICT` references
//! in the schema are what refuse deleting an item or customer that a rental
//! still cites.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::customer::CustomerRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::rental::RentalRepository;
use crate::repository::site_config::SiteConfigRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Where the shop database lives and how to open it.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("/srv/atelier/atelier.db").pool_size(2)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// Connections in the pool. One back office rarely needs more than a few.
    pub pool_size: u32,

    /// How long a command waits for a free connection before failing.
    pub acquire_timeout: Duration,

    /// Close connections idle for this long. `None` keeps them open.
    pub idle_timeout: Option<Duration>,

    /// Recycle connections after this long. `None` keeps them forever.
    pub max_lifetime: Option<Duration>,

    /// Apply embedded migrations on open.
    pub migrate: bool,
}

impl DbConfig {
    /// The file is created on first open if it does not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            pool_size: 4,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            max_lifetime: Some(Duration::from_secs(30 * 60)),
            migrate: true,
        }
    }

    /// A private in-memory store, for tests.
    ///
    /// Single connection that is never closed or recycled: every SQLite
    /// `:memory:` connection is its own database, gone with the connection.
    pub fn in_memory() -> Self {
        DbConfig {
            pool_size: 1,
            acquire_timeout: Duration::from_secs(2),
            idle_timeout: None,
            max_lifetime: None,
            ..DbConfig::new(IN_MEMORY)
        }
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Opens the store as is; see [`Database::migration_status`].
    pub fn without_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    /// Rejects an absent or placeholder path before touching the disk.
    fn check_configured(&self) -> DbResult<()> {
        let path = self.database_path.to_string_lossy();
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(DbError::NotConfigured("database path is empty".to_string()));
        }
        if trimmed.contains("YOUR_") || trimmed.contains("CHANGE_ME") {
            return Err(DbError::NotConfigured(format!(
                "database path '{}' is a placeholder",
                trimmed
            )));
        }
        Ok(())
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", self.database_path.display())
        };

        Ok(SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the shop database. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store described by `config`.
    ///
    /// ## Errors
    /// - [`DbError::NotConfigured`] for an empty or placeholder path
    /// - [`DbError::ConnectionFailed`] when the file cannot be opened
    /// - [`DbError::MigrationFailed`] when the schema cannot be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        config.check_configured()?;
        info!(path = %config.database_path.display(), "Opening shop database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(pool_size = config.pool_size, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending embedded migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    pub fn items(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn rentals(&self) -> RentalRepository {
        RentalRepository::new(self.pool.clone())
    }

    pub fn site_config(&self) -> SiteConfigRepository {
        SiteConfigRepository::new(self.pool.clone())
    }

    /// Closes the pool. Every later call fails as unavailable.
    pub async fn close(&self) {
        info!("Closing shop database");
        self.pool.close().await;
    }

    /// True when the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
