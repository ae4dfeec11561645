//! # Atelier Admin Library
//!
//! Back office of the rental shop: sign-in, inventory, customers, the
//! rental board, the dashboard and the public catalogue page.
//!
//! ## Module Organization
//! ```text
//! atelier_admin/
//! ├── lib.rs            ◄─── You are here (startup helpers)
//! ├── state/
//! │   ├── mod.rs        ◄─── State type exports
//! │   ├── db.rs         ◄─── Database state wrapper
//! │   ├── snapshot.rs   ◄─── Cached records + derived sets
//! │   ├── session.rs    ◄─── Role of the signed-in user
//! │   └── config.rs     ◄─── Configuration from the environment
//! ├── commands/
//! │   ├── mod.rs        ◄─── Command exports, write-then-reload
//! │   ├── inventory.rs  ◄─── Items
//! │   ├── customer.rs   ◄─── Customers
//! │   ├── rental.rs     ◄─── Rentals
//! │   └── ...           ◄─── Dashboard, storefront, site, auth, config
//! └── error.rs          ◄─── API error type for commands
//! ```
//!
//! ## State Management (Multiple State Types)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐ ┌────────────────┐ ┌──────────────┐ ┌────────────┐   │
//! │  │   DbState    │ │ SnapshotState  │ │ ConfigState  │ │  Session   │   │
//! │  │ • pool       │ │ • all records  │ │ • shop name  │ │ • role     │   │
//! │  │ • repos      │ │ • reservations │ │ • UTC offset │ │            │   │
//! │  └──────────────┘ └────────────────┘ └──────────────┘ └────────────┘   │
//! │                                                                         │
//! │  Each command takes only the state it needs.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use atelier_db::{Database, DbConfig, DbError};
use directories::ProjectDirs;
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use state::{ConfigState, DbState, SnapshotState};

/// Why the back office could not start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl StartupError {
    /// True when the store itself cannot be reached (as opposed to a bug).
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            StartupError::Db(e) => e.is_unavailable(),
            StartupError::NoDataDir | StartupError::Io(_) => true,
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=atelier=trace` - Show trace for atelier crates only
/// - Default: INFO, DEBUG for atelier crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atelier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.atelier.admin/atelier.db`
/// - **Windows**: `%APPDATA%\atelier\admin\atelier.db`
/// - **Linux**: `~/.local/share/admin/atelier.db`
///
/// `ATELIER_DB_PATH` (read into [`ConfigState`]) overrides all of these.
pub fn database_path(config: &ConfigState) -> Result<PathBuf, StartupError> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "atelier", "admin").ok_or(StartupError::NoDataDir)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("atelier.db"))
}

/// Opens the shop database, applies migrations and loads the first snapshot.
///
/// ## Startup Sequence
/// ```text
/// database_path ──► Database::new (WAL, migrations) ──► SnapshotState::reload
/// ```
pub async fn open(config: &ConfigState) -> Result<(DbState, SnapshotState), StartupError> {
    let db_path = database_path(config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let snapshot = SnapshotState::new();
    snapshot.reload(&db).await?;

    Ok((DbState::new(db), snapshot))
}
