//! # State Module
//!
//! Application state for the admin command layer.
//!
//! Instead of a single `AppState` struct, separate state types; each
//! command takes exactly the ones it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────┐  ┌──────────┐  │
//! │  │   DbState    │  │ SnapshotState  │  │ ConfigState  │  │ Session  │  │
//! │  │              │  │                │  │              │  │          │  │
//! │  │  Database    │  │  RwLock<       │  │  shop name   │  │  role    │  │
//! │  │  (SQLite     │  │    Snapshot    │  │  UTC offset  │  │          │  │
//! │  │   pool)      │  │  >             │  │  passwords   │  │          │  │
//! │  └──────────────┘  └────────────────┘  └──────────────┘  └──────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: the pool is thread-safe                                    │
//! │  • SnapshotState: replaced wholesale under a write lock                │
//! │  • ConfigState, Session: read-only values                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;
mod snapshot;

pub use config::{ConfigState, DEV_ADMIN_PASSWORD, DEV_STAFF_PASSWORD};
pub use db::DbState;
pub use session::{Credentials, Role, Session};
pub use snapshot::{Snapshot, SnapshotState};
