//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! The `SqlitePool` inside is thread-safe; commands share it without
//! locking. All writes go through here before the snapshot is refreshed.

use atelier_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
