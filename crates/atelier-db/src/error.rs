//! # Persistence Errors
//!
//! What the shop database can refuse, and why.
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (admin) ──► message or banner
//!
//!   NotFound / Referenced / AlreadySettled     the store said no; re-prompt
//!   ConnectionFailed / NotConfigured / Pool*   the store is unavailable
//!   MigrationFailed / QueryFailed / Internal   a bug; logged in full
//! ```

use thiserror::Error;

/// Failures of the persistence shell.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Updating or deleting an id that does not exist
    /// - Settling a rental that was deleted meanwhile
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Delete refused because another record still cites this one.
    ///
    /// ## When This Occurs
    /// - Deleting an inventory item used by any rental (active or settled)
    /// - Deleting a customer with any rental
    ///
    /// Not retryable: the referenced entity stays in place.
    #[error("{entity} {id} is referenced by existing rentals and cannot be deleted")]
    Referenced { entity: String, id: String },

    /// Write refused because the rental is no longer active.
    ///
    /// ## When This Occurs
    /// - Two sessions settling the same rental; the second one lands here
    /// - Revising terms of a rental settled meanwhile
    #[error("Rental {id} is already settled")]
    AlreadySettled { id: i64 },

    /// Foreign key constraint violation on insert or update.
    ///
    /// ## When This Occurs
    /// - Rental citing a customer or item id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The backing store is not configured.
    ///
    /// ## When This Occurs
    /// - Empty or placeholder database path
    #[error("Database not configured: {0}")]
    NotConfigured(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including CHECK constraint failures).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Referenced error.
    pub fn referenced(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::Referenced {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True when the store itself is unreachable or unconfigured.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::NotConfigured(_) | DbError::PoolExhausted
        )
    }
}

/// Classifies a driver error.
///
/// Closed pools and I/O failures count as an unavailable store; a foreign
/// key failure is kept apart so deletes can report it as [`DbError::Referenced`].
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();

                // SQLite reports RESTRICT and missing parents the same way:
                // "FOREIGN KEY constraint failed". Deletes remap this to
                // Referenced at the call site.
                if message.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    }
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("database closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DbError::referenced("Item", 4).to_string(),
            "Item 4 is referenced by existing rentals and cannot be deleted"
        );
        assert_eq!(DbError::not_found("Customer", 9).to_string(), "Customer not found: 9");
        assert_eq!(DbError::AlreadySettled { id: 3 }.to_string(), "Rental 3 is already settled");
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(DbError::NotConfigured("empty path".into()).is_unavailable());
        assert!(DbError::PoolExhausted.is_unavailable());
        assert!(!DbError::referenced("Item", 1).is_unavailable());
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
    }
}
