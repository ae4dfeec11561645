//! # API Error Type
//!
//! The one error every command returns: a stable code the front end can
//! switch on, and a message it can show as is.
//!
//! ## Where Codes Come From
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ source                       │ code                                     │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │ ValidationError              │ VALIDATION_ERROR       re-prompt         │
//! │ CoreError::Unavailable       │ UNAVAILABLE            "only N left"     │
//! │ CoreError::InvalidState      │ INVALID_STATE          caller bug        │
//! │ DbError::AlreadySettled      │ INVALID_STATE          lost a race       │
//! │ DbError::Referenced          │ REFERENCED             no retry          │
//! │ DbError::NotFound            │ NOT_FOUND                                │
//! │ DbError::ConnectionFailed,   │ BACKING_STORE_UNAVAILABLE  top banner    │
//! │   NotConfigured, PoolExh.    │                                          │
//! │ Session::require_admin       │ FORBIDDEN                                │
//! │ Credentials::authenticate    │ UNAUTHORIZED                             │
//! │ anything else                │ DATABASE_ERROR / INTERNAL  logged        │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

use atelier_core::{CoreError, ValidationError};
use atelier_db::DbError;
use serde::Serialize;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "REFERENCED",
///   "message": "Item 7 is referenced by existing rentals and cannot be deleted"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Stable, SCREAMING_SNAKE_CASE on the wire
    pub code: ErrorCode,

    /// Shown to the user as is
    pub message: String,
}

/// What kind of failure a command hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed; re-prompt
    ValidationError,

    /// Rental in the wrong lifecycle state
    InvalidState,

    /// Delete refused because rentals cite the record
    Referenced,

    /// Requested more units than are free
    Unavailable,

    /// Store unreachable or not configured; show a banner
    BackingStoreUnavailable,

    /// Wrong password
    Unauthorized,

    /// Role may not perform this command
    Forbidden,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a referenced error.
    pub fn referenced(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(
            ErrorCode::Referenced,
            format!(
                "{} {} is referenced by existing rentals and cannot be deleted",
                resource, id
            ),
        )
    }

    pub fn forbidden(action: &str) -> Self {
        ApiError::new(ErrorCode::Forbidden, format!("Only an admin may {}", action))
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// True for conditions the front end shows as a blocking banner.
    pub fn is_blocking(&self) -> bool {
        matches!(self.code, ErrorCode::BackingStoreUnavailable)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::Referenced { entity, id } => ApiError::referenced(&entity, id),
            DbError::AlreadySettled { id } => ApiError::new(
                ErrorCode::InvalidState,
                format!("Rental {} is already settled", id),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!(error = %e, "Database connection failed");
                ApiError::new(
                    ErrorCode::BackingStoreUnavailable,
                    "The shop database cannot be reached",
                )
            }
            DbError::NotConfigured(e) => ApiError::new(
                ErrorCode::BackingStoreUnavailable,
                format!("The shop database is not configured: {}", e),
            ),
            DbError::PoolExhausted => ApiError::new(
                ErrorCode::BackingStoreUnavailable,
                "Database pool exhausted",
            ),
            DbError::MigrationFailed(e) => {
                tracing::error!(error = %e, "Migration failed");
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!(error = %e, "Query failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!(error = %e, "Internal database error");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidState { .. } => ApiError::new(ErrorCode::InvalidState, err.to_string()),
            CoreError::Unavailable {
                item_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::Unavailable,
                format!(
                    "Item {}: only {} available, {} requested",
                    item_id, available, requested
                ),
            ),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;
