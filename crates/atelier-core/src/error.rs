//! # Error Types
//!
//! Domain-specific error types for atelier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atelier-core errors (this file)                                       │
//! │  ├── CoreError        - Lifecycle and availability violations          │
//! │  └── ValidationError  - Malformed caller input                         │
//! │                                                                         │
//! │  atelier-db errors (separate crate)                                    │
//! │  └── DbError          - Store failures, Referenced, Unavailable        │
//! │                                                                         │
//! │  Admin command errors (in app)                                         │
//! │  └── ApiError         - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → user message           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Precondition violations are returned immediately; nothing in the core
//! retries or swallows an error.

use thiserror::Error;

use crate::types::{ItemId, RentalId};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Operation attempted against a rental in the wrong lifecycle state.
    ///
    /// ## When This Occurs
    /// - Settling a rental that is already settled
    /// - Revising the terms of a settled rental
    ///
    /// Indicates a caller bug; the normal UI flow never offers these.
    #[error("Rental {rental_id} is {state}, cannot {operation}")]
    InvalidState {
        rental_id: RentalId,
        state: &'static str,
        operation: &'static str,
    },

    /// Requested quantity exceeds what is free for the item.
    ///
    /// ## User Workflow
    /// ```text
    /// Rental form (item X, qty: 3)
    ///      │
    ///      ▼
    /// ensure_available: available=2
    ///      │
    ///      ▼
    /// Unavailable { item_id: X, available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 left"
    /// ```
    #[error("Item {item_id} is unavailable: available {available}, requested {requested}")]
    Unavailable {
        item_id: ItemId,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error for a rental.
    pub fn invalid_state(rental_id: RentalId, state: &'static str, operation: &'static str) -> Self {
        CoreError::InvalidState {
            rental_id,
            state,
            operation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any persistence call; always recoverable by re-prompting.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (phone number, date order).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (the same item twice on one rental).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },

    /// An amount computed from stored values does not fit in i64.
    #[error("{field} is too large to compute")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
