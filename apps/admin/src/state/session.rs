//! # Session
//!
//! The signed-in role, passed explicitly to commands that need it.
//!
//! ```text
//! password ──► Credentials::authenticate ──► Session { role }
//!                                                 │
//!                 read commands ◄─────────────────┤ (any role)
//!                                                 │
//!                 write commands ◄── require_admin┘
//! ```
//!
//! The core engines never see a role.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ErrorCode};
use crate::state::ConfigState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// Read-only.
    Staff,
}

/// An authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub role: Role,
}

impl Session {
    pub fn admin() -> Self {
        Session { role: Role::Admin }
    }

    pub fn staff() -> Self {
        Session { role: Role::Staff }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `FORBIDDEN` unless the session is an admin.
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!(action, "Staff session attempted an admin command");
            Err(ApiError::forbidden(action))
        }
    }
}

/// The two shop passwords.
#[derive(Clone)]
pub struct Credentials {
    admin_password: String,
    staff_password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(admin_password: impl Into<String>, staff_password: impl Into<String>) -> Self {
        Credentials {
            admin_password: admin_password.into(),
            staff_password: staff_password.into(),
        }
    }

    pub fn from_config(config: &ConfigState) -> Self {
        Credentials::new(&config.admin_password, &config.staff_password)
    }

    /// Opens a session for whichever role the password belongs to.
    ///
    /// The admin password wins if both are configured identically.
    pub fn authenticate(&self, password: &str) -> Result<Session, ApiError> {
        let session = if password == self.admin_password {
            Session::admin()
        } else if password == self.staff_password {
            Session::staff()
        } else {
            warn!("Rejected sign-in attempt");
            return Err(ApiError::new(ErrorCode::Unauthorized, "Incorrect password"));
        };

        info!(role = ?session.role, "Signed in");
        Ok(session)
    }
}
