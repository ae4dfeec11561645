//! # Auth Commands

use tracing::debug;

use crate::error::ApiResult;
use crate::state::{ConfigState, Credentials, Session};

/// Exchanges a password for a session.
///
/// The front end keeps the returned [`Session`] and passes it back with
/// every write command.
pub fn sign_in(config: &ConfigState, password: &str) -> ApiResult<Session> {
    debug!("sign_in command");
    Credentials::from_config(config).authenticate(password)
}
