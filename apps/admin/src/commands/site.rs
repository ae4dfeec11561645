//! # Site Configuration Commands
//!
//! Key/value settings behind the public page (banner, contact details).
//! Missing keys fall back to built-in defaults when rendered.

use atelier_core::SiteConfig;
use tracing::debug;

use super::refresh;
use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session, SnapshotState};

/// Stored pairs as of the last reload.
pub async fn get_site_config(snapshot: &SnapshotState) -> SiteConfig {
    debug!("get_site_config command");
    snapshot.read().await.site_config.clone()
}

/// Inserts or replaces the given keys, all or nothing.
///
/// Keys not mentioned are left as they are. Values are stored as typed;
/// an empty value makes the page fall back to its default.
pub async fn update_site_config(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    pairs: Vec<(String, String)>,
) -> ApiResult<SiteConfig> {
    debug!(count = pairs.len(), "update_site_config command");
    session.require_admin("edit site settings")?;

    let pairs: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(key, value)| (key.trim().to_string(), value))
        .collect();
    if pairs.iter().any(|(key, _)| key.is_empty()) {
        return Err(ApiError::validation("key is required"));
    }
    if pairs.is_empty() {
        return Ok(get_site_config(snapshot).await);
    }

    let stored = db.inner().site_config().upsert_many(&pairs).await?;
    refresh(db, snapshot).await?;
    Ok(stored)
}

/// Stored pairs as pretty JSON, for backup.
pub async fn export_site_config(db: &DbState, session: &Session) -> ApiResult<String> {
    debug!("export_site_config command");
    session.require_admin("export site settings")?;

    Ok(db.inner().site_config().export_json().await?)
}
