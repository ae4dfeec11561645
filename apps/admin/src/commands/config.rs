//! # Config Commands
//!
//! Application configuration and the health of the backing store.

use atelier_db::MigrationStatus;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::{ConfigState, DbState};

/// Gets the current application configuration (passwords excluded).
pub fn get_config(config: &ConfigState) -> ConfigState {
    debug!("get_config command");
    config.clone()
}

/// What the status bar shows about the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub reachable: bool,
    pub migrations: MigrationStatus,
}

/// Checks that the store answers and its schema is current.
pub async fn get_store_status(db: &DbState) -> ApiResult<StoreStatus> {
    debug!("get_store_status command");

    let reachable = db.inner().health_check().await;
    let migrations = db.inner().migration_status().await?;

    Ok(StoreStatus {
        reachable,
        migrations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::TestApp;

    #[tokio::test]
    async fn test_store_status() {
        let app = TestApp::new().await;
        let status = get_store_status(&app.db).await.unwrap();
        assert!(status.reachable);
        assert!(status.migrations.is_current());

        app.db.inner().close().await;
        let status = get_store_status(&app.db).await.unwrap();
        assert!(!status.reachable);
        assert!(!status.migrations.is_current());
    }

    #[test]
    fn test_get_config_is_a_copy() {
        let config = ConfigState::default();
        assert_eq!(get_config(&config).shop_name, config.shop_name);
    }
}
