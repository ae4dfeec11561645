//! # Site Configuration Repository
//!
//! Key/value pairs behind the storefront banner and contact card.
//!
//! Reading never fails: when the table is unreachable, [`SiteConfigRepository::load`]
//! logs a warning and returns an empty [`SiteConfig`], whose getters fall
//! back to built-in defaults.

use atelier_core::SiteConfig;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct SiteConfigRepository {
    pool: SqlitePool,
}

impl SiteConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SiteConfigRepository { pool }
    }

    /// Reads every stored pair.
    pub async fn try_load(&self) -> DbResult<SiteConfig> {
        let pairs: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM site_config ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        debug!(count = pairs.len(), "Loaded site config");
        Ok(pairs.into_iter().collect())
    }

    /// Reads every stored pair, degrading to defaults on failure.
    pub async fn load(&self) -> SiteConfig {
        match self.try_load().await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Site config unavailable, using defaults");
                SiteConfig::new()
            }
        }
    }

    /// Inserts or replaces several keys in one transaction.
    ///
    /// ## Returns
    /// The full configuration as stored afterwards.
    pub async fn upsert_many(&self, pairs: &[(String, String)]) -> DbResult<SiteConfig> {
        debug!(count = pairs.len(), "Upserting site config");

        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(
                r#"
                INSERT INTO site_config (key, value, updated_at)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                ON CONFLICT (key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(count = pairs.len(), "Site config updated");
        self.try_load().await
    }

    /// The stored pairs as a JSON object, for backup.
    pub async fn export_json(&self) -> DbResult<String> {
        let config = self.try_load().await?;
        serde_json::to_string_pretty(&config).map_err(|e| DbError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use atelier_core::site_keys;

    #[tokio::test]
    async fn test_empty_store_gives_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = db.site_config().load().await;
        assert!(config.is_empty());
        assert_eq!(config.hero_title(), atelier_core::site_defaults::HERO_TITLE);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_keeps_others() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.site_config();

        repo.upsert_many(&[
            (site_keys::HERO_TITLE.to_string(), "Spring".to_string()),
            ("custom_key".to_string(), "kept".to_string()),
        ])
        .await
        .unwrap();

        let config = repo
            .upsert_many(&[(site_keys::HERO_TITLE.to_string(), "Summer".to_string())])
            .await
            .unwrap();
        assert_eq!(config.hero_title(), "Summer");
        assert_eq!(config.get("custom_key"), Some("kept"));

        let json: serde_json::Value = serde_json::from_str(&repo.export_json().await.unwrap()).unwrap();
        assert_eq!(json["hero_title"], "Summer");
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let config = db.site_config().load().await;
        assert_eq!(config.contact_zalo_name(), atelier_core::site_defaults::CONTACT_ZALO_NAME);
        assert!(db.site_config().try_load().await.is_err());
    }
}
