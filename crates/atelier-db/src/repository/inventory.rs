//! # Inventory Repository
//!
//! Database operations for inventory items.
//!
//! ## Delete Guard
//! ```text
//! DELETE FROM inventory_items WHERE id = 7
//!      │
//!      ├── no rental_line_items row cites 7  → deleted
//!      │
//!      └── any row cites 7 (active OR settled rental)
//!             → SQLite: "FOREIGN KEY constraint failed"
//!             → DbError::Referenced { entity: "Item", id: "7" }
//!             → row untouched
//! ```

use atelier_core::{InventoryItem, ItemId, Money, NewInventoryItem};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    size: String,
    daily_rate: i64,
    total_quantity: i64,
    image_url: Option<String>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        InventoryItem {
            id: row.id,
            name: row.name,
            size: row.size,
            daily_rate: Money::from_units(row.daily_rate),
            total_quantity: row.total_quantity,
            image_url: row.image_url,
        }
    }
}

const SELECT_ITEMS: &str = r#"
    SELECT id, name, size, daily_rate, total_quantity, image_url
    FROM inventory_items
"#;

/// Repository for inventory item database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Lists every item ordered by id.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed inventory items");
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Gets an item by id.
    ///
    /// ## Returns
    /// * `Ok(Some(item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get_by_id(&self, id: ItemId) -> DbResult<Option<InventoryItem>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEMS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(InventoryItem::from))
    }

    /// Inserts a new item and returns it as stored.
    pub async fn insert(&self, item: &NewInventoryItem) -> DbResult<InventoryItem> {
        debug!(name = %item.name, "Inserting inventory item");

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items (name, size, daily_rate, total_quantity, image_url)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&item.name)
        .bind(&item.size)
        .bind(item.daily_rate.units())
        .bind(item.total_quantity)
        .bind(&item.image_url)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, name = %item.name, "Inventory item created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Inserts many items in one transaction (spreadsheet import).
    ///
    /// All or nothing: a failing row rolls back the whole batch.
    pub async fn insert_many(&self, items: &[NewInventoryItem]) -> DbResult<Vec<InventoryItem>> {
        debug!(count = items.len(), "Bulk inserting inventory items");

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO inventory_items (name, size, daily_rate, total_quantity, image_url)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&item.name)
            .bind(&item.size)
            .bind(item.daily_rate.units())
            .bind(item.total_quantity)
            .bind(&item.image_url)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        info!(count = ids.len(), "Inventory items imported");

        let mut stored = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = self.get_by_id(id).await? {
                stored.push(item);
            }
        }
        Ok(stored)
    }

    /// Replaces every field of an existing item.
    ///
    /// ## Returns
    /// * `Ok(item)` - The item as stored
    /// * `Err(DbError::NotFound)` - No such id
    pub async fn update(&self, item: &InventoryItem) -> DbResult<InventoryItem> {
        debug!(id = item.id, "Updating inventory item");

        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                name = ?2,
                size = ?3,
                daily_rate = ?4,
                total_quantity = ?5,
                image_url = ?6
            WHERE id = ?1
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.size)
        .bind(item.daily_rate.units())
        .bind(item.total_quantity)
        .bind(&item.image_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", item.id));
        }

        self.get_by_id(item.id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", item.id))
    }

    /// Deletes an item no rental has ever cited.
    ///
    /// ## Errors
    /// * `DbError::Referenced` - Some rental (any state) cites the item
    /// * `DbError::NotFound` - No such id
    pub async fn delete(&self, id: ItemId) -> DbResult<()> {
        debug!(id, "Deleting inventory item");

        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::referenced("Item", id),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        info!(id, "Inventory item deleted");
        Ok(())
    }

    /// Counts inventory records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
