//! # Inventory Commands
//!
//! Inventory listing with live availability, and item maintenance.
//!
//! ## Delete Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete_item(7)                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  admin? ──── no ───► FORBIDDEN                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  snapshot: any rental (active or settled) cites 7? ── yes ─► REFERENCED │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  DELETE ... (RESTRICT in the store) ─── FK failure ───────► REFERENCED  │
//! │       │ ok                                                              │
//! │       ▼                                                                 │
//! │  reload snapshot                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either way a refused item stays exactly as it was.

use atelier_core::availability::{available_count, reserved_count};
use atelier_core::validation::{
    validate_daily_rate, validate_item_name, validate_new_item, validate_size_label,
    validate_total_quantity,
};
use atelier_core::{InventoryItem, ItemId, Money, NewInventoryItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::refresh;
use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, Session, Snapshot, SnapshotState};

pub use atelier_core::availability::StockFilter;

/// Inventory row as shown in the admin list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: ItemId,
    pub name: String,
    pub size: String,
    pub daily_rate: Money,
    pub total_quantity: i64,
    pub image_url: Option<String>,
    /// Units out on active rentals.
    pub reserved: i64,
    /// `total_quantity - reserved`. Negative only for over-committed data.
    pub available: i64,
    pub in_stock: bool,
    /// False once any rental has cited the item.
    pub can_delete: bool,
}

impl ItemDto {
    pub(crate) fn from_snapshot(item: &InventoryItem, snapshot: &Snapshot) -> Self {
        let available = available_count(item, &snapshot.reservations);
        ItemDto {
            id: item.id,
            name: item.name.clone(),
            size: item.size.clone(),
            daily_rate: item.daily_rate,
            total_quantity: item.total_quantity,
            image_url: item.image_url.clone(),
            reserved: reserved_count(item.id, &snapshot.reservations),
            available,
            in_stock: available > 0,
            can_delete: !snapshot.items_with_history.contains(&item.id),
        }
    }
}

/// Sort orders offered on the inventory page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSort {
    /// Store order (by id).
    #[default]
    Default,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    AvailableAsc,
    AvailableDesc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemQuery {
    pub stock: StockFilter,
    pub sort: ItemSort,
}

/// Lists inventory with availability, filtered and sorted.
pub async fn list_items(snapshot: &SnapshotState, query: ItemQuery) -> Vec<ItemDto> {
    debug!(?query, "list_items command");

    let snapshot = snapshot.read().await;
    let mut rows: Vec<ItemDto> = snapshot
        .items
        .iter()
        .filter(|item| query.stock.matches(item, &snapshot.reservations))
        .map(|item| ItemDto::from_snapshot(item, &snapshot))
        .collect();

    // Stable sorts keep store order among equals
    match query.sort {
        ItemSort::Default => {}
        ItemSort::NameAsc => rows.sort_by(|a, b| a.name.cmp(&b.name)),
        ItemSort::NameDesc => rows.sort_by(|a, b| b.name.cmp(&a.name)),
        ItemSort::PriceAsc => rows.sort_by_key(|r| r.daily_rate),
        ItemSort::PriceDesc => rows.sort_by(|a, b| b.daily_rate.cmp(&a.daily_rate)),
        ItemSort::AvailableAsc => rows.sort_by_key(|r| r.available),
        ItemSort::AvailableDesc => rows.sort_by(|a, b| b.available.cmp(&a.available)),
    }

    rows
}

/// Adds one item.
pub async fn add_item(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    item: NewInventoryItem,
) -> ApiResult<InventoryItem> {
    debug!(name = %item.name, "add_item command");
    session.require_admin("add inventory")?;
    validate_new_item(&item)?;

    let stored = db.inner().items().insert(&item).await?;
    refresh(db, snapshot).await?;
    Ok(stored)
}

/// Adds many items at once (spreadsheet import).
///
/// Every row is validated before anything is written; the first bad row
/// is reported by its 1-based position. The store writes all or nothing.
pub async fn import_items(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    items: Vec<NewInventoryItem>,
) -> ApiResult<Vec<InventoryItem>> {
    debug!(count = items.len(), "import_items command");
    session.require_admin("import inventory")?;

    if items.is_empty() {
        return Ok(Vec::new());
    }

    for (index, item) in items.iter().enumerate() {
        validate_new_item(item)
            .map_err(|e| ApiError::validation(format!("Row {}: {}", index + 1, e)))?;
    }

    let stored = db.inner().items().insert_many(&items).await?;
    refresh(db, snapshot).await?;

    info!(count = stored.len(), "Inventory imported");
    Ok(stored)
}

/// Replaces every field of an item.
///
/// Lowering the quantity below what is currently out is allowed; the item
/// then simply shows as unavailable until enough units come back.
pub async fn update_item(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    item: InventoryItem,
) -> ApiResult<InventoryItem> {
    debug!(id = item.id, "update_item command");
    session.require_admin("edit inventory")?;

    validate_item_name(&item.name)?;
    validate_size_label(&item.size)?;
    validate_daily_rate(item.daily_rate)?;
    validate_total_quantity(item.total_quantity)?;

    {
        let current = snapshot.read().await;
        let reserved = reserved_count(item.id, &current.reservations);
        if item.total_quantity < reserved {
            warn!(
                id = item.id,
                total = item.total_quantity,
                reserved,
                "Item quantity set below units currently rented"
            );
        }
    }

    let stored = db.inner().items().update(&item).await?;
    refresh(db, snapshot).await?;
    Ok(stored)
}

/// Deletes an item that no rental has ever cited.
pub async fn delete_item(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    id: ItemId,
) -> ApiResult<()> {
    debug!(id, "delete_item command");
    session.require_admin("delete inventory")?;

    if snapshot.read().await.items_with_history.contains(&id) {
        return Err(ApiError::referenced("Item", id));
    }

    db.inner().items().delete(id).await?;
    refresh(db, snapshot).await?;
    Ok(())
}
