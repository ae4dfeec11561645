//! # Availability Engine
//!
//! Derives how many units of each inventory item are committed to open
//! rentals, and how many remain free.
//!
//! ## Data Flow
//! ```text
//! ┌──────────────┐   compute_active_reservations   ┌────────────────────┐
//! │ all rentals  │ ──────────────────────────────► │ ReservationMap     │
//! │ (any state)  │   (active rentals only)         │ item_id → reserved │
//! └──────┬───────┘                                 └─────────┬──────────┘
//!        │ items_with_history                                │
//!        │ customers_with_history                            ▼
//!        ▼                                    available_count(item, map)
//! ┌──────────────┐                            = total_quantity − reserved
//! │ delete gates │
//! └──────────────┘
//! ```
//!
//! Everything here is a pure function of the full collections. The caller
//! recomputes after every change to the rental set; nothing is cached.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{CustomerId, InventoryItem, ItemId, Rental, RentalLineItem};

/// Units of each item committed to active rentals.
pub type ReservationMap = HashMap<ItemId, i64>;

// =============================================================================
// Reservations
// =============================================================================

/// Sums line-item quantities of every active rental, keyed by item id.
///
/// Settled rentals are ignored. Items on no active rental are absent from
/// the map (read them through [`reserved_count`]).
pub fn compute_active_reservations(rentals: &[Rental]) -> ReservationMap {
    let mut reserved = ReservationMap::new();
    for rental in rentals.iter().filter(|r| r.is_active()) {
        for line in &rental.line_items {
            *reserved.entry(line.item_id).or_insert(0) += line.quantity;
        }
    }
    reserved
}

/// Reserved units of one item (0 when absent).
#[inline]
pub fn reserved_count(item_id: ItemId, reservations: &ReservationMap) -> i64 {
    reservations.get(&item_id).copied().unwrap_or(0)
}

/// Free units of `item`: `total_quantity − reserved`.
///
/// Negative only when the data is over-committed. Treat `<= 0` as
/// unavailable.
#[inline]
pub fn available_count(item: &InventoryItem, reservations: &ReservationMap) -> i64 {
    item.total_quantity - reserved_count(item.id, reservations)
}

// =============================================================================
// History Sets
// =============================================================================

/// Every item id cited by any rental, active or settled.
///
/// Gates inventory deletion.
pub fn items_with_history(rentals: &[Rental]) -> HashSet<ItemId> {
    rentals
        .iter()
        .flat_map(|r| r.line_items.iter().map(|line| line.item_id))
        .collect()
}

/// Every customer id cited by any rental.
pub fn customers_with_history(rentals: &[Rental]) -> HashSet<CustomerId> {
    rentals.iter().map(|r| r.customer_id).collect()
}

/// Number of rentals (any state) per customer.
pub fn customer_rental_counts(rentals: &[Rental]) -> HashMap<CustomerId, usize> {
    let mut counts = HashMap::new();
    for rental in rentals {
        *counts.entry(rental.customer_id).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Input Checks
// =============================================================================

/// Units of `item_id` the rental under edit already holds.
///
/// A settled rental holds nothing.
fn held_by(editing: Option<&Rental>, item_id: ItemId) -> i64 {
    editing
        .filter(|r| r.is_active())
        .map(|r| r.quantity_of(item_id))
        .unwrap_or(0)
}

/// Checks every requested line against what is free.
///
/// When revising an active rental, the units it already holds are counted
/// as free for that rental. An item missing from `items` has nothing
/// available.
///
/// ## Errors
/// [`CoreError::Unavailable`] for the first line that does not fit.
pub fn ensure_available(
    requested: &[RentalLineItem],
    items: &[InventoryItem],
    reservations: &ReservationMap,
    editing: Option<&Rental>,
) -> CoreResult<()> {
    for line in requested {
        let free = items
            .iter()
            .find(|item| item.id == line.item_id)
            .map(|item| available_count(item, reservations))
            .unwrap_or(0);
        let allowed = free + held_by(editing, line.item_id);

        if line.quantity > allowed {
            return Err(CoreError::Unavailable {
                item_id: line.item_id,
                available: allowed.max(0),
                requested: line.quantity,
            });
        }
    }
    Ok(())
}

/// Items offered in the rental form, sorted by name.
///
/// Every item with free units, plus the items already on the rental being
/// edited (even if it now holds the last unit).
pub fn selectable_items<'a>(
    items: &'a [InventoryItem],
    reservations: &ReservationMap,
    editing: Option<&Rental>,
) -> Vec<&'a InventoryItem> {
    let mut offered: Vec<&InventoryItem> = items
        .iter()
        .filter(|item| {
            available_count(item, reservations) > 0 || held_by(editing, item.id) > 0
        })
        .collect();
    offered.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    offered
}

// =============================================================================
// Stock Filter
// =============================================================================

/// Stock filter for inventory listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockFilter {
    #[default]
    All,
    /// At least one unit free.
    Available,
    /// Nothing free.
    Unavailable,
}

impl StockFilter {
    pub fn matches(&self, item: &InventoryItem, reservations: &ReservationMap) -> bool {
        match self {
            StockFilter::All => true,
            StockFilter::Available => available_count(item, reservations) > 0,
            StockFilter::Unavailable => available_count(item, reservations) <= 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
