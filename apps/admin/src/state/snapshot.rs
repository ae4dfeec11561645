//! # Snapshot State
//!
//! The in-memory copy of every record, plus the sets derived from it.
//!
//! ## Refresh Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  command                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  write through the repository ──── Err ──► snapshot untouched          │
//! │     │ Ok                                                                │
//! │     ▼                                                                   │
//! │  reload(): list items, customers, rentals, site config                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Snapshot::new() recomputes reservations and history sets               │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  replace the whole snapshot under the write lock                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is ever patched in place; the store's answer is the only truth.

use std::collections::HashSet;

use atelier_core::availability::{
    compute_active_reservations, customers_with_history, items_with_history,
};
use atelier_core::{
    Customer, CustomerId, InventoryItem, ItemId, Rental, RentalId, ReservationMap, SiteConfig,
};
use atelier_db::{Database, DbResult};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Every record as last fetched, with derived sets.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub items: Vec<InventoryItem>,
    pub customers: Vec<Customer>,
    /// Newest rental date first.
    pub rentals: Vec<Rental>,
    pub site_config: SiteConfig,

    /// Units held by active rentals.
    pub reservations: ReservationMap,
    /// Items cited by any rental; these cannot be deleted.
    pub items_with_history: HashSet<ItemId>,
    /// Customers with any rental; these cannot be deleted.
    pub customers_with_history: HashSet<CustomerId>,
}

impl Snapshot {
    pub fn new(
        items: Vec<InventoryItem>,
        customers: Vec<Customer>,
        rentals: Vec<Rental>,
        site_config: SiteConfig,
    ) -> Self {
        let reservations = compute_active_reservations(&rentals);
        let items_with_history = items_with_history(&rentals);
        let customers_with_history = customers_with_history(&rentals);

        Snapshot {
            items,
            customers,
            rentals,
            site_config,
            reservations,
            items_with_history,
            customers_with_history,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn rental(&self, id: RentalId) -> Option<&Rental> {
        self.rentals.iter().find(|rental| rental.id == id)
    }
}

/// Shared snapshot behind an async read/write lock.
#[derive(Debug, Default)]
pub struct SnapshotState {
    inner: RwLock<Snapshot>,
}

impl SnapshotState {
    /// An empty snapshot; call [`SnapshotState::reload`] before use.
    pub fn new() -> Self {
        SnapshotState::default()
    }

    /// Fetches every collection and replaces the snapshot wholesale.
    ///
    /// On error the previous snapshot stays in place. Site configuration
    /// degrades to defaults rather than failing the reload.
    pub async fn reload(&self, db: &Database) -> DbResult<()> {
        let (item_repo, customer_repo, rental_repo) = (db.items(), db.customers(), db.rentals());
        let (items, customers, rentals) =
            tokio::try_join!(item_repo.list(), customer_repo.list(), rental_repo.list())?;
        let site_config = db.site_config().load().await;

        debug!(
            items = items.len(),
            customers = customers.len(),
            rentals = rentals.len(),
            "Snapshot fetched"
        );

        self.replace(Snapshot::new(items, customers, rentals, site_config))
            .await;
        Ok(())
    }

    /// Swaps in a new snapshot.
    pub async fn replace(&self, snapshot: Snapshot) {
        let active = snapshot.reservations.len();
        *self.inner.write().await = snapshot;
        info!(reserved_items = active, "Snapshot replaced");
    }

    /// Read access to the current snapshot.
    pub async fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().await
    }
}
