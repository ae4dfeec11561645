//! # Commands Module
//!
//! Every operation the admin front end and the public page invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs         ◄─── You are here (exports, write-then-reload)
//! ├── auth.rs        ◄─── Sign-in
//! ├── config.rs      ◄─── Configuration and store status
//! ├── inventory.rs   ◄─── Items with availability, CRUD, import
//! ├── customer.rs    ◄─── Customers with rental counts, CRUD, history
//! ├── rental.rs      ◄─── Rental board, create, revise, return, delete
//! ├── dashboard.rs   ◄─── Dashboard figures
//! ├── storefront.rs  ◄─── Public catalogue page
//! └── site.rs        ◄─── Site configuration
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Read command                     Write command                         │
//! │  ────────────                     ─────────────                         │
//! │  snapshot.read()                  session.require_admin()               │
//! │      │                            validate input (atelier-core)         │
//! │      ▼                            check against snapshot                │
//! │  derive DTOs (atelier-core)       write through repository (atelier-db)│
//! │      │                                │                                 │
//! │      ▼                                ▼                                 │
//! │  return                           snapshot.reload()  ◄── wholesale      │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                                   return the stored record              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares only the state it needs.

pub mod auth;
pub mod config;
pub mod customer;
pub mod dashboard;
pub mod inventory;
pub mod rental;
pub mod site;
pub mod storefront;

use crate::error::ApiResult;
use crate::state::{DbState, SnapshotState};

/// Refreshes the snapshot after a successful write.
async fn refresh(db: &DbState, snapshot: &SnapshotState) -> ApiResult<()> {
    snapshot.reload(db.inner()).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the command tests.

    use atelier_core::calendar::local_midnight;
    use atelier_core::{
        Customer, InventoryItem, Money, NewCustomer, NewInventoryItem, Rental, RentalLineItem,
        RentalTerms,
    };
    use atelier_db::{Database, DbConfig};
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    use crate::state::{ConfigState, DbState, SnapshotState};

    pub struct TestApp {
        pub db: DbState,
        pub snapshot: SnapshotState,
        pub config: ConfigState,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            let snapshot = SnapshotState::new();
            snapshot.reload(&db).await.unwrap();
            TestApp {
                db: DbState::new(db),
                snapshot,
                config: ConfigState::default(),
            }
        }

        pub async fn item(&self, name: &str, rate: i64, qty: i64) -> InventoryItem {
            let item = self
                .db
                .inner()
                .items()
                .insert(&NewInventoryItem {
                    name: name.to_string(),
                    size: "M".to_string(),
                    daily_rate: Money::from_units(rate),
                    total_quantity: qty,
                    image_url: None,
                })
                .await
                .unwrap();
            self.reload().await;
            item
        }

        pub async fn customer(&self, name: &str) -> Customer {
            let customer = self
                .db
                .inner()
                .customers()
                .insert(&NewCustomer {
                    name: name.to_string(),
                    phone: "0901234567".to_string(),
                    address: "12 Le Loi".to_string(),
                })
                .await
                .unwrap();
            self.reload().await;
            customer
        }

        /// Stores an active rental directly, bypassing availability checks.
        pub async fn rental(
            &self,
            customer: &Customer,
            lines: &[(i64, i64)],
            rental_date: DateTime<Utc>,
        ) -> Rental {
            let rental = self
                .db
                .inner()
                .rentals()
                .insert(&RentalTerms {
                    customer_id: customer.id,
                    line_items: lines
                        .iter()
                        .map(|(item_id, qty)| RentalLineItem::new(*item_id, *qty))
                        .collect(),
                    rental_date,
                    due_date: rental_date + Duration::days(2),
                    discount: None,
                    notes: None,
                })
                .await
                .unwrap();
            self.reload().await;
            rental
        }

        pub async fn reload(&self) {
            self.snapshot.reload(self.db.inner()).await.unwrap();
        }
    }

    /// 10:00 shop time on the given day.
    pub fn shop_time(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        local_midnight(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            atelier_core::calendar::default_offset(),
        ) + Duration::hours(10)
    }
}
