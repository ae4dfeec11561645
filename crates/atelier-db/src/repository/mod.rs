//! # Repository Module
//!
//! Database repository implementations for Atelier.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin command                                                          │
//! │       │                                                                 │
//! │       │  db.rentals().settle(id, &settlement)                           │
//! │       ▼                                                                 │
//! │  RentalRepository                                                       │
//! │  ├── list / get_by_id                                                   │
//! │  ├── insert / update_terms                                              │
//! │  ├── settle (guarded: active rows only)                                 │
//! │  └── delete                                                             │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite (authoritative) ──► record read back and returned               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`](inventory::InventoryRepository) - Inventory item CRUD and bulk import
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer CRUD
//! - [`RentalRepository`](rental::RentalRepository) - Rentals, line items, settlement
//! - [`SiteConfigRepository`](site_config::SiteConfigRepository) - Storefront key/value settings

pub mod customer;
pub mod inventory;
pub mod rental;
pub mod site_config;
