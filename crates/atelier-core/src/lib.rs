//! # atelier-core: Pure Business Logic for the Rental Shop
//!
//! This crate is the **heart** of Atelier. It contains the availability and
//! pricing reconciliation as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atelier Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/admin (command layer)                      │   │
//! │  │   list_items, create_rental, return_rental, dashboard, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atelier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐ ┌─────────┐ ┌────────────┐ ┌────────────────┐  │   │
//! │  │  │availability│ │ pricing │ │ analytics  │ │   validation   │  │   │
//! │  │  │ reserved   │ │ quote   │ │ dashboard  │ │   rules        │  │   │
//! │  │  │ available  │ │ settle  │ │ revenue    │ │   checks       │  │   │
//! │  │  └────────────┘ └─────────┘ └────────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 atelier-db (Persistence Shell)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (InventoryItem, Customer, Rental, SiteConfig)
//! - [`money`] - Whole-unit money and discount rates (integer arithmetic)
//! - [`calendar`] - Calendar-day arithmetic in the shop's time zone
//! - [`availability`] - Reservations of inventory by active rentals
//! - [`pricing`] - Rental quotes, live estimates, settlement
//! - [`analytics`] - Dashboard figures
//! - [`storefront`] - Public page projections
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: everything is recomputed from the full collections
//! 2. **No I/O**: the persistence shell lives in `atelier-db`
//! 3. **Integer Money**: whole currency units (i64), no floats in totals
//! 4. **Explicit State**: a rental is `Active` or `Settled`, never "has a price or not"
//!
//! ## Example Usage
//!
//! ```rust
//! use atelier_core::money::{DiscountRate, Money};
//!
//! let gross = Money::from_units(600_000);
//! let net = gross.discounted_half_up(DiscountRate::from_percentage(10.0));
//! assert_eq!(net.units(), 540_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod availability;
pub mod calendar;
pub mod error;
pub mod money;
pub mod pricing;
pub mod storefront;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::ReservationMap;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use pricing::{ItemCatalog, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single item on one rental.
///
/// Guards against typos like 100 instead of 1.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest daily rate an item may carry, in whole currency units.
pub const MAX_DAILY_RATE: i64 = 1_000_000_000_000;

/// Number of entries shown in the dashboard "top" lists.
pub const DASHBOARD_TOP_N: usize = 5;
