//! # Domain Types
//!
//! Records used throughout Atelier.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │    Customer     │   │     Rental      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name, size     │   │  name           │   │  customer_id    │       │
//! │  │  daily_rate     │   │  phone          │   │  line_items[]   │       │
//! │  │  total_quantity │   │  address        │   │  dates          │       │
//! │  └─────────────────┘   └─────────────────┘   │  status ───────────┐   │
//! │                                              └─────────────────┘  │   │
//! │                        ┌──────────────────────────────────────────┘   │
//! │                        ▼                                               │
//! │               RentalStatus::Active                                     │
//! │               RentalStatus::Settled(Settlement {                       │
//! │                   return_date, surcharge, total_price })               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Identities are integers assigned by the persistence shell. Records that
//! have not been stored yet use the `New*` / [`RentalTerms`] shapes, which
//! carry no id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{DiscountRate, Money};

/// Identity of an inventory item.
pub type ItemId = i64;

/// Identity of a customer.
pub type CustomerId = i64;

/// Identity of a rental.
pub type RentalId = i64;

// =============================================================================
// Inventory Item
// =============================================================================

/// A rentable garment (or any other stock-keeping unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    pub id: ItemId,

    /// Display name shown in listings and on the storefront.
    pub name: String,

    /// Size label ("S", "M", "XL", "Free size", ...).
    pub size: String,

    /// Price per unit per day.
    pub daily_rate: Money,

    /// Units owned by the shop, rented or not. Never negative.
    pub total_quantity: i64,

    /// Image reference (URL or inline data URI). Opaque to the core.
    pub image_url: Option<String>,
}

/// An inventory item before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewInventoryItem {
    pub name: String,
    pub size: String,
    pub daily_rate: Money,
    pub total_quantity: i64,
    pub image_url: Option<String>,
}

impl NewInventoryItem {
    /// Attaches a store-assigned id.
    pub fn with_id(self, id: ItemId) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            size: self.size,
            daily_rate: self.daily_rate,
            total_quantity: self.total_quantity,
            image_url: self.image_url,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A shop customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// A customer before the store has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: String,
}

// =============================================================================
// Rental
// =============================================================================

/// One line on a rental: how many units of which item.
///
/// Value type embedded in a rental; never stored on its own identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RentalLineItem {
    pub item_id: ItemId,
    pub quantity: i64,
}

impl RentalLineItem {
    pub const fn new(item_id: ItemId, quantity: i64) -> Self {
        RentalLineItem { item_id, quantity }
    }
}

/// The frozen outcome of returning a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settlement {
    #[ts(as = "String")]
    pub return_date: DateTime<Utc>,

    /// Extra charge declared at return time, added after the discount.
    pub surcharge: Money,

    /// Final price. Never recomputed once set.
    pub total_price: Money,
}

/// Lifecycle state of a rental.
///
/// ```text
///   Active ──settle_rental──► Settled(Settlement)
///     │                           (one-way)
///     └─ revise_rental ─┐
///          ▲            │
///          └────────────┘
/// ```
///
/// An active rental has no stored price; its live estimate is computed on
/// demand. A settled rental has a frozen price and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum RentalStatus {
    /// Out with the customer; items are reserved.
    Active,
    /// Returned; price frozen.
    Settled(Settlement),
}

impl RentalStatus {
    /// Short lowercase name used in error messages and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            RentalStatus::Active => "active",
            RentalStatus::Settled(_) => "settled",
        }
    }
}

/// Commercial terms of a rental: everything the customer agreed to up front.
///
/// Used to create a rental and to revise an active one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RentalTerms {
    pub customer_id: CustomerId,
    pub line_items: Vec<RentalLineItem>,
    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,
    /// Informational only; never gates pricing.
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub discount: Option<DiscountRate>,
    pub notes: Option<String>,
}

/// Terms of a rental about to be created. Always starts active.
pub type NewRental = RentalTerms;

/// Replacement terms for an active rental.
pub type RentalRevision = RentalTerms;

/// A rental of one or more items by one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Rental {
    pub id: RentalId,
    pub customer_id: CustomerId,
    pub line_items: Vec<RentalLineItem>,
    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    pub discount: Option<DiscountRate>,
    pub notes: Option<String>,
    pub status: RentalStatus,
}

impl Rental {
    /// Builds a freshly stored (active) rental from its terms.
    pub fn from_terms(id: RentalId, terms: RentalTerms) -> Self {
        Rental {
            id,
            customer_id: terms.customer_id,
            line_items: terms.line_items,
            rental_date: terms.rental_date,
            due_date: terms.due_date,
            discount: terms.discount,
            notes: terms.notes,
            status: RentalStatus::Active,
        }
    }

    /// Returns the current terms of this rental.
    pub fn terms(&self) -> RentalTerms {
        RentalTerms {
            customer_id: self.customer_id,
            line_items: self.line_items.clone(),
            rental_date: self.rental_date,
            due_date: self.due_date,
            discount: self.discount,
            notes: self.notes.clone(),
        }
    }

    /// True while the items are out (no return recorded).
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.status, RentalStatus::Active)
    }

    /// The settlement, if the rental has been returned.
    #[inline]
    pub fn settlement(&self) -> Option<&Settlement> {
        match &self.status {
            RentalStatus::Settled(settlement) => Some(settlement),
            RentalStatus::Active => None,
        }
    }

    /// The frozen price of a settled rental.
    #[inline]
    pub fn total_price(&self) -> Option<Money> {
        self.settlement().map(|s| s.total_price)
    }

    /// When the rental was returned, if it was.
    #[inline]
    pub fn return_date(&self) -> Option<DateTime<Utc>> {
        self.settlement().map(|s| s.return_date)
    }

    /// Discount to apply, treating an absent discount as zero.
    #[inline]
    pub fn effective_discount(&self) -> DiscountRate {
        self.discount.unwrap_or_default()
    }

    /// Units of `item_id` on this rental (0 if not present).
    pub fn quantity_of(&self, item_id: ItemId) -> i64 {
        self.line_items
            .iter()
            .filter(|line| line.item_id == item_id)
            .map(|line| line.quantity)
            .sum()
    }
}

// =============================================================================
// Site Configuration
// =============================================================================

/// Keys understood by the storefront.
pub mod site_keys {
    pub const HERO_TITLE: &str = "hero_title";
    pub const HERO_SUBTITLE: &str = "hero_subtitle";
    pub const HERO_IMAGE_URL: &str = "hero_image_url";
    pub const CONTACT_ZALO_NAME: &str = "contact_zalo_name";
    pub const CONTACT_ZALO_PHONE: &str = "contact_zalo_phone";
    pub const CONTACT_ZALO_ICON_URL: &str = "contact_zalo_icon_url";
    pub const CONTACT_HOTLINE_PHONE: &str = "contact_hotline_phone";
    pub const CONTACT_HOTLINE_ICON_URL: &str = "contact_hotline_icon_url";
}

/// Built-in values used when a key is absent (or empty) in the store.
pub mod site_defaults {
    pub const HERO_TITLE: &str = "Fashion Collection for Rent";
    pub const HERO_SUBTITLE: &str =
        "Beautiful outfits for every special occasion. Stylish, convenient and elegant.";
    pub const HERO_IMAGE_URL: &str =
        "https://images.unsplash.com/photo-1556905055-8f358a7a47b2?q=80&w=2070&auto=format&fit=crop";
    pub const CONTACT_ZALO_NAME: &str = "Atelier Studio";
    pub const CONTACT_ZALO_PHONE: &str = "0900000000";
    pub const CONTACT_HOTLINE_PHONE: &str = "0900000000";
}

/// Open key/value site configuration (banner text, contact info, ...).
///
/// Keys are unique; unknown keys are kept untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SiteConfig(BTreeMap<String, String>);

impl SiteConfig {
    /// Creates an empty configuration (every getter returns its default).
    pub fn new() -> Self {
        SiteConfig(BTreeMap::new())
    }

    /// Raw lookup. Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Lookup with a fallback.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Sets a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Iterates over the stored pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn hero_title(&self) -> &str {
        self.get_or(site_keys::HERO_TITLE, site_defaults::HERO_TITLE)
    }

    pub fn hero_subtitle(&self) -> &str {
        self.get_or(site_keys::HERO_SUBTITLE, site_defaults::HERO_SUBTITLE)
    }

    pub fn hero_image_url(&self) -> &str {
        self.get_or(site_keys::HERO_IMAGE_URL, site_defaults::HERO_IMAGE_URL)
    }

    pub fn contact_zalo_name(&self) -> &str {
        self.get_or(site_keys::CONTACT_ZALO_NAME, site_defaults::CONTACT_ZALO_NAME)
    }

    pub fn contact_zalo_phone(&self) -> &str {
        self.get_or(site_keys::CONTACT_ZALO_PHONE, site_defaults::CONTACT_ZALO_PHONE)
    }

    pub fn contact_hotline_phone(&self) -> &str {
        self.get_or(
            site_keys::CONTACT_HOTLINE_PHONE,
            site_defaults::CONTACT_HOTLINE_PHONE,
        )
    }

    /// Icons have no default; the front end falls back to a built-in glyph.
    pub fn contact_zalo_icon_url(&self) -> Option<&str> {
        self.get(site_keys::CONTACT_ZALO_ICON_URL)
    }

    pub fn contact_hotline_icon_url(&self) -> Option<&str> {
        self.get(site_keys::CONTACT_HOTLINE_ICON_URL)
    }
}

impl FromIterator<(String, String)> for SiteConfig {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        SiteConfig(iter.into_iter().collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
