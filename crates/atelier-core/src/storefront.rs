//! # Storefront
//!
//! Projections for the public catalogue page: the hero banner, the item
//! listing with stock badges, and the floating contact card.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::{available_count, ReservationMap};
use crate::money::Money;
use crate::types::{InventoryItem, ItemId, SiteConfig};

/// One card in the public listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StorefrontItem {
    pub id: ItemId,
    pub name: String,
    pub size: String,
    pub daily_rate: Money,
    pub image_url: Option<String>,
    /// Free units, never below zero.
    pub available: i64,
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StorefrontHero {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContactCard {
    pub zalo_name: String,
    pub zalo_phone: String,
    /// `https://zalo.me/<digits>`
    pub zalo_link: String,
    pub zalo_icon_url: Option<String>,
    /// Grouped `0900.000.000` when the number has ten digits.
    pub hotline_display: String,
    /// `tel:<digits>`
    pub hotline_link: String,
    pub hotline_icon_url: Option<String>,
}

/// Filters for the public listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListingQuery {
    /// Case-insensitive substring of the item name. Empty matches all.
    pub search: String,
    /// Hide items with nothing free.
    pub available_only: bool,
}

/// Every item with its free count, sorted by name.
pub fn storefront_listing(
    items: &[InventoryItem],
    reservations: &ReservationMap,
) -> Vec<StorefrontItem> {
    let mut listing: Vec<StorefrontItem> = items
        .iter()
        .map(|item| {
            let available = available_count(item, reservations).max(0);
            StorefrontItem {
                id: item.id,
                name: item.name.clone(),
                size: item.size.clone(),
                daily_rate: item.daily_rate,
                image_url: item.image_url.clone(),
                available,
                in_stock: available > 0,
            }
        })
        .collect();
    listing.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    listing
}

/// The listing narrowed by a visitor's search and stock filter.
pub fn filter_listing(listing: Vec<StorefrontItem>, query: &ListingQuery) -> Vec<StorefrontItem> {
    let needle = query.search.trim().to_lowercase();
    listing
        .into_iter()
        .filter(|item| !query.available_only || item.in_stock)
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn hero(config: &SiteConfig) -> StorefrontHero {
    StorefrontHero {
        title: config.hero_title().to_string(),
        subtitle: config.hero_subtitle().to_string(),
        image_url: config.hero_image_url().to_string(),
    }
}

fn digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `0975475789` → `0975.475.789`; other lengths are left as typed.
fn group_hotline(phone: &str) -> String {
    let d = digits(phone);
    if d.len() == 10 {
        format!("{}.{}.{}", &d[..4], &d[4..7], &d[7..])
    } else {
        phone.to_string()
    }
}

pub fn contact_card(config: &SiteConfig) -> ContactCard {
    let zalo_phone = config.contact_zalo_phone();
    let hotline = config.contact_hotline_phone();

    ContactCard {
        zalo_name: config.contact_zalo_name().to_string(),
        zalo_phone: zalo_phone.to_string(),
        zalo_link: format!("https://zalo.me/{}", digits(zalo_phone)),
        zalo_icon_url: config.contact_zalo_icon_url().map(str::to_string),
        hotline_display: group_hotline(hotline),
        hotline_link: format!("tel:{}", digits(hotline)),
        hotline_icon_url: config.contact_hotline_icon_url().map(str::to_string),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
