//! # Storefront Commands
//!
//! The public catalogue page. No session is required; nothing here writes.

use atelier_core::storefront::{
    contact_card, filter_listing, hero, storefront_listing, ContactCard, ListingQuery,
    StorefrontHero, StorefrontItem,
};
use serde::Serialize;
use tracing::debug;

use crate::state::SnapshotState;

/// Everything the public page renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontPage {
    pub hero: StorefrontHero,
    pub contact: ContactCard,
    pub items: Vec<StorefrontItem>,
}

pub async fn storefront_page(snapshot: &SnapshotState, query: &ListingQuery) -> StorefrontPage {
    debug!(search = %query.search, available_only = query.available_only, "storefront_page command");

    let snapshot = snapshot.read().await;
    let listing = storefront_listing(&snapshot.items, &snapshot.reservations);

    StorefrontPage {
        hero: hero(&snapshot.site_config),
        contact: contact_card(&snapshot.site_config),
        items: filter_listing(listing, query),
    }
}
