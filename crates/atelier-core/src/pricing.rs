//! # Pricing Engine
//!
//! Derives the cost of a rental from its line items, elapsed days,
//! discount, and surcharge.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  daily_rate = Σ catalog[line.item_id].daily_rate × line.quantity        │
//! │  days       = max(1, calendar_days(rental_date → as_of) + 1)            │
//! │  gross      = daily_rate × days                                         │
//! │  net        = round_half_up(gross × (100 % − discount))                 │
//! │  total      = net + surcharge            (surcharge is not discounted)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The daily rate is read from the catalog at computation time, not
//! snapshotted into the rental. A price change moves the live estimate of
//! open rentals; a settled price is frozen.
//!
//! ## Live estimate vs settlement
//! Both go through [`quote`]. The live estimate uses `surcharge = 0` and
//! `as_of = now`; settlement uses the declared surcharge and the return
//! instant. Settling "now" with no surcharge therefore matches the estimate
//! shown a moment earlier.
//!
//! Every step is checked: a product or sum that leaves i64 is reported as
//! [`ValidationError::Overflow`] instead of wrapping.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::calendar::days_elapsed;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountRate, Money};
use crate::types::{
    InventoryItem, ItemId, Rental, RentalLineItem, RentalRevision, RentalStatus, Settlement,
};
use crate::validation::{validate_discount, validate_line_items, validate_surcharge};

// =============================================================================
// Item Catalog
// =============================================================================

/// Lookup of current daily rates by item id.
///
/// Implemented for item slices (linear scan) and id-keyed maps.
pub trait ItemCatalog {
    /// Current daily rate of `item_id`, or `None` if the item is unknown.
    fn daily_rate_of(&self, item_id: ItemId) -> Option<Money>;
}

impl ItemCatalog for [InventoryItem] {
    fn daily_rate_of(&self, item_id: ItemId) -> Option<Money> {
        self.iter()
            .find(|item| item.id == item_id)
            .map(|item| item.daily_rate)
    }
}

impl ItemCatalog for Vec<InventoryItem> {
    fn daily_rate_of(&self, item_id: ItemId) -> Option<Money> {
        self.as_slice().daily_rate_of(item_id)
    }
}

impl ItemCatalog for HashMap<ItemId, InventoryItem> {
    fn daily_rate_of(&self, item_id: ItemId) -> Option<Money> {
        self.get(&item_id).map(|item| item.daily_rate)
    }
}

impl ItemCatalog for HashMap<ItemId, Money> {
    fn daily_rate_of(&self, item_id: ItemId) -> Option<Money> {
        self.get(&item_id).copied()
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Every step of a price computation.
///
/// `gross − discount + surcharge == total` holds exactly, and
/// `0 <= discount <= gross`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    /// Billed days (inclusive, at least 1).
    pub days: i64,
    /// Sum of line rates per day.
    pub daily_rate: Money,
    /// `daily_rate × days`.
    pub gross: Money,
    /// Discount after rounding the discounted gross.
    pub discount: Money,
    pub surcharge: Money,
    pub total: Money,
}

fn overflow(field: &str) -> CoreError {
    CoreError::Validation(ValidationError::Overflow {
        field: field.to_string(),
    })
}

/// Daily rate of a set of lines at current catalog prices.
///
/// Items missing from the catalog contribute 0.
///
/// ## Errors
/// [`ValidationError::Overflow`] if the sum does not fit in i64.
pub fn daily_rate<C: ItemCatalog + ?Sized>(
    lines: &[RentalLineItem],
    catalog: &C,
) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        catalog
            .daily_rate_of(line.item_id)
            .unwrap_or_default()
            .checked_mul(line.quantity)
            .and_then(|amount| acc.checked_add(amount))
            .ok_or_else(|| overflow("daily rate"))
    })
}

/// Prices a set of lines over `rental_date ..= as_of`.
///
/// ## Errors
/// [`ValidationError::Overflow`] if any step does not fit in i64.
pub fn quote<C: ItemCatalog + ?Sized>(
    lines: &[RentalLineItem],
    rental_date: DateTime<Utc>,
    discount: DiscountRate,
    surcharge: Money,
    as_of: DateTime<Utc>,
    catalog: &C,
    offset: FixedOffset,
) -> CoreResult<PriceBreakdown> {
    let days = days_elapsed(rental_date, as_of, offset);
    let rate = daily_rate(lines, catalog)?;
    let gross = rate.checked_mul(days).ok_or_else(|| overflow("price"))?;
    let net = gross.discounted_half_up(discount);
    let total = net.checked_add(surcharge).ok_or_else(|| overflow("total"))?;

    Ok(PriceBreakdown {
        days,
        daily_rate: rate,
        gross,
        discount: gross - net,
        surcharge,
        total,
    })
}

// =============================================================================
// Rental Operations
// =============================================================================

/// Live price of an active rental as of `as_of`, with no surcharge.
///
/// Advisory only: recompute on every display, never persist.
///
/// ## Errors
/// [`CoreError::InvalidState`] if the rental is settled; its price is frozen
/// and must be read from the settlement instead.
pub fn estimate_live_price<C: ItemCatalog + ?Sized>(
    rental: &Rental,
    as_of: DateTime<Utc>,
    catalog: &C,
    offset: FixedOffset,
) -> CoreResult<PriceBreakdown> {
    if !rental.is_active() {
        return Err(CoreError::invalid_state(
            rental.id,
            rental.status.name(),
            "estimate",
        ));
    }

    quote(
        &rental.line_items,
        rental.rental_date,
        rental.effective_discount(),
        Money::zero(),
        as_of,
        catalog,
        offset,
    )
}

/// Settles an active rental: freezes its price at `return_date`.
///
/// Pure transform `(Rental, return_date, surcharge) → Rental`; the caller
/// persists the result.
///
/// ## State Transition
/// ```text
/// Active ──► Settled { return_date, surcharge, total_price }
/// Settled ──► CoreError::InvalidState (one-way)
/// ```
///
/// ## Errors
/// - [`CoreError::InvalidState`] if already settled
/// - [`CoreError::Validation`] for a negative surcharge or a price that
///   overflows
pub fn settle_rental<C: ItemCatalog + ?Sized>(
    rental: &Rental,
    return_date: DateTime<Utc>,
    surcharge: Money,
    catalog: &C,
    offset: FixedOffset,
) -> CoreResult<Rental> {
    if !rental.is_active() {
        return Err(CoreError::invalid_state(
            rental.id,
            rental.status.name(),
            "settle",
        ));
    }
    validate_surcharge(surcharge)?;

    let price = quote(
        &rental.line_items,
        rental.rental_date,
        rental.effective_discount(),
        surcharge,
        return_date,
        catalog,
        offset,
    )?;

    let mut settled = rental.clone();
    settled.status = RentalStatus::Settled(Settlement {
        return_date,
        surcharge,
        total_price: price.total,
    });
    Ok(settled)
}

/// Replaces the commercial terms of an active rental.
///
/// No price is computed; the live estimate picks up the new terms.
///
/// ## Errors
/// - [`CoreError::InvalidState`] if the rental is settled
/// - [`CoreError::Validation`] for empty lines, bad quantities, or an
///   out-of-range discount
pub fn revise_rental(rental: &Rental, revision: RentalRevision) -> CoreResult<Rental> {
    if !rental.is_active() {
        return Err(CoreError::invalid_state(
            rental.id,
            rental.status.name(),
            "revise",
        ));
    }
    validate_line_items(&revision.line_items)?;
    validate_discount(revision.discount)?;

    Ok(Rental::from_terms(rental.id, revision))
}

// =============================================================================
// Unit Tests
// =============================================================================
