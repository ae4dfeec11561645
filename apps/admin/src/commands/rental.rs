//! # Rental Commands
//!
//! The rental board and the rental lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_rental ──► Active ──── revise_rental (terms only) ───┐         │
//! │   (validate,         │  ▲                                    │         │
//! │    availability)     │  └────────────────────────────────────┘         │
//! │                      │                                                  │
//! │                      │ return_rental(surcharge)                         │
//! │                      │   settle_rental() prices it (atelier-core)       │
//! │                      │   store guards WHERE return_date IS NULL         │
//! │                      ▼                                                  │
//! │                   Settled { return_date, surcharge, total_price }       │
//! │                      (frozen; a second return is INVALID_STATE)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Active rentals are listed with a live estimate computed at `now`;
//! settled ones with their frozen price. Neither is ever stored by a read.

use std::cmp::Ordering;

use atelier_core::availability::{ensure_available, selectable_items};
use atelier_core::calendar::is_overdue;
use atelier_core::pricing::{estimate_live_price, quote, revise_rental as revise_terms, settle_rental};
use atelier_core::validation::{
    validate_discount_percent, validate_line_items, validate_new_customer, validate_rental_terms,
    validate_schedule, validate_search_query, validate_surcharge,
};
use atelier_core::{
    CoreError, CoreResult, CustomerId, DiscountRate, ItemId, Money, NewCustomer, PriceBreakdown, Rental,
    RentalId, RentalLineItem, RentalTerms,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::inventory::ItemDto;
use super::refresh;
use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState, Session, Snapshot, SnapshotState};

// =============================================================================
// DTOs
// =============================================================================

/// One line of a rental, resolved against the current inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalLineDto {
    pub item_id: ItemId,
    /// `None` when the item no longer exists.
    pub name: Option<String>,
    pub size: Option<String>,
    pub quantity: i64,
    /// Current rate of the item, not a snapshot.
    pub daily_rate: Option<Money>,
}

/// Price of a rental as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RentalPrice {
    /// Live estimate at the time of the call, no surcharge.
    Estimate(PriceBreakdown),
    /// Frozen at return.
    Settled {
        return_date: DateTime<Utc>,
        surcharge: Money,
        total_price: Money,
    },
}

/// A rental row on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDto {
    pub id: RentalId,
    pub customer_id: CustomerId,
    /// `None` when the customer no longer exists.
    pub customer_name: Option<String>,
    pub lines: Vec<RentalLineDto>,
    /// `Vest (x2), Dam (x1)`; unknown items show as `Unknown`.
    pub items_summary: String,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub discount: Option<DiscountRate>,
    pub notes: Option<String>,
    pub overdue: bool,
    pub price: RentalPrice,
}

impl RentalDto {
    pub(crate) fn from_snapshot(
        rental: &Rental,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> CoreResult<Self> {
        let lines: Vec<RentalLineDto> = rental
            .line_items
            .iter()
            .map(|line| {
                let item = snapshot.item(line.item_id);
                RentalLineDto {
                    item_id: line.item_id,
                    name: item.map(|i| i.name.clone()),
                    size: item.map(|i| i.size.clone()),
                    quantity: line.quantity,
                    daily_rate: item.map(|i| i.daily_rate),
                }
            })
            .collect();

        let items_summary = lines
            .iter()
            .map(|line| {
                format!(
                    "{} (x{})",
                    line.name.as_deref().unwrap_or("Unknown"),
                    line.quantity
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let price = match rental.settlement() {
            Some(settlement) => RentalPrice::Settled {
                return_date: settlement.return_date,
                surcharge: settlement.surcharge,
                total_price: settlement.total_price,
            },
            None => RentalPrice::Estimate(quote(
                &rental.line_items,
                rental.rental_date,
                rental.effective_discount(),
                Money::zero(),
                now,
                &snapshot.items,
                offset,
            )?),
        };

        Ok(RentalDto {
            id: rental.id,
            customer_id: rental.customer_id,
            customer_name: snapshot.customer(rental.customer_id).map(|c| c.name.clone()),
            lines,
            items_summary,
            rental_date: rental.rental_date,
            due_date: rental.due_date,
            discount: rental.discount,
            notes: rental.notes.clone(),
            overdue: is_overdue(rental, now),
            price,
        })
    }

    fn return_date(&self) -> Option<DateTime<Utc>> {
        match self.price {
            RentalPrice::Settled { return_date, .. } => Some(return_date),
            RentalPrice::Estimate(_) => None,
        }
    }

    fn total_price(&self) -> Option<Money> {
        match self.price {
            RentalPrice::Settled { total_price, .. } => Some(total_price),
            RentalPrice::Estimate(_) => None,
        }
    }
}

/// Active rentals (newest first) and past rentals (sorted on request).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalBoard {
    pub active: Vec<RentalDto>,
    pub past: Vec<RentalDto>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastSortKey {
    CustomerName,
    RentalDate,
    DueDate,
    #[default]
    ReturnDate,
    TotalPrice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentalQuery {
    /// Matches customer name, item names, or a `dd/mm/yyyy` date.
    pub search: String,
    pub sort: PastSortKey,
    pub direction: SortDirection,
}

/// Who the rental is for: someone on file, or a customer created inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomerChoice {
    Existing { id: CustomerId },
    New(NewCustomer),
}

/// The rental form, as submitted for create and for revise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalForm {
    pub customer: CustomerChoice,
    pub line_items: Vec<RentalLineItem>,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Percent, 0..=100. Zero means no discount.
    pub discount_percent: Option<f64>,
    pub notes: Option<String>,
}

/// Return dialog input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub rental_id: RentalId,
    #[serde(default)]
    pub surcharge: Money,
    /// Defaults to the time of the call.
    pub return_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Read Commands
// =============================================================================

/// The rental board: every rental with its current price.
pub async fn list_rentals(
    snapshot: &SnapshotState,
    config: &ConfigState,
    query: &RentalQuery,
    now: DateTime<Utc>,
) -> ApiResult<RentalBoard> {
    let needle = validate_search_query(&query.search)?;
    debug!(query = %needle, sort = ?query.sort, "list_rentals command");

    let offset = config.offset();
    let snapshot = snapshot.read().await;

    let rows = snapshot
        .rentals
        .iter()
        .map(|r| RentalDto::from_snapshot(r, &snapshot, now, offset))
        .collect::<CoreResult<Vec<_>>>()?;
    let (mut active, mut past): (Vec<RentalDto>, Vec<RentalDto>) = rows
        .into_iter()
        .filter(|dto| needle.is_empty() || matches_search(dto, &needle, offset))
        .partition(|dto| dto.return_date().is_none());

    active.sort_by(|a, b| b.rental_date.cmp(&a.rental_date));
    past.sort_by(|a, b| compare_past(a, b, query.sort, query.direction));

    Ok(RentalBoard { active, past })
}

fn matches_search(dto: &RentalDto, needle: &str, offset: FixedOffset) -> bool {
    let day = |instant: DateTime<Utc>| instant.with_timezone(&offset).format("%d/%m/%Y").to_string();

    dto.customer_name
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(needle))
        || dto.lines.iter().any(|line| {
            line.name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(needle))
        })
        || day(dto.rental_date).contains(needle)
        || day(dto.due_date).contains(needle)
        || dto.return_date().is_some_and(|d| day(d).contains(needle))
}

/// Orders past rentals; rows without a value sort last in both directions.
fn compare_past(a: &RentalDto, b: &RentalDto, key: PastSortKey, direction: SortDirection) -> Ordering {
    fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => match direction {
                SortDirection::Ascending => a.cmp(&b),
                SortDirection::Descending => b.cmp(&a),
            },
        }
    }

    match key {
        PastSortKey::CustomerName => missing_last(
            Some(a.customer_name.clone().unwrap_or_default().to_lowercase()),
            Some(b.customer_name.clone().unwrap_or_default().to_lowercase()),
            direction,
        ),
        PastSortKey::RentalDate => missing_last(Some(a.rental_date), Some(b.rental_date), direction),
        PastSortKey::DueDate => missing_last(Some(a.due_date), Some(b.due_date), direction),
        PastSortKey::ReturnDate => missing_last(a.return_date(), b.return_date(), direction),
        PastSortKey::TotalPrice => missing_last(a.total_price(), b.total_price(), direction),
    }
}

/// Live estimate of one active rental.
pub async fn estimate_rental(
    snapshot: &SnapshotState,
    config: &ConfigState,
    id: RentalId,
    now: DateTime<Utc>,
) -> ApiResult<PriceBreakdown> {
    debug!(id, "estimate_rental command");

    let snapshot = snapshot.read().await;
    let rental = snapshot
        .rental(id)
        .ok_or_else(|| ApiError::not_found("Rental", id))?;

    Ok(estimate_live_price(rental, now, &snapshot.items, config.offset())?)
}

/// What returning now with `surcharge` would charge. Nothing is stored.
pub async fn preview_return(
    snapshot: &SnapshotState,
    config: &ConfigState,
    id: RentalId,
    surcharge: Money,
    now: DateTime<Utc>,
) -> ApiResult<PriceBreakdown> {
    debug!(id, %surcharge, "preview_return command");
    validate_surcharge(surcharge)?;

    let estimate = estimate_rental(snapshot, config, id, now).await?;
    let total = estimate
        .total
        .checked_add(surcharge)
        .ok_or_else(|| ApiError::validation("total is too large to compute"))?;
    Ok(PriceBreakdown {
        surcharge,
        total,
        ..estimate
    })
}

/// Items offered in the rental form.
///
/// When editing, the rental's own items stay selectable even if it holds
/// the last unit.
pub async fn rental_form_items(
    snapshot: &SnapshotState,
    editing: Option<RentalId>,
) -> ApiResult<Vec<ItemDto>> {
    let snapshot = snapshot.read().await;
    let editing = match editing {
        Some(id) => Some(
            snapshot
                .rental(id)
                .ok_or_else(|| ApiError::not_found("Rental", id))?,
        ),
        None => None,
    };

    Ok(selectable_items(&snapshot.items, &snapshot.reservations, editing)
        .into_iter()
        .map(|item| ItemDto::from_snapshot(item, &snapshot))
        .collect())
}

// =============================================================================
// Write Commands
// =============================================================================

/// A form that passed every check against the snapshot.
struct CheckedForm {
    customer: CustomerChoice,
    line_items: Vec<RentalLineItem>,
    rental_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    discount: Option<DiscountRate>,
    notes: Option<String>,
}

impl CheckedForm {
    fn into_terms(self, customer_id: CustomerId) -> RentalTerms {
        RentalTerms {
            customer_id,
            line_items: self.line_items,
            rental_date: self.rental_date,
            due_date: self.due_date,
            discount: self.discount,
            notes: self.notes,
        }
    }
}

/// Validates a form and checks it against current availability.
///
/// Nothing is written, so a rejected form leaves no trace (in particular
/// no inline customer).
fn check_form(
    form: RentalForm,
    snapshot: &Snapshot,
    editing: Option<&Rental>,
    offset: FixedOffset,
) -> ApiResult<CheckedForm> {
    let discount = match form.discount_percent {
        Some(pct) => Some(validate_discount_percent(pct)?).filter(|rate| !rate.is_zero()),
        None => None,
    };
    validate_line_items(&form.line_items)?;
    validate_schedule(form.rental_date, form.due_date, offset)?;

    match &form.customer {
        CustomerChoice::Existing { id } => {
            if snapshot.customer(*id).is_none() {
                return Err(ApiError::not_found("Customer", id));
            }
        }
        CustomerChoice::New(customer) => validate_new_customer(customer)?,
    }

    ensure_available(
        &form.line_items,
        &snapshot.items,
        &snapshot.reservations,
        editing,
    )?;

    Ok(CheckedForm {
        customer: form.customer,
        line_items: form.line_items,
        rental_date: form.rental_date,
        due_date: form.due_date,
        discount,
        notes: form
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

/// Stores an inline customer if the form has one.
async fn resolve_customer(db: &DbState, choice: &CustomerChoice) -> ApiResult<CustomerId> {
    match choice {
        CustomerChoice::Existing { id } => Ok(*id),
        CustomerChoice::New(customer) => {
            let stored = db.inner().customers().insert(customer).await?;
            info!(id = stored.id, "Customer created from rental form");
            Ok(stored.id)
        }
    }
}

/// Reloads the snapshot after a rental write, failed or not.
///
/// An inline customer is stored before the rental write, so a failed write
/// can still leave the store ahead of the snapshot.
async fn finish_write(
    db: &DbState,
    snapshot: &SnapshotState,
    written: ApiResult<Rental>,
) -> ApiResult<Rental> {
    match written {
        Ok(stored) => {
            refresh(db, snapshot).await?;
            Ok(stored)
        }
        Err(e) => {
            if let Err(reload) = refresh(db, snapshot).await {
                warn!(error = %reload, "Snapshot reload failed after rental write error");
            }
            Err(e)
        }
    }
}

/// Creates an active rental.
///
/// ## Errors
/// - `FORBIDDEN` for staff
/// - `VALIDATION_ERROR` for a malformed form
/// - `UNAVAILABLE` when a line asks for more than is free
pub async fn create_rental(
    db: &DbState,
    snapshot: &SnapshotState,
    config: &ConfigState,
    session: &Session,
    form: RentalForm,
) -> ApiResult<Rental> {
    debug!(lines = form.line_items.len(), "create_rental command");
    session.require_admin("create rentals")?;

    let offset = config.offset();
    let checked = check_form(form, &*snapshot.read().await, None, offset)?;

    let customer_id = resolve_customer(db, &checked.customer).await?;
    let written = async {
        let terms = checked.into_terms(customer_id);
        validate_rental_terms(&terms, offset)?;
        Ok::<_, ApiError>(db.inner().rentals().insert(&terms).await?)
    }
    .await;

    finish_write(db, snapshot, written).await
}

/// Replaces the terms of an active rental.
///
/// The units the rental already holds count as free for the availability
/// check. No price is stored; the live estimate reflects the change.
pub async fn revise_rental(
    db: &DbState,
    snapshot: &SnapshotState,
    config: &ConfigState,
    session: &Session,
    id: RentalId,
    form: RentalForm,
) -> ApiResult<Rental> {
    debug!(id, lines = form.line_items.len(), "revise_rental command");
    session.require_admin("edit rentals")?;

    let offset = config.offset();
    let (current, checked) = {
        let snapshot = snapshot.read().await;
        let current = snapshot
            .rental(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Rental", id))?;
        if !current.is_active() {
            return Err(CoreError::invalid_state(id, current.status.name(), "revise").into());
        }
        let checked = check_form(form, &snapshot, Some(&current), offset)?;
        (current, checked)
    };

    let customer_id = resolve_customer(db, &checked.customer).await?;
    let written = async {
        let terms = checked.into_terms(customer_id);
        validate_rental_terms(&terms, offset)?;
        let revised = revise_terms(&current, terms)?;
        Ok::<_, ApiError>(db.inner().rentals().update_terms(id, &revised.terms()).await?)
    }
    .await;

    finish_write(db, snapshot, written).await
}

/// Settles a rental: prices it at the return date and freezes the total.
///
/// If the store refuses (settled meanwhile, deleted, unreachable) the
/// snapshot is left as it was.
pub async fn return_rental(
    db: &DbState,
    snapshot: &SnapshotState,
    config: &ConfigState,
    session: &Session,
    request: ReturnRequest,
    now: DateTime<Utc>,
) -> ApiResult<Rental> {
    debug!(id = request.rental_id, surcharge = %request.surcharge, "return_rental command");
    session.require_admin("return rentals")?;

    let settled = {
        let snapshot = snapshot.read().await;
        let rental = snapshot
            .rental(request.rental_id)
            .ok_or_else(|| ApiError::not_found("Rental", request.rental_id))?;
        settle_rental(
            rental,
            request.return_date.unwrap_or(now),
            request.surcharge,
            &snapshot.items,
            config.offset(),
        )?
    };

    let settlement = settled
        .settlement()
        .copied()
        .ok_or_else(|| ApiError::internal("settlement missing after settle"))?;

    let stored = db.inner().rentals().settle(request.rental_id, &settlement).await?;
    refresh(db, snapshot).await?;

    info!(
        id = stored.id,
        total = %settlement.total_price,
        "Rental returned"
    );
    Ok(stored)
}

pub async fn delete_rental(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    id: RentalId,
) -> ApiResult<()> {
    debug!(id, "delete_rental command");
    session.require_admin("delete rentals")?;

    db.inner().rentals().delete(id).await?;
    refresh(db, snapshot).await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{shop_time, TestApp};
    use crate::error::ErrorCode;
    use chrono::Duration;

    fn form(customer_id: CustomerId, lines: &[(ItemId, i64)], day: u32) -> RentalForm {
        RentalForm {
            customer: CustomerChoice::Existing { id: customer_id },
            line_items: lines
                .iter()
                .map(|(id, qty)| RentalLineItem::new(*id, *qty))
                .collect(),
            rental_date: shop_time(2026, 3, day),
            due_date: shop_time(2026, 3, day + 2),
            discount_percent: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_scenario_price_and_settle() {
        let app = TestApp::new().await;
        let item = app.item("Ao dai", 100_000, 5).await;
        let lan = app.customer("Lan").await;

        let mut f = form(lan.id, &[(item.id, 2)], 1);
        f.discount_percent = Some(10.0);
        let rental = create_rental(&app.db, &app.snapshot, &app.config, &Session::admin(), f)
            .await
            .unwrap();

        let preview = preview_return(
            &app.snapshot,
            &app.config,
            rental.id,
            Money::from_units(20_000),
            shop_time(2026, 3, 3),
        )
        .await
        .unwrap();
        assert_eq!(preview.days, 3);
        assert_eq!(preview.daily_rate, Money::from_units(200_000));
        assert_eq!(preview.gross, Money::from_units(600_000));
        assert_eq!(preview.discount, Money::from_units(60_000));
        assert_eq!(preview.total, Money::from_units(560_000));

        let settled = return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            ReturnRequest {
                rental_id: rental.id,
                surcharge: Money::from_units(20_000),
                return_date: None,
            },
            shop_time(2026, 3, 3),
        )
        .await
        .unwrap();
        assert_eq!(settled.total_price(), Some(Money::from_units(560_000)));

        let board = list_rentals(
            &app.snapshot,
            &app.config,
            &RentalQuery::default(),
            shop_time(2026, 3, 4),
        )
        .await
        .unwrap();
        assert!(board.active.is_empty());
        assert_eq!(board.past[0].total_price(), Some(Money::from_units(560_000)));
        assert_eq!(app.snapshot.read().await.reservations.get(&item.id), None);
    }

    #[tokio::test]
    async fn test_second_return_is_invalid_state() {
        let app = TestApp::new().await;
        let item = app.item("Vest", 150_000, 1).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(item.id, 1)], shop_time(2026, 3, 1)).await;

        let request = ReturnRequest {
            rental_id: rental.id,
            surcharge: Money::zero(),
            return_date: Some(shop_time(2026, 3, 2)),
        };
        let first = return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            request,
            shop_time(2026, 3, 2),
        )
        .await
        .unwrap();

        let err = return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            request,
            shop_time(2026, 3, 5),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let stored = app.db.inner().rentals().get_by_id(rental.id).await.unwrap().unwrap();
        assert_eq!(stored.settlement(), first.settlement());
    }

    #[tokio::test]
    async fn test_store_guard_catches_stale_snapshot() {
        let app = TestApp::new().await;
        let item = app.item("Vest", 150_000, 1).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(item.id, 1)], shop_time(2026, 3, 1)).await;

        // Another session settles it; our snapshot still says active
        let elsewhere = settle_rental(
            &rental,
            shop_time(2026, 3, 2),
            Money::zero(),
            &app.snapshot.read().await.items,
            app.config.offset(),
        )
        .unwrap();
        app.db
            .inner()
            .rentals()
            .settle(rental.id, elsewhere.settlement().unwrap())
            .await
            .unwrap();

        let err = return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            ReturnRequest {
                rental_id: rental.id,
                surcharge: Money::from_units(5_000),
                return_date: None,
            },
            shop_time(2026, 3, 3),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        assert!(app.snapshot.read().await.rental(rental.id).unwrap().is_active());
    }

    #[tokio::test]
    async fn test_third_rental_limited_to_free_units() {
        let app = TestApp::new().await;
        let x = app.item("X", 50_000, 5).await;
        let lan = app.customer("Lan").await;
        app.rental(&lan, &[(x.id, 2)], shop_time(2026, 3, 1)).await;
        app.rental(&lan, &[(x.id, 1)], shop_time(2026, 3, 2)).await;

        let listed = rental_form_items(&app.snapshot, None).await.unwrap();
        assert_eq!(listed[0].available, 2);

        let err = create_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            form(lan.id, &[(x.id, 3)], 3),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);

        create_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            form(lan.id, &[(x.id, 2)], 3),
        )
        .await
        .unwrap();
        assert_eq!(app.snapshot.read().await.reservations.get(&x.id), Some(&5));
    }

    #[tokio::test]
    async fn test_inline_customer_only_created_for_valid_form() {
        let app = TestApp::new().await;
        let x = app.item("X", 50_000, 1).await;

        let mut f = form(0, &[(x.id, 2)], 1);
        f.customer = CustomerChoice::New(NewCustomer {
            name: "Minh".to_string(),
            phone: "0912345678".to_string(),
            address: "Q3".to_string(),
        });

        let err = create_rental(&app.db, &app.snapshot, &app.config, &Session::admin(), f.clone())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
        assert!(app.snapshot.read().await.customers.is_empty());

        f.line_items = vec![RentalLineItem::new(x.id, 1)];
        let rental = create_rental(&app.db, &app.snapshot, &app.config, &Session::admin(), f)
            .await
            .unwrap();
        let snapshot = app.snapshot.read().await;
        assert_eq!(snapshot.customer(rental.customer_id).map(|c| c.name.as_str()), Some("Minh"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_forms() {
        let app = TestApp::new().await;
        let x = app.item("X", 50_000, 5).await;
        let lan = app.customer("Lan").await;
        let admin = Session::admin();

        let err = create_rental(&app.db, &app.snapshot, &app.config, &admin, form(lan.id, &[], 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &admin,
            form(lan.id, &[(x.id, 0)], 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut late = form(lan.id, &[(x.id, 1)], 5);
        late.due_date = shop_time(2026, 3, 4);
        let err = create_rental(&app.db, &app.snapshot, &app.config, &admin, late)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut greedy = form(lan.id, &[(x.id, 1)], 1);
        greedy.discount_percent = Some(150.0);
        let err = create_rental(&app.db, &app.snapshot, &app.config, &admin, greedy)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &admin,
            form(404, &[(x.id, 1)], 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = create_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::staff(),
            form(lan.id, &[(x.id, 1)], 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        assert!(app.snapshot.read().await.rentals.is_empty());
    }

    #[tokio::test]
    async fn test_revise_counts_own_units_as_free() {
        let app = TestApp::new().await;
        let x = app.item("X", 100_000, 3).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(x.id, 3)], shop_time(2026, 3, 1)).await;

        // All three units are out, but they are this rental's own
        let own = rental_form_items(&app.snapshot, Some(rental.id)).await.unwrap();
        assert_eq!(own.iter().map(|i| i.id).collect::<Vec<_>>(), vec![x.id]);
        assert!(rental_form_items(&app.snapshot, None).await.unwrap().is_empty());

        let mut f = form(lan.id, &[(x.id, 2)], 1);
        f.discount_percent = Some(50.0);
        f.notes = Some("  deposit paid ".to_string());
        let revised = revise_rental(&app.db, &app.snapshot, &app.config, &Session::admin(), rental.id, f)
            .await
            .unwrap();
        assert!(revised.is_active());
        assert_eq!(revised.notes.as_deref(), Some("deposit paid"));

        let estimate = estimate_rental(&app.snapshot, &app.config, rental.id, shop_time(2026, 3, 2))
            .await
            .unwrap();
        assert_eq!(estimate.gross, Money::from_units(400_000));
        assert_eq!(estimate.total, Money::from_units(200_000));

        let err = revise_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            rental.id,
            form(lan.id, &[(x.id, 4)], 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);
    }

    #[tokio::test]
    async fn test_revise_settled_is_invalid_state() {
        let app = TestApp::new().await;
        let x = app.item("X", 100_000, 3).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(x.id, 1)], shop_time(2026, 3, 1)).await;
        return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            ReturnRequest {
                rental_id: rental.id,
                surcharge: Money::zero(),
                return_date: None,
            },
            shop_time(2026, 3, 1),
        )
        .await
        .unwrap();

        let err = revise_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            rental.id,
            form(lan.id, &[(x.id, 1)], 1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err = estimate_rental(&app.snapshot, &app.config, rental.id, shop_time(2026, 3, 2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_failed_revise_still_reloads_inline_customer() {
        let app = TestApp::new().await;
        let x = app.item("X", 100_000, 3).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(x.id, 1)], shop_time(2026, 3, 1)).await;

        // Settled by another session; our snapshot still says active
        let elsewhere = settle_rental(
            &rental,
            shop_time(2026, 3, 2),
            Money::zero(),
            &app.snapshot.read().await.items,
            app.config.offset(),
        )
        .unwrap();
        app.db
            .inner()
            .rentals()
            .settle(rental.id, elsewhere.settlement().unwrap())
            .await
            .unwrap();

        let mut f = form(0, &[(x.id, 1)], 1);
        f.customer = CustomerChoice::New(NewCustomer {
            name: "Minh".to_string(),
            phone: "0912345678".to_string(),
            address: "Q3".to_string(),
        });
        let err = revise_rental(&app.db, &app.snapshot, &app.config, &Session::admin(), rental.id, f)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let stored = app.db.inner().customers().list().await.unwrap();
        let snapshot = app.snapshot.read().await;
        assert_eq!(stored.len(), 2);
        assert_eq!(snapshot.customers.len(), stored.len());
        assert!(!snapshot.rental(rental.id).unwrap().is_active());
    }

    #[tokio::test]
    async fn test_oversized_stored_rate_is_reported_not_panicking() {
        let app = TestApp::new().await;
        let x = app.item("X", 5_000_000_000_000_000_000, 3).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(x.id, 2)], shop_time(2026, 3, 1)).await;
        let now = shop_time(2026, 3, 2);

        let err = list_rentals(&app.snapshot, &app.config, &RentalQuery::default(), now)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = estimate_rental(&app.snapshot, &app.config, rental.id, now)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = return_rental(
            &app.db,
            &app.snapshot,
            &app.config,
            &Session::admin(),
            ReturnRequest {
                rental_id: rental.id,
                surcharge: Money::zero(),
                return_date: None,
            },
            now,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let stored = app.db.inner().rentals().get_by_id(rental.id).await.unwrap().unwrap();
        assert!(stored.is_active());
    }

    #[tokio::test]
    async fn test_board_search_sort_and_overdue() {
        let app = TestApp::new().await;
        let vest = app.item("Vest", 100_000, 5).await;
        let dam = app.item("Dam", 100_000, 5).await;
        let lan = app.customer("Lan").await;
        let bao = app.customer("Bao").await;

        let old = app.rental(&lan, &[(vest.id, 1)], shop_time(2026, 3, 1)).await;
        let new = app.rental(&bao, &[(dam.id, 1)], shop_time(2026, 3, 10)).await;
        let a = app.rental(&lan, &[(dam.id, 1)], shop_time(2026, 2, 1)).await;
        let b = app.rental(&bao, &[(vest.id, 2)], shop_time(2026, 2, 1)).await;
        for (rental, day) in [(&a, 3), (&b, 5)] {
            return_rental(
                &app.db,
                &app.snapshot,
                &app.config,
                &Session::admin(),
                ReturnRequest {
                    rental_id: rental.id,
                    surcharge: Money::zero(),
                    return_date: Some(shop_time(2026, 2, day)),
                },
                shop_time(2026, 2, day),
            )
            .await
            .unwrap();
        }

        let now = shop_time(2026, 3, 11);
        let board = list_rentals(&app.snapshot, &app.config, &RentalQuery::default(), now)
            .await
            .unwrap();
        assert_eq!(board.active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id, old.id]);
        assert!(board.active[1].overdue);
        assert!(!board.active[0].overdue);
        assert_eq!(board.active[1].items_summary, "Vest (x1)");
        // Most recent return first by default
        assert_eq!(board.past.iter().map(|r| r.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let by_price = list_rentals(
            &app.snapshot,
            &app.config,
            &RentalQuery {
                search: String::new(),
                sort: PastSortKey::TotalPrice,
                direction: SortDirection::Ascending,
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(by_price.past[0].id, a.id);

        let searched = list_rentals(
            &app.snapshot,
            &app.config,
            &RentalQuery {
                search: "vest".to_string(),
                ..RentalQuery::default()
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(searched.active.len() + searched.past.len(), 2);

        let by_date = list_rentals(
            &app.snapshot,
            &app.config,
            &RentalQuery {
                search: "10/03/2026".to_string(),
                ..RentalQuery::default()
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(by_date.active.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new.id]);

        // Live estimate of the open rental moves with `now`
        let later = list_rentals(
            &app.snapshot,
            &app.config,
            &RentalQuery::default(),
            now + Duration::days(1),
        )
        .await
        .unwrap();
        match (&board.active[0].price, &later.active[0].price) {
            (RentalPrice::Estimate(before), RentalPrice::Estimate(after)) => {
                assert_eq!(after.days, before.days + 1);
            }
            other => panic!("expected estimates, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_rental_releases_units() {
        let app = TestApp::new().await;
        let x = app.item("X", 100_000, 1).await;
        let lan = app.customer("Lan").await;
        let rental = app.rental(&lan, &[(x.id, 1)], shop_time(2026, 3, 1)).await;

        let err = delete_rental(&app.db, &app.snapshot, &Session::staff(), rental.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        delete_rental(&app.db, &app.snapshot, &Session::admin(), rental.id)
            .await
            .unwrap();
        let snapshot = app.snapshot.read().await;
        assert!(snapshot.rentals.is_empty());
        assert!(!snapshot.items_with_history.contains(&x.id));

        drop(snapshot);
        let err = delete_rental(&app.db, &app.snapshot, &Session::admin(), rental.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
