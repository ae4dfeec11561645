//! # Rental Repository
//!
//! Database operations for rentals and their line items.
//!
//! ## Storage Layout
//! ```text
//! ┌──────────────────────────────┐        ┌─────────────────────────────┐
//! │ rentals                      │ 1    * │ rental_line_items           │
//! │  id, customer_id             │───────►│  rental_id (CASCADE)        │
//! │  rental_date, due_date       │        │  item_id   (RESTRICT)       │
//! │  discount_bps, notes         │        │  quantity, position         │
//! │  return_date  ┐ all NULL     │        └─────────────────────────────┘
//! │  surcharge    ├ (active) or  │
//! │  total_price  ┘ all set      │
//! └──────────────────────────────┘
//! ```
//!
//! ## Lifecycle Guards
//! Settlement and revision only touch rows `WHERE return_date IS NULL`.
//! When two sessions settle the same rental, the second one affects zero
//! rows and gets [`DbError::AlreadySettled`]; the first settlement stands.

use std::collections::HashMap;

use atelier_core::{
    DiscountRate, Money, NewRental, Rental, RentalId, RentalLineItem, RentalRevision,
    RentalStatus, Settlement,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct RentalRow {
    id: i64,
    customer_id: i64,
    rental_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    discount_bps: Option<i64>,
    surcharge: Option<i64>,
    total_price: Option<i64>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    rental_id: i64,
    item_id: i64,
    quantity: i64,
}

impl RentalRow {
    fn into_rental(self, line_items: Vec<RentalLineItem>) -> Rental {
        let status = match (self.return_date, self.total_price) {
            (Some(return_date), Some(total_price)) => RentalStatus::Settled(Settlement {
                return_date,
                surcharge: Money::from_units(self.surcharge.unwrap_or(0)),
                total_price: Money::from_units(total_price),
            }),
            _ => RentalStatus::Active,
        };

        Rental {
            id: self.id,
            customer_id: self.customer_id,
            line_items,
            rental_date: self.rental_date,
            due_date: self.due_date,
            discount: self
                .discount_bps
                .map(|bps| DiscountRate::from_bps(bps.clamp(0, u32::MAX as i64) as u32)),
            notes: self.notes,
            status,
        }
    }
}

const SELECT_RENTALS: &str = r#"
    SELECT id, customer_id, rental_date, due_date, return_date,
           discount_bps, surcharge, total_price, notes
    FROM rentals
"#;

fn discount_bps(rate: Option<DiscountRate>) -> Option<i64> {
    rate.map(|r| r.bps() as i64)
}

/// Blank notes are stored as NULL.
fn normalized_notes(notes: &Option<String>) -> Option<&str> {
    notes.as_deref().map(str::trim).filter(|n| !n.is_empty())
}

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    rental_id: RentalId,
    lines: &[RentalLineItem],
) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            "INSERT INTO rental_line_items (rental_id, item_id, quantity, position) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(rental_id)
        .bind(line.item_id)
        .bind(line.quantity)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Repository for rental database operations.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    /// Lists every rental, newest `rental_date` first, with line items.
    pub async fn list(&self) -> DbResult<Vec<Rental>> {
        let rows: Vec<RentalRow> =
            sqlx::query_as(&format!("{SELECT_RENTALS} ORDER BY rental_date DESC, id DESC"))
                .fetch_all(&self.pool)
                .await?;

        let lines: Vec<LineRow> = sqlx::query_as(
            "SELECT rental_id, item_id, quantity FROM rental_line_items ORDER BY rental_id, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_rental: HashMap<RentalId, Vec<RentalLineItem>> = HashMap::new();
        for line in lines {
            by_rental
                .entry(line.rental_id)
                .or_default()
                .push(RentalLineItem::new(line.item_id, line.quantity));
        }

        debug!(count = rows.len(), "Listed rentals");
        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = by_rental.remove(&row.id).unwrap_or_default();
                row.into_rental(lines)
            })
            .collect())
    }

    /// Gets a rental with its line items.
    pub async fn get_by_id(&self, id: RentalId) -> DbResult<Option<Rental>> {
        let row: Option<RentalRow> = sqlx::query_as(&format!("{SELECT_RENTALS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines: Vec<LineRow> = sqlx::query_as(
            "SELECT rental_id, item_id, quantity FROM rental_line_items WHERE rental_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let lines = lines
            .into_iter()
            .map(|l| RentalLineItem::new(l.item_id, l.quantity))
            .collect();
        Ok(Some(row.into_rental(lines)))
    }

    async fn fetch_stored(&self, id: RentalId) -> DbResult<Rental> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Rental", id))
    }

    /// Tells a missing row apart from a settled one after a guarded write
    /// touched nothing.
    async fn guard_failure(&self, id: RentalId) -> DbError {
        match self.get_by_id(id).await {
            Ok(Some(_)) => DbError::AlreadySettled { id },
            Ok(None) => DbError::not_found("Rental", id),
            Err(e) => e,
        }
    }

    /// Stores a new active rental and its line items in one transaction.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - Unknown customer or item id
    pub async fn insert(&self, rental: &NewRental) -> DbResult<Rental> {
        debug!(
            customer_id = rental.customer_id,
            lines = rental.line_items.len(),
            "Inserting rental"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO rentals (customer_id, rental_date, due_date, discount_bps, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(rental.customer_id)
        .bind(rental.rental_date)
        .bind(rental.due_date)
        .bind(discount_bps(rental.discount))
        .bind(normalized_notes(&rental.notes))
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        insert_lines(&mut tx, id, &rental.line_items).await?;
        tx.commit().await?;

        info!(id, customer_id = rental.customer_id, "Rental created");
        self.fetch_stored(id).await
    }

    /// Replaces the terms of an active rental.
    ///
    /// ## Errors
    /// * `DbError::AlreadySettled` - Settled meanwhile; nothing changed
    /// * `DbError::NotFound` - No such id
    pub async fn update_terms(&self, id: RentalId, terms: &RentalRevision) -> DbResult<Rental> {
        debug!(id, lines = terms.line_items.len(), "Revising rental");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE rentals SET
                customer_id = ?2,
                rental_date = ?3,
                due_date = ?4,
                discount_bps = ?5,
                notes = ?6
            WHERE id = ?1 AND return_date IS NULL
            "#,
        )
        .bind(id)
        .bind(terms.customer_id)
        .bind(terms.rental_date)
        .bind(terms.due_date)
        .bind(discount_bps(terms.discount))
        .bind(normalized_notes(&terms.notes))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.guard_failure(id).await);
        }

        sqlx::query("DELETE FROM rental_line_items WHERE rental_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, id, &terms.line_items).await?;
        tx.commit().await?;

        info!(id, "Rental revised");
        self.fetch_stored(id).await
    }

    /// Records the settlement of an active rental.
    ///
    /// ## Errors
    /// * `DbError::AlreadySettled` - Somebody settled it first
    /// * `DbError::NotFound` - No such id
    pub async fn settle(&self, id: RentalId, settlement: &Settlement) -> DbResult<Rental> {
        debug!(id, total = %settlement.total_price, "Settling rental");

        let result = sqlx::query(
            r#"
            UPDATE rentals SET
                return_date = ?2,
                surcharge = ?3,
                total_price = ?4
            WHERE id = ?1 AND return_date IS NULL
            "#,
        )
        .bind(id)
        .bind(settlement.return_date)
        .bind(settlement.surcharge.units())
        .bind(settlement.total_price.units())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.guard_failure(id).await);
        }

        info!(id, total = %settlement.total_price, "Rental settled");
        self.fetch_stored(id).await
    }

    /// Deletes a rental; its line items go with it.
    pub async fn delete(&self, id: RentalId) -> DbResult<()> {
        debug!(id, "Deleting rental");

        let result = sqlx::query("DELETE FROM rentals WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Rental", id));
        }

        info!(id, "Rental deleted");
        Ok(())
    }

    /// Counts rentals still out.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rentals WHERE return_date IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use atelier_core::{Customer, InventoryItem, NewCustomer, NewInventoryItem, RentalTerms};
    use chrono::{Duration, TimeZone};

    struct Shop {
        db: Database,
        lan: Customer,
        ao_dai: InventoryItem,
        vest: InventoryItem,
    }

    async fn shop() -> Shop {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lan = db
            .customers()
            .insert(&NewCustomer {
                name: "Lan".to_string(),
                phone: "0901234567".to_string(),
                address: "Q1".to_string(),
            })
            .await
            .unwrap();
        let ao_dai = db
            .items()
            .insert(&NewInventoryItem {
                name: "Ao dai".to_string(),
                size: "M".to_string(),
                daily_rate: Money::from_units(100_000),
                total_quantity: 5,
                image_url: None,
            })
            .await
            .unwrap();
        let vest = db
            .items()
            .insert(&NewInventoryItem {
                name: "Vest".to_string(),
                size: "L".to_string(),
                daily_rate: Money::from_units(150_000),
                total_quantity: 2,
                image_url: None,
            })
            .await
            .unwrap();
        Shop { db, lan, ao_dai, vest }
    }

    fn terms(shop: &Shop, day: u32) -> RentalTerms {
        let rental_date = Utc.with_ymd_and_hms(2026, 3, day, 2, 0, 0).unwrap();
        RentalTerms {
            customer_id: shop.lan.id,
            line_items: vec![
                RentalLineItem::new(shop.vest.id, 1),
                RentalLineItem::new(shop.ao_dai.id, 2),
            ],
            rental_date,
            due_date: rental_date + Duration::days(2),
            discount: Some(DiscountRate::from_bps(1000)),
            notes: Some("  ".to_string()),
        }
    }

    fn settlement(total: i64) -> Settlement {
        Settlement {
            return_date: Utc.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap(),
            surcharge: Money::from_units(20_000),
            total_price: Money::from_units(total),
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_terms() {
        let shop = shop().await;
        let t = terms(&shop, 1);
        let stored = shop.db.rentals().insert(&t).await.unwrap();

        assert!(stored.is_active());
        // Line order is preserved
        assert_eq!(stored.line_items, t.line_items);
        assert_eq!(stored.rental_date, t.rental_date);
        assert_eq!(stored.discount.map(|d| d.bps()), Some(1000));
        assert_eq!(stored.notes, None);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_lines() {
        let shop = shop().await;
        let older = shop.db.rentals().insert(&terms(&shop, 1)).await.unwrap();
        let newer = shop.db.rentals().insert(&terms(&shop, 5)).await.unwrap();

        let all = shop.db.rentals().list().await.unwrap();
        let ids: Vec<RentalId> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(all.iter().all(|r| r.line_items.len() == 2));
    }

    #[tokio::test]
    async fn test_insert_unknown_customer_fails_without_partial_rows() {
        let shop = shop().await;
        let mut t = terms(&shop, 1);
        t.customer_id = 999;

        let err = shop.db.rentals().insert(&t).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(shop.db.rentals().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_once() {
        let shop = shop().await;
        let rental = shop.db.rentals().insert(&terms(&shop, 1)).await.unwrap();

        let settled = shop.db.rentals().settle(rental.id, &settlement(560_000)).await.unwrap();
        assert_eq!(settled.total_price(), Some(Money::from_units(560_000)));
        assert_eq!(settled.settlement().map(|s| s.surcharge), Some(Money::from_units(20_000)));
        assert_eq!(shop.db.rentals().count_active().await.unwrap(), 0);

        // Second settlement is refused and the first one stands
        let err = shop.db.rentals().settle(rental.id, &settlement(1)).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadySettled { .. }));
        let stored = shop.db.rentals().get_by_id(rental.id).await.unwrap().unwrap();
        assert_eq!(stored.total_price(), Some(Money::from_units(560_000)));

        let err = shop.db.rentals().settle(999, &settlement(1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_terms_replaces_lines_for_active_only() {
        let shop = shop().await;
        let rental = shop.db.rentals().insert(&terms(&shop, 1)).await.unwrap();

        let mut revision = rental.terms();
        revision.line_items = vec![RentalLineItem::new(shop.ao_dai.id, 1)];
        revision.discount = None;
        revision.notes = Some("Hem shortened".to_string());

        let revised = shop.db.rentals().update_terms(rental.id, &revision).await.unwrap();
        assert_eq!(revised.line_items, revision.line_items);
        assert_eq!(revised.discount, None);
        assert_eq!(revised.notes.as_deref(), Some("Hem shortened"));

        shop.db.rentals().settle(rental.id, &settlement(100_000)).await.unwrap();
        let err = shop.db.rentals().update_terms(rental.id, &revision).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadySettled { .. }));
    }

    #[tokio::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let shop = shop().await;
        let rental = shop.db.rentals().insert(&terms(&shop, 1)).await.unwrap();
        shop.db.rentals().settle(rental.id, &settlement(100)).await.unwrap();

        // Settled rentals still protect their items and customer
        let err = shop.db.items().delete(shop.vest.id).await.unwrap_err();
        assert!(matches!(err, DbError::Referenced { .. }));
        assert!(shop.db.items().get_by_id(shop.vest.id).await.unwrap().is_some());

        let err = shop.db.customers().delete(shop.lan.id).await.unwrap_err();
        assert!(matches!(err, DbError::Referenced { .. }));

        // Once the rental is gone, so is the reference
        shop.db.rentals().delete(rental.id).await.unwrap();
        shop.db.items().delete(shop.vest.id).await.unwrap();
        shop.db.customers().delete(shop.lan.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_rental() {
        let shop = shop().await;
        let err = shop.db.rentals().delete(7).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
