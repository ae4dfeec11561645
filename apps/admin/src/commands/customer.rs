//! # Customer Commands
//!
//! Customer list with rental counts, maintenance, and per-customer history.

use atelier_core::availability::customer_rental_counts;
use atelier_core::validation::{validate_new_customer, validate_search_query};
use atelier_core::{Customer, CustomerId, Money, NewCustomer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::refresh;
use super::rental::RentalDto;
use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState, Session, SnapshotState};

/// Customer card as shown in the admin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub address: String,
    /// Rentals of any state.
    pub rental_count: usize,
    pub can_delete: bool,
}

/// One customer with every rental they have made.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub customer: Customer,
    /// Newest first.
    pub rentals: Vec<RentalDto>,
    /// Sum of settled totals.
    pub total_spent: Money,
}

/// Lists customers whose name, phone or address contains `search`
/// (case-insensitive), sorted by name.
pub async fn list_customers(snapshot: &SnapshotState, search: &str) -> ApiResult<Vec<CustomerDto>> {
    let needle = validate_search_query(search)?;
    debug!(query = %needle, "list_customers command");

    let snapshot = snapshot.read().await;
    let counts = customer_rental_counts(&snapshot.rentals);

    let mut rows: Vec<CustomerDto> = snapshot
        .customers
        .iter()
        .filter(|c| {
            needle.is_empty()
                || c.name.to_lowercase().contains(&needle)
                || c.phone.to_lowercase().contains(&needle)
                || c.address.to_lowercase().contains(&needle)
        })
        .map(|c| CustomerDto {
            id: c.id,
            name: c.name.clone(),
            phone: c.phone.clone(),
            address: c.address.clone(),
            rental_count: counts.get(&c.id).copied().unwrap_or(0),
            can_delete: !snapshot.customers_with_history.contains(&c.id),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    Ok(rows)
}

pub async fn add_customer(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    customer: NewCustomer,
) -> ApiResult<Customer> {
    debug!(name = %customer.name, "add_customer command");
    session.require_admin("add customers")?;
    validate_new_customer(&customer)?;

    let stored = db.inner().customers().insert(&customer).await?;
    refresh(db, snapshot).await?;
    Ok(stored)
}

pub async fn update_customer(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    customer: Customer,
) -> ApiResult<Customer> {
    debug!(id = customer.id, "update_customer command");
    session.require_admin("edit customers")?;
    validate_new_customer(&NewCustomer {
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        address: customer.address.clone(),
    })?;

    let stored = db.inner().customers().update(&customer).await?;
    refresh(db, snapshot).await?;
    Ok(stored)
}

/// Deletes a customer with no rentals.
pub async fn delete_customer(
    db: &DbState,
    snapshot: &SnapshotState,
    session: &Session,
    id: CustomerId,
) -> ApiResult<()> {
    debug!(id, "delete_customer command");
    session.require_admin("delete customers")?;

    if snapshot.read().await.customers_with_history.contains(&id) {
        return Err(ApiError::referenced("Customer", id));
    }

    db.inner().customers().delete(id).await?;
    refresh(db, snapshot).await?;
    Ok(())
}

/// A customer's rentals, with live estimates for the ones still out.
pub async fn customer_history(
    snapshot: &SnapshotState,
    config: &ConfigState,
    id: CustomerId,
    now: DateTime<Utc>,
) -> ApiResult<CustomerHistory> {
    debug!(id, "customer_history command");

    let snapshot = snapshot.read().await;
    let customer = snapshot
        .customer(id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("Customer", id))?;

    let rentals: Vec<RentalDto> = snapshot
        .rentals
        .iter()
        .filter(|r| r.customer_id == id)
        .map(|r| RentalDto::from_snapshot(r, &snapshot, now, config.offset()))
        .collect::<Result<_, _>>()?;

    let total_spent = snapshot
        .rentals
        .iter()
        .filter(|r| r.customer_id == id)
        .filter_map(|r| r.total_price())
        .sum();

    Ok(CustomerHistory {
        customer,
        rentals,
        total_spent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{shop_time, TestApp};
    use crate::error::ErrorCode;

    fn new_customer(name: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: phone.to_string(),
            address: "45 Hai Ba Trung".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_customers_counts_and_search() {
        let app = TestApp::new().await;
        let vest = app.item("Vest", 150_000, 5).await;
        let minh = app.customer("minh").await;
        let lan = app.customer("Lan").await;
        app.rental(&lan, &[(vest.id, 1)], shop_time(2026, 3, 1)).await;
        app.rental(&lan, &[(vest.id, 1)], shop_time(2026, 3, 5)).await;

        let rows = list_customers(&app.snapshot, "").await.unwrap();
        assert_eq!(rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["Lan", "minh"]);
        assert_eq!((rows[0].rental_count, rows[0].can_delete), (2, false));
        assert_eq!((rows[1].rental_count, rows[1].can_delete), (0, true));

        let found = list_customers(&app.snapshot, "  MIN ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, minh.id);

        let by_address = list_customers(&app.snapshot, "le loi").await.unwrap();
        assert_eq!(by_address.len(), 2);
    }

    #[tokio::test]
    async fn test_add_and_update_validate_phone() {
        let app = TestApp::new().await;

        let err = add_customer(
            &app.db,
            &app.snapshot,
            &Session::admin(),
            new_customer("Ha", "09-abc"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut ha = add_customer(
            &app.db,
            &app.snapshot,
            &Session::admin(),
            new_customer("Ha", "0987654321"),
        )
        .await
        .unwrap();

        ha.address = "8 Nguyen Trai".to_string();
        let stored = update_customer(&app.db, &app.snapshot, &Session::admin(), ha.clone())
            .await
            .unwrap();
        assert_eq!(stored, ha);
        assert_eq!(app.snapshot.read().await.customer(ha.id), Some(&ha));

        let err = update_customer(&app.db, &app.snapshot, &Session::staff(), ha)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_delete_customer_with_rentals_is_refused() {
        let app = TestApp::new().await;
        let vest = app.item("Vest", 150_000, 5).await;
        let lan = app.customer("Lan").await;
        let bao = app.customer("Bao").await;
        app.rental(&lan, &[(vest.id, 1)], shop_time(2026, 3, 1)).await;

        let err = delete_customer(&app.db, &app.snapshot, &Session::admin(), lan.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Referenced);
        assert!(app.snapshot.read().await.customer(lan.id).is_some());

        delete_customer(&app.db, &app.snapshot, &Session::admin(), bao.id)
            .await
            .unwrap();
        assert!(app.snapshot.read().await.customer(bao.id).is_none());
    }

    #[tokio::test]
    async fn test_customer_history() {
        let app = TestApp::new().await;
        let vest = app.item("Vest", 100_000, 5).await;
        let lan = app.customer("Lan").await;
        app.rental(&lan, &[(vest.id, 1)], shop_time(2026, 3, 1)).await;

        let history = customer_history(&app.snapshot, &app.config, lan.id, shop_time(2026, 3, 2))
            .await
            .unwrap();
        assert_eq!(history.rentals.len(), 1);
        assert_eq!(history.total_spent, Money::zero());

        let err = customer_history(&app.snapshot, &app.config, 999, shop_time(2026, 3, 2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
