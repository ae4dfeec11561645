//! # Customer Repository
//!
//! CRUD for customers. Deletion is refused by the store while any rental
//! cites the customer.

use atelier_core::{Customer, CustomerId, NewCustomer};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    phone: String,
    address: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists every customer ordered by name (case-insensitive).
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            "SELECT id, name, phone, address FROM customers ORDER BY name COLLATE NOCASE, id",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed customers");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub async fn get_by_id(&self, id: CustomerId) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as("SELECT id, name, phone, address FROM customers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Customer::from))
    }

    /// Inserts a customer and returns it as stored.
    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %customer.name, "Inserting customer");

        let result = sqlx::query("INSERT INTO customers (name, phone, address) VALUES (?1, ?2, ?3)")
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(&customer.address)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!(id, "Customer created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Replaces name, phone and address.
    pub async fn update(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = customer.id, "Updating customer");

        let result =
            sqlx::query("UPDATE customers SET name = ?2, phone = ?3, address = ?4 WHERE id = ?1")
                .bind(customer.id)
                .bind(&customer.name)
                .bind(&customer.phone)
                .bind(&customer.address)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer.id));
        }

        self.get_by_id(customer.id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer.id))
    }

    /// Deletes a customer with no rentals.
    ///
    /// ## Errors
    /// * `DbError::Referenced` - Some rental cites the customer
    /// * `DbError::NotFound` - No such id
    pub async fn delete(&self, id: CustomerId) -> DbResult<()> {
        debug!(id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::referenced("Customer", id),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id, "Customer deleted");
        Ok(())
    }
}
