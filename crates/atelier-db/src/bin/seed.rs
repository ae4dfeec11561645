//! # Seed Data Generator
//!
//! Populates the database with a demo rental shop for development.
//!
//! ## Usage
//! ```bash
//! # Demo shop with 60 days of rental history (default)
//! cargo run -p atelier-db --bin seed
//!
//! # Longer history
//! cargo run -p atelier-db --bin seed -- --days 365
//!
//! # Specify database path
//! cargo run -p atelier-db --bin seed -- --db ./data/atelier.db
//! ```
//!
//! ## Generated Data
//! - One inventory record per (garment, size) pair
//! - A handful of customers
//! - One rental every few days; everything older than a week is settled
//!   through the pricing engine, the rest stays active

use atelier_core::calendar::default_offset;
use atelier_core::pricing::settle_rental;
use atelier_core::{DiscountRate, Money, NewCustomer, NewInventoryItem, RentalLineItem, RentalTerms};
use atelier_db::{Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;

/// Garments with their base daily rate.
const GARMENTS: &[(&str, i64)] = &[
    ("Ao dai lua do", 120_000),
    ("Ao dai truyen thong trang", 100_000),
    ("Vest nam xanh than", 150_000),
    ("Vest nam den", 150_000),
    ("Vay cuoi duoi ca", 450_000),
    ("Vay da hoi kim sa", 250_000),
    ("Dam du tiec do", 180_000),
    ("Ao yem co trang", 90_000),
];

/// Size labels and stock per size.
const SIZES: &[(&str, i64)] = &[("S", 2), ("M", 3), ("L", 2)];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Nguyen Thi Lan", "0901234567", "12 Le Loi, Quan 1"),
    ("Tran Van Minh", "0912345678", "45 Hai Ba Trung, Quan 3"),
    ("Le Thu Ha", "0987654321", "8 Nguyen Trai, Quan 5"),
    ("Pham Quoc Bao", "0934567890", "101 Vo Van Tan, Quan 3"),
    ("Hoang My Linh", "0978123456", "22 Pasteur, Quan 1"),
];

/// Discounts cycled across rentals, in percent.
const DISCOUNTS: &[f64] = &[0.0, 0.0, 5.0, 10.0, 0.0, 15.0];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 60;
    let mut db_path = String::from("./atelier_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Atelier Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of rental history (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./atelier_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Atelier Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Inventory
    let new_items: Vec<NewInventoryItem> = GARMENTS
        .iter()
        .flat_map(|(name, rate)| {
            SIZES.iter().map(move |(size, qty)| NewInventoryItem {
                name: name.to_string(),
                size: size.to_string(),
                daily_rate: Money::from_units(*rate),
                total_quantity: *qty,
                image_url: None,
            })
        })
        .collect();
    let items = db.items().insert_many(&new_items).await?;
    println!("✓ Inserted {} inventory items", items.len());

    // Customers
    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone, address) in CUSTOMERS {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: name.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
            })
            .await?;
        customers.push(customer);
    }
    println!("✓ Inserted {} customers", customers.len());

    // Rentals: one every three days, settled unless recent
    let offset = default_offset();
    let now = Utc::now();
    let mut created = 0;
    let mut settled = 0;
    let mut revenue = Money::zero();

    let mut seed = 0usize;
    let mut day = days;
    while day > 0 {
        let rental_date = now - Duration::days(day) + Duration::hours((seed % 8) as i64);
        let customer = &customers[seed % customers.len()];
        let first = &items[(seed * 7) % items.len()];
        let second = &items[(seed * 11 + 3) % items.len()];

        let mut line_items = vec![RentalLineItem::new(first.id, 1)];
        if second.id != first.id && seed % 2 == 0 {
            line_items.push(RentalLineItem::new(second.id, 1));
        }

        let discount = DISCOUNTS[seed % DISCOUNTS.len()];
        let terms = RentalTerms {
            customer_id: customer.id,
            line_items,
            rental_date,
            due_date: rental_date + Duration::days(2 + (seed % 3) as i64),
            discount: (discount > 0.0).then(|| DiscountRate::from_percentage(discount)),
            notes: None,
        };

        let rental = db.rentals().insert(&terms).await?;
        created += 1;

        if day > 7 {
            let returned_at = rental_date + Duration::days(1 + (seed % 4) as i64);
            let surcharge = Money::from_units(if seed % 5 == 0 { 20_000 } else { 0 });
            let settled_rental = settle_rental(&rental, returned_at, surcharge, &items, offset)?;
            if let Some(settlement) = settled_rental.settlement() {
                db.rentals().settle(rental.id, settlement).await?;
                revenue += settlement.total_price;
                settled += 1;
            }
        }

        seed += 1;
        day -= 3;
    }

    println!(
        "✓ Inserted {} rentals ({} settled, {} active)",
        created,
        settled,
        created - settled
    );
    println!("  Settled revenue: {}", revenue);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
