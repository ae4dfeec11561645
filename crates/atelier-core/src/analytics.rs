//! # Dashboard Analytics
//!
//! Figures shown on the admin dashboard, derived from the full collections.
//!
//! Revenue comes from settled rentals only and is attributed to the
//! calendar bucket of the rental's `rental_date` (not its return date).
//! Buckets are computed on the shop's calendar.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, IsoWeek, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::{compute_active_reservations, reserved_count, ReservationMap};
use crate::calendar::{first_of_month, is_overdue, local_date, months_back};
use crate::money::Money;
use crate::types::{Customer, CustomerId, InventoryItem, ItemId, Rental, RentalId};
use crate::DASHBOARD_TOP_N;

/// Months shown in the monthly revenue series.
pub const REVENUE_MONTHS: u32 = 12;

/// Weeks shown in the weekly revenue series.
pub const REVENUE_WEEKS: i64 = 12;

/// Years shown in the yearly revenue series.
pub const REVENUE_YEARS: i32 = 5;

/// Stat card counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    /// Distinct inventory records.
    pub item_kinds: usize,
    /// Sum of `total_quantity` over all items.
    pub total_stock: i64,
    pub active_rentals: usize,
    pub overdue_rentals: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PopularItem {
    pub item_id: ItemId,
    pub name: String,
    pub reserved: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopCustomer {
    pub customer_id: CustomerId,
    /// `None` when the customer record no longer exists.
    pub name: Option<String>,
    pub total_spent: Money,
}

/// Granularity of a revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RevenuePeriod {
    Week,
    Month,
    Year,
}

/// One bucket of a revenue series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevenuePoint {
    /// Short axis label: `W11`, `3/26`, `2026`.
    pub label: String,
    /// First calendar day of the bucket.
    #[ts(as = "String")]
    pub starts_on: NaiveDate,
    pub revenue: Money,
}

/// An overdue rental as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OverdueRental {
    pub rental_id: RentalId,
    pub customer_id: CustomerId,
    /// `name (xN)` per line; `N/A` for items that no longer exist.
    pub items: Vec<String>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
}

/// Everything the dashboard displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub stats: DashboardStats,
    pub popular_items: Vec<PopularItem>,
    pub top_customers: Vec<TopCustomer>,
    pub overdue: Vec<OverdueRental>,
    pub revenue_by_week: Vec<RevenuePoint>,
    pub revenue_by_month: Vec<RevenuePoint>,
    pub revenue_by_year: Vec<RevenuePoint>,
}

// =============================================================================
// Stats and Rankings
// =============================================================================

pub fn dashboard_stats(
    items: &[InventoryItem],
    rentals: &[Rental],
    now: DateTime<Utc>,
) -> DashboardStats {
    DashboardStats {
        item_kinds: items.len(),
        total_stock: items.iter().map(|item| item.total_quantity).sum(),
        active_rentals: rentals.iter().filter(|r| r.is_active()).count(),
        overdue_rentals: rentals.iter().filter(|r| is_overdue(r, now)).count(),
    }
}

/// Items with the most units currently out, highest first.
///
/// Items with nothing reserved are left out. Ties keep inventory order.
pub fn popular_items(
    items: &[InventoryItem],
    reservations: &ReservationMap,
    limit: usize,
) -> Vec<PopularItem> {
    let mut ranked: Vec<PopularItem> = items
        .iter()
        .map(|item| PopularItem {
            item_id: item.id,
            name: item.name.clone(),
            reserved: reserved_count(item.id, reservations),
        })
        .filter(|p| p.reserved > 0)
        .collect();
    ranked.sort_by(|a, b| b.reserved.cmp(&a.reserved));
    ranked.truncate(limit);
    ranked
}

/// Customers with the highest settled spend on rentals started in `year`.
pub fn top_customers(
    customers: &[Customer],
    rentals: &[Rental],
    year: i32,
    offset: FixedOffset,
    limit: usize,
) -> Vec<TopCustomer> {
    let mut spending: HashMap<CustomerId, Money> = HashMap::new();
    for rental in rentals {
        let Some(total) = rental.total_price() else {
            continue;
        };
        if local_date(rental.rental_date, offset).year() == year {
            *spending.entry(rental.customer_id).or_default() += total;
        }
    }

    let mut ranked: Vec<TopCustomer> = spending
        .into_iter()
        .map(|(customer_id, total_spent)| TopCustomer {
            customer_id,
            name: customers
                .iter()
                .find(|c| c.id == customer_id)
                .map(|c| c.name.clone()),
            total_spent,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Overdue rentals, longest overdue first.
pub fn overdue_rentals(
    items: &[InventoryItem],
    rentals: &[Rental],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<OverdueRental> {
    let mut overdue: Vec<&Rental> = rentals.iter().filter(|r| is_overdue(r, now)).collect();
    overdue.sort_by_key(|r| r.due_date);

    overdue
        .into_iter()
        .take(limit)
        .map(|rental| OverdueRental {
            rental_id: rental.id,
            customer_id: rental.customer_id,
            items: rental
                .line_items
                .iter()
                .map(|line| {
                    let name = items
                        .iter()
                        .find(|item| item.id == line.item_id)
                        .map(|item| item.name.as_str())
                        .unwrap_or("N/A");
                    format!("{} (x{})", name, line.quantity)
                })
                .collect(),
            due_date: rental.due_date,
        })
        .collect()
}

// =============================================================================
// Revenue Series
// =============================================================================

struct Bucket {
    key: (i32, u32),
    label: String,
    starts_on: NaiveDate,
}

fn week_key(week: IsoWeek) -> (i32, u32) {
    (week.year(), week.week())
}

fn buckets(period: RevenuePeriod, today: NaiveDate) -> Vec<Bucket> {
    let mut out = match period {
        RevenuePeriod::Week => (0..REVENUE_WEEKS)
            .map(|i| {
                let day = today - Duration::weeks(i);
                let week = day.iso_week();
                let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
                Bucket {
                    key: week_key(week),
                    label: format!("W{}", week.week()),
                    starts_on: monday,
                }
            })
            .collect::<Vec<_>>(),
        RevenuePeriod::Month => (0..REVENUE_MONTHS)
            .map(|i| {
                let first = months_back(today, i);
                Bucket {
                    key: (first.year(), first.month()),
                    label: format!("{}/{:02}", first.month(), first.year().rem_euclid(100)),
                    starts_on: first,
                }
            })
            .collect(),
        RevenuePeriod::Year => (0..REVENUE_YEARS)
            .map(|i| {
                let year = today.year() - i;
                Bucket {
                    key: (year, 0),
                    label: year.to_string(),
                    starts_on: first_of_month(year, 1),
                }
            })
            .collect(),
    };
    out.reverse();
    out
}

fn bucket_key(period: RevenuePeriod, date: NaiveDate) -> (i32, u32) {
    match period {
        RevenuePeriod::Week => week_key(date.iso_week()),
        RevenuePeriod::Month => (date.year(), date.month()),
        RevenuePeriod::Year => (date.year(), 0),
    }
}

/// Settled revenue per bucket ending with the bucket containing `today`.
///
/// Oldest bucket first; empty buckets are zero. Rentals outside the window
/// are ignored.
pub fn revenue_series(
    rentals: &[Rental],
    period: RevenuePeriod,
    today: NaiveDate,
    offset: FixedOffset,
) -> Vec<RevenuePoint> {
    let buckets = buckets(period, today);
    let mut totals = vec![Money::zero(); buckets.len()];

    for rental in rentals {
        let Some(total) = rental.total_price() else {
            continue;
        };
        let key = bucket_key(period, local_date(rental.rental_date, offset));
        if let Some(index) = buckets.iter().position(|b| b.key == key) {
            totals[index] += total;
        }
    }

    buckets
        .into_iter()
        .zip(totals)
        .map(|(bucket, revenue)| RevenuePoint {
            label: bucket.label,
            starts_on: bucket.starts_on,
            revenue,
        })
        .collect()
}

/// Builds the whole dashboard in one pass over the collections.
pub fn dashboard_summary(
    items: &[InventoryItem],
    customers: &[Customer],
    rentals: &[Rental],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DashboardSummary {
    let reservations = compute_active_reservations(rentals);
    let today = local_date(now, offset);

    DashboardSummary {
        stats: dashboard_stats(items, rentals, now),
        popular_items: popular_items(items, &reservations, DASHBOARD_TOP_N),
        top_customers: top_customers(customers, rentals, today.year(), offset, DASHBOARD_TOP_N),
        overdue: overdue_rentals(items, rentals, now, DASHBOARD_TOP_N),
        revenue_by_week: revenue_series(rentals, RevenuePeriod::Week, today, offset),
        revenue_by_month: revenue_series(rentals, RevenuePeriod::Month, today, offset),
        revenue_by_year: revenue_series(rentals, RevenuePeriod::Year, today, offset),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{default_offset, local_midnight};
    use crate::types::{RentalLineItem, RentalStatus, Settlement};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        local_midnight(date(y, m, d), default_offset()) + Duration::hours(10)
    }

    fn item(id: ItemId, name: &str, qty: i64) -> InventoryItem {
        InventoryItem {
            id,
            name: name.to_string(),
            size: String::new(),
            daily_rate: Money::from_units(50_000),
            total_quantity: qty,
            image_url: None,
        }
    }

    fn customer(id: CustomerId, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            phone: "0900000000".to_string(),
            address: "HCM".to_string(),
        }
    }

    fn rental(
        id: RentalId,
        customer_id: CustomerId,
        lines: &[(ItemId, i64)],
        rented: DateTime<Utc>,
        total: Option<i64>,
    ) -> Rental {
        Rental {
            id,
            customer_id,
            line_items: lines.iter().map(|&(i, q)| RentalLineItem::new(i, q)).collect(),
            rental_date: rented,
            due_date: rented + Duration::days(3),
            discount: None,
            notes: None,
            status: match total {
                Some(units) => RentalStatus::Settled(Settlement {
                    return_date: rented + Duration::days(2),
                    surcharge: Money::zero(),
                    total_price: Money::from_units(units),
                }),
                None => RentalStatus::Active,
            },
        }
    }

    #[test]
    fn test_dashboard_stats() {
        let items = vec![item(1, "A", 3), item(2, "B", 4)];
        let now = at(2026, 3, 10);
        let rentals = vec![
            rental(1, 1, &[(1, 1)], at(2026, 3, 1), None),
            rental(2, 1, &[(2, 1)], at(2026, 3, 9), None),
            rental(3, 2, &[(2, 1)], at(2026, 3, 1), Some(100)),
        ];
        let stats = dashboard_stats(&items, &rentals, now);
        assert_eq!(stats.item_kinds, 2);
        assert_eq!(stats.total_stock, 7);
        assert_eq!(stats.active_rentals, 2);
        assert_eq!(stats.overdue_rentals, 1);
    }

    #[test]
    fn test_popular_items_excludes_zero_and_truncates() {
        let items: Vec<_> = (1..=7).map(|i| item(i, &format!("I{}", i), 10)).collect();
        let rentals = vec![
            rental(1, 1, &[(1, 1), (2, 5), (3, 2), (4, 4), (5, 3), (6, 6)], at(2026, 3, 1), None),
        ];
        let reserved = compute_active_reservations(&rentals);
        let popular = popular_items(&items, &reserved, 5);

        let ids: Vec<ItemId> = popular.iter().map(|p| p.item_id).collect();
        assert_eq!(ids, vec![6, 2, 4, 5, 3]);
        assert!(popular.iter().all(|p| p.reserved > 0));
    }

    #[test]
    fn test_top_customers_current_year_settled_only() {
        let customers = vec![customer(1, "Lan"), customer(2, "Minh")];
        let rentals = vec![
            rental(1, 1, &[(1, 1)], at(2026, 1, 5), Some(300_000)),
            rental(2, 1, &[(1, 1)], at(2026, 2, 5), Some(200_000)),
            rental(3, 2, &[(1, 1)], at(2026, 2, 7), Some(400_000)),
            rental(4, 2, &[(1, 1)], at(2025, 12, 30), Some(900_000)),
            rental(5, 2, &[(1, 1)], at(2026, 3, 1), None),
            rental(6, 3, &[(1, 1)], at(2026, 3, 1), Some(50_000)),
        ];
        let top = top_customers(&customers, &rentals, 2026, default_offset(), 5);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].customer_id, 1);
        assert_eq!(top[0].total_spent, Money::from_units(500_000));
        assert_eq!(top[1].customer_id, 2);
        assert_eq!(top[1].total_spent, Money::from_units(400_000));
        assert_eq!(top[2].name, None);
    }

    #[test]
    fn test_monthly_revenue_by_rental_date() {
        let rentals = vec![
            // Rented in February, returned in March: counts for February
            rental(1, 1, &[(1, 1)], at(2026, 2, 27), Some(100_000)),
            rental(2, 1, &[(1, 1)], at(2026, 3, 2), Some(50_000)),
            rental(3, 1, &[(1, 1)], at(2026, 3, 3), None),
            rental(4, 1, &[(1, 1)], at(2024, 1, 1), Some(999)),
        ];
        let series = revenue_series(&rentals, RevenuePeriod::Month, date(2026, 3, 15), default_offset());

        assert_eq!(series.len(), 12);
        assert_eq!(series[0].label, "4/25");
        assert_eq!(series[0].starts_on, date(2025, 4, 1));
        assert_eq!(series[10].label, "2/26");
        assert_eq!(series[10].revenue, Money::from_units(100_000));
        assert_eq!(series[11].label, "3/26");
        assert_eq!(series[11].revenue, Money::from_units(50_000));
        let total: Money = series.iter().map(|p| p.revenue).sum();
        assert_eq!(total, Money::from_units(150_000));
    }

    #[test]
    fn test_weekly_and_yearly_series() {
        let today = date(2026, 3, 11); // Wednesday, ISO week 11
        let rentals = vec![
            rental(1, 1, &[(1, 1)], at(2026, 3, 9), Some(10)),
            rental(2, 1, &[(1, 1)], at(2026, 3, 8), Some(20)),
            rental(3, 1, &[(1, 1)], at(2022, 6, 1), Some(30)),
            rental(4, 1, &[(1, 1)], at(2021, 6, 1), Some(40)),
        ];

        let weekly = revenue_series(&rentals, RevenuePeriod::Week, today, default_offset());
        assert_eq!(weekly.len(), 12);
        assert_eq!(weekly[11].label, "W11");
        assert_eq!(weekly[11].starts_on, date(2026, 3, 9));
        assert_eq!(weekly[11].revenue, Money::from_units(10));
        assert_eq!(weekly[10].revenue, Money::from_units(20));

        let yearly = revenue_series(&rentals, RevenuePeriod::Year, today, default_offset());
        let labels: Vec<&str> = yearly.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2022", "2023", "2024", "2025", "2026"]);
        assert_eq!(yearly[0].revenue, Money::from_units(30));
        assert_eq!(yearly[4].revenue, Money::from_units(30));
    }

    #[test]
    fn test_overdue_rentals_name_missing_items() {
        let items = vec![item(1, "Vest", 2)];
        let rentals = vec![
            rental(1, 1, &[(1, 1), (9, 2)], at(2026, 3, 1), None),
            rental(2, 1, &[(1, 1)], at(2026, 2, 20), None),
        ];
        let overdue = overdue_rentals(&items, &rentals, at(2026, 3, 10), 5);
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].rental_id, 2);
        assert_eq!(overdue[1].items, vec!["Vest (x1)", "N/A (x2)"]);
    }

    #[test]
    fn test_dashboard_summary_assembles_parts() {
        let items = vec![item(1, "Vest", 2)];
        let customers = vec![customer(1, "Lan")];
        let rentals = vec![rental(1, 1, &[(1, 1)], at(2026, 3, 1), None)];
        let summary = dashboard_summary(&items, &customers, &rentals, at(2026, 3, 2), default_offset());

        assert_eq!(summary.stats.active_rentals, 1);
        assert_eq!(summary.popular_items.len(), 1);
        assert!(summary.top_customers.is_empty());
        assert!(summary.overdue.is_empty());
        assert_eq!(summary.revenue_by_year.len(), 5);
    }
}
