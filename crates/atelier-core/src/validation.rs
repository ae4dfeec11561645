//! # Validation Module
//!
//! Input validation for records coming from the admin forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin command (Rust)                                         │
//! │  ├── THIS MODULE: shape and range checks                               │
//! │  └── availability::ensure_available (stock check)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Pricing Engine                                               │
//! │  └── lifecycle preconditions (active vs settled)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 1, rate >= 0)                      │
//! │  └── Foreign keys (ON DELETE RESTRICT)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes; shop data is mostly
//! Vietnamese text.
//!
//! ## Usage
//! ```rust
//! use atelier_core::validation::{validate_item_name, validate_quantity};
//!
//! validate_item_name("Ao dai lua do").unwrap();
//! validate_quantity(2).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};

use crate::calendar::calendar_days_between;
use crate::error::ValidationError;
use crate::money::{DiscountRate, Money, BPS_PER_WHOLE};
use crate::types::{NewCustomer, NewInventoryItem, RentalLineItem, RentalTerms};
use crate::{MAX_DAILY_RATE, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum item name length.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum size label length.
pub const MAX_SIZE_LEN: usize = 20;

/// Maximum phone number length in digits.
pub const MAX_PHONE_DIGITS: usize = 10;

/// Maximum search query length.
pub const MAX_QUERY_LEN: usize = 100;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Inventory Validators
// =============================================================================

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - Maximum 200 characters
///
/// ## Example
/// ```rust
/// use atelier_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Vest nam xanh").is_ok());
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    at_most("name", name, MAX_NAME_LEN)
}

/// Validates a size label. Empty is allowed ("one size").
pub fn validate_size_label(size: &str) -> ValidationResult<()> {
    at_most("size", size, MAX_SIZE_LEN)
}

/// Validates a daily rate. Zero is allowed (promotional items).
pub fn validate_daily_rate(rate: Money) -> ValidationResult<()> {
    if rate.is_negative() || rate.units() > MAX_DAILY_RATE {
        return Err(ValidationError::OutOfRange {
            field: "daily rate".to_string(),
            min: 0,
            max: MAX_DAILY_RATE,
        });
    }
    Ok(())
}

/// Validates an owned stock count.
pub fn validate_total_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "total quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a whole inventory record.
pub fn validate_new_item(item: &NewInventoryItem) -> ValidationResult<()> {
    validate_item_name(&item.name)?;
    validate_size_label(&item.size)?;
    validate_daily_rate(item.daily_rate)?;
    validate_total_quantity(item.total_quantity)
}

// =============================================================================
// Customer Validators
// =============================================================================

/// Validates a phone number.
///
/// ## Rules
/// - Digits only, 1 to 10 of them
///
/// Callers strip display formatting (spaces, dots) first.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    required("phone", phone)?;

    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain digits only".to_string(),
        });
    }

    if phone.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_DIGITS,
        });
    }

    Ok(())
}

/// Validates a whole customer record. Every field is required.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    required("name", &customer.name)?;
    at_most("name", &customer.name, MAX_NAME_LEN)?;
    validate_phone(&customer.phone)?;
    required("address", &customer.address)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed, lowercased query. Empty matches everything.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    at_most("query", query, MAX_QUERY_LEN)?;
    Ok(query.trim().to_lowercase())
}

// =============================================================================
// Rental Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates the line items of a rental.
///
/// ## Rules
/// - At least one line
/// - Every quantity valid
/// - Each item at most once
pub fn validate_line_items(lines: &[RentalLineItem]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "line items".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        validate_quantity(line.quantity)?;
        if !seen.insert(line.item_id) {
            return Err(ValidationError::Duplicate {
                field: "item".to_string(),
                value: line.item_id.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a discount typed as a percentage and converts it.
///
/// At most two decimals: the rate is kept in whole basis points.
///
/// ## Example
/// ```rust
/// use atelier_core::validation::validate_discount_percent;
///
/// assert_eq!(validate_discount_percent(10.0).unwrap().bps(), 1000);
/// assert!(validate_discount_percent(120.0).is_err());
/// assert!(validate_discount_percent(12.345).is_err());
/// ```
pub fn validate_discount_percent(pct: f64) -> ValidationResult<DiscountRate> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }
    let bps = pct * 100.0;
    if (bps - bps.round()).abs() > 1e-6 {
        return Err(ValidationError::InvalidFormat {
            field: "discount".to_string(),
            reason: "at most two decimal places".to_string(),
        });
    }
    Ok(DiscountRate::from_percentage(pct))
}

/// Validates a discount already in basis points (e.g. deserialized).
pub fn validate_discount(rate: Option<DiscountRate>) -> ValidationResult<()> {
    match rate {
        Some(rate) if rate.bps() > BPS_PER_WHOLE => Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        }),
        _ => Ok(()),
    }
}

/// Validates a return surcharge.
pub fn validate_surcharge(surcharge: Money) -> ValidationResult<()> {
    if surcharge.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "surcharge".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates rental terms before create or revise.
///
/// ## Rules
/// - Customer id set (> 0)
/// - Line items valid
/// - Discount within 0..=100 %
/// - Due date not on an earlier calendar day than the rental date
pub fn validate_rental_terms(terms: &RentalTerms, offset: FixedOffset) -> ValidationResult<()> {
    if terms.customer_id <= 0 {
        return Err(ValidationError::Required {
            field: "customer".to_string(),
        });
    }

    validate_line_items(&terms.line_items)?;
    validate_discount(terms.discount)?;
    validate_schedule(terms.rental_date, terms.due_date, offset)
}

/// Checks that the due date is not on an earlier calendar day than the
/// rental date. Same-day returns are fine.
pub fn validate_schedule(
    rental_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    offset: FixedOffset,
) -> ValidationResult<()> {
    if calendar_days_between(rental_date, due_date, offset) < 0 {
        return Err(ValidationError::InvalidFormat {
            field: "due date".to_string(),
            reason: "must not be before the rental date".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::default_offset;
    use chrono::{TimeZone, Utc};

    fn terms(lines: Vec<RentalLineItem>) -> RentalTerms {
        RentalTerms {
            customer_id: 1,
            line_items: lines,
            rental_date: Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap(),
            due_date: Utc.with_ymd_and_hms(2026, 3, 3, 2, 0, 0).unwrap(),
            discount: None,
            notes: None,
        }
    }

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Áo dài lụa đỏ").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"A".repeat(201)).is_err());
        // 200 multi-byte characters still fit
        assert!(validate_item_name(&"đ".repeat(200)).is_ok());
    }

    #[test]
    fn test_validate_new_item() {
        let mut item = NewInventoryItem {
            name: "Vest".to_string(),
            size: "L".to_string(),
            daily_rate: Money::from_units(150_000),
            total_quantity: 0,
            image_url: None,
        };
        assert!(validate_new_item(&item).is_ok());

        item.total_quantity = -1;
        assert!(validate_new_item(&item).is_err());

        item.total_quantity = 2;
        item.daily_rate = Money::from_units(-1);
        assert!(validate_new_item(&item).is_err());

        item.daily_rate = Money::zero();
        item.size = "X".repeat(21);
        assert!(validate_new_item(&item).is_err());
    }

    #[test]
    fn test_validate_daily_rate_bounds() {
        assert!(validate_daily_rate(Money::zero()).is_ok());
        assert!(validate_daily_rate(Money::from_units(MAX_DAILY_RATE)).is_ok());

        let err = validate_daily_rate(Money::from_units(MAX_DAILY_RATE + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: MAX_DAILY_RATE, .. }));
        assert!(validate_daily_rate(Money::from_units(5_000_000_000_000_000_000)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0901234567").is_ok());
        assert!(validate_phone("1").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("090 123").is_err());
        assert!(validate_phone("09012345678").is_err());
    }

    #[test]
    fn test_validate_new_customer_requires_all_fields() {
        let customer = NewCustomer {
            name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            address: String::new(),
        };
        let err = validate_new_customer(&customer).unwrap_err();
        assert_eq!(err.to_string(), "address is required");
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  LAN ").unwrap(), "lan");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_line_items() {
        assert!(validate_line_items(&[]).is_err());
        assert!(validate_line_items(&[RentalLineItem::new(1, 2), RentalLineItem::new(2, 1)]).is_ok());

        let err = validate_line_items(&[RentalLineItem::new(1, 2), RentalLineItem::new(1, 1)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));

        assert!(validate_line_items(&[RentalLineItem::new(1, 0)]).is_err());
    }

    #[test]
    fn test_validate_discount_percent() {
        assert_eq!(validate_discount_percent(0.0).unwrap(), DiscountRate::zero());
        assert_eq!(validate_discount_percent(100.0).unwrap().bps(), 10_000);
        assert!(validate_discount_percent(-0.5).is_err());
        assert!(validate_discount_percent(100.5).is_err());
        assert!(validate_discount_percent(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_discount_percent_precision() {
        assert_eq!(validate_discount_percent(12.34).unwrap().bps(), 1234);
        assert_eq!(validate_discount_percent(0.01).unwrap().bps(), 1);
        assert_eq!(validate_discount_percent(33.3).unwrap().bps(), 3330);

        let err = validate_discount_percent(12.345).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
        assert!(validate_discount_percent(0.005).is_err());
    }

    #[test]
    fn test_validate_surcharge() {
        assert!(validate_surcharge(Money::zero()).is_ok());
        assert!(validate_surcharge(Money::from_units(20_000)).is_ok());
        assert!(validate_surcharge(Money::from_units(-1)).is_err());
    }

    #[test]
    fn test_validate_rental_terms() {
        let offset = default_offset();
        let mut t = terms(vec![RentalLineItem::new(1, 1)]);
        assert!(validate_rental_terms(&t, offset).is_ok());

        // Same calendar day is fine
        t.due_date = t.rental_date;
        assert!(validate_rental_terms(&t, offset).is_ok());

        t.due_date = Utc.with_ymd_and_hms(2026, 2, 27, 2, 0, 0).unwrap();
        assert!(validate_rental_terms(&t, offset).is_err());

        let mut t = terms(vec![]);
        assert!(validate_rental_terms(&t, offset).is_err());

        t.line_items = vec![RentalLineItem::new(1, 1)];
        t.customer_id = 0;
        assert!(validate_rental_terms(&t, offset).is_err());
    }
}
