//! # Calendar Utilities
//!
//! Calendar-day arithmetic in the shop's time zone.
//!
//! Instants are stored as UTC. Days are counted on the shop's wall calendar,
//! which is a fixed UTC offset (+07:00 unless configured otherwise):
//!
//! ```text
//!   rented  2026-03-01 23:30 (+07:00)  ──┐
//!   returned 2026-03-02 00:15 (+07:00) ──┴─► 1 calendar day apart → 2 days billed
//! ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::types::Rental;

/// Default shop offset: UTC+07:00.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 7 * 60;

/// Builds a fixed offset from minutes east of UTC.
///
/// Returns `None` when the value is outside ±24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// The default shop offset (falls back to UTC, which cannot happen for +07:00).
pub fn default_offset() -> FixedOffset {
    offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or_else(|| Utc.fix())
}

/// Current instant on the shop's wall clock.
pub fn shop_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// The calendar date of `instant` in the shop's zone.
#[inline]
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// UTC instant of local midnight on `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN) - Duration::seconds(offset.local_minus_utc() as i64);
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Whole calendar days from `from` to `to`, ignoring time of day.
///
/// Negative when `to` falls on an earlier date.
pub fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>, offset: FixedOffset) -> i64 {
    (local_date(to, offset) - local_date(from, offset)).num_days()
}

/// Inclusive day count used for billing: `max(1, days_between + 1)`.
///
/// Same-day rentals bill one day; an `as_of` before the rental date still
/// bills one day.
pub fn days_elapsed(rental_date: DateTime<Utc>, as_of: DateTime<Utc>, offset: FixedOffset) -> i64 {
    (calendar_days_between(rental_date, as_of, offset) + 1).max(1)
}

/// An active rental whose due instant has passed.
pub fn is_overdue(rental: &Rental, now: DateTime<Utc>) -> bool {
    rental.is_active() && now > rental.due_date
}

/// Shifts a date back by `months` calendar months, clamping the day.
pub(crate) fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 - months as i32;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    first_of_month(year, month0 + 1)
}

/// First day of the given month. Falls back to `NaiveDate::MIN` for
/// out-of-range years.
pub(crate) fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

// =============================================================================
// Unit Tests
// =============================================================================
