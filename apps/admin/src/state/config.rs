//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`ATELIER_*`)
//! 2. Defaults (this file)
//!
//! Read-only after initialization, so no lock.

use std::path::PathBuf;

use atelier_core::calendar::{offset_from_minutes, DEFAULT_UTC_OFFSET_MINUTES};
use atelier_core::Money;
use chrono::FixedOffset;
use serde::Serialize;
use tracing::warn;

/// Development passwords used when none are configured.
pub const DEV_ADMIN_PASSWORD: &str = "admin";
pub const DEV_STAFF_PASSWORD: &str = "staff";

/// Application configuration.
///
/// Passwords are never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Shop name shown in the header.
    pub shop_name: String,

    /// Database file; `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// The shop's UTC offset. Calendar days are counted in this zone.
    pub utc_offset_minutes: i32,

    /// Suffix for amounts (`560.000 ₫`).
    pub currency_symbol: String,

    #[serde(skip)]
    pub admin_password: String,

    #[serde(skip)]
    pub staff_password: String,
}

impl Default for ConfigState {
    /// Development defaults: Vietnam time, dong, dev passwords.
    fn default() -> Self {
        ConfigState {
            shop_name: "Atelier Dev Shop".to_string(),
            database_path: None,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            currency_symbol: "₫".to_string(),
            admin_password: DEV_ADMIN_PASSWORD.to_string(),
            staff_password: DEV_STAFF_PASSWORD.to_string(),
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `ATELIER_DB_PATH`: database file
    /// - `ATELIER_SHOP_NAME`: shop name
    /// - `ATELIER_UTC_OFFSET_MINUTES`: e.g. "420" for +07:00
    /// - `ATELIER_ADMIN_PASSWORD` / `ATELIER_STAFF_PASSWORD`
    /// - `ATELIER_CURRENCY_SYMBOL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigState::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("ATELIER_DB_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = var("ATELIER_SHOP_NAME") {
            config.shop_name = name;
        }

        if let Some(raw) = var("ATELIER_UTC_OFFSET_MINUTES") {
            let minutes = raw
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|m| offset_from_minutes(*m).is_some());
            match minutes {
                Some(minutes) => config.utc_offset_minutes = minutes,
                None => warn!(value = %raw, "Ignoring invalid ATELIER_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(symbol) = var("ATELIER_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        match var("ATELIER_ADMIN_PASSWORD") {
            Some(password) => config.admin_password = password,
            None => warn!("ATELIER_ADMIN_PASSWORD not set, using the development password"),
        }

        match var("ATELIER_STAFF_PASSWORD") {
            Some(password) => config.staff_password = password,
            None => warn!("ATELIER_STAFF_PASSWORD not set, using the development password"),
        }

        config
    }

    /// The shop's fixed offset.
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes)
            .unwrap_or_else(atelier_core::calendar::default_offset)
    }

    /// Formats an amount with `.` thousands separators and the configured symbol.
    pub fn format_money(&self, amount: Money) -> String {
        let units = amount.units();
        let digits = units.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!(
            "{}{} {}",
            if units < 0 { "-" } else { "" },
            grouped,
            self.currency_symbol
        )
    }
}
