//! # Atelier Admin Entry Point
//!
//! Opens the shop database and prints the state of the shop.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Read configuration from the environment
//! 3. Determine database path (app data directory or `ATELIER_DB_PATH`)
//! 4. Connect to database & run migrations
//! 5. Load the first snapshot
//! 6. Report store status and today's dashboard figures
//!
//! If the store cannot be reached nothing else is attempted: the process
//! logs a blocking error and exits non-zero.

use std::process::ExitCode;

use atelier_admin::commands::{config::get_store_status, dashboard::dashboard};
use atelier_admin::state::ConfigState;
use chrono::Utc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    atelier_admin::init_tracing();

    let config = ConfigState::from_env();
    info!(shop = %config.shop_name, offset = config.utc_offset_minutes, "Starting Atelier admin");

    let (db, snapshot) = match atelier_admin::open(&config).await {
        Ok(opened) => opened,
        Err(e) if e.is_store_unavailable() => {
            error!(error = %e, "Backing store unavailable; nothing can be shown until it is reachable");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    match get_store_status(&db).await {
        Ok(status) if status.migrations.is_current() => {
            info!(applied = status.migrations.applied, "Schema is current");
        }
        Ok(status) => warn!(
            applied = status.migrations.applied,
            total = status.migrations.total,
            "Schema is behind"
        ),
        Err(e) => warn!(error = %e, "Could not read migration status"),
    }

    let summary = dashboard(&snapshot, &config, Utc::now()).await;
    info!(
        item_kinds = summary.stats.item_kinds,
        total_stock = summary.stats.total_stock,
        active = summary.stats.active_rentals,
        overdue = summary.stats.overdue_rentals,
        "Shop status"
    );
    if let Some(month) = summary.revenue_by_month.last() {
        info!(
            month = %month.label,
            revenue = %config.format_money(month.revenue),
            "Revenue this month"
        );
    }
    for rental in &summary.overdue {
        warn!(
            rental = rental.rental_id,
            items = %rental.items.join(", "),
            due = %rental.due_date.with_timezone(&config.offset()).format("%d/%m/%Y"),
            "Overdue"
        );
    }

    db.inner().close().await;
    ExitCode::SUCCESS
}
