//! # Dashboard Commands

use atelier_core::analytics::{dashboard_summary, DashboardSummary};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::state::{ConfigState, SnapshotState};

/// Stat cards, rankings, overdue list and revenue series as of `now`.
///
/// Computed from the snapshot on every call; nothing is cached.
pub async fn dashboard(
    snapshot: &SnapshotState,
    config: &ConfigState,
    now: DateTime<Utc>,
) -> DashboardSummary {
    debug!("dashboard command");

    let snapshot = snapshot.read().await;
    dashboard_summary(
        &snapshot.items,
        &snapshot.customers,
        &snapshot.rentals,
        now,
        config.offset(),
    )
}
