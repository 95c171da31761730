//! Reconciliation: recompute derived state from the entries
//!
//! The occupied count and waitlist positions are derived data. Lost writes
//! or manual edits can let them drift; reconciliation rebuilds both from
//! the entries of one resource and repairs missed promotions. Running it
//! twice in a row changes nothing the second time.

use super::manager::ManagerResult;
use super::traits::SectionContext;
use serde::Serialize;
use shared::registration::{EntryStatus, EventPayload};

/// What reconciliation found and fixed on one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub resource_id: String,
    pub occupied_before: u32,
    pub occupied_after: u32,
    /// Waitlisted entries whose position was rewritten
    pub positions_fixed: u32,
    /// Non-waitlisted entries that still carried a position
    pub stray_positions_cleared: u32,
    /// Entries promoted into repaired vacancies
    pub promoted: u32,
}

impl ReconcileReport {
    /// Whether anything was corrected
    pub fn changed(&self) -> bool {
        self.occupied_before != self.occupied_after
            || self.positions_fixed > 0
            || self.stray_positions_cleared > 0
            || self.promoted > 0
    }
}

/// Reconcile the resource held by `ctx`
pub fn reconcile_section(ctx: &mut SectionContext<'_>) -> ManagerResult<ReconcileReport> {
    let resource_id = ctx.resource_id().to_string();
    let occupied_before = ctx.ledger().occupied();

    // 1. Positions belong to waitlisted entries only
    let mut stray_positions_cleared = 0;
    for mut entry in ctx.entries(&[])? {
        if entry.status != EntryStatus::Waitlisted && entry.position.is_some() {
            entry.position = None;
            ctx.record(entry);
            stray_positions_cleared += 1;
        }
    }

    // 2. Dense 1..N in first-come-first-served order
    let positions_fixed = ctx.waitlist_mut().renumber();

    // 3. Occupied = slot holders, stored exactly (an over-full resource stays over-full)
    let holders = ctx
        .entries(&[EntryStatus::Confirmed, EntryStatus::Offered])?
        .len() as u32;
    ctx.ledger_mut().recount(holders);
    let occupied_after = ctx.ledger().occupied();

    // 4. Repair missed promotions
    let promoted = ctx.promote_vacancies().len() as u32;

    let report = ReconcileReport {
        resource_id,
        occupied_before,
        occupied_after,
        positions_fixed,
        stray_positions_cleared,
        promoted,
    };

    if report.changed() {
        ctx.emit(EventPayload::Reconciled {
            occupied_before,
            occupied_after,
            positions_fixed,
        });
        tracing::warn!(
            resource_id = %report.resource_id,
            occupied_before,
            occupied_after,
            positions_fixed,
            stray_positions_cleared,
            promoted,
            "Reconciliation corrected drift"
        );
    } else {
        tracing::debug!(resource_id = %report.resource_id, "Reconciliation found no drift");
    }
    Ok(report)
}
