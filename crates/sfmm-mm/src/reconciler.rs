//! Fill reconciliation.
//!
//! Every status read of one of our orders (status poll, place response,
//! cancel response) goes through `FillReconciler::reconcile`, which applies
//! each fill not yet in the side's ledger exactly once.

use sfmm_core::OrderStatus;
use tracing::{debug, info};

use crate::error::{MakerError, MakerResult};
use crate::inventory::{FillKey, FillLedger, InventoryState};

/// What one reconcile pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Newly applied fills.
    pub applied: usize,
    pub position_delta: i64,
    pub cash_delta: i64,
}

impl ReconcileSummary {
    pub fn is_empty(&self) -> bool {
        self.applied == 0
    }

    pub fn merge(&mut self, other: ReconcileSummary) {
        self.applied += other.applied;
        self.position_delta += other.position_delta;
        self.cash_delta += other.cash_delta;
    }
}

/// Applies observed fills to the inventory.
pub struct FillReconciler;

impl FillReconciler {
    /// Apply every fill in `status` whose identity is not in `ledger`.
    ///
    /// Re-reconciling an unchanged fills list is a no-op. Equal timestamps
    /// do not collide because identity is (order id, index in fills list).
    pub fn reconcile(
        status: &OrderStatus,
        ledger: &mut FillLedger,
        inventory: &mut InventoryState,
    ) -> MakerResult<ReconcileSummary> {
        let side = ledger.side();
        if status.side != side {
            return Err(MakerError::Invariant(format!(
                "order {} is {} but was reconciled against the {} ledger",
                status.id, status.side, side
            )));
        }
        if !status.is_consistent() {
            return Err(MakerError::Invariant(format!(
                "order {} reports totalFilled {} > originalQty {}",
                status.id, status.total_filled, status.original_qty
            )));
        }

        let mut summary = ReconcileSummary::default();
        for (index, fill) in status.fills.iter().enumerate() {
            if !ledger.record(FillKey::new(status.id, index), fill) {
                continue;
            }
            inventory.apply_fill(side, fill);
            summary.applied += 1;
            summary.position_delta += fill.position_delta(side);
            summary.cash_delta += fill.cash_delta(side);
            debug!(
                side = side.quote_label(),
                order_id = %status.id,
                index,
                price = %fill.price,
                qty = fill.qty,
                ts = %fill.filled_at,
                "Fill applied"
            );
        }

        if !summary.is_empty() {
            info!(
                side = side.quote_label(),
                order_id = %status.id,
                fills = summary.applied,
                position = inventory.position,
                cash = inventory.cash,
                "Reconciled fills"
            );
        }
        Ok(summary)
    }
}
