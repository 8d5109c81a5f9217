//! Inventory tracking for market making.
//!
//! `InventoryState` is the agent's own cash/position book, built only from
//! observed fills. `FillLedger` remembers which fills were already applied,
//! keyed by fill identity rather than by timestamp.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sfmm_core::{Fill, OrderId, OrderSide, Price};

/// Cash and position built from applied fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryState {
    /// Net shares (positive = long, negative = short).
    pub position: i64,
    /// Cash in cents.
    pub cash: i64,
}

impl InventoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fill: buys add shares and spend cash, sells the inverse.
    pub fn apply_fill(&mut self, side: OrderSide, fill: &Fill) {
        self.position += fill.position_delta(side);
        self.cash += fill.cash_delta(side);
    }

    /// Net asset value in cents, marked at `last`.
    pub fn nav(&self, last: Price) -> i64 {
        self.position * last.cents() + self.cash
    }

    /// Whether `|position|` has reached the soft band.
    pub fn at_or_beyond_band(&self, band: i64) -> bool {
        self.position.abs() >= band
    }
}

/// Identity of a fill: the order plus its index in that order's fills list.
///
/// Fills lists are append-only per order, so the index never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillKey {
    pub order_id: OrderId,
    pub index: usize,
}

impl FillKey {
    pub fn new(order_id: OrderId, index: usize) -> Self {
        Self { order_id, index }
    }
}

/// Latest fill time seen on a side. Observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillWatermark {
    pub last_fill_time: Option<DateTime<Utc>>,
}

impl FillWatermark {
    /// Move forward to `ts` if it is later than the current mark.
    pub fn advance(&mut self, ts: DateTime<Utc>) {
        if self.last_fill_time.map_or(true, |cur| ts > cur) {
            self.last_fill_time = Some(ts);
        }
    }
}

/// Applied-fill set for one side, spanning the whole session.
#[derive(Debug, Clone)]
pub struct FillLedger {
    side: OrderSide,
    applied: HashSet<FillKey>,
    watermark: FillWatermark,
    /// Shares applied through this ledger.
    filled_qty: i64,
}

impl FillLedger {
    pub fn new(side: OrderSide) -> Self {
        Self {
            side,
            applied: HashSet::new(),
            watermark: FillWatermark::default(),
            filled_qty: 0,
        }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn contains(&self, key: &FillKey) -> bool {
        self.applied.contains(key)
    }

    /// Record a fill. Returns false if it was already recorded.
    pub fn record(&mut self, key: FillKey, fill: &Fill) -> bool {
        if !self.applied.insert(key) {
            return false;
        }
        self.filled_qty += fill.qty;
        self.watermark.advance(fill.filled_at);
        true
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn filled_qty(&self) -> i64 {
        self.filled_qty
    }

    pub fn watermark(&self) -> FillWatermark {
        self.watermark
    }
}
