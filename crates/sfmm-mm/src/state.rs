//! Trader state threaded through the scheduler.

use std::fmt;

use sfmm_core::{format_cents, OrderSide, Price};

use crate::config::MakerConfig;
use crate::estimator::PriceEstimator;
use crate::inventory::InventoryState;
use crate::lifecycle::SideState;

/// All mutable state of the quoting loop. Each component borrows only
/// the slice it owns.
#[derive(Debug, Clone)]
pub struct TraderState {
    pub inventory: InventoryState,
    pub estimator: PriceEstimator,
    pub bid: SideState,
    pub ask: SideState,
    /// Last trade price from the most recent quote snapshot.
    pub last_trade: Price,
}

impl TraderState {
    pub fn new(config: &MakerConfig) -> Self {
        Self {
            inventory: InventoryState::new(),
            estimator: PriceEstimator::new(config.alpha),
            bid: SideState::new(OrderSide::Buy),
            ask: SideState::new(OrderSide::Sell),
            last_trade: Price::ZERO,
        }
    }

    pub fn side(&self, side: OrderSide) -> &SideState {
        match side {
            OrderSide::Buy => &self.bid,
            OrderSide::Sell => &self.ask,
        }
    }

    /// Side state plus the inventory, borrowed disjointly.
    pub fn side_and_inventory(&mut self, side: OrderSide) -> (&mut SideState, &mut InventoryState) {
        let side_state = match side {
            OrderSide::Buy => &mut self.bid,
            OrderSide::Sell => &mut self.ask,
        };
        (side_state, &mut self.inventory)
    }

    pub fn nav(&self) -> i64 {
        self.inventory.nav(self.last_trade)
    }

    pub fn status_line(&self) -> StatusLine {
        let (bid_qty, bid_price) = self.bid.display_quote();
        let (ask_qty, ask_price) = self.ask.display_quote();
        StatusLine {
            cash: self.inventory.cash,
            position: self.inventory.position,
            nav: self.nav(),
            bid_qty,
            bid_price,
            ask_qty,
            ask_price,
            last: self.last_trade,
        }
    }
}

/// Operator status line, one per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub cash: i64,
    pub position: i64,
    pub nav: i64,
    pub bid_qty: i64,
    pub bid_price: Price,
    pub ask_qty: i64,
    pub ask_price: Price,
    pub last: Price,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cash: ${} Position: {} NAV: ${} OurBid: {} @ ${} OurAsk: {} @ ${} Last: ${}",
            format_cents(self.cash),
            self.position,
            format_cents(self.nav),
            self.bid_qty,
            self.bid_price,
            self.ask_qty,
            self.ask_price,
            self.last,
        )
    }
}
