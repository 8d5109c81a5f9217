//! Exchange-reported order state.
//!
//! `OrderStatus` is what place, cancel and status reads all return. It is
//! replaced wholesale on every read; the fills list is append-only per order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::{OrderId, OrderSide, OrderType};
use crate::price::Price;

/// A single execution against one of our orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Execution price.
    pub price: Price,
    /// Executed quantity.
    pub qty: i64,
    /// Execution timestamp as reported by the venue.
    #[serde(rename = "ts")]
    pub filled_at: DateTime<Utc>,
}

impl Fill {
    pub fn new(price: Price, qty: i64, filled_at: DateTime<Utc>) -> Self {
        Self {
            price,
            qty,
            filled_at,
        }
    }

    /// Cash impact of this fill for the given side: negative for buys.
    pub fn cash_delta(&self, side: OrderSide) -> i64 {
        -side.sign() * self.price.notional(self.qty)
    }

    /// Position impact of this fill for the given side.
    pub fn position_delta(&self, side: OrderSide) -> i64 {
        side.sign() * self.qty
    }
}

/// Order status as reported by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub id: OrderId,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub account: String,
    #[serde(rename = "direction")]
    pub side: OrderSide,
    #[serde(default)]
    pub order_type: OrderType,
    /// Limit price (zero for market orders).
    pub price: Price,
    pub original_qty: i64,
    /// Quantity still resting on the book.
    #[serde(default)]
    pub qty: i64,
    #[serde(default)]
    pub total_filled: i64,
    pub open: bool,
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(rename = "ts", default)]
    pub placed_at: Option<DateTime<Utc>>,
}

impl OrderStatus {
    /// Unfilled quantity, as shown on the operator status line.
    pub fn remaining(&self) -> i64 {
        (self.original_qty - self.total_filled).max(0)
    }

    /// Sum of the quantities in the fills list.
    pub fn filled_from_fills(&self) -> i64 {
        self.fills.iter().map(|f| f.qty).sum()
    }

    /// Check `total_filled <= original_qty`.
    pub fn is_consistent(&self) -> bool {
        self.total_filled <= self.original_qty
    }

    /// Latest fill timestamp in the fills list.
    pub fn last_fill_time(&self) -> Option<DateTime<Utc>> {
        self.fills.iter().map(|f| f.filled_at).max()
    }
}
