//! Service traits consumed by the quoting core.
//!
//! Both traits are dyn-compatible (boxed futures) so the scheduler can hold
//! the real client, a retrying wrapper or the mock behind the same seam.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use sfmm_core::{MarketQuote, OrderId, OrderSide, OrderStatus, OrderType, Price};

use crate::error::ClientResult;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Order request body for `POST /venues/{venue}/stocks/{stock}/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub account: String,
    pub venue: String,
    pub stock: String,
    pub price: Price,
    pub qty: i64,
    #[serde(rename = "direction")]
    pub side: OrderSide,
    pub order_type: OrderType,
}

impl NewOrder {
    /// Build a resting limit order.
    pub fn limit(
        account: impl Into<String>,
        venue: impl Into<String>,
        stock: impl Into<String>,
        side: OrderSide,
        price: Price,
        qty: i64,
    ) -> Self {
        Self {
            account: account.into(),
            venue: venue.into(),
            stock: stock.into(),
            price,
            qty,
            side,
            order_type: OrderType::Limit,
        }
    }
}

/// Source of last-trade snapshots.
pub trait MarketDataClient: Send + Sync {
    /// Fetch the latest quote (last trade price and timestamp) for a symbol.
    fn quote<'a>(&'a self, venue: &'a str, symbol: &'a str)
        -> BoxFuture<'a, ClientResult<MarketQuote>>;
}

/// Order entry and order status reads.
pub trait OrderService: Send + Sync {
    /// Place an order. For limit orders a successful response always carries
    /// an order id, even if nothing filled yet.
    fn place_order<'a>(&'a self, order: &'a NewOrder) -> BoxFuture<'a, ClientResult<OrderStatus>>;

    /// Read the current status of an order, including the full fills list.
    fn order_status<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>>;

    /// Cancel an order. Cancelling an already-closed order reports
    /// `open == false` rather than failing.
    fn cancel_order<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>>;
}
