//! In-memory scripted venue implementing both service traits.
//!
//! Tests drive it from the outside: set the last trade price, fill resting
//! orders, queue failures for specific operations, then inspect the call log.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::ready;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sfmm_core::{Fill, MarketQuote, OrderId, OrderSide, OrderStatus, OrderType, Price};

use crate::error::{ClientError, ClientResult};
use crate::service::{BoxFuture, MarketDataClient, NewOrder, OrderService};

/// Operation selector for injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Quote,
    Place,
    Status,
    Cancel,
}

/// Recorded call, in arrival order. Failed attempts are recorded too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Quote,
    Place {
        side: OrderSide,
        price: Price,
        qty: i64,
    },
    Status(OrderId),
    Cancel(OrderId),
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    last: Price,
    last_trade: Option<DateTime<Utc>>,
    orders: BTreeMap<OrderId, OrderStatus>,
    calls: Vec<MockCall>,
    failures: HashMap<MockOp, VecDeque<ClientError>>,
    /// When set, cancels are acknowledged but the order stays open.
    ignore_cancels: bool,
}

impl MockState {
    fn take_failure(&mut self, op: MockOp) -> Option<ClientError> {
        self.failures.get_mut(&op).and_then(VecDeque::pop_front)
    }

    fn order(&self, id: OrderId) -> ClientResult<OrderStatus> {
        self.orders
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::Business(format!("No order with id {id}")))
    }
}

/// Mock exchange for tests.
pub struct MockExchange {
    venue: String,
    symbol: String,
    state: Mutex<MockState>,
}

impl MockExchange {
    pub fn new(venue: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
            state: Mutex::new(MockState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Print a trade at `price`.
    pub fn set_last_price(&self, price: Price) {
        let mut state = self.state.lock();
        state.last = price;
        state.last_trade = Some(Utc::now());
    }

    /// Queue an error for the next call of `op`. Queued errors are consumed
    /// one per call, in order.
    pub fn inject_failure(&self, op: MockOp, error: ClientError) {
        self.state.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Make cancels leave orders open (a misbehaving venue).
    pub fn set_ignore_cancels(&self, ignore: bool) {
        self.state.lock().ignore_cancels = ignore;
    }

    /// Execute `qty` of order `id` at `price`. The order closes once fully
    /// filled. Returns false for unknown or closed orders.
    pub fn fill(&self, id: OrderId, price: Price, qty: i64, filled_at: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        let Some(order) = state.orders.get_mut(&id) else {
            return false;
        };
        if !order.open {
            return false;
        }
        let qty = qty.min(order.qty);
        order.fills.push(Fill::new(price, qty, filled_at));
        order.total_filled += qty;
        order.qty -= qty;
        if order.qty == 0 {
            order.open = false;
        }
        true
    }

    /// Close an order without a fill (e.g. an IOC remainder).
    pub fn close(&self, id: OrderId) {
        if let Some(order) = self.state.lock().orders.get_mut(&id) {
            order.open = false;
            order.qty = 0;
        }
    }

    /// Orders on `side` still open on the book.
    pub fn open_orders(&self, side: OrderSide) -> Vec<OrderStatus> {
        self.state
            .lock()
            .orders
            .values()
            .filter(|o| o.open && o.side == side)
            .cloned()
            .collect()
    }

    /// Snapshot of a single order.
    pub fn order(&self, id: OrderId) -> Option<OrderStatus> {
        self.state.lock().orders.get(&id).cloned()
    }

    /// Call log since creation or the last `clear_calls`.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn do_quote(&self) -> ClientResult<MarketQuote> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::Quote);
        if let Some(err) = state.take_failure(MockOp::Quote) {
            return Err(err);
        }
        Ok(MarketQuote {
            venue: self.venue.clone(),
            symbol: self.symbol.clone(),
            last: state.last,
            last_trade: state.last_trade,
            quote_time: Some(Utc::now()),
            ..Default::default()
        })
    }

    fn do_place(&self, order: &NewOrder) -> ClientResult<OrderStatus> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::Place {
            side: order.side,
            price: order.price,
            qty: order.qty,
        });
        if let Some(err) = state.take_failure(MockOp::Place) {
            return Err(err);
        }
        if order.qty <= 0 {
            return Err(ClientError::Business(format!("invalid qty {}", order.qty)));
        }
        if order.order_type == OrderType::Limit && !order.price.is_positive() {
            return Err(ClientError::Business(format!("invalid price {}", order.price)));
        }

        let id = OrderId(state.next_id);
        state.next_id += 1;
        let status = OrderStatus {
            id,
            venue: order.venue.clone(),
            symbol: order.stock.clone(),
            account: order.account.clone(),
            side: order.side,
            order_type: order.order_type,
            price: order.price,
            original_qty: order.qty,
            qty: order.qty,
            total_filled: 0,
            open: true,
            fills: Vec::new(),
            placed_at: Some(Utc::now()),
        };
        state.orders.insert(id, status.clone());
        Ok(status)
    }

    fn do_status(&self, id: OrderId) -> ClientResult<OrderStatus> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::Status(id));
        if let Some(err) = state.take_failure(MockOp::Status) {
            return Err(err);
        }
        state.order(id)
    }

    fn do_cancel(&self, id: OrderId) -> ClientResult<OrderStatus> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::Cancel(id));
        if let Some(err) = state.take_failure(MockOp::Cancel) {
            return Err(err);
        }
        let ignore = state.ignore_cancels;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| ClientError::Business(format!("No order with id {id}")))?;
        if !ignore {
            order.open = false;
            order.qty = 0;
        }
        Ok(order.clone())
    }
}

impl MarketDataClient for MockExchange {
    fn quote<'a>(&'a self, _venue: &'a str, _symbol: &'a str) -> BoxFuture<'a, ClientResult<MarketQuote>> {
        Box::pin(ready(self.do_quote()))
    }
}

impl OrderService for MockExchange {
    fn place_order<'a>(&'a self, order: &'a NewOrder) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(ready(self.do_place(order)))
    }

    fn order_status<'a>(
        &'a self,
        _venue: &'a str,
        _symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(ready(self.do_status(id)))
    }

    fn cancel_order<'a>(
        &'a self,
        _venue: &'a str,
        _symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(ready(self.do_cancel(id)))
    }
}
