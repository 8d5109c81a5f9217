//! Per-side order lifecycle: cancel a stale quote, place a fresh one.
//!
//! # State per side
//!
//! ```text
//! Empty ──place──▶ Open ──(price moved) cancel + status──▶ Closed
//!   ▲                │                                      │
//!   │                └──(fully filled, seen on a read)──────┤
//!   └───────────────────────── next requote ◀───────────────┘
//! ```
//!
//! At most one open order per side: a new order is only placed once the
//! previous one has been observed closed.

use sfmm_client::{NewOrder, OrderService};
use sfmm_core::{OrderId, OrderSide, OrderStatus, Price};
use tracing::{debug, info, warn};

use crate::error::{MakerError, MakerResult};
use crate::inventory::{FillLedger, InventoryState};
use crate::quote_engine::SideQuote;
use crate::reconciler::{FillReconciler, ReconcileSummary};

/// Everything the loop owns for one side.
#[derive(Debug, Clone)]
pub struct SideState {
    side: OrderSide,
    /// Latest status of the most recent order on this side, open or not.
    live: Option<OrderStatus>,
    ledger: FillLedger,
    /// Set while the side is not quoting because the band is exhausted.
    band_blocked: bool,
}

impl SideState {
    pub fn new(side: OrderSide) -> Self {
        Self {
            side,
            live: None,
            ledger: FillLedger::new(side),
            band_blocked: false,
        }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Latest known status of the side's order.
    pub fn live(&self) -> Option<&OrderStatus> {
        self.live.as_ref()
    }

    /// The side's order, if it is still resting.
    pub fn open_order(&self) -> Option<&OrderStatus> {
        self.live.as_ref().filter(|o| o.open)
    }

    pub fn ledger(&self) -> &FillLedger {
        &self.ledger
    }

    /// `(remaining qty, limit price)` for the operator status line.
    pub fn display_quote(&self) -> (i64, Price) {
        self.live
            .as_ref()
            .map(|o| (o.remaining(), o.price))
            .unwrap_or((0, Price::ZERO))
    }
}

/// What a requote did on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideOutcome {
    pub cancelled: Option<OrderId>,
    pub placed: Option<OrderId>,
    /// Open order left in place because its price is still current.
    pub held: Option<OrderId>,
    pub fills: ReconcileSummary,
}

/// Drives place/cancel/status calls for one instrument.
#[derive(Debug, Clone)]
pub struct OrderLifecycleManager {
    venue: String,
    symbol: String,
    account: String,
}

impl OrderLifecycleManager {
    pub fn new(
        venue: impl Into<String>,
        symbol: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            venue: venue.into(),
            symbol: symbol.into(),
            account: account.into(),
        }
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Store a status read for this side and apply its new fills.
    ///
    /// The status is stored even when reconciliation rejects it: the order
    /// exists on the venue and must stay tracked so the side is not quoted
    /// twice.
    fn observe(
        &self,
        state: &mut SideState,
        status: OrderStatus,
        inventory: &mut InventoryState,
    ) -> MakerResult<ReconcileSummary> {
        let live = state.live.insert(status);
        FillReconciler::reconcile(live, &mut state.ledger, inventory)
    }

    async fn fetch_and_observe<S>(
        &self,
        svc: &S,
        state: &mut SideState,
        id: OrderId,
        inventory: &mut InventoryState,
    ) -> MakerResult<ReconcileSummary>
    where
        S: OrderService + ?Sized,
    {
        let status = svc.order_status(&self.venue, &self.symbol, id).await?;
        if status.id != id {
            return Err(MakerError::Invariant(format!(
                "status read for order {id} returned order {}",
                status.id
            )));
        }
        self.observe(state, status, inventory)
    }

    /// Poll the side's open order, if any, and apply new fills.
    pub async fn refresh<S>(
        &self,
        svc: &S,
        state: &mut SideState,
        inventory: &mut InventoryState,
    ) -> MakerResult<ReconcileSummary>
    where
        S: OrderService + ?Sized,
    {
        match state.open_order().map(|o| o.id) {
            Some(id) => self.fetch_and_observe(svc, state, id, inventory).await,
            None => Ok(ReconcileSummary::default()),
        }
    }

    /// Bring the side in line with `desired`.
    ///
    /// 1. An open order at a different price is cancelled, then its status
    ///    is re-read; it must be closed before anything else happens.
    /// 2. With no open order, a placeable quote is sent as a limit order and
    ///    its status re-read.
    ///
    /// Every status read on the way is reconciled, so fills that land between
    /// the last poll and the cancel are not lost.
    pub async fn requote<S>(
        &self,
        svc: &S,
        state: &mut SideState,
        desired: &SideQuote,
        inventory: &mut InventoryState,
    ) -> MakerResult<SideOutcome>
    where
        S: OrderService + ?Sized,
    {
        if desired.side != state.side {
            return Err(MakerError::Invariant(format!(
                "{} quote routed to the {} side",
                desired.side, state.side
            )));
        }

        let mut outcome = SideOutcome::default();
        let side = state.side.quote_label();

        if let Some(open) = state.open_order() {
            let id = open.id;
            if open.price == desired.price {
                outcome.held = Some(id);
                return Ok(outcome);
            }

            info!(
                side,
                order_id = %id,
                old_price = %open.price,
                new_price = %desired.price,
                "Cancelling stale quote"
            );
            let cancelled = svc.cancel_order(&self.venue, &self.symbol, id).await?;
            outcome.fills.merge(self.observe(state, cancelled, inventory)?);
            outcome
                .fills
                .merge(self.fetch_and_observe(svc, state, id, inventory).await?);

            if state.open_order().is_some() {
                return Err(MakerError::Invariant(format!(
                    "{side} order {id} still open after cancel"
                )));
            }
            outcome.cancelled = Some(id);
        }

        if !desired.is_placeable() {
            if desired.qty <= 0 && !state.band_blocked {
                warn!(
                    side,
                    position = inventory.position,
                    qty = desired.qty,
                    "Inventory band reached, side stops quoting"
                );
            } else {
                debug!(side, price = %desired.price, qty = desired.qty, "Nothing to quote");
            }
            state.band_blocked = desired.qty <= 0;
            return Ok(outcome);
        }
        state.band_blocked = false;

        let order = NewOrder::limit(
            self.account.as_str(),
            self.venue.as_str(),
            self.symbol.as_str(),
            state.side,
            desired.price,
            desired.qty,
        );
        let placed = svc.place_order(&order).await?;
        let id = placed.id;
        outcome.fills.merge(self.observe(state, placed, inventory)?);
        outcome
            .fills
            .merge(self.fetch_and_observe(svc, state, id, inventory).await?);
        outcome.placed = Some(id);

        info!(
            side,
            order_id = %id,
            price = %desired.price,
            qty = desired.qty,
            "Quote placed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sfmm_client::{BoxFuture, ClientError, ClientResult, MockCall, MockExchange, MockOp};
    use tokio_test::{assert_err, assert_ok};

    /// Venue whose place response reports more filled than ordered.
    struct OverfilledPlaceAck(MockExchange);

    impl OrderService for OverfilledPlaceAck {
        fn place_order<'a>(
            &'a self,
            order: &'a NewOrder,
        ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
            Box::pin(async move {
                let mut status = self.0.place_order(order).await?;
                status.total_filled = status.original_qty + 1;
                Ok(status)
            })
        }

        fn order_status<'a>(
            &'a self,
            venue: &'a str,
            symbol: &'a str,
            id: OrderId,
        ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
            self.0.order_status(venue, symbol, id)
        }

        fn cancel_order<'a>(
            &'a self,
            venue: &'a str,
            symbol: &'a str,
            id: OrderId,
        ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
            self.0.cancel_order(venue, symbol, id)
        }
    }

    fn manager() -> OrderLifecycleManager {
        OrderLifecycleManager::new("TESTEX", "FOOBAR", "EXB123456")
    }

    fn bid(price: i64, qty: i64) -> SideQuote {
        SideQuote {
            side: OrderSide::Buy,
            price: Price(price),
            qty,
        }
    }

    #[tokio::test]
    async fn test_places_when_empty() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();

        let outcome = manager()
            .requote(&mock, &mut state, &bid(9400, 225), &mut inv)
            .await
            .unwrap();

        let id = outcome.placed.unwrap();
        assert_eq!(state.open_order().unwrap().id, id);
        assert_eq!(state.display_quote(), (225, Price(9400)));
        assert_eq!(
            mock.calls(),
            vec![
                MockCall::Place {
                    side: OrderSide::Buy,
                    price: Price(9400),
                    qty: 225
                },
                MockCall::Status(id),
            ]
        );
    }

    #[tokio::test]
    async fn test_holds_when_price_unchanged() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        mgr.requote(&mock, &mut state, &bid(9400, 225), &mut inv).await.unwrap();
        mock.clear_calls();
        let outcome = mgr
            .requote(&mock, &mut state, &bid(9400, 200), &mut inv)
            .await
            .unwrap();

        assert!(outcome.held.is_some());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_replace() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        let first = mgr
            .requote(&mock, &mut state, &bid(9400, 225), &mut inv)
            .await
            .unwrap()
            .placed
            .unwrap();
        mock.clear_calls();

        let outcome = mgr
            .requote(&mock, &mut state, &bid(9500, 225), &mut inv)
            .await
            .unwrap();

        assert_eq!(outcome.cancelled, Some(first));
        let second = outcome.placed.unwrap();
        let calls = mock.calls();
        assert_eq!(calls[0], MockCall::Cancel(first));
        assert_eq!(calls[1], MockCall::Status(first));
        assert!(matches!(calls[2], MockCall::Place { price: Price(9500), .. }));
        assert_eq!(mock.open_orders(OrderSide::Buy).len(), 1);
        assert_eq!(mock.open_orders(OrderSide::Buy)[0].id, second);
    }

    #[tokio::test]
    async fn test_fill_racing_cancel_is_applied() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        let id = mgr
            .requote(&mock, &mut state, &bid(9400, 225), &mut inv)
            .await
            .unwrap()
            .placed
            .unwrap();
        mock.fill(id, Price(9400), 25, Utc::now());

        let outcome = mgr
            .requote(&mock, &mut state, &bid(9300, 225), &mut inv)
            .await
            .unwrap();

        assert_eq!(outcome.fills.applied, 1);
        assert_eq!(inv.position, 25);
        assert_eq!(inv.cash, -235_000);
    }

    #[tokio::test]
    async fn test_still_open_after_cancel_is_invariant() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        mgr.requote(&mock, &mut state, &bid(9400, 225), &mut inv).await.unwrap();
        mock.set_ignore_cancels(true);

        let err = mgr
            .requote(&mock, &mut state, &bid(9300, 225), &mut inv)
            .await
            .unwrap_err();

        assert!(matches!(err, MakerError::Invariant(_)));
        // nothing new placed while the old order is open
        assert_eq!(mock.open_orders(OrderSide::Buy).len(), 1);
    }

    #[tokio::test]
    async fn test_band_exhausted_side_not_placed() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState {
            position: 900,
            cash: 0,
        };

        let outcome = manager()
            .requote(&mock, &mut state, &bid(9000, 0), &mut inv)
            .await
            .unwrap();

        assert_eq!(outcome, SideOutcome::default());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_skips_closed_orders() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        let id = mgr
            .requote(&mock, &mut state, &bid(9400, 100), &mut inv)
            .await
            .unwrap()
            .placed
            .unwrap();
        mock.fill(id, Price(9400), 100, Utc::now());

        let summary = mgr.refresh(&mock, &mut state, &mut inv).await.unwrap();
        assert_eq!(summary.applied, 1);
        assert!(state.open_order().is_none());
        assert_eq!(state.display_quote(), (0, Price(9400)));

        mock.clear_calls();
        mgr.refresh(&mock, &mut state, &mut inv).await.unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_business_error_on_place_leaves_side_empty() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        mock.inject_failure(MockOp::Place, ClientError::Business("bad account".into()));
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();

        let err = manager()
            .requote(&mock, &mut state, &bid(9400, 225), &mut inv)
            .await
            .unwrap_err();

        assert!(!err.is_transport());
        assert!(state.live().is_none());
    }

    #[tokio::test]
    async fn test_wrong_side_quote_rejected() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        let mut state = SideState::new(OrderSide::Sell);
        let mut inv = InventoryState::new();

        let err = manager()
            .requote(&mock, &mut state, &bid(9400, 225), &mut inv)
            .await
            .unwrap_err();
        assert!(matches!(err, MakerError::Invariant(_)));
    }

    #[tokio::test]
    async fn test_rejected_place_ack_keeps_order_tracked() {
        let venue = OverfilledPlaceAck(MockExchange::new("TESTEX", "FOOBAR"));
        let mut state = SideState::new(OrderSide::Buy);
        let mut inv = InventoryState::new();
        let mgr = manager();

        let err = assert_err!(mgr.requote(&venue, &mut state, &bid(9400, 225), &mut inv).await);
        assert!(matches!(err, MakerError::Invariant(_)));
        let placed = venue.0.open_orders(OrderSide::Buy);
        assert_eq!(placed.len(), 1);
        assert_eq!(state.open_order().map(|o| o.id), Some(placed[0].id));
        assert_eq!(inv, InventoryState::new());

        // the next cycle re-reads the tracked order instead of placing again
        assert_ok!(mgr.refresh(&venue, &mut state, &mut inv).await);
        let outcome = assert_ok!(mgr.requote(&venue, &mut state, &bid(9400, 225), &mut inv).await);
        assert_eq!(outcome.held, Some(placed[0].id));
        assert_eq!(venue.0.open_orders(OrderSide::Buy).len(), 1);
    }
}
