//! The quoting loop.
//!
//! One iteration: reconcile both sides, read the last trade, refresh the
//! estimate, log the status line, then re-quote the bid and the ask.
//! Iterations never overlap; the loop sleeps between them and backs off
//! on failures.

use std::time::Duration;

use sfmm_client::{backoff_delay, MarketDataClient, OrderService};
use sfmm_core::OrderSide;
use sfmm_mm::{
    compute_quotes, MakerConfig, MakerError, OrderLifecycleManager, SideOutcome, TraderState,
};
use sfmm_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{AppError, AppResult};

const SIDES: [OrderSide; 2] = [OrderSide::Buy, OrderSide::Sell];

/// Result of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Every step succeeded.
    Clean,
    /// A side hit a business or invariant error and was skipped.
    Degraded,
    /// Market data failed or a transport error outlived the retries; the
    /// rest of the iteration was abandoned.
    Failed,
}

/// Owns the trader state and drives iterations against `S`.
pub struct Scheduler<S> {
    services: S,
    manager: OrderLifecycleManager,
    maker: MakerConfig,
    config: SchedulerConfig,
    state: TraderState,
    consecutive_failures: u32,
}

impl<S> Scheduler<S>
where
    S: MarketDataClient + OrderService,
{
    pub fn new(
        services: S,
        manager: OrderLifecycleManager,
        maker: MakerConfig,
        config: SchedulerConfig,
    ) -> Self {
        let state = TraderState::new(&maker);
        Self {
            services,
            manager,
            maker,
            config,
            state,
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> &TraderState {
        &self.state
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run a single iteration.
    pub async fn run_iteration(&mut self) -> IterationOutcome {
        let mut degraded = false;
        let mut skip = [false; 2];

        // 1. Reconcile fills on both resting orders.
        for (i, side) in SIDES.into_iter().enumerate() {
            let (side_state, inventory) = self.state.side_and_inventory(side);
            match self.manager.refresh(&self.services, side_state, inventory).await {
                Ok(summary) => {
                    if !summary.is_empty() {
                        Metrics::fills_applied(side.quote_label(), summary.applied);
                    }
                }
                Err(e) if e.is_transport() => return fail_side(side, e),
                Err(e) => {
                    degrade_side(side, &e);
                    degraded = true;
                    skip[i] = true;
                }
            }
        }

        // 2. Market data.
        let quote = match self
            .services
            .quote(self.manager.venue(), self.manager.symbol())
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                error!(error = %e, "Quote read failed, abandoning iteration");
                Metrics::iteration_failure(MakerError::from(e).kind());
                return IterationOutcome::Failed;
            }
        };

        // 3. Estimate.
        if quote.last.is_positive() {
            self.state.last_trade = quote.last;
        }
        if let Some(estimate) = self.state.estimator.observe(quote.last) {
            debug!(last = %quote.last, estimate = %estimate, "Price estimate updated");
            Metrics::price_estimate(estimate.cents());
        }

        // 4. Operator status line.
        self.log_status();

        // 5. Re-quote bid, then ask. Each side sees the position as left by
        //    the previous side's reconciliation.
        for (i, side) in SIDES.into_iter().enumerate() {
            if skip[i] {
                continue;
            }
            let estimate = self.state.estimator.estimate();
            let quotes = compute_quotes(estimate, self.state.inventory.position, &self.maker);
            let desired = *quotes.side(side);

            let (side_state, inventory) = self.state.side_and_inventory(side);
            match self
                .manager
                .requote(&self.services, side_state, &desired, inventory)
                .await
            {
                Ok(outcome) => record_side_outcome(side, &outcome),
                Err(e) if e.is_transport() => return fail_side(side, e),
                Err(e) => {
                    degrade_side(side, &e);
                    degraded = true;
                }
            }
        }

        if degraded {
            IterationOutcome::Degraded
        } else {
            IterationOutcome::Clean
        }
    }

    fn log_status(&self) {
        let line = self.state.status_line();
        Metrics::inventory(line.position, line.cash, line.nav);
        info!(
            cash = line.cash,
            position = line.position,
            nav = line.nav,
            bid_qty = line.bid_qty,
            bid_price = %line.bid_price,
            ask_qty = line.ask_qty,
            ask_price = %line.ask_price,
            last = %line.last,
            "{line}"
        );
    }

    /// Update the failure counter and pick the sleep before the next
    /// iteration. Errors once the failure threshold is reached.
    pub fn record_outcome(&mut self, outcome: IterationOutcome) -> AppResult<Duration> {
        if outcome == IterationOutcome::Clean {
            self.consecutive_failures = 0;
            return Ok(Duration::from_millis(self.config.min_iteration_interval_ms));
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.config.max_consecutive_failures {
            return Err(AppError::TooManyFailures {
                consecutive: self.consecutive_failures,
            });
        }
        let delay = backoff_delay(
            self.config.error_backoff_base_ms,
            self.config.error_backoff_max_ms,
            self.consecutive_failures,
        );
        warn!(
            ?outcome,
            consecutive = self.consecutive_failures,
            delay_ms = delay.as_millis() as u64,
            "Iteration not clean, backing off"
        );
        Ok(delay)
    }

    /// Loop until Ctrl-C or too many consecutive failures.
    pub async fn run(&mut self) -> AppResult<()> {
        info!(
            venue = self.manager.venue(),
            symbol = self.manager.symbol(),
            "Entering quoting loop"
        );

        loop {
            let outcome = self.run_iteration().await;
            let delay = match self.record_outcome(outcome) {
                Ok(delay) => delay,
                Err(e) => {
                    error!(error = %e, "Quoting loop stopped");
                    self.log_status();
                    return Err(e);
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.log_status();
        Ok(())
    }
}

fn fail_side(side: OrderSide, e: MakerError) -> IterationOutcome {
    error!(
        side = side.quote_label(),
        error = %e,
        "Transport failure after retries, abandoning iteration"
    );
    Metrics::iteration_failure(e.kind());
    IterationOutcome::Failed
}

fn degrade_side(side: OrderSide, e: &MakerError) {
    error!(
        side = side.quote_label(),
        kind = e.kind(),
        error = %e,
        "Side skipped this iteration"
    );
    Metrics::iteration_failure(e.kind());
}

fn record_side_outcome(side: OrderSide, outcome: &SideOutcome) {
    let label = side.quote_label();
    if !outcome.fills.is_empty() {
        Metrics::fills_applied(label, outcome.fills.applied);
    }
    if outcome.cancelled.is_some() {
        Metrics::order_cancelled(label);
    }
    if outcome.placed.is_some() {
        Metrics::order_placed(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfmm_client::MockExchange;

    fn scheduler(max_failures: u32) -> Scheduler<MockExchange> {
        Scheduler::new(
            MockExchange::new("TESTEX", "FOOBAR"),
            OrderLifecycleManager::new("TESTEX", "FOOBAR", "EXB123456"),
            MakerConfig::default(),
            SchedulerConfig {
                min_iteration_interval_ms: 250,
                error_backoff_base_ms: 100,
                error_backoff_max_ms: 1_000,
                max_consecutive_failures: max_failures,
            },
        )
    }

    #[test]
    fn test_clean_resets_counter() {
        let mut s = scheduler(5);
        s.record_outcome(IterationOutcome::Failed).unwrap();
        s.record_outcome(IterationOutcome::Degraded).unwrap();
        assert_eq!(s.consecutive_failures(), 2);

        let delay = s.record_outcome(IterationOutcome::Clean).unwrap();
        assert_eq!(delay, Duration::from_millis(250));
        assert_eq!(s.consecutive_failures(), 0);
    }

    #[test]
    fn test_backoff_grows_with_failures() {
        let mut s = scheduler(10);
        let d1 = s.record_outcome(IterationOutcome::Failed).unwrap();
        let d2 = s.record_outcome(IterationOutcome::Failed).unwrap();
        let d3 = s.record_outcome(IterationOutcome::Failed).unwrap();
        assert!((100..200).contains(&d1.as_millis()));
        assert!((200..300).contains(&d2.as_millis()));
        assert!((400..500).contains(&d3.as_millis()));
    }

    #[test]
    fn test_threshold_stops_loop() {
        let mut s = scheduler(3);
        s.record_outcome(IterationOutcome::Failed).unwrap();
        s.record_outcome(IterationOutcome::Degraded).unwrap();
        let err = s.record_outcome(IterationOutcome::Failed).unwrap_err();
        assert!(matches!(err, AppError::TooManyFailures { consecutive: 3 }));
    }
}
