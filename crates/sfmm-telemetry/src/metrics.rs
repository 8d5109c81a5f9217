//! Prometheus metrics for the sfmm quoting loop.
//!
//! Covers:
//! - Inventory (position, cash, NAV)
//! - Fair-value estimate
//! - Fills applied, orders placed and cancelled per side
//! - Iteration failures by kind
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure here means a duplicate
//! metric name, which is a startup-time programming error.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Net position in shares.
pub static POSITION: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("sfmm_position", "Net position in shares").unwrap());

/// Cash in cents.
pub static CASH_CENTS: Lazy<IntGauge> =
    Lazy::new(|| register_int_gauge!("sfmm_cash_cents", "Cash balance in cents").unwrap());

/// Net asset value in cents, marked at the last trade.
pub static NAV_CENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sfmm_nav_cents",
        "Net asset value in cents (position * last + cash)"
    )
    .unwrap()
});

/// Current fair-value estimate in cents.
pub static PRICE_ESTIMATE_CENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sfmm_price_estimate_cents",
        "Smoothed fair-value estimate in cents"
    )
    .unwrap()
});

/// Fills applied to the inventory.
/// Labels: side (bid/ask)
pub static FILLS_APPLIED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "sfmm_fills_applied_total",
        "Fills applied to the inventory",
        &["side"]
    )
    .unwrap()
});

/// Orders placed.
/// Labels: side (bid/ask)
pub static ORDERS_PLACED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("sfmm_orders_placed_total", "Quote orders placed", &["side"])
        .unwrap()
});

/// Orders cancelled.
/// Labels: side (bid/ask)
pub static ORDERS_CANCELLED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "sfmm_orders_cancelled_total",
        "Stale quote orders cancelled",
        &["side"]
    )
    .unwrap()
});

/// Degraded or failed iterations.
/// Labels: kind (transport/business/invariant/config)
pub static ITERATION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "sfmm_iteration_failures_total",
        "Iterations that did not complete cleanly",
        &["kind"]
    )
    .unwrap()
});

/// Metric update facade.
pub struct Metrics;

impl Metrics {
    /// Record inventory after reconciliation.
    pub fn inventory(position: i64, cash: i64, nav: i64) {
        POSITION.set(position);
        CASH_CENTS.set(cash);
        NAV_CENTS.set(nav);
    }

    pub fn price_estimate(cents: i64) {
        PRICE_ESTIMATE_CENTS.set(cents);
    }

    pub fn fills_applied(side: &str, count: usize) {
        FILLS_APPLIED_TOTAL
            .with_label_values(&[side])
            .inc_by(count as u64);
    }

    pub fn order_placed(side: &str) {
        ORDERS_PLACED_TOTAL.with_label_values(&[side]).inc();
    }

    pub fn order_cancelled(side: &str) {
        ORDERS_CANCELLED_TOTAL.with_label_values(&[side]).inc();
    }

    pub fn iteration_failure(kind: &str) {
        ITERATION_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Text exposition of the default registry.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
