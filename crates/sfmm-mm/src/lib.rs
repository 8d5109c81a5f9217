//! Quoting and fill reconciliation core for sfmm.
//!
//! Provides the single-instrument market making loop pieces:
//! - Fair-value estimate smoothed from last-trade prints
//! - Quote calculation with inventory skew
//! - Quote lifecycle management (place/cancel/replace), one open order per side
//! - Fill reconciliation keyed by fill identity
//!
//! # Architecture
//!
//! ```text
//! Scheduler iteration
//!   ├─ OrderLifecycleManager.refresh()  (bid, ask) ─▶ FillReconciler ─▶ InventoryState
//!   ├─ MarketDataClient.quote()         ─▶ PriceEstimator.observe()
//!   ├─ compute_quotes(estimate, position)
//!   └─ OrderLifecycleManager.requote()  (bid, ask) ─▶ OrderService
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod inventory;
pub mod lifecycle;
pub mod quote_engine;
pub mod reconciler;
pub mod state;

pub use config::MakerConfig;
pub use error::{MakerError, MakerResult};
pub use estimator::PriceEstimator;
pub use inventory::{FillKey, FillLedger, FillWatermark, InventoryState};
pub use lifecycle::{OrderLifecycleManager, SideOutcome, SideState};
pub use quote_engine::{compute_quotes, QuotePair, SideQuote};
pub use reconciler::{FillReconciler, ReconcileSummary};
pub use state::{StatusLine, TraderState};
