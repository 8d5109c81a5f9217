//! Polling market-making agent for the Stockfighter simulated exchange.
//!
//! Orchestrates the quoting loop for one instrument:
//! - Fill reconciliation for both resting quotes
//! - Last-trade snapshot and fair-value refresh
//! - Cancel/replace of the bid, then the ask
//! - Operator status line and metrics every iteration

pub mod config;
pub mod error;
pub mod scheduler;

pub use config::{AppConfig, ExchangeConfig, MarketConfig, SchedulerConfig};
pub use error::{AppError, AppResult};
pub use scheduler::{IterationOutcome, Scheduler};
