//! Prometheus metrics and structured logging for sfmm.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus gauges/counters for inventory, quoting and loop health

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
