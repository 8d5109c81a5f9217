//! Exchange boundary for the sfmm market-making agent.
//!
//! The quoting core only sees two traits:
//! - `MarketDataClient`: last-trade snapshots on demand
//! - `OrderService`: place, cancel and status reads
//!
//! `StockfighterClient` implements both over the venue's REST API (plus the
//! game-master calls used at bootstrap). `RetryingClient` wraps any
//! implementation with the transport retry policy, and `MockExchange` is an
//! in-memory scripted venue for tests.

pub mod client;
pub mod error;
pub mod gm;
pub mod mock;
pub mod retry;
pub mod service;

pub use client::{ClientConfig, StockfighterClient};
pub use error::{ClientError, ClientResult};
pub use gm::InstanceInfo;
pub use mock::{MockCall, MockExchange, MockOp};
pub use retry::{backoff_delay, RetryPolicy, RetryingClient};
pub use service::{BoxFuture, MarketDataClient, NewOrder, OrderService};
