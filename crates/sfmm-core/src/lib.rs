//! Core domain types for the sfmm market-making agent.
//!
//! This crate provides the types shared by the exchange client and the
//! quoting core:
//! - `Price`: integer-cent price, exact in done/filled comparisons
//! - `OrderSide`, `OrderType`, `OrderId`: order enums and identifiers
//! - `OrderStatus`, `Fill`: exchange-reported order state
//! - `MarketQuote`, `OrderBook`: market data snapshots

pub mod error;
pub mod order;
pub mod price;
pub mod status;
pub mod types;

pub use error::{CoreError, Result};
pub use order::{OrderId, OrderSide, OrderType};
pub use price::{format_cents, Price};
pub use status::{Fill, OrderStatus};
pub use types::{BookLevel, MarketQuote, OrderBook};
