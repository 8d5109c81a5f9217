//! Order-related types and identifiers.
//!
//! Provides order side, order type and the exchange-assigned order ID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Order side: buy or sell.
///
/// Serialized as the venue's `direction` field (`"buy"` / `"sell"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }

    /// Quote-side label used in logs and metrics.
    pub fn quote_label(&self) -> &'static str {
        match self {
            Self::Buy => "bid",
            Self::Sell => "ask",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "bid" => Ok(Self::Buy),
            "sell" | "ask" => Ok(Self::Sell),
            _ => Err(CoreError::InvalidSide(s.to_string())),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    /// Resting limit order (the only type the quoting loop uses).
    #[default]
    Limit,
    /// Market order; the price field is ignored by the venue.
    Market,
    /// Fill completely at the limit price or not at all.
    FillOrKill,
    /// Fill what is available immediately, cancel the rest.
    ImmediateOrCancel,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::Market => write!(f, "market"),
            Self::FillOrKill => write!(f, "fill-or-kill"),
            Self::ImmediateOrCancel => write!(f, "immediate-or-cancel"),
        }
    }
}

impl FromStr for OrderType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "limit" => Ok(Self::Limit),
            "market" => Ok(Self::Market),
            "fill-or-kill" | "fok" => Ok(Self::FillOrKill),
            "immediate-or-cancel" | "ioc" => Ok(Self::ImmediateOrCancel),
            _ => Err(CoreError::InvalidOrderType(s.to_string())),
        }
    }
}

/// Exchange-assigned order ID.
///
/// Opaque to the agent; only used to address status reads and cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_order_side_sign() {
        assert_eq!(OrderSide::Buy.sign(), 1);
        assert_eq!(OrderSide::Sell.sign(), -1);
    }

    #[test]
    fn test_order_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderType::FillOrKill).unwrap(),
            r#""fill-or-kill""#
        );
        assert_eq!(
            serde_json::to_string(&OrderType::ImmediateOrCancel).unwrap(),
            r#""immediate-or-cancel""#
        );
        let parsed: OrderType = serde_json::from_str(r#""limit""#).unwrap();
        assert_eq!(parsed, OrderType::Limit);
    }

    #[test]
    fn test_parse_from_cli_strings() {
        assert_eq!("BUY".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("ask".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert_eq!("ioc".parse::<OrderType>().unwrap(), OrderType::ImmediateOrCancel);
        assert!("short".parse::<OrderSide>().is_err());
        assert!("stop".parse::<OrderType>().is_err());
    }
}
