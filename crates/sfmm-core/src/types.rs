//! Market data snapshots.
//!
//! The venue has no push feed; these are polled request/response snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::price::Price;

/// Quote snapshot for one symbol.
///
/// Only `last` and `last_trade` feed the estimator; the rest is kept for
/// logging. Every field except venue/symbol may be missing on a quiet book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub bid: Option<Price>,
    #[serde(default)]
    pub ask: Option<Price>,
    #[serde(default)]
    pub bid_size: i64,
    #[serde(default)]
    pub ask_size: i64,
    #[serde(default)]
    pub bid_depth: i64,
    #[serde(default)]
    pub ask_depth: i64,
    /// Last trade price; zero when nothing has traded yet.
    #[serde(default)]
    pub last: Price,
    #[serde(default)]
    pub last_size: i64,
    /// Timestamp of the last trade.
    #[serde(default)]
    pub last_trade: Option<DateTime<Utc>>,
    /// When the venue produced this snapshot.
    #[serde(rename = "quoteTime", default)]
    pub quote_time: Option<DateTime<Utc>>,
}

impl MarketQuote {
    /// Whether a trade has printed yet.
    pub fn has_trade(&self) -> bool {
        self.last.is_positive()
    }
}

/// One resting level of the public order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookLevel {
    pub price: Price,
    pub qty: i64,
    pub is_buy: bool,
}

/// Public order book snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub bids: Option<Vec<BookLevel>>,
    #[serde(default)]
    pub asks: Option<Vec<BookLevel>>,
    #[serde(rename = "ts", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl OrderBook {
    /// Best (highest) bid level.
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.as_ref()?.iter().max_by_key(|l| l.price)
    }

    /// Best (lowest) ask level.
    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.as_ref()?.iter().min_by_key(|l| l.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_quote() {
        let json = r#"{
            "ok": true,
            "symbol": "FAC",
            "venue": "OGEX",
            "bid": 5100,
            "ask": 5125,
            "bidSize": 392,
            "askSize": 711,
            "bidDepth": 2748,
            "askDepth": 2237,
            "last": 5125,
            "lastSize": 52,
            "lastTrade": "2015-07-13T05:38:17.33640392Z",
            "quoteTime": "2015-07-13T05:38:17.33640392Z"
        }"#;
        let quote: MarketQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.last, Price(5125));
        assert_eq!(quote.bid, Some(Price(5100)));
        assert!(quote.last_trade.is_some());
        assert!(quote.has_trade());
    }

    #[test]
    fn test_decode_quote_without_trades() {
        let json = r#"{"ok": true, "symbol": "FAC", "venue": "OGEX", "askSize": 0}"#;
        let quote: MarketQuote = serde_json::from_str(json).unwrap();
        assert!(quote.last.is_zero());
        assert!(!quote.has_trade());
        assert!(quote.bid.is_none());
    }

    #[test]
    fn test_book_best_levels() {
        let json = r#"{
            "venue": "OGEX", "symbol": "FAC",
            "bids": [{"price": 5200, "qty": 10, "isBuy": true},
                     {"price": 5300, "qty": 5, "isBuy": true}],
            "asks": null,
            "ts": "2015-12-04T09:02:16.680986205Z"
        }"#;
        let book: OrderBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.best_bid().unwrap().price, Price(5300));
        assert!(book.best_ask().is_none());
    }
}
