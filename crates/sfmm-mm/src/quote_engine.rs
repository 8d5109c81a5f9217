//! Quote price and size calculation.
//!
//! Computes bid/ask from:
//! - the fair-value estimate
//! - inventory weight `w = position / band` (not clamped)
//!
//! `bid = floor(E * (bid_base - skew * w))`, `ask = floor(E * (ask_base - skew * w))`,
//! `bid_qty = (band - position) / size_divisor`, `ask_qty = (band + position) / size_divisor`.
//! All arithmetic is exact `Decimal` or `i64`, so equal inputs give equal quotes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sfmm_core::{OrderSide, Price};

use crate::config::MakerConfig;

/// Desired resting order for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideQuote {
    pub side: OrderSide,
    pub price: Price,
    /// May be zero or negative past the inventory band; never placed then.
    pub qty: i64,
}

impl SideQuote {
    /// Whether this quote should rest on the book.
    pub fn is_placeable(&self) -> bool {
        self.qty > 0 && self.price.is_positive()
    }
}

/// Computed quotes for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePair {
    pub bid: SideQuote,
    pub ask: SideQuote,
}

impl QuotePair {
    pub fn side(&self, side: OrderSide) -> &SideQuote {
        match side {
            OrderSide::Buy => &self.bid,
            OrderSide::Sell => &self.ask,
        }
    }
}

/// Calculate both quotes for an estimate and a position.
///
/// Pure: no side effects and no failure mode. An uninitialized estimate
/// yields zero prices, which are never placed.
pub fn compute_quotes(estimate: Price, position: i64, config: &MakerConfig) -> QuotePair {
    let band = config.inventory_band;
    let divisor = config.size_divisor.max(1);

    QuotePair {
        bid: SideQuote {
            side: OrderSide::Buy,
            price: skewed_price(estimate, position, config.bid_base, config),
            qty: band.saturating_sub(position) / divisor,
        },
        ask: SideQuote {
            side: OrderSide::Sell,
            price: skewed_price(estimate, position, config.ask_base, config),
            qty: band.saturating_add(position) / divisor,
        },
    }
}

/// `floor(E * (base * band - skew * position) / band)`.
///
/// A result outside the i64 range comes back as zero, which is never placed.
fn skewed_price(estimate: Price, position: i64, base: Decimal, config: &MakerConfig) -> Price {
    let band = Decimal::from(config.inventory_band.max(1));
    let raw = config
        .skew
        .checked_mul(Decimal::from(position))
        .and_then(|skew| (base * band).checked_sub(skew))
        .and_then(|factor| Decimal::from(estimate.cents()).checked_mul(factor))
        .and_then(|v| v.checked_div(band))
        .and_then(|v| v.floor().to_i64());
    raw.map(Price).unwrap_or(Price::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(estimate: i64, position: i64) -> QuotePair {
        compute_quotes(Price(estimate), position, &MakerConfig::default())
    }

    #[test]
    fn test_flat_inventory() {
        let q = quote(10000, 0);
        assert_eq!(q.bid.price, Price(9400));
        assert_eq!(q.bid.qty, 225);
        assert_eq!(q.ask.price, Price(10400));
        assert_eq!(q.ask.qty, 225);
    }

    #[test]
    fn test_full_long_inventory() {
        let q = quote(10000, 900);
        assert_eq!(q.ask.price, Price(10000));
        assert_eq!(q.ask.qty, 450);
        assert_eq!(q.bid.qty, 0);
        assert!(!q.bid.is_placeable());
    }

    #[test]
    fn test_full_short_inventory() {
        let q = quote(10000, -900);
        assert_eq!(q.ask.qty, 0);
        assert_eq!(q.bid.qty, 450);
        assert_eq!(q.bid.price, Price(9800));
        assert!(!q.ask.is_placeable());
    }

    #[test]
    fn test_bid_below_ask_within_band() {
        for estimate in [1, 7, 99, 5000, 10000, 123_457, 9_999_999] {
            for position in (-900..=900).step_by(37) {
                let q = quote(estimate, position);
                assert!(
                    q.bid.price < q.ask.price,
                    "E={estimate} p={position}: {:?}",
                    q
                );
            }
        }
    }

    #[test]
    fn test_prices_truncate_down() {
        // 1234 * 0.94 = 1159.96
        assert_eq!(quote(1234, 0).bid.price, Price(1159));
        // 1234 * (0.94 - 0.04 / 900) = 1159.905..
        assert_eq!(quote(1234, 1).bid.price, Price(1159));
        // 1234 * 1.04 = 1283.36
        assert_eq!(quote(1234, 0).ask.price, Price(1283));
    }

    #[test]
    fn test_sizes_truncate_toward_zero() {
        assert_eq!(quote(10000, 1).bid.qty, 224);
        assert_eq!(quote(10000, 1).ask.qty, 225);
        assert_eq!(quote(10000, 903).bid.qty, 0);
        assert_eq!(quote(10000, 905).bid.qty, -1);
    }

    #[test]
    fn test_extreme_positions_do_not_overflow() {
        let q = quote(10000, i64::MAX);
        assert_eq!(q.ask.qty, i64::MAX / 4);
        assert!(!q.bid.is_placeable());

        let q = quote(10000, i64::MIN);
        assert_eq!(q.bid.qty, i64::MAX / 4);
        assert!(!q.ask.is_placeable());
    }

    #[test]
    fn test_uninitialized_estimate_never_placeable() {
        let q = quote(0, 0);
        assert!(!q.bid.is_placeable());
        assert!(!q.ask.is_placeable());
    }

    #[test]
    fn test_reproducible() {
        assert_eq!(quote(10037, -313), quote(10037, -313));
    }
}
