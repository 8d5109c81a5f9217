//! Market making configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quoting parameters.
///
/// Prices come out as `floor(E * (base - skew * position / band))` and sizes
/// as `(band -/+ position) / size_divisor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Smoothing factor for the fair-value estimate, in [0, 1].
    /// 0 tracks the last trade exactly; values near 1 barely move.
    #[serde(default = "default_alpha")]
    pub alpha: Decimal,

    /// Soft inventory band in shares. Quote size on the side that would
    /// extend the position reaches zero at +/- band.
    #[serde(default = "default_inventory_band")]
    pub inventory_band: i64,

    /// Bid price as a fraction of the estimate when flat.
    #[serde(default = "default_bid_base")]
    pub bid_base: Decimal,

    /// Ask price as a fraction of the estimate when flat.
    #[serde(default = "default_ask_base")]
    pub ask_base: Decimal,

    /// Price shift per unit of inventory weight (position / band).
    /// Long inventory pushes both quotes down.
    #[serde(default = "default_skew")]
    pub skew: Decimal,

    /// Divisor turning remaining band capacity into order size.
    #[serde(default = "default_size_divisor")]
    pub size_divisor: i64,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            inventory_band: default_inventory_band(),
            bid_base: default_bid_base(),
            ask_base: default_ask_base(),
            skew: default_skew(),
            size_divisor: default_size_divisor(),
        }
    }
}

fn default_alpha() -> Decimal {
    Decimal::ZERO
}
fn default_inventory_band() -> i64 {
    900
}
fn default_bid_base() -> Decimal {
    Decimal::new(94, 2) // 0.94
}
fn default_ask_base() -> Decimal {
    Decimal::new(104, 2) // 1.04
}
fn default_skew() -> Decimal {
    Decimal::new(4, 2) // 0.04
}
fn default_size_divisor() -> i64 {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = MakerConfig::default();
        assert_eq!(config.alpha, dec!(0));
        assert_eq!(config.inventory_band, 900);
        assert_eq!(config.bid_base, dec!(0.94));
        assert_eq!(config.ask_base, dec!(1.04));
        assert_eq!(config.skew, dec!(0.04));
        assert_eq!(config.size_divisor, 4);
    }

    #[test]
    fn test_config_serde_defaults() {
        let toml_str = r#"
            alpha = "0.25"
            inventory_band = 500
        "#;
        let config: MakerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.alpha, dec!(0.25));
        assert_eq!(config.inventory_band, 500);
        assert_eq!(config.bid_base, dec!(0.94));
        assert_eq!(config.size_divisor, 4);
    }
}
