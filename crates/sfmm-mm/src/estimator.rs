//! Fair-value estimate smoothed from last-trade prints.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sfmm_core::Price;

/// Exponentially smoothed fair value.
///
/// `Price::ZERO` means "not initialized": the first print seeds the estimate,
/// later prints blend in as `alpha * estimate + (1 - alpha) * last`,
/// truncated to whole cents.
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    alpha: Decimal,
    estimate: Price,
    /// Last observed trade price, to skip duplicate snapshots.
    last_seen: Price,
}

impl PriceEstimator {
    pub fn new(alpha: Decimal) -> Self {
        Self {
            alpha,
            estimate: Price::ZERO,
            last_seen: Price::ZERO,
        }
    }

    pub fn estimate(&self) -> Price {
        self.estimate
    }

    pub fn is_initialized(&self) -> bool {
        !self.estimate.is_zero()
    }

    /// Blend one trade price into the estimate and return the new value.
    pub fn update(&mut self, last: Price) -> Price {
        if self.estimate.is_zero() {
            self.estimate = last;
            return self.estimate;
        }

        let blended = self.alpha * Decimal::from(self.estimate.cents())
            + (Decimal::ONE - self.alpha) * Decimal::from(last.cents());
        // to_i64 only fails outside the i64 range
        self.estimate = Price(blended.trunc().to_i64().unwrap_or(last.cents()));
        self.estimate
    }

    /// Feed a snapshot's last-trade price. Only a changed, nonzero print
    /// updates the estimate; returns the new estimate when it did.
    pub fn observe(&mut self, last: Price) -> Option<Price> {
        if last.is_zero() || last == self.last_seen {
            return None;
        }
        self.last_seen = last;
        Some(self.update(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_print_seeds_estimate() {
        let mut est = PriceEstimator::new(dec!(0.5));
        assert!(!est.is_initialized());
        assert_eq!(est.update(Price(5000)), Price(5000));
        assert!(est.is_initialized());
    }

    #[test]
    fn test_alpha_zero_tracks_last_trade() {
        let mut est = PriceEstimator::new(dec!(0));
        est.update(Price(5000));
        for p in [5100, 4900, 7777, 1] {
            assert_eq!(est.update(Price(p)), Price(p));
        }
    }

    #[test]
    fn test_smoothing_truncates() {
        let mut est = PriceEstimator::new(dec!(0.5));
        est.update(Price(1000));
        // 0.5 * 1000 + 0.5 * 1001 = 1000.5
        assert_eq!(est.update(Price(1001)), Price(1000));
        // 0.5 * 1000 + 0.5 * 1003 = 1001.5
        assert_eq!(est.update(Price(1003)), Price(1001));
    }

    #[test]
    fn test_alpha_one_is_static() {
        let mut est = PriceEstimator::new(dec!(1));
        est.update(Price(4000));
        assert_eq!(est.update(Price(9000)), Price(4000));
    }

    #[test]
    fn test_observe_skips_zero_and_duplicates() {
        let mut est = PriceEstimator::new(dec!(0.5));
        assert_eq!(est.observe(Price::ZERO), None);
        assert!(!est.is_initialized());

        assert_eq!(est.observe(Price(1000)), Some(Price(1000)));
        assert_eq!(est.observe(Price(1000)), None);
        assert_eq!(est.observe(Price(1200)), Some(Price(1100)));
        // unchanged print no longer drags the estimate toward it
        assert_eq!(est.observe(Price(1200)), None);
        assert_eq!(est.estimate(), Price(1100));
    }
}
