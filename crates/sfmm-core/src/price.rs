//! Integer-cent price type.
//!
//! The exchange quotes every price in integer minor-currency units. Keeping
//! prices as `i64` cents end to end makes quote computation reproducible
//! bit-for-bit and keeps done/filled comparisons exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Price in integer cents.
///
/// Wraps `i64` to prevent mixing prices with quantities in calculations.
/// `Price::ZERO` doubles as "no price" (no trade yet, estimate uninitialized).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[inline]
    pub fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Notional value of `qty` units at this price, in cents.
    #[inline]
    pub fn notional(&self, qty: i64) -> i64 {
        self.0 * qty
    }
}

/// Format a signed cent amount as dollars, e.g. `-293000` -> `-2930.00`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_cents(self.0))
    }
}

impl FromStr for Price {
    type Err = CoreError;

    /// Parse a dollar amount (`"94.5"`, `"$94.50"`, `"94"`) into cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let invalid = || CoreError::InvalidPrice(s.to_string());

        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty()
            || whole.starts_with('-')
            || frac.len() > 2
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        Ok(Self(whole * 100 + frac_cents))
    }
}

impl From<i64> for Price {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for Price {
    type Output = i64;

    fn mul(self, rhs: i64) -> Self::Output {
        self.0 * rhs
    }
}
