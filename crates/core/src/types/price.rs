//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores prices as `DECIMAL(10, 2)` and sends them as plain JSON
//! numbers. Keeping them as [`Decimal`] on the client avoids the rounding
//! drift a float sum would accumulate over a cart.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit or line price in the shop's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).amount(), Decimal::new(1999, 2));
        assert_eq!(Price::from_cents(-550).amount(), Decimal::new(-550, 2));
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(1000).times(2), Price::from_cents(550).times(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(2550));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_cents(2550).to_string(), "$25.50");
        assert_eq!(Price::new(Decimal::from(3)).to_string(), "$3.00");
    }

    #[test]
    fn test_deserializes_json_number() {
        let price: Price = serde_json::from_str("199.99").unwrap();
        assert_eq!(price, Price::from_cents(19999));
        assert_eq!(serde_json::to_string(&price).unwrap(), "199.99");
    }
}
