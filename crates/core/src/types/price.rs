//! Money amounts using decimal arithmetic.
//!
//! The commerce API quotes every price as a bare number in a single store
//! currency (EGP). Amounts are kept as [`Decimal`] so line totals and cart
//! totals never accumulate floating point drift.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
///
/// Deserializes from either a JSON number or a numeric string.
///
/// ```
/// use freshcart_core::Money;
///
/// let unit = Money::from_major(149);
/// assert_eq!(unit.times(3), Money::from_major(447));
/// assert_eq!(unit.to_string(), "EGP 149.00");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// ISO 4217 code of the store currency.
    pub const CURRENCY_CODE: &'static str = "EGP";

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Amount from whole currency units.
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This amount multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", Self::CURRENCY_CODE, self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Money = serde_json::from_str("149").unwrap();
        let from_string: Money = serde_json::from_str("\"149\"").unwrap();
        assert_eq!(from_number, Money::from_major(149));
        assert_eq!(from_string, Money::from_major(149));
    }

    #[test]
    fn test_sum_of_line_totals() {
        let lines = [Money::from_major(10).times(2), Money::from_major(5).times(3)];
        let total: Money = lines.iter().sum();
        assert_eq!(total, Money::from_major(35));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Money::new(Decimal::new(19_990, 2));
        assert_eq!(price.to_string(), "EGP 199.90");
    }
}
