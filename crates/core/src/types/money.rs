//! Decimal money amounts.
//!
//! The app deals in a single currency, so `Money` is just a non-float decimal
//! with the handful of operations order and coupon math needs.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
}

/// A money amount.
///
/// Serializes as a decimal string (`"15.00"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a number of cents (`1500` is `15.00`).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a stored or client-supplied amount.
    ///
    /// Accepts a leading currency sign (`¥`, `￥`, `$`) and thousands separators.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or not a decimal number.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let trimmed = s
            .trim()
            .trim_start_matches(['¥', '￥', '$'])
            .trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        let cleaned = trimmed.replace(',', "");
        Decimal::from_str(&cleaned)
            .map(Self)
            .map_err(|_| MoneyError::Invalid(s.to_owned()))
    }

    /// Parse an optional amount, treating missing or malformed input as zero.
    #[must_use]
    pub fn parse_or_zero(s: Option<&str>) -> Self {
        s.and_then(|s| Self::parse(s).ok()).unwrap_or_default()
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity, saturating at the decimal range.
    #[must_use]
    pub fn times(self, quantity: i64) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Subtract, flooring the result at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        let diff = self.0.saturating_sub(rhs.0);
        if diff.is_sign_negative() {
            Self::ZERO
        } else {
            Self(diff)
        }
    }

    /// Format with exactly two decimal places.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
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
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_prefixed() {
        assert_eq!(Money::parse("199").unwrap(), Money::from_cents(19900));
        assert_eq!(Money::parse("¥29.90").unwrap(), Money::from_cents(2990));
        assert_eq!(Money::parse(" 1,299.5 ").unwrap(), Money::from_cents(129_950));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Money::parse("  "), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("abc"), Err(MoneyError::Invalid(_))));
        assert_eq!(Money::parse_or_zero(Some("n/a")), Money::ZERO);
        assert_eq!(Money::parse_or_zero(None), Money::ZERO);
    }

    #[test]
    fn test_subtotal_and_discount() {
        let subtotal: Money = [(Money::from_cents(1000), 2), (Money::from_cents(250), 3)]
            .into_iter()
            .map(|(price, qty)| price.times(qty))
            .sum();
        assert_eq!(subtotal, Money::from_cents(2750));
        assert_eq!(
            subtotal.saturating_sub(Money::from_cents(1500)),
            Money::from_cents(1250)
        );
        assert_eq!(
            Money::from_cents(500).saturating_sub(Money::from_cents(1500)),
            Money::ZERO
        );
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.times(i64::MAX), Money::new(Decimal::MAX));
        assert_eq!(huge + huge, Money::new(Decimal::MAX));
        assert_eq!(Money::new(Decimal::MIN).saturating_sub(huge), Money::ZERO);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(Money::parse("12.5").unwrap().to_fixed(), "12.50");
        assert_eq!(Money::ZERO.to_fixed(), "0.00");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Money::from_cents(1500)).unwrap();
        assert_eq!(json, "\"15.00\"");
    }
}
