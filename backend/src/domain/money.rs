//! Monetary amounts held in minor units (cents).

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Validation errors for monetary input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must not be empty")]
    Empty,
    #[error("amount must be a non-negative decimal with at most two fractional digits")]
    Malformed,
    #[error("amount is too large")]
    Overflow,
}

/// Non-negative amount of money in cents.
///
/// Rendered as a decimal string with two fractional digits, e.g. `"1000.00"`.
///
/// # Examples
/// ```
/// use agroai::domain::Money;
///
/// let price = Money::parse("1000.5").unwrap();
/// assert_eq!(price.cents(), 100_050);
/// assert_eq!(price.to_string(), "1000.50");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = String, example = "1000.00")]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct from minor units; negative values are rejected.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Malformed);
        }
        Ok(Self(cents))
    }

    /// Construct from whole currency units.
    pub fn from_units(units: i64) -> Result<Self, MoneyError> {
        units
            .checked_mul(100)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::from_cents)
    }

    /// Construct from a whole-unit amount that cannot overflow.
    #[must_use]
    pub const fn from_whole_units(units: u32) -> Self {
        Self(units as i64 * 100)
    }

    /// Parse a decimal string such as `1000`, `1000.5` or `1000.50`.
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }
        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2 {
            return Err(MoneyError::Malformed);
        }
        let units: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| MoneyError::Malformed)? * 10,
            _ => fraction.parse().map_err(|_| MoneyError::Malformed)?,
        };
        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction_cents))
            .ok_or(MoneyError::Overflow)
            .map(Self)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiply by a whole number of days, failing on overflow.
    pub fn checked_times(self, factor: i64) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::from_cents)
    }

    /// Add two amounts, failing on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal amount")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Money, E> {
        Money::parse(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
        let units = i64::try_from(value).map_err(|_| E::custom(MoneyError::Overflow))?;
        Money::from_units(units).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
        Money::from_units(value).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Money, E> {
        // Route through the decimal parser so no float arithmetic touches cents.
        Money::parse(&value.to_string()).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1000", 100_000)]
    #[case("1000.5", 100_050)]
    #[case("1000.05", 100_005)]
    #[case(" 0 ", 0)]
    #[case("0.99", 99)]
    fn parses_decimal_strings(#[case] raw: &str, #[case] cents: i64) {
        assert_eq!(Money::parse(raw).expect("valid amount").cents(), cents);
    }

    #[rstest]
    #[case("", MoneyError::Empty)]
    #[case("-1", MoneyError::Malformed)]
    #[case("1.234", MoneyError::Malformed)]
    #[case(".5", MoneyError::Malformed)]
    #[case("1e3", MoneyError::Malformed)]
    #[case("99999999999999999999", MoneyError::Overflow)]
    fn rejects_invalid_amounts(#[case] raw: &str, #[case] expected: MoneyError) {
        assert_eq!(Money::parse(raw).expect_err("must fail"), expected);
    }

    #[rstest]
    fn multiplication_detects_overflow() {
        let price = Money::from_cents(i64::MAX / 2).expect("valid cents");
        assert_eq!(price.checked_times(3), Err(MoneyError::Overflow));
    }

    #[rstest]
    fn deserialises_strings_and_numbers() {
        let from_str: Money = serde_json::from_str("\"12.50\"").expect("string amount");
        let from_int: Money = serde_json::from_str("12").expect("integer amount");
        let from_float: Money = serde_json::from_str("12.5").expect("float amount");
        assert_eq!(from_str.cents(), 1250);
        assert_eq!(from_int.cents(), 1200);
        assert_eq!(from_float, from_str);
    }

    #[rstest]
    fn serialises_with_two_fractional_digits() {
        let amount = Money::from_units(3000).expect("valid amount");
        assert_eq!(serde_json::to_value(amount).expect("serialise"), "3000.00");
    }
}
