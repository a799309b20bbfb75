//! Money type with decimal precision and currency.
//!
//! Amounts are `rust_decimal::Decimal`; floating point never touches money.
//! Comparisons that decide whether a payment fits a balance are done in
//! minor units so that sub-cent noise cannot flip the outcome.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g. dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currencies seen on export documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US Dollar
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Pound Sterling
    Gbp,
    /// Indian Rupee
    Inr,
    /// UAE Dirham
    Aed,
    /// Japanese Yen
    Jpy,
}

impl Currency {
    /// Number of decimal places in the minor unit.
    #[must_use]
    pub const fn minor_digits(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Inr => "INR",
            Self::Aed => "AED",
            Self::Jpy => "JPY",
        }
    }
}

/// Rounds a decimal to two places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a two-place amount to integer cents.
///
/// Returns `None` if the value does not fit in an `i64`.
#[must_use]
pub fn to_cents(amount: Decimal) -> Option<i64> {
    let scaled = round_money(amount) * Decimal::ONE_HUNDRED;
    i64::try_from(scaled.trunc()).ok()
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Amount in minor units of its currency.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        let digits = self.currency.minor_digits();
        let rounded = self
            .amount
            .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
        let scale = Decimal::from(10_i64.pow(digits));
        i64::try_from((rounded * scale).trunc()).ok()
    }

    /// Converts into another currency at `rate` (target units per source unit).
    #[must_use]
    pub fn convert(&self, rate: Decimal, target: Currency) -> Self {
        Self {
            amount: round_money(self.amount * rate),
            currency: target,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "INR" => Ok(Self::Inr),
            "AED" => Ok(Self::Aed),
            "JPY" => Ok(Self::Jpy),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Inr);
        assert!(money.is_zero());
        assert!(!money.is_negative());
        assert_eq!(money.currency, Currency::Inr);
    }

    #[test]
    fn test_money_is_negative() {
        assert!(!Money::new(dec!(10), Currency::Usd).is_negative());
        assert!(Money::new(dec!(-10), Currency::Usd).is_negative());
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_money(dec!(2.004)), dec!(2.00));
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(dec!(1234.56)), Some(123_456));
        assert_eq!(to_cents(dec!(0.1) + dec!(0.2)), Some(30));
        assert_eq!(to_cents(dec!(999.999)), Some(100_000));
    }

    #[test]
    fn test_minor_units_respect_currency_digits() {
        assert_eq!(Money::new(dec!(12.34), Currency::Usd).minor_units(), Some(1234));
        assert_eq!(Money::new(dec!(1500.4), Currency::Jpy).minor_units(), Some(1500));
    }

    #[test]
    fn test_convert_rounds_to_two_places() {
        let usd = Money::new(dec!(1000), Currency::Usd);
        let inr = usd.convert(dec!(83.12345), Currency::Inr);
        assert_eq!(inr.amount, dec!(83123.45));
        assert_eq!(inr.currency, Currency::Inr);
    }

    #[test]
    fn test_currency_round_trip_text() {
        for currency in [
            Currency::Usd,
            Currency::Eur,
            Currency::Gbp,
            Currency::Inr,
            Currency::Aed,
            Currency::Jpy,
        ] {
            assert_eq!(Currency::from_str(&currency.to_string()).unwrap(), currency);
        }
        assert_eq!(Currency::from_str("inr").unwrap(), Currency::Inr);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }
}
