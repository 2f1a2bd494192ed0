//! Monetary amounts using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount with its ISO 4217 currency code.
///
/// Amounts are kept as [`Decimal`] to preserve precision; the commerce API
/// serializes them as JSON numbers or strings depending on the field, both of
/// which `rust_decimal` accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD", "EUR").
    pub currency: String,
}

impl Money {
    /// Create a new monetary amount.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Currency symbol for well-known codes, falling back to the code itself.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self.currency.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => "$",
            "EUR" => "\u{20ac}",
            "GBP" => "\u{a3}",
            "JPY" => "\u{a5}",
            "PLN" => "z\u{142}",
            "SEK" | "NOK" | "DKK" => "kr",
            "CHF" => "CHF",
            other => other,
        }
    }

    /// Format for display (e.g., "$ 19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {}", self.symbol(), self.amount)
    }
}

/// A money amount split into net, gross and tax parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxedMoney {
    /// Amount without taxes.
    pub net: Money,
    /// Amount with taxes included.
    pub gross: Money,
    /// Tax amount (gross - net).
    pub tax: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        let money = Money::new(Decimal::new(1999, 2), "USD");
        assert_eq!(money.display(), "$ 19.99");

        let money = Money::new(Decimal::new(550, 2), "EUR");
        assert_eq!(money.display(), "\u{20ac} 5.50");
    }

    #[test]
    fn test_money_unknown_currency_falls_back_to_code() {
        let money = Money::new(Decimal::new(100, 0), "XDR");
        assert_eq!(money.display(), "XDR 100");
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero("USD");
        assert!(money.is_zero());
        assert!(!Money::new(Decimal::new(1, 2), "USD").is_zero());
    }
}
