use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CurrencyCode;

/// A gross salary received in a single currency.
///
/// The amount is not checked on construction; calculators reject negative
/// amounts with [`crate::TaxError::InvalidSalary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryEntry {
    pub amount: Decimal,
    pub currency: CurrencyCode,
}

impl SalaryEntry {
    pub fn new(
        amount: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        Self { amount, currency }
    }
}

impl fmt::Display for SalaryEntry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Errors from parsing a `"<amount>:<code>"` salary string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SalaryParseError {
    #[error("expected '<amount>:<currency>', got '{0}'")]
    MissingCurrency(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("invalid currency code '{0}'")]
    InvalidCurrency(String),
}

impl FromStr for SalaryEntry {
    type Err = SalaryParseError;

    /// Accepts `5000:PLN`, `310.25:usd` or `310.25 USD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (amount, currency) = trimmed
            .split_once(':')
            .or_else(|| trimmed.split_once(char::is_whitespace))
            .ok_or_else(|| SalaryParseError::MissingCurrency(trimmed.to_string()))?;

        let amount = amount
            .trim()
            .parse::<Decimal>()
            .map_err(|_| SalaryParseError::InvalidAmount(amount.trim().to_string()))?;
        let currency = CurrencyCode::parse(currency)
            .map_err(|_| SalaryParseError::InvalidCurrency(currency.trim().to_string()))?;

        Ok(Self { amount, currency })
    }
}
