use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rates::ConversionError;

/// Three-letter ISO 4217 currency code, stored upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Polish zloty, the default home currency.
    pub const PLN: CurrencyCode = CurrencyCode(*b"PLN");
    pub const USD: CurrencyCode = CurrencyCode(*b"USD");
    pub const EUR: CurrencyCode = CurrencyCode(*b"EUR");
    pub const GBP: CurrencyCode = CurrencyCode(*b"GBP");

    /// Parses a currency code, trimming whitespace and normalising to upper case.
    ///
    /// Only the shape of the code is checked here. Whether a provider actually
    /// supports it is decided at conversion time.
    pub fn parse(code: &str) -> Result<Self, ConversionError> {
        let trimmed = code.trim();
        let bytes = trimmed.as_bytes();

        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(ConversionError::InvalidCurrencyCode(trimmed.to_string()));
        }

        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters ever reach the array.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::PLN
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}
