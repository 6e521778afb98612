use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::CurrencyCode;

/// The three ways a currency conversion can fail.
///
/// Providers map whatever their backend reports (status codes, error bodies,
/// transport failures) onto exactly these variants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The currency code is malformed or not supported by the provider.
    #[error("invalid currency code '{0}'")]
    InvalidCurrencyCode(String),

    /// The provider rejected the credential (wrong, expired or inactive key).
    #[error("exchange rate provider rejected the API key")]
    InvalidCredential,

    /// Any other provider or transport failure.
    #[error("exchange rate provider error: {0}")]
    Provider(String),
}

/// Source of conversion rates between two currencies.
///
/// `rate(from, to)` returns a positive multiplier such that
/// `amount_in_to = amount_in_from * rate`.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, ConversionError>;
}
