use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::provider::{ConversionError, ExchangeRateProvider};
use crate::CurrencyCode;

/// Converts salaries into the home currency through an [`ExchangeRateProvider`].
///
/// Conversions whose source already is the target never reach the provider:
/// a provider round trip through the same currency is not guaranteed to be
/// exactly 1, and it would cost a request.
#[derive(Clone)]
pub struct CurrencyConverter {
    provider: Arc<dyn ExchangeRateProvider>,
    home_currency: CurrencyCode,
}

impl CurrencyConverter {
    pub fn new(
        provider: Arc<dyn ExchangeRateProvider>,
        home_currency: CurrencyCode,
    ) -> Self {
        Self {
            provider,
            home_currency,
        }
    }

    pub fn home_currency(&self) -> &CurrencyCode {
        &self.home_currency
    }

    /// Converts `amount` from `source` into `target`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`ConversionError`]. A non-positive rate, or
    /// a converted amount too large to represent, is reported as
    /// [`ConversionError::Provider`].
    pub async fn convert(
        &self,
        amount: Decimal,
        source: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        if source == target {
            return Ok(amount);
        }

        let rate = self.provider.rate(source, target).await?;
        if rate <= Decimal::ZERO {
            return Err(ConversionError::Provider(format!(
                "non-positive rate {rate} for {source}/{target}"
            )));
        }

        let converted = amount.checked_mul(rate).ok_or_else(|| {
            ConversionError::Provider(format!(
                "{amount} {source} at rate {rate} overflows when converted to {target}"
            ))
        })?;

        debug!(%amount, %source, %target, %rate, "converted amount");
        Ok(converted)
    }

    /// Converts `amount` from `source` into the home currency.
    pub async fn to_home(
        &self,
        amount: Decimal,
        source: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        self.convert(amount, source, &self.home_currency).await
    }
}

impl std::fmt::Debug for CurrencyConverter {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter")
            .field("home_currency", &self.home_currency)
            .finish_non_exhaustive()
    }
}
