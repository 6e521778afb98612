//! In-memory exchange rates.
//!
//! Useful offline and in tests: rates are loaded once (typically from the
//! `[provider.fixed_rates]` table of the configuration file) and never
//! change afterwards.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use super::provider::{ConversionError, ExchangeRateProvider};
use crate::CurrencyCode;

/// Provider answering from a fixed `(from, to) -> rate` table.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::CurrencyCode;
/// use tax_core::rates::FixedRateProvider;
///
/// let mut provider = FixedRateProvider::new();
/// provider
///     .add_rate(CurrencyCode::USD, CurrencyCode::PLN, dec!(4.00))
///     .unwrap();
///
/// assert_eq!(
///     provider.lookup(&CurrencyCode::PLN, &CurrencyCode::USD),
///     Some(dec!(0.25))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    rates: HashMap<(CurrencyCode, CurrencyCode), Decimal>,
    /// Answer `(to, from)` with the reciprocal of a stored `(from, to)` rate.
    auto_inverse: bool,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
            auto_inverse: true,
        }
    }

    pub fn without_inverse() -> Self {
        Self {
            auto_inverse: false,
            ..Self::new()
        }
    }

    /// Builds a provider whose rates all convert into `target`.
    pub fn into_currency<I>(
        target: CurrencyCode,
        rates: I,
    ) -> Result<Self, ConversionError>
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        let mut provider = Self::new();
        for (source, rate) in rates {
            provider.add_rate(source, target, rate)?;
        }
        Ok(provider)
    }

    /// Stores a rate, replacing any previous rate for the same pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Provider`] if `rate` is not positive.
    pub fn add_rate(
        &mut self,
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    ) -> Result<(), ConversionError> {
        if rate <= Decimal::ZERO {
            return Err(ConversionError::Provider(format!(
                "rate for {from}/{to} must be positive, got {rate}"
            )));
        }
        self.rates.insert((from, to), rate);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Exact pair first, then the reciprocal of the inverse pair.
    pub fn lookup(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<Decimal> {
        if let Some(rate) = self.rates.get(&(*from, *to)) {
            return Some(*rate);
        }
        if self.auto_inverse {
            return self
                .rates
                .get(&(*to, *from))
                .map(|inverse| Decimal::ONE / *inverse);
        }
        None
    }
}

impl Default for FixedRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        let rate = self
            .lookup(from, to)
            .ok_or_else(|| ConversionError::InvalidCurrencyCode(from.to_string()))?;
        debug!(%from, %to, %rate, "fixed rate lookup");
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn usd_to_pln() -> FixedRateProvider {
        FixedRateProvider::into_currency(CurrencyCode::PLN, [(CurrencyCode::USD, dec!(4.00))])
            .unwrap()
    }

    #[tokio::test]
    async fn returns_stored_rate() {
        let provider = usd_to_pln();

        let rate = provider.rate(&CurrencyCode::USD, &CurrencyCode::PLN).await;

        assert_eq!(rate, Ok(dec!(4.00)));
    }

    #[tokio::test]
    async fn returns_reciprocal_for_inverse_pair() {
        let provider = usd_to_pln();

        let rate = provider.rate(&CurrencyCode::PLN, &CurrencyCode::USD).await;

        assert_eq!(rate, Ok(dec!(0.25)));
    }

    #[tokio::test]
    async fn inverse_lookup_can_be_disabled() {
        let mut provider = FixedRateProvider::without_inverse();
        provider
            .add_rate(CurrencyCode::USD, CurrencyCode::PLN, dec!(4.00))
            .unwrap();

        let rate = provider.rate(&CurrencyCode::PLN, &CurrencyCode::USD).await;

        assert_eq!(
            rate,
            Err(ConversionError::InvalidCurrencyCode("PLN".to_string()))
        );
    }

    #[tokio::test]
    async fn unknown_pair_is_invalid_currency_code() {
        let provider = usd_to_pln();

        let rate = provider.rate(&CurrencyCode::EUR, &CurrencyCode::PLN).await;

        assert_eq!(
            rate,
            Err(ConversionError::InvalidCurrencyCode("EUR".to_string()))
        );
    }

    #[test]
    fn add_rate_rejects_non_positive_rates() {
        let mut provider = FixedRateProvider::new();

        assert!(provider
            .add_rate(CurrencyCode::USD, CurrencyCode::PLN, dec!(0))
            .is_err());
        assert!(provider
            .add_rate(CurrencyCode::USD, CurrencyCode::PLN, dec!(-3.9))
            .is_err());
        assert!(provider.is_empty());
    }

    #[test]
    fn add_rate_replaces_existing_pair() {
        let mut provider = usd_to_pln();
        provider
            .add_rate(CurrencyCode::USD, CurrencyCode::PLN, dec!(3.80))
            .unwrap();

        assert_eq!(provider.len(), 1);
        assert_eq!(
            provider.lookup(&CurrencyCode::USD, &CurrencyCode::PLN),
            Some(dec!(3.80))
        );
    }
}
