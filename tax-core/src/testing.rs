//! Test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::CurrencyCode;
use crate::rates::{ConversionError, CurrencyConverter, ExchangeRateProvider};

/// Provider that answers from a source-keyed table and records every lookup.
#[derive(Default)]
pub struct RecordingProvider {
    rates: HashMap<CurrencyCode, Decimal>,
    failure: Option<ConversionError>,
    calls: Mutex<Vec<(CurrencyCode, CurrencyCode)>>,
}

impl RecordingProvider {
    pub fn with_rate(
        source: CurrencyCode,
        rate: Decimal,
    ) -> Self {
        Self::default().and_rate(source, rate)
    }

    pub fn and_rate(
        mut self,
        source: CurrencyCode,
        rate: Decimal,
    ) -> Self {
        self.rates.insert(source, rate);
        self
    }

    pub fn failing(error: ConversionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(CurrencyCode, CurrencyCode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeRateProvider for RecordingProvider {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        self.calls.lock().unwrap().push((*from, *to));

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.rates
            .get(from)
            .copied()
            .ok_or_else(|| ConversionError::InvalidCurrencyCode(from.to_string()))
    }
}

/// PLN-home converter over `provider`.
pub fn pln_converter(provider: &Arc<RecordingProvider>) -> CurrencyConverter {
    CurrencyConverter::new(provider.clone(), CurrencyCode::PLN)
}
