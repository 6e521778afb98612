//! Flat-rate income tax.
//!
//! Every salary is taxed at the same rate, with no brackets, no deduction and
//! no state carried between calls.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_decimal_macros::dec;
//! use tax_core::CurrencyCode;
//! use tax_core::calculations::{FlatRateCalculator, TaxCalculator};
//! use tax_core::rates::{CurrencyConverter, FixedRateProvider};
//!
//! let converter = CurrencyConverter::new(Arc::new(FixedRateProvider::new()), CurrencyCode::PLN);
//! let mut calculator = FlatRateCalculator::with_defaults(converter);
//!
//! assert_eq!(calculator.calculate_tax_home(dec!(5000)), Ok(dec!(950)));
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CalculatorConfigError;
use super::{TaxCalculator, TaxError};
use super::common::is_fraction;
use crate::rates::CurrencyConverter;

/// Parameters of the flat-rate policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatRateConfig {
    /// Rate applied to every home-currency amount, as a fraction (0.19 = 19%).
    pub tax_rate: Decimal,
}

impl FlatRateConfig {
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

    /// Builds a configuration from a percentage (`19` for 19%).
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::calculations::FlatRateConfig;
    ///
    /// assert_eq!(FlatRateConfig::from_percent(dec!(19)).tax_rate, dec!(0.19));
    /// ```
    pub fn from_percent(percent: Decimal) -> Self {
        Self {
            tax_rate: percent / Decimal::ONE_HUNDRED,
        }
    }

    /// # Errors
    ///
    /// [`CalculatorConfigError::InvalidTaxRate`] if `tax_rate` is not in `[0, 1]`.
    pub fn validate(&self) -> Result<(), CalculatorConfigError> {
        if !is_fraction(self.tax_rate) {
            return Err(CalculatorConfigError::InvalidTaxRate(self.tax_rate));
        }
        Ok(())
    }
}

impl Default for FlatRateConfig {
    fn default() -> Self {
        Self {
            tax_rate: Self::DEFAULT_TAX_RATE,
        }
    }
}

/// Stateless single-rate calculator.
#[derive(Debug, Clone)]
pub struct FlatRateCalculator {
    config: FlatRateConfig,
    converter: CurrencyConverter,
}

impl FlatRateCalculator {
    /// # Errors
    ///
    /// Returns the first [`CalculatorConfigError`] found in `config`.
    pub fn new(
        config: FlatRateConfig,
        converter: CurrencyConverter,
    ) -> Result<Self, CalculatorConfigError> {
        config.validate()?;
        Ok(Self { config, converter })
    }

    /// A 19% calculator.
    pub fn with_defaults(converter: CurrencyConverter) -> Self {
        Self {
            config: FlatRateConfig::default(),
            converter,
        }
    }

    pub fn tax_rate(&self) -> Decimal {
        self.config.tax_rate
    }
}

#[async_trait]
impl TaxCalculator for FlatRateCalculator {
    fn policy_name(&self) -> &'static str {
        "flat"
    }

    fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    fn tax_on_home_amount(
        &mut self,
        amount: Decimal,
    ) -> Result<Decimal, TaxError> {
        let tax = amount
            .checked_mul(self.config.tax_rate)
            .ok_or(TaxError::IncomeOverflow(amount))?;
        debug!(%amount, rate = %self.config.tax_rate, %tax, "flat rate tax");
        Ok(tax)
    }

    fn reset_fiscal_year(&mut self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::rates::ConversionError;
    use crate::testing::{RecordingProvider, pln_converter};
    use crate::{CurrencyCode, SalaryEntry};

    fn calculator_at(
        rate: Decimal,
        provider: &Arc<RecordingProvider>,
    ) -> FlatRateCalculator {
        FlatRateCalculator::new(FlatRateConfig { tax_rate: rate }, pln_converter(provider)).unwrap()
    }

    // =========================================================================
    // Configuration tests
    // =========================================================================

    #[test]
    fn default_rate_is_nineteen_percent() {
        assert_eq!(FlatRateConfig::default().tax_rate, dec!(0.19));
    }

    #[test]
    fn from_percent_converts_to_fraction() {
        assert_eq!(FlatRateConfig::from_percent(dec!(12.5)).tax_rate, dec!(0.125));
    }

    #[test]
    fn validate_accepts_zero_and_one() {
        assert_eq!(FlatRateConfig { tax_rate: dec!(0) }.validate(), Ok(()));
        assert_eq!(FlatRateConfig { tax_rate: dec!(1) }.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_percentage_passed_as_fraction() {
        assert_eq!(
            FlatRateConfig { tax_rate: dec!(19) }.validate(),
            Err(CalculatorConfigError::InvalidTaxRate(dec!(19)))
        );
    }

    #[test]
    fn new_rejects_negative_rate() {
        let provider = Arc::new(RecordingProvider::default());

        let result =
            FlatRateCalculator::new(FlatRateConfig { tax_rate: dec!(-0.1) }, pln_converter(&provider));

        assert_eq!(
            result.err(),
            Some(CalculatorConfigError::InvalidTaxRate(dec!(-0.1)))
        );
    }

    #[test]
    fn deserializes_with_default_rate() {
        let config: FlatRateConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, FlatRateConfig::default());
    }

    // =========================================================================
    // Single salary tests
    // =========================================================================

    #[test]
    fn home_amount_is_taxed_at_rate_and_floored() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        for (amount, expected) in [
            (dec!(0), dec!(0)),
            (dec!(1), dec!(0)),
            (dec!(5000), dec!(950)),
            (dec!(5001), dec!(950)),
            (dec!(100000), dec!(19000)),
            (dec!(1234.56), dec!(234)),
        ] {
            assert_eq!(calculator.calculate_tax_home(amount), Ok(expected), "amount {amount}");
        }
    }

    #[tokio::test]
    async fn home_currency_never_reaches_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let result = calculator.calculate_tax(dec!(5000), &CurrencyCode::PLN).await;

        assert_eq!(result, Ok(dec!(950)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn foreign_salary_is_converted_before_taxing() {
        let provider = Arc::new(RecordingProvider::with_rate(CurrencyCode::USD, dec!(4)));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let result = calculator.calculate_tax(dec!(1000), &CurrencyCode::USD).await;

        assert_eq!(result, Ok(dec!(760)));
        assert_eq!(provider.calls(), vec![(CurrencyCode::USD, CurrencyCode::PLN)]);
    }

    #[tokio::test]
    async fn negative_salary_fails_without_conversion() {
        let provider = Arc::new(RecordingProvider::with_rate(CurrencyCode::USD, dec!(4)));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let result = calculator.calculate_tax(dec!(-100), &CurrencyCode::USD).await;

        assert_eq!(result, Err(TaxError::InvalidSalary(dec!(-100))));
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn negative_home_salary_fails() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        assert_eq!(
            calculator.calculate_tax_home(dec!(-0.01)),
            Err(TaxError::InvalidSalary(dec!(-0.01)))
        );
    }

    #[tokio::test]
    async fn conversion_errors_propagate() {
        let provider = Arc::new(RecordingProvider::failing(ConversionError::InvalidCredential));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let result = calculator.calculate_tax(dec!(100), &CurrencyCode::EUR).await;

        assert_eq!(
            result,
            Err(TaxError::Conversion(ConversionError::InvalidCredential))
        );
    }

    #[test]
    fn zero_rate_always_yields_zero() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = calculator_at(dec!(0), &provider);

        assert_eq!(calculator.calculate_tax_home(dec!(1000000)), Ok(dec!(0)));
    }

    #[test]
    fn repeated_calls_are_independent() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let first = calculator.calculate_tax_home(dec!(100000));
        let second = calculator.calculate_tax_home(dec!(100000));
        calculator.reset_fiscal_year();
        let third = calculator.calculate_tax_home(dec!(100000));

        assert_eq!(first, Ok(dec!(19000)));
        assert_eq!(second, first);
        assert_eq!(third, first);
    }

    // =========================================================================
    // Batch tests
    // =========================================================================

    #[tokio::test]
    async fn batch_floors_only_the_total() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = calculator_at(dec!(0.1), &provider);
        let salaries = [
            SalaryEntry::new(dec!(6), CurrencyCode::PLN),
            SalaryEntry::new(dec!(6), CurrencyCode::PLN),
        ];

        let batch = calculator.calculate_batch(&salaries).await;
        let first = calculator.calculate_tax_home(dec!(6));
        let second = calculator.calculate_tax_home(dec!(6));

        assert_eq!(batch, Ok(dec!(1)));
        assert_eq!(first, Ok(dec!(0)));
        assert_eq!(second, Ok(dec!(0)));
    }

    #[tokio::test]
    async fn batch_mixes_currencies() {
        let provider = Arc::new(RecordingProvider::with_rate(CurrencyCode::USD, dec!(4)));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));
        let salaries = [
            SalaryEntry::new(dec!(1000), CurrencyCode::USD),
            SalaryEntry::new(dec!(5000), CurrencyCode::PLN),
        ];

        let result = calculator.calculate_batch(&salaries).await;

        // 4000 * 0.19 + 5000 * 0.19
        assert_eq!(result, Ok(dec!(1710)));
        assert_eq!(provider.calls(), vec![(CurrencyCode::USD, CurrencyCode::PLN)]);
    }

    #[tokio::test]
    async fn batch_with_negative_entry_makes_no_provider_calls() {
        let provider = Arc::new(RecordingProvider::with_rate(CurrencyCode::USD, dec!(4)));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));
        let salaries = [
            SalaryEntry::new(dec!(1000), CurrencyCode::USD),
            SalaryEntry::new(dec!(-5), CurrencyCode::PLN),
        ];

        let result = calculator.calculate_batch(&salaries).await;

        assert_eq!(result, Err(TaxError::InvalidSalary(dec!(-5))));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_owes_nothing() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        assert_eq!(calculator.calculate_batch(&[]).await, Ok(dec!(0)));
    }

    #[test]
    fn largest_home_salary_is_taxed() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = calculator_at(dec!(1), &provider);

        assert_eq!(calculator.calculate_tax_home(Decimal::MAX), Ok(Decimal::MAX));
    }

    #[tokio::test]
    async fn overflowing_conversion_fails_cleanly() {
        let provider = Arc::new(RecordingProvider::with_rate(CurrencyCode::USD, dec!(4)));
        let mut calculator = FlatRateCalculator::with_defaults(pln_converter(&provider));

        let result = calculator.calculate_tax(Decimal::MAX, &CurrencyCode::USD).await;

        assert!(matches!(
            result,
            Err(TaxError::Conversion(ConversionError::Provider(_)))
        ));
    }

    #[tokio::test]
    async fn batch_whose_total_overflows_fails() {
        let provider = Arc::new(RecordingProvider::default());
        let mut calculator = calculator_at(dec!(1), &provider);
        let salaries = [
            SalaryEntry::new(Decimal::MAX, CurrencyCode::PLN),
            SalaryEntry::new(dec!(1), CurrencyCode::PLN),
        ];

        let result = calculator.calculate_batch(&salaries).await;

        assert_eq!(result, Err(TaxError::IncomeOverflow(dec!(1))));
    }
}
