use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use super::aggregate;
use super::common::{ensure_non_negative, floor_to_unit};
use crate::rates::{ConversionError, CurrencyConverter};
use crate::{CurrencyCode, SalaryEntry};

/// Errors returned by tax calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaxError {
    /// A salary amount was negative.
    #[error("salary cannot be less than 0, got {0}")]
    InvalidSalary(Decimal),

    /// Taking the salary would push income past what `Decimal` can hold.
    #[error("salary {0} pushes income beyond the supported range")]
    IncomeOverflow(Decimal),

    /// Converting a salary into the home currency failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors raised when a calculator is built from invalid parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculatorConfigError {
    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),

    #[error("first bracket rate must be between 0 and 1, got {0}")]
    InvalidFirstBracketRate(Decimal),

    #[error("second bracket rate must be between 0 and 1, got {0}")]
    InvalidSecondBracketRate(Decimal),

    #[error("first bracket ceiling must be positive, got {0}")]
    InvalidBracketCeiling(Decimal),

    #[error("deductible tax limit must be non-negative, got {0}")]
    InvalidDeductionLimit(Decimal),
}

/// A tax policy applied to salaries paid in any currency.
///
/// Implementors supply the per-amount rule ([`tax_on_home_amount`]) and their
/// fiscal-year reset; conversion, validation, batching and flooring are shared
/// by the provided methods.
///
/// Methods that may advance fiscal-year state take `&mut self`. Callers sharing
/// a calculator must serialise access to it.
///
/// [`tax_on_home_amount`]: TaxCalculator::tax_on_home_amount
#[async_trait]
pub trait TaxCalculator: Send {
    /// Short policy name used in logs and CLI output.
    fn policy_name(&self) -> &'static str;

    fn converter(&self) -> &CurrencyConverter;

    /// Unrounded tax on a non-negative home-currency amount.
    ///
    /// Stateful policies advance their fiscal-year state here, and only once
    /// the amount is known to fit; an error leaves the state untouched.
    ///
    /// # Errors
    ///
    /// [`TaxError::IncomeOverflow`] if the amount cannot be taken.
    fn tax_on_home_amount(
        &mut self,
        amount: Decimal,
    ) -> Result<Decimal, TaxError>;

    /// Checks that `additional_income` can be taxed this fiscal year without
    /// overflowing any running total. Stateless policies accept anything.
    ///
    /// # Errors
    ///
    /// [`TaxError::IncomeOverflow`] carrying `additional_income`.
    fn ensure_capacity(
        &self,
        _additional_income: Decimal,
    ) -> Result<(), TaxError> {
        Ok(())
    }

    /// Starts a new fiscal year, clearing any accumulated state.
    fn reset_fiscal_year(&mut self);

    /// Tax on a salary already in the home currency, floored.
    ///
    /// # Errors
    ///
    /// [`TaxError::InvalidSalary`] if `amount` is negative.
    fn calculate_tax_home(
        &mut self,
        amount: Decimal,
    ) -> Result<Decimal, TaxError> {
        ensure_non_negative(amount)?;
        Ok(floor_to_unit(self.tax_on_home_amount(amount)?))
    }

    /// Tax on a salary paid in `currency`, floored.
    ///
    /// The amount is validated before any conversion is attempted.
    ///
    /// # Errors
    ///
    /// [`TaxError::InvalidSalary`] for a negative amount, any
    /// [`ConversionError`] from the provider, or [`TaxError::IncomeOverflow`]
    /// when the converted amount is too large to take.
    async fn calculate_tax(
        &mut self,
        amount: Decimal,
        currency: &CurrencyCode,
    ) -> Result<Decimal, TaxError> {
        ensure_non_negative(amount)?;
        let converter = self.converter().clone();
        let home_amount = converter.to_home(amount, currency).await?;
        Ok(floor_to_unit(self.tax_on_home_amount(home_amount)?))
    }

    /// Total tax on salaries paid in several currencies.
    ///
    /// Per-entry tax is summed unrounded and only the total is floored.
    /// Entries are taxed in list order. On any error nothing is returned and
    /// no fiscal-year state has changed.
    ///
    /// # Errors
    ///
    /// [`TaxError::InvalidSalary`] if any entry is negative (checked before any
    /// conversion), otherwise the first [`ConversionError`]. A batch whose
    /// home-currency total cannot be taken fails with
    /// [`TaxError::IncomeOverflow`] before the policy sees any entry.
    async fn calculate_batch(
        &mut self,
        salaries: &[SalaryEntry],
    ) -> Result<Decimal, TaxError> {
        let converter = self.converter().clone();
        let home_amounts = aggregate::convert_to_home(&converter, salaries).await?;
        self.ensure_capacity(aggregate::total_income(&home_amounts)?)?;
        let tax_due =
            aggregate::sum_unrounded(&home_amounts, |amount| self.tax_on_home_amount(amount))?;
        Ok(floor_to_unit(tax_due))
    }
}
