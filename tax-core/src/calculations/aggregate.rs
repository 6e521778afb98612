//! Multi-currency salary aggregation shared by every tax policy.
//!
//! A batch runs in three phases so that a failure never leaves a calculator
//! half-updated:
//!
//! 1. every amount is validated,
//! 2. every entry is converted into the home currency, in list order, and
//!    the home-currency total is checked against the policy's capacity,
//! 3. the policy is applied to each home amount, in list order, and the
//!    unrounded results are summed.

use rust_decimal::Decimal;
use tracing::debug;

use super::TaxError;
use super::common::ensure_non_negative;
use crate::SalaryEntry;
use crate::rates::CurrencyConverter;

/// Validates and converts `salaries` into home-currency amounts.
///
/// No provider is called unless every amount is non-negative. Home-currency
/// entries are passed through; every other entry costs one provider call.
///
/// # Errors
///
/// The first [`TaxError::InvalidSalary`], or the first conversion failure.
pub async fn convert_to_home(
    converter: &CurrencyConverter,
    salaries: &[SalaryEntry],
) -> Result<Vec<Decimal>, TaxError> {
    for salary in salaries {
        ensure_non_negative(salary.amount)?;
    }

    let mut home_amounts = Vec::with_capacity(salaries.len());
    for salary in salaries {
        let home_amount = converter.to_home(salary.amount, &salary.currency).await?;
        home_amounts.push(home_amount);
    }

    debug!(
        entries = salaries.len(),
        home_currency = %converter.home_currency(),
        "converted salary batch"
    );
    Ok(home_amounts)
}

/// Total home-currency income of a converted batch.
///
/// # Errors
///
/// [`TaxError::IncomeOverflow`] carrying the entry that no longer fits.
pub fn total_income(home_amounts: &[Decimal]) -> Result<Decimal, TaxError> {
    home_amounts.iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(*amount)
            .ok_or(TaxError::IncomeOverflow(*amount))
    })
}

/// Sums the unrounded tax of each amount, applying `tax_on` in order.
///
/// # Errors
///
/// The first error from `tax_on`, or [`TaxError::IncomeOverflow`] if the
/// running sum overflows.
pub fn sum_unrounded<F>(
    home_amounts: &[Decimal],
    mut tax_on: F,
) -> Result<Decimal, TaxError>
where
    F: FnMut(Decimal) -> Result<Decimal, TaxError>,
{
    home_amounts.iter().try_fold(Decimal::ZERO, |total, amount| {
        let tax = tax_on(*amount)?;
        total
            .checked_add(tax)
            .ok_or(TaxError::IncomeOverflow(*amount))
    })
}
