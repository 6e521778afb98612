//! Common utility functions for tax calculations.
//!
//! This module provides shared functionality used by both tax policies,
//! including rounding, salary validation and rate validation.

use rust_decimal::Decimal;

use super::TaxError;

/// Rounds a tax amount down to a whole currency unit.
///
/// Tax due is always floored, never rounded to nearest: the taxpayer is not
/// charged for a fraction of a unit.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::floor_to_unit;
///
/// assert_eq!(floor_to_unit(dec!(324.88)), dec!(324));
/// assert_eq!(floor_to_unit(dec!(18645.68)), dec!(18645));
/// assert_eq!(floor_to_unit(dec!(32000.00)), dec!(32000));
/// ```
pub fn floor_to_unit(value: Decimal) -> Decimal {
    value.floor()
}

/// Rejects negative salaries.
///
/// # Errors
///
/// Returns [`TaxError::InvalidSalary`] carrying the offending amount.
pub fn ensure_non_negative(amount: Decimal) -> Result<(), TaxError> {
    if amount < Decimal::ZERO {
        return Err(TaxError::InvalidSalary(amount));
    }
    Ok(())
}

/// Whether `rate` is a valid fraction in `[0, 1]`.
pub fn is_fraction(rate: Decimal) -> bool {
    (Decimal::ZERO..=Decimal::ONE).contains(&rate)
}
