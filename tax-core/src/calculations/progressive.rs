//! Progressive two-bracket income tax with a cumulative annual deduction.
//!
//! # Algorithm
//!
//! For each home-currency salary `s`:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Split `s` across the brackets using income already taxed this year |
//! | 2    | Add `s` to the year's cumulative income |
//! | 3    | Offset the raw tax against whatever deduction is left this year |
//!
//! The bracket split depends on income *before* the current salary:
//!
//! - already above the ceiling: all of `s` at the second rate,
//! - still below the ceiling after `s`: all of `s` at the first rate,
//! - otherwise the part up to the ceiling at the first rate and the rest at
//!   the second rate.
//!
//! The deduction is consumed across calls until the annual limit is reached.
//! Both running totals are cleared by
//! [`reset_fiscal_year`](super::TaxCalculator::reset_fiscal_year).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use rust_decimal_macros::dec;
//! use tax_core::CurrencyCode;
//! use tax_core::calculations::{ProgressiveBracketCalculator, TaxCalculator};
//! use tax_core::rates::{CurrencyConverter, FixedRateProvider};
//!
//! let converter = CurrencyConverter::new(Arc::new(FixedRateProvider::new()), CurrencyCode::PLN);
//! let mut calculator = ProgressiveBracketCalculator::with_defaults(converter);
//!
//! assert_eq!(calculator.calculate_tax_home(dec!(100000)), Ok(dec!(18645)));
//! assert_eq!(calculator.calculate_tax_home(dec!(100000)), Ok(dec!(32000)));
//!
//! calculator.reset_fiscal_year();
//! assert_eq!(calculator.calculate_tax_home(dec!(100000)), Ok(dec!(18645)));
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CalculatorConfigError;
use super::{TaxCalculator, TaxError};
use super::common::is_fraction;
use crate::rates::CurrencyConverter;

/// Parameters of the progressive policy, fixed for the calculator's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressiveConfig {
    /// Total tax that may be deducted in one fiscal year.
    pub deductible_tax_limit: Decimal,

    /// Rate for income up to [`first_bracket_ceiling`](Self::first_bracket_ceiling).
    pub first_bracket_rate: Decimal,

    /// Cumulative annual income at which the second rate starts to apply.
    pub first_bracket_ceiling: Decimal,

    /// Rate for income above the ceiling. May be lower than the first rate.
    pub second_bracket_rate: Decimal,
}

impl ProgressiveConfig {
    /// # Errors
    ///
    /// Returns [`CalculatorConfigError`] if:
    /// - either bracket rate is not in `[0, 1]`
    /// - `first_bracket_ceiling` is not positive
    /// - `deductible_tax_limit` is negative
    pub fn validate(&self) -> Result<(), CalculatorConfigError> {
        if !is_fraction(self.first_bracket_rate) {
            return Err(CalculatorConfigError::InvalidFirstBracketRate(
                self.first_bracket_rate,
            ));
        }
        if !is_fraction(self.second_bracket_rate) {
            return Err(CalculatorConfigError::InvalidSecondBracketRate(
                self.second_bracket_rate,
            ));
        }
        if self.first_bracket_ceiling <= Decimal::ZERO {
            return Err(CalculatorConfigError::InvalidBracketCeiling(
                self.first_bracket_ceiling,
            ));
        }
        if self.deductible_tax_limit < Decimal::ZERO {
            return Err(CalculatorConfigError::InvalidDeductionLimit(
                self.deductible_tax_limit,
            ));
        }
        Ok(())
    }
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            deductible_tax_limit: Decimal::new(52512, 2),
            first_bracket_rate: Decimal::new(17, 2),
            first_bracket_ceiling: Decimal::new(85528, 0),
            second_bracket_rate: Decimal::new(32, 2),
        }
    }
}

/// Running totals for the current fiscal year.
///
/// `cumulative_income` only grows between resets, and `deducted_so_far` never
/// exceeds the configured deductible limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FiscalYearState {
    /// Home-currency income taxed so far this year.
    pub cumulative_income: Decimal,
    /// Deduction already consumed this year.
    pub deducted_so_far: Decimal,
}

/// Stateful two-bracket calculator.
///
/// One instance tracks one taxpayer's fiscal year; calls must arrive in the
/// order the income was earned.
#[derive(Debug, Clone)]
pub struct ProgressiveBracketCalculator {
    config: ProgressiveConfig,
    state: FiscalYearState,
    converter: CurrencyConverter,
}

impl ProgressiveBracketCalculator {
    /// # Errors
    ///
    /// Returns the first [`CalculatorConfigError`] found in `config`.
    pub fn new(
        config: ProgressiveConfig,
        converter: CurrencyConverter,
    ) -> Result<Self, CalculatorConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: FiscalYearState::default(),
            converter,
        })
    }

    pub fn with_defaults(converter: CurrencyConverter) -> Self {
        Self {
            config: ProgressiveConfig::default(),
            state: FiscalYearState::default(),
            converter,
        }
    }

    pub fn config(&self) -> &ProgressiveConfig {
        &self.config
    }

    pub fn state(&self) -> FiscalYearState {
        self.state
    }

    /// Deduction still available this fiscal year.
    pub fn remaining_deduction(&self) -> Decimal {
        self.config.deductible_tax_limit - self.state.deducted_so_far
    }

    /// Raw tax on `salary` given the income already taxed this year and the
    /// year's income once `salary` is added.
    fn bracket_tax(
        &self,
        salary: Decimal,
        income_after: Decimal,
    ) -> Decimal {
        let ceiling = self.config.first_bracket_ceiling;
        let earned = self.state.cumulative_income;

        if earned > ceiling {
            return salary * self.config.second_bracket_rate;
        }
        if income_after < ceiling {
            return salary * self.config.first_bracket_rate;
        }

        let first_part = ceiling - earned;
        let second_part = salary - first_part;
        debug!(%first_part, %second_part, "salary straddles first bracket ceiling");
        first_part * self.config.first_bracket_rate + second_part * self.config.second_bracket_rate
    }

    /// Offsets `raw_tax` against the remaining deduction and records what
    /// was used.
    fn apply_deduction(
        &mut self,
        raw_tax: Decimal,
    ) -> Decimal {
        let remaining = self.remaining_deduction();
        if raw_tax > remaining {
            self.state.deducted_so_far = self.config.deductible_tax_limit;
            raw_tax - remaining
        } else {
            self.state.deducted_so_far += raw_tax;
            Decimal::ZERO
        }
    }
}

#[async_trait]
impl TaxCalculator for ProgressiveBracketCalculator {
    fn policy_name(&self) -> &'static str {
        "progressive"
    }

    fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    fn tax_on_home_amount(
        &mut self,
        amount: Decimal,
    ) -> Result<Decimal, TaxError> {
        let income_after = self
            .state
            .cumulative_income
            .checked_add(amount)
            .ok_or(TaxError::IncomeOverflow(amount))?;

        let raw_tax = self.bracket_tax(amount, income_after);
        self.state.cumulative_income = income_after;
        let tax = self.apply_deduction(raw_tax);

        debug!(
            %amount,
            %raw_tax,
            %tax,
            cumulative_income = %self.state.cumulative_income,
            deducted_so_far = %self.state.deducted_so_far,
            "progressive tax"
        );
        Ok(tax)
    }

    fn ensure_capacity(
        &self,
        additional_income: Decimal,
    ) -> Result<(), TaxError> {
        match self.state.cumulative_income.checked_add(additional_income) {
            Some(_) => Ok(()),
            None => Err(TaxError::IncomeOverflow(additional_income)),
        }
    }

    fn reset_fiscal_year(&mut self) {
        info!(
            cumulative_income = %self.state.cumulative_income,
            deducted_so_far = %self.state.deducted_so_far,
            "resetting fiscal year"
        );
        self.state = FiscalYearState::default();
    }
}
