use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tax_core::calculations::{ProgressiveBracketCalculator, ProgressiveConfig};
use tax_core::rates::{FixedRateProvider, RateProviderRegistry};
use tax_core::{
    CurrencyCode, CurrencyConverter, ExchangeRateProvider, SalaryEntry, TaxCalculator, TaxError,
    TaxPolicyConfig,
};
use tracing::{debug, info};

use crate::config::AppConfig;

/// Build the rate provider registry with every backend the binary supports.
///
/// Add new backends here as they are implemented.
pub fn build_registry() -> RateProviderRegistry {
    tax_rates::registry_with_all_backends()
}

/// Builds the configured calculator.
///
/// When no salary in `salaries` needs converting, no rate provider is created
/// at all, so home-currency runs work offline and without an API key.
pub fn build_calculator(
    config: &AppConfig,
    registry: &RateProviderRegistry,
    salaries: &[SalaryEntry],
) -> anyhow::Result<Box<dyn TaxCalculator>> {
    let needs_conversion = salaries
        .iter()
        .any(|salary| salary.currency != config.home_currency);

    let provider: Arc<dyn ExchangeRateProvider> = if needs_conversion {
        registry.create(&config.provider, config.home_currency)?
    } else {
        debug!("all salaries in home currency, skipping rate provider");
        Arc::new(FixedRateProvider::new())
    };

    let converter = CurrencyConverter::new(provider, config.home_currency);
    Ok(config.policy.build(converter)?)
}

/// Result of a `calc` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcReport {
    pub policy: &'static str,
    pub home_currency: CurrencyCode,
    pub salaries: usize,
    pub tax_due: Decimal,
}

impl fmt::Display for CalcReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let plural = if self.salaries == 1 { "salary" } else { "salaries" };
        write!(
            f,
            "Tax due ({} policy, {} {}): {} {}",
            self.policy, self.salaries, plural, self.tax_due, self.home_currency
        )
    }
}

/// Taxes `salaries` in order: one entry through the single-salary path,
/// several as one batch.
pub async fn run_calc(
    calculator: &mut dyn TaxCalculator,
    salaries: &[SalaryEntry],
) -> Result<CalcReport, TaxError> {
    let tax_due = match salaries {
        [single] => {
            calculator
                .calculate_tax(single.amount, &single.currency)
                .await?
        }
        _ => calculator.calculate_batch(salaries).await?,
    };

    let home_currency = *calculator.converter().home_currency();
    info!(policy = calculator.policy_name(), salaries = salaries.len(), %tax_due, "calculated tax");

    Ok(CalcReport {
        policy: calculator.policy_name(),
        home_currency,
        salaries: salaries.len(),
        tax_due,
    })
}

/// The progressive calculator the demo replays against: the configured
/// parameters when the config selects the progressive policy, defaults
/// otherwise. Only home-currency amounts are used, so no provider is needed.
pub fn demo_calculator(config: &AppConfig) -> anyhow::Result<ProgressiveBracketCalculator> {
    let params = match &config.policy {
        TaxPolicyConfig::Progressive(params) => params.clone(),
        TaxPolicyConfig::Flat(_) => ProgressiveConfig::default(),
    };
    let converter = CurrencyConverter::new(Arc::new(FixedRateProvider::new()), config.home_currency);
    Ok(ProgressiveBracketCalculator::new(params, converter)?)
}

/// Replays the fiscal-year walkthrough and returns the lines to print.
pub fn run_demo(calculator: &mut ProgressiveBracketCalculator) -> Vec<String> {
    enum Step {
        Salary(i64),
        Reset,
    }

    let home_currency = *calculator.converter().home_currency();
    let steps = [
        Step::Salary(5000),
        Step::Salary(100000),
        Step::Salary(100000),
        Step::Salary(100000),
        Step::Reset,
        Step::Salary(100000),
        Step::Salary(-100000),
    ];

    let mut lines = Vec::new();
    for step in steps {
        match step {
            Step::Salary(amount) => {
                lines.push(format!("Tax from {amount} {home_currency}"));
                match calculator.calculate_tax_home(Decimal::from(amount)) {
                    Ok(tax) => lines.push(tax.to_string()),
                    Err(error) => lines.push(error.to_string()),
                }
            }
            Step::Reset => {
                lines.push("Reset of fiscal year".to_string());
                calculator.reset_fiscal_year();
            }
        }
    }
    lines
}
