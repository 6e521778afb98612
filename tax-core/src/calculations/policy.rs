use serde::{Deserialize, Serialize};

use super::{
    CalculatorConfigError, FlatRateCalculator, FlatRateConfig, ProgressiveBracketCalculator,
    ProgressiveConfig, TaxCalculator,
};
use crate::rates::CurrencyConverter;

/// Which tax policy to apply, with its parameters.
///
/// Deserializes from a table tagged with `kind`; omitted parameters take their
/// defaults.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::{FlatRateConfig, TaxPolicyConfig};
///
/// let policy: TaxPolicyConfig = toml::from_str(r#"
///     kind = "flat"
///     tax_rate = 0.12
/// "#).unwrap();
///
/// assert_eq!(policy, TaxPolicyConfig::Flat(FlatRateConfig { tax_rate: dec!(0.12) }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxPolicyConfig {
    Flat(FlatRateConfig),
    Progressive(ProgressiveConfig),
}

impl TaxPolicyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat(_) => "flat",
            Self::Progressive(_) => "progressive",
        }
    }

    /// The named policy with default parameters.
    ///
    /// Returns `None` for an unknown name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat(FlatRateConfig::default())),
            "progressive" => Some(Self::Progressive(ProgressiveConfig::default())),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), CalculatorConfigError> {
        match self {
            Self::Flat(config) => config.validate(),
            Self::Progressive(config) => config.validate(),
        }
    }

    /// Builds a calculator for this policy on top of `converter`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculatorConfigError`] if the parameters are invalid.
    pub fn build(
        &self,
        converter: CurrencyConverter,
    ) -> Result<Box<dyn TaxCalculator>, CalculatorConfigError> {
        Ok(match self {
            Self::Flat(config) => Box::new(FlatRateCalculator::new(config.clone(), converter)?),
            Self::Progressive(config) => Box::new(ProgressiveBracketCalculator::new(
                config.clone(),
                converter,
            )?),
        })
    }
}

impl Default for TaxPolicyConfig {
    fn default() -> Self {
        Self::Progressive(ProgressiveConfig::default())
    }
}
