//! Income tax policies.
//!
//! Every policy implements [`TaxCalculator`]. The shared flow (validation,
//! conversion into the home currency, batching and flooring) lives in the
//! trait's provided methods and in [`aggregate`]; each policy only supplies
//! its per-amount rule.

pub mod aggregate;
mod calculator;
pub mod common;
mod flat_rate;
mod policy;
mod progressive;

pub use calculator::{CalculatorConfigError, TaxCalculator, TaxError};
pub use flat_rate::{FlatRateCalculator, FlatRateConfig};
pub use policy::TaxPolicyConfig;
pub use progressive::{FiscalYearState, ProgressiveBracketCalculator, ProgressiveConfig};
