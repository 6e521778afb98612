pub mod calculations;
pub mod models;
pub mod rates;

#[cfg(test)]
mod testing;

pub use calculations::{TaxCalculator, TaxError, TaxPolicyConfig};
pub use models::*;
pub use rates::{ConversionError, CurrencyConverter, ExchangeRateProvider};
