//! Currency conversion boundary.
//!
//! Calculators only ever see a [`CurrencyConverter`]; where its rates come
//! from is decided by the [`ExchangeRateProvider`] behind it.

mod converter;
mod factory;
mod fixed;
mod provider;

pub use converter::CurrencyConverter;
pub use factory::{
    FixedRateFactory, ProviderConfig, ProviderSetupError, RateProviderFactory,
    RateProviderRegistry,
};
pub use fixed::FixedRateProvider;
pub use provider::{ConversionError, ExchangeRateProvider};
