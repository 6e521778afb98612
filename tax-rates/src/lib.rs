//! exchangerate-api.com rate provider.
//!
//! [`ExchangeRateApiClient`] implements [`tax_core::ExchangeRateProvider`]
//! over the v6 pair endpoint; [`ExchangeRateApiFactory`] plugs it into a
//! [`tax_core::rates::RateProviderRegistry`] under the `exchangerate-api`
//! backend name.

mod client;
mod error;
mod factory;

pub use client::ExchangeRateApiClient;
pub use error::{classify_error_type, classify_message, classify_status, status_from_message};
pub use factory::{ExchangeRateApiFactory, registry_with_all_backends};
