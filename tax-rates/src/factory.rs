use std::sync::Arc;
use std::time::Duration;

use tax_core::rates::{
    ProviderConfig, ProviderSetupError, RateProviderFactory, RateProviderRegistry,
};
use tax_core::{CurrencyCode, ExchangeRateProvider};

use crate::client::ExchangeRateApiClient;

/// Builds an [`ExchangeRateApiClient`] from `api_key`, `base_url` and
/// `timeout_secs`, which must be positive.
pub struct ExchangeRateApiFactory;

impl ExchangeRateApiFactory {
    pub const BACKEND: &'static str = ProviderConfig::DEFAULT_BACKEND;
}

impl RateProviderFactory for ExchangeRateApiFactory {
    fn backend_name(&self) -> &'static str {
        Self::BACKEND
    }

    fn create(
        &self,
        config: &ProviderConfig,
        _home_currency: CurrencyCode,
    ) -> Result<Arc<dyn ExchangeRateProvider>, ProviderSetupError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderSetupError::MissingApiKey(Self::BACKEND))?;
        if config.timeout_secs == 0 {
            return Err(ProviderSetupError::InvalidTimeout(Self::BACKEND));
        }

        let client = ExchangeRateApiClient::with_endpoint(
            api_key,
            config
                .base_url
                .as_deref()
                .unwrap_or(ExchangeRateApiClient::DEFAULT_BASE_URL),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Arc::new(client))
    }
}

/// A registry with every backend this workspace ships: `fixed` and
/// `exchangerate-api`.
pub fn registry_with_all_backends() -> RateProviderRegistry {
    let mut registry = RateProviderRegistry::with_builtin();
    registry.register(Box::new(ExchangeRateApiFactory));
    registry
}
