use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::fixed::FixedRateProvider;
use super::provider::{ConversionError, ExchangeRateProvider};
use crate::CurrencyCode;

/// Errors raised while building a provider from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderSetupError {
    #[error("unknown rate provider backend '{requested}'; available: {available:?}")]
    UnknownBackend {
        requested: String,
        available: Vec<&'static str>,
    },

    #[error("backend '{0}' requires an API key")]
    MissingApiKey(&'static str),

    #[error("backend '{0}' requires a positive timeout_secs")]
    InvalidTimeout(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Rate(#[from] ConversionError),
}

/// Backend-agnostic rate provider configuration.
///
/// `backend` must match the [`RateProviderFactory::backend_name`] of a
/// registered factory. The remaining fields are read by whichever backends
/// need them.
///
/// | backend            | fields used                             |
/// |--------------------|-----------------------------------------|
/// | `fixed`            | `fixed_rates`                           |
/// | `exchangerate-api` | `api_key`, `base_url`, `timeout_secs`   |
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Lowercase identifier matching a registered factory.
    pub backend: String,
    pub api_key: Option<String>,
    /// Overrides the backend's default endpoint.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Source currency -> rate into the home currency.
    pub fixed_rates: BTreeMap<CurrencyCode, Decimal>,
}

impl ProviderConfig {
    pub const DEFAULT_BACKEND: &'static str = "exchangerate-api";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// A `fixed` backend configuration over the given rates.
    pub fn fixed<I>(rates: I) -> Self
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        Self {
            backend: FixedRateFactory::BACKEND.to_string(),
            fixed_rates: rates.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: Self::DEFAULT_BACKEND.to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            fixed_rates: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("fixed_rates", &self.fixed_rates)
            .finish()
    }
}

/// One implementation per rate backend, registered with a
/// [`RateProviderRegistry`] at startup.
pub trait RateProviderFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use provider converting into `home_currency`.
    fn create(
        &self,
        config: &ProviderConfig,
        home_currency: CurrencyCode,
    ) -> Result<Arc<dyn ExchangeRateProvider>, ProviderSetupError>;
}

/// Factory for [`FixedRateProvider`]; every configured rate converts into the
/// home currency.
pub struct FixedRateFactory;

impl FixedRateFactory {
    pub const BACKEND: &'static str = "fixed";
}

impl RateProviderFactory for FixedRateFactory {
    fn backend_name(&self) -> &'static str {
        Self::BACKEND
    }

    fn create(
        &self,
        config: &ProviderConfig,
        home_currency: CurrencyCode,
    ) -> Result<Arc<dyn ExchangeRateProvider>, ProviderSetupError> {
        let provider = FixedRateProvider::into_currency(
            home_currency,
            config.fixed_rates.iter().map(|(code, rate)| (*code, *rate)),
        )?;
        Ok(Arc::new(provider))
    }
}

/// Registry of [`RateProviderFactory`] instances, keyed by backend name.
pub struct RateProviderRegistry {
    factories: HashMap<&'static str, Box<dyn RateProviderFactory>>,
}

impl RateProviderRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the in-crate `fixed` backend already registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FixedRateFactory));
        registry
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RateProviderFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`ProviderSetupError::UnknownBackend`] when no factory is registered
    ///   under the requested name.
    /// * Any error the chosen factory itself returns.
    pub fn create(
        &self,
        config: &ProviderConfig,
        home_currency: CurrencyCode,
    ) -> Result<Arc<dyn ExchangeRateProvider>, ProviderSetupError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| ProviderSetupError::UnknownBackend {
                requested: config.backend.clone(),
                available: self.available_backends(),
            })?;

        info!(backend = factory.backend_name(), %home_currency, "creating rate provider");
        factory.create(config, home_currency)
    }
}

impl Default for RateProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // ── stub factory ─────────────────────────────────────────────────────
    /// Flips an `AtomicBool` when `create` runs so tests can prove dispatch.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    impl RateProviderFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        fn create(
            &self,
            _config: &ProviderConfig,
            _home_currency: CurrencyCode,
        ) -> Result<Arc<dyn ExchangeRateProvider>, ProviderSetupError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Arc::new(FixedRateProvider::new()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RateProviderFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config_for(backend: &str) -> ProviderConfig {
        ProviderConfig {
            backend: backend.to_string(),
            ..ProviderConfig::default()
        }
    }

    // ── ProviderConfig ───────────────────────────────────────────────────
    #[test]
    fn default_config_targets_exchangerate_api() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.backend, "exchangerate-api");
        assert_eq!(cfg.timeout_secs, 10);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = ProviderConfig {
            api_key: Some("secret-key-123".to_string()),
            ..ProviderConfig::default()
        };

        let rendered = format!("{cfg:?}");

        assert!(!rendered.contains("secret-key-123"));
        assert!(rendered.contains("<redacted>"));
    }

    // ── registry construction ────────────────────────────────────────────
    #[test]
    fn new_registry_has_no_backends() {
        assert!(RateProviderRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn builtin_registry_has_fixed_backend() {
        assert_eq!(
            RateProviderRegistry::with_builtin().available_backends(),
            vec!["fixed"]
        );
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RateProviderRegistry::new();
        let (f1, _) = stub_factory("zeta");
        let (f2, _) = stub_factory("alpha");
        reg.register(f1);
        reg.register(f2);
        assert_eq!(reg.available_backends(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RateProviderRegistry::new();
        let (old, old_called) = stub_factory("fixed");
        let (new, new_called) = stub_factory("fixed");
        reg.register(old);
        reg.register(new);

        reg.create(&config_for("fixed"), CurrencyCode::PLN).unwrap();

        assert_eq!(reg.available_backends(), vec!["fixed"]);
        assert!(!old_called.load(Ordering::SeqCst));
        assert!(new_called.load(Ordering::SeqCst));
    }

    // ── dispatch ─────────────────────────────────────────────────────────
    #[test]
    fn create_calls_only_matching_factory() {
        let mut reg = RateProviderRegistry::new();
        let (a, a_called) = stub_factory("alpha");
        let (b, b_called) = stub_factory("beta");
        reg.register(a);
        reg.register(b);

        let result = reg.create(&config_for("beta"), CurrencyCode::PLN);

        assert!(result.is_ok());
        assert!(!a_called.load(Ordering::SeqCst));
        assert!(b_called.load(Ordering::SeqCst));
    }

    #[test]
    fn unknown_backend_names_requested_and_available() {
        let reg = RateProviderRegistry::with_builtin();

        let result = reg.create(&config_for("nope"), CurrencyCode::PLN);

        assert_eq!(
            result.err(),
            Some(ProviderSetupError::UnknownBackend {
                requested: "nope".to_string(),
                available: vec!["fixed"],
            })
        );
    }

    // ── fixed backend ────────────────────────────────────────────────────
    #[tokio::test]
    async fn fixed_backend_converts_into_home_currency() {
        let reg = RateProviderRegistry::with_builtin();
        let config = ProviderConfig::fixed([(CurrencyCode::USD, dec!(3.95))]);

        let provider = reg.create(&config, CurrencyCode::PLN).unwrap();

        assert_eq!(
            provider.rate(&CurrencyCode::USD, &CurrencyCode::PLN).await,
            Ok(dec!(3.95))
        );
    }

    #[test]
    fn fixed_backend_rejects_non_positive_rate() {
        let reg = RateProviderRegistry::with_builtin();
        let config = ProviderConfig::fixed([(CurrencyCode::USD, dec!(-1))]);

        let result = reg.create(&config, CurrencyCode::PLN);

        assert!(matches!(
            result,
            Err(ProviderSetupError::Rate(ConversionError::Provider(_)))
        ));
    }
}
