//! Application configuration.
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults (PLN home currency, progressive policy,
//!    `exchangerate-api` backend),
//! 2. an optional TOML file,
//! 3. command-line flags and the `EXCHANGE_RATE_API_KEY` environment variable
//!    (which may itself come from a `.env` file).
//!
//! ```toml
//! home_currency = "PLN"
//!
//! [policy]
//! kind = "progressive"
//! first_bracket_ceiling = 85528
//!
//! [provider]
//! backend = "fixed"
//!
//! [provider.fixed_rates]
//! USD = 3.95
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tax_core::calculations::CalculatorConfigError;
use tax_core::rates::ProviderConfig;
use tax_core::{CurrencyCode, TaxPolicyConfig};
use tracing::debug;

/// Errors raised while assembling the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown policy '{0}'; expected 'flat' or 'progressive'")]
    UnknownPolicy(String),

    #[error(transparent)]
    Policy(#[from] CalculatorConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub home_currency: CurrencyCode,
    pub policy: TaxPolicyConfig,
    pub provider: ProviderConfig,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub policy: Option<String>,
    pub home_currency: Option<CurrencyCode>,
    pub backend: Option<String>,
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Defaults, or the file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Applies command-line overrides and validates the result.
    ///
    /// A `--policy` naming the policy already configured keeps the file's
    /// parameters; naming a different one switches to its defaults.
    pub fn with_overrides(
        mut self,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        if let Some(name) = overrides.policy {
            let requested =
                TaxPolicyConfig::from_name(&name).ok_or(ConfigError::UnknownPolicy(name))?;
            if requested.name() != self.policy.name() {
                self.policy = requested;
            }
        }
        if let Some(home_currency) = overrides.home_currency {
            self.home_currency = home_currency;
        }
        if let Some(backend) = overrides.backend {
            self.provider.backend = backend.trim().to_ascii_lowercase();
        }
        if let Some(api_key) = overrides.api_key {
            self.provider.api_key = Some(api_key);
        }

        self.policy.validate()?;
        Ok(self)
    }
}
