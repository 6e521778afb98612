use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::rates::{ProviderConfig, ProviderSetupError};
use tax_core::{ConversionError, CurrencyCode, ExchangeRateProvider};
use tracing::{debug, warn};

use crate::error::{classify_error_type, classify_message, classify_status};

/// Body of a `/pair/{from}/{to}` response, successful or not.
#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    target_code: Option<String>,
    conversion_rate: Option<Decimal>,
}

/// Rate provider backed by the exchangerate-api.com v6 pair endpoint.
///
/// Every call makes one HTTP request; nothing is cached. The API key is part
/// of the request path and is kept out of logs and error messages.
pub struct ExchangeRateApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://v6.exchangerate-api.com/v6";

    /// Client for the public endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderSetupError> {
        Self::with_endpoint(
            api_key,
            Self::DEFAULT_BASE_URL,
            Duration::from_secs(ProviderConfig::DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Client for a custom endpoint, e.g. a proxy or a local test server.
    ///
    /// # Errors
    ///
    /// [`ProviderSetupError::Client`] if the HTTP client cannot be built.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderSetupError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderSetupError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pair_url(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> String {
        format!("{}/{}/pair/{}/{}", self.base_url, self.api_key, from, to)
    }

    async fn fetch_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        let response = self
            .client
            .get(self.pair_url(from, to))
            .send()
            .await
            .map_err(|e| classify_message(&e.without_url().to_string(), from))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_message(&e.without_url().to_string(), from))?;

        let parsed = match serde_json::from_str::<PairResponse>(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(classify_status(
                    status.as_u16(),
                    from,
                    status.canonical_reason().unwrap_or("unexpected status"),
                ));
            }
            Err(e) => {
                return Err(ConversionError::Provider(format!(
                    "unreadable response body: {e}"
                )));
            }
        };

        if let Some(error_type) = parsed.error_type.as_deref() {
            return Err(classify_error_type(error_type, status.as_u16(), from));
        }
        if !status.is_success() || parsed.result != "success" {
            return Err(classify_status(status.as_u16(), from, &parsed.result));
        }
        if let Some(target) = parsed.target_code.as_deref()
            && !target.eq_ignore_ascii_case(to.as_str())
        {
            return Err(ConversionError::Provider(format!(
                "asked for {to}, provider answered {target}"
            )));
        }

        parsed
            .conversion_rate
            .ok_or_else(|| ConversionError::Provider("response has no conversion_rate".to_string()))
    }
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiClient {
    async fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, ConversionError> {
        match self.fetch_rate(from, to).await {
            Ok(rate) => {
                debug!(%from, %to, %rate, "fetched exchange rate");
                Ok(rate)
            }
            Err(error) => {
                warn!(%from, %to, %error, "exchange rate lookup failed");
                Err(error)
            }
        }
    }
}

impl fmt::Debug for ExchangeRateApiClient {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ExchangeRateApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
