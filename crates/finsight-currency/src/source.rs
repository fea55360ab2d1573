//! Exchange-rate sources

use crate::RateError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default live rate endpoint (rates quoted against INR)
pub const DEFAULT_RATE_ENDPOINT: &str = "https://api.exchangerate-api.com/v4/latest/INR";

/// Default timeout for rate requests (5 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Supplies the INR→USD exchange rate
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the current rate (USD per INR)
    async fn fetch_inr_to_usd(&self) -> Result<f64, RateError>;
}

/// Response body of the latest-rates endpoint
#[derive(Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

/// Live rate source backed by an HTTP endpoint
pub struct HttpRateSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRateSource {
    /// Create a source for `endpoint` with the given request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::Communication(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a source for the default endpoint and timeout
    pub fn default_endpoint() -> Result<Self, RateError> {
        Self::new(DEFAULT_RATE_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_inr_to_usd(&self) -> Result<f64, RateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| RateError::Communication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| RateError::MalformedPayload(e.to_string()))?;

        body.rates
            .get("USD")
            .copied()
            .ok_or_else(|| RateError::MalformedPayload("rates.USD missing".to_string()))
    }
}

/// Source that always returns one rate, or always fails
///
/// Used offline and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateSource {
    rate: Option<f64>,
}

impl FixedRateSource {
    /// Always return `rate`
    pub fn new(rate: f64) -> Self {
        Self { rate: Some(rate) }
    }

    /// Always fail, forcing the converter onto its fallback
    pub fn unavailable() -> Self {
        Self { rate: None }
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn fetch_inr_to_usd(&self) -> Result<f64, RateError> {
        self.rate
            .ok_or_else(|| RateError::Communication("rate source unavailable".to_string()))
    }
}
