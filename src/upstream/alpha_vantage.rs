//! Alpha Vantage HTTP client
//!
//! Implements `MarketDataApi` as a single GET per call against the query endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Entitlement, MarketDataApi, UpstreamError};
use crate::request::ApiParams;

/// Alpha Vantage query endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Top-level keys the API uses to report failures with a 200 status
const ERROR_FIELDS: &[&str] = &["Error Message", "Information", "Note"];

/// Configuration for the Alpha Vantage client
#[derive(Debug, Clone)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AlphaVantageConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Alpha Vantage API client
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    config: AlphaVantageConfig,
}

impl AlphaVantageClient {
    /// Create a new client
    ///
    /// Reads ALPHAVANTAGE_API_KEY from environment
    pub fn new(config: AlphaVantageConfig) -> Result<Self, UpstreamError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| UpstreamError::MissingApiKey {
                env_var: API_KEY_ENV.to_string(),
            })?;
        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>, config: AlphaVantageConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Query string for one call; the key is always last
    fn build_query(
        &self,
        function: &str,
        params: &ApiParams,
        entitlement: Option<Entitlement>,
    ) -> Vec<(String, String)> {
        let mut query = Vec::with_capacity(params.len() + 3);
        query.push(("function".to_string(), function.to_string()));
        query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        if let Some(entitlement) = entitlement {
            query.push(("entitlement".to_string(), entitlement.to_string()));
        }
        query.push(("apikey".to_string(), self.api_key.clone()));
        query
    }
}

/// Detect an error payload in a successful response
pub(crate) fn check_body(body: &str) -> Result<(), UpstreamError> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return Ok(());
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return Ok(());
    };
    for field in ERROR_FIELDS {
        if let Some(message) = map.get(*field) {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(UpstreamError::Api {
                field: field.to_string(),
                message,
            });
        }
    }
    Ok(())
}

#[async_trait]
impl MarketDataApi for AlphaVantageClient {
    async fn query(
        &self,
        function: &str,
        params: &ApiParams,
        entitlement: Option<Entitlement>,
    ) -> Result<String, UpstreamError> {
        let query = self.build_query(function, params, entitlement);
        debug!(function = %function, params = params.len(), "Querying Alpha Vantage");

        let response = self.client.get(&self.config.base_url).query(&query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            warn!(function = %function, status = status.as_u16(), "Alpha Vantage returned an error status");
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        check_body(&body).inspect_err(|e| {
            warn!(function = %function, error = %e, "Alpha Vantage reported an error");
        })?;
        debug!(function = %function, bytes = body.len(), "Alpha Vantage response received");
        Ok(body)
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AlphaVantageClient {
        AlphaVantageClient::with_api_key("demo", AlphaVantageConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = AlphaVantageConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_with_base_url() {
        let config = AlphaVantageConfig::with_base_url("http://localhost:8080/query");
        assert_eq!(config.base_url, "http://localhost:8080/query");
    }

    #[test]
    fn test_build_query_orders_function_first_and_key_last() {
        let mut params = ApiParams::new();
        params.insert("symbol", "IBM");
        params.insert("datatype", "csv");
        let query = client().build_query("TIME_SERIES_DAILY", &params, Some(Entitlement::Delayed));

        assert_eq!(query[0], ("function".to_string(), "TIME_SERIES_DAILY".to_string()));
        assert!(query.contains(&("symbol".to_string(), "IBM".to_string())));
        assert!(query.contains(&("entitlement".to_string(), "delayed".to_string())));
        assert_eq!(query.last().unwrap(), &("apikey".to_string(), "demo".to_string()));
    }

    #[test]
    fn test_build_query_without_entitlement() {
        let query = client().build_query("MARKET_STATUS", &ApiParams::new(), None);
        assert_eq!(query.len(), 2);
        assert!(!query.iter().any(|(k, _)| k == "entitlement"));
    }

    #[test]
    fn test_check_body_detects_error_fields() {
        let err = check_body(r#"{"Error Message": "Invalid API call."}"#).unwrap_err();
        assert!(matches!(err, UpstreamError::Api { ref field, .. } if field == "Error Message"));

        let err = check_body(r#"{"Note": "Thank you for using Alpha Vantage!"}"#).unwrap_err();
        assert!(err.to_string().contains("Thank you"));

        assert!(check_body(r#"{"Information": "premium endpoint"}"#).is_err());
    }

    #[test]
    fn test_check_body_passes_data() {
        assert!(check_body(r#"{"Meta Data": {"1. Information": "Daily Prices"}}"#).is_ok());
        assert!(check_body("timestamp,open,high,low,close\n2024-01-02,1,2,0.5,1.5").is_ok());
        assert!(check_body("{not json").is_ok());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("demo"));
    }

    #[test]
    fn test_client_without_api_key() {
        let original = std::env::var(API_KEY_ENV).ok();
        // SAFETY: This test restores the var before returning
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }

        let result = AlphaVantageClient::new(AlphaVantageConfig::default());
        assert!(matches!(result, Err(UpstreamError::MissingApiKey { .. })));

        if let Some(key) = original {
            // SAFETY: Restoring the environment variable to its original state
            unsafe {
                std::env::set_var(API_KEY_ENV, key);
            }
        }
    }
}
