//! Upstream market data API
//!
//! This module provides:
//! - `MarketDataApi` trait for API abstraction
//! - `AlphaVantageClient` implementation over HTTP
//! - `MockMarketDataApi` for tests and offline use

pub mod alpha_vantage;
pub mod mock;

pub use alpha_vantage::{AlphaVantageClient, AlphaVantageConfig};
pub use mock::MockMarketDataApi;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::ApiParams;

/// Data entitlement tier passed through to the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entitlement {
    Realtime,
    Delayed,
}

impl Entitlement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Delayed => "delayed",
        }
    }
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entitlement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(Self::Realtime),
            "delayed" => Ok(Self::Delayed),
            other => Err(format!("entitlement must be one of: realtime, delayed (got '{}')", other)),
        }
    }
}

/// Errors from the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The API answered 200 with an error, rate limit or notice payload
    #[error("API error ({field}): {message}")]
    Api { field: String, message: String },
}

impl UpstreamError {
    /// Short machine-readable kind, used as the `error` field in tool output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey { .. } => "ConfigurationError",
            Self::Network(_) => "NetworkError",
            Self::Http { .. } => "HttpError",
            Self::Api { .. } => "ApiError",
        }
    }
}

/// A market data backend; each call is one independent request
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// Call `function` with `params`, returning the raw response body
    async fn query(
        &self,
        function: &str,
        params: &ApiParams,
        entitlement: Option<Entitlement>,
    ) -> Result<String, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entitlement_parse() {
        assert_eq!("realtime".parse::<Entitlement>(), Ok(Entitlement::Realtime));
        assert_eq!("delayed".parse::<Entitlement>(), Ok(Entitlement::Delayed));
        assert!("live".parse::<Entitlement>().unwrap_err().contains("realtime, delayed"));
    }

    #[test]
    fn test_entitlement_serde() {
        let value: Entitlement = serde_yaml::from_str("delayed").unwrap();
        assert_eq!(value, Entitlement::Delayed);
        assert_eq!(serde_json::to_string(&Entitlement::Realtime).unwrap(), "\"realtime\"");
    }

    #[test]
    fn test_error_kinds() {
        let err = UpstreamError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.kind(), "HttpError");
        assert_eq!(err.to_string(), "HTTP error 503: unavailable");

        let err = UpstreamError::Api {
            field: "Note".to_string(),
            message: "slow down".to_string(),
        };
        assert_eq!(err.kind(), "ApiError");
        assert_eq!(err.to_string(), "API error (Note): slow down");
    }
}
