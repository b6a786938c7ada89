//! Error types for avtools
//!
//! Centralized error handling using thiserror. Tool-facing failures are
//! rendered as JSON objects at the tool boundary via `AvError::to_json`.

use serde_json::{json, Value};
use thiserror::Error;

use crate::request::{RoutingError, ValidationErrors};
use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// All error types that can occur in avtools
#[derive(Debug, Error)]
pub enum AvError {
    /// Request parameters failed schema validation
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// A validated request could not be routed
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Upstream API call failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Object storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl AvError {
    /// Short name used as the `error` field of a tool response
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Request validation failed",
            Self::Routing(_) => "RoutingError",
            Self::Upstream(e) => e.kind(),
            Self::Store(_) => "StorageError",
            Self::UnknownTool(_) => "Unknown tool",
        }
    }

    /// Render as the JSON object returned to tool callers
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Validation(errors) = self {
            body["validation_errors"] = json!(errors.messages());
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_json() {
        let err: AvError = ValidationErrors::new(vec!["'symbol' is required".into(), "bad".into()]).into();
        let body = err.to_json();
        assert_eq!(body["error"], "Request validation failed");
        assert_eq!(body["message"], "Request validation failed: 'symbol' is required; bad");
        assert_eq!(body["validation_errors"][0], "'symbol' is required");
        assert_eq!(body["validation_errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_routing_error_json() {
        let err: AvError = RoutingError::unknown("forex timeframe", "hourly").into();
        let body = err.to_json();
        assert_eq!(body["error"], "RoutingError");
        assert_eq!(body["message"], "Unknown forex timeframe: hourly");
        assert!(body.get("validation_errors").is_none());
    }

    #[test]
    fn test_unknown_tool_error() {
        let err = AvError::UnknownTool("options".to_string());
        assert_eq!(err.to_string(), "Unknown tool: options");
        assert_eq!(err.to_json()["error"], "Unknown tool");
    }

    #[test]
    fn test_upstream_error_uses_kind() {
        let err: AvError = UpstreamError::Api {
            field: "Error Message".to_string(),
            message: "Invalid API call".to_string(),
        }
        .into();
        let body = err.to_json();
        assert_eq!(body["error"], "ApiError");
        assert!(body["message"].as_str().unwrap().contains("Invalid API call"));
    }

    #[test]
    fn test_store_error() {
        let err: AvError = StoreError::BucketNotFound("market-data".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: Bucket not found: market-data");
        assert_eq!(err.kind(), "StorageError");
    }
}
