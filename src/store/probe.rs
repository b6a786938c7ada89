//! Object store connectivity probe

use serde::Serialize;
use serde_json::{json, Value};

use super::{ObjectStore, S3Settings, S3Store, StoreError};

/// Outcome of a connectivity check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub success: bool,
    pub message: String,
    pub details: Value,
}

impl ProbeResult {
    fn failure(error: &StoreError, details: Value) -> Self {
        let message = match error {
            StoreError::NotConfigured(_) => "Object store is not configured",
            StoreError::BucketNotFound(_) => "Bucket does not exist",
            StoreError::AccessDenied(_) => "Access denied; check the access key permissions",
            StoreError::Client(_) => "Could not reach the object store",
        };
        let mut details = details;
        details["error"] = json!(error.to_string());
        Self {
            success: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Issue one head-bucket call against `store`
pub async fn probe_store(store: &dyn ObjectStore) -> ProbeResult {
    let details = json!({"bucket": store.bucket()});
    match store.head_bucket().await {
        Ok(()) => {
            log::info!("Object store probe succeeded for bucket {}", store.bucket());
            ProbeResult {
                success: true,
                message: format!("Connected to bucket {}", store.bucket()),
                details,
            }
        }
        Err(e) => {
            log::warn!("Object store probe failed: {}", e);
            ProbeResult::failure(&e, details)
        }
    }
}

/// Resolve settings, connect and probe
pub async fn probe(settings: Result<S3Settings, StoreError>) -> ProbeResult {
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => return ProbeResult::failure(&e, json!({})),
    };
    let store = S3Store::connect(&settings).await;
    let mut result = probe_store(&store).await;
    result.details["endpoint"] = json!(store.endpoint());
    result.details["timeout_ms"] = json!(settings.timeout.as_millis() as u64);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_probe_success() {
        let store = MemoryStore::new("market-data");
        let result = probe_store(&store).await;
        assert!(result.success);
        assert_eq!(result.details["bucket"], "market-data");
    }

    #[tokio::test]
    async fn test_probe_classifies_failures() {
        let cases = [
            (StoreError::BucketNotFound("b".into()), "does not exist"),
            (StoreError::AccessDenied("b".into()), "Access denied"),
            (StoreError::Client("connect timeout".into()), "Could not reach"),
        ];
        for (error, expected) in cases {
            let store = MemoryStore::new("b").failing(error);
            let result = probe_store(&store).await;
            assert!(!result.success);
            assert!(result.message.contains(expected), "{}", result.message);
            assert!(result.details["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_probe_not_configured() {
        let result = probe(Err(StoreError::NotConfigured(vec!["R2_BUCKET_NAME".into()]))).await;
        assert!(!result.success);
        assert!(result.details["error"].as_str().unwrap().contains("R2_BUCKET_NAME"));
    }
}
