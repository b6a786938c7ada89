//! Object storage
//!
//! An S3-compatible bucket (Cloudflare R2 in production) holds ingested log
//! batches and large tool responses. `MemoryStore` stands in for tests.

pub mod memory;
pub mod probe;
pub mod s3;

pub use memory::MemoryStore;
pub use probe::{probe, probe_store, ProbeResult};
pub use s3::{S3Settings, S3Store};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from object storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Required settings are absent
    #[error("Object store not configured: missing {}", .0.join(", "))]
    NotConfigured(Vec<String>),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Access denied to bucket: {0}")]
    AccessDenied(String),

    /// Transport, timeout or unclassified service failure
    #[error("Client error: {0}")]
    Client(String),
}

impl StoreError {
    /// Map an HTTP status from the storage service to an error
    pub fn from_status(bucket: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        match status {
            Some(404) => Self::BucketNotFound(bucket.to_string()),
            Some(403) => Self::AccessDenied(bucket.to_string()),
            _ => Self::Client(message.into()),
        }
    }
}

/// A bucket that accepts whole-object writes
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name objects are written to
    fn bucket(&self) -> &str;

    /// Write `body` at `key`, replacing any existing object
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Check that the bucket exists and is reachable with the current credentials
    async fn head_bucket(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(
            StoreError::from_status("b", Some(404), "x"),
            StoreError::BucketNotFound("b".to_string())
        );
        assert_eq!(
            StoreError::from_status("b", Some(403), "x"),
            StoreError::AccessDenied("b".to_string())
        );
        assert_eq!(
            StoreError::from_status("b", Some(500), "boom"),
            StoreError::Client("boom".to_string())
        );
        assert_eq!(
            StoreError::from_status("b", None, "timed out"),
            StoreError::Client("timed out".to_string())
        );
    }

    #[test]
    fn test_not_configured_lists_names() {
        let err = StoreError::NotConfigured(vec!["R2_ACCOUNT_ID".into(), "R2_BUCKET_NAME".into()]);
        assert_eq!(
            err.to_string(),
            "Object store not configured: missing R2_ACCOUNT_ID, R2_BUCKET_NAME"
        );
    }
}
