//! S3-compatible object store backed by aws-sdk-s3

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, error};

use super::{ObjectStore, StoreError};

pub const ACCOUNT_ID_ENV: &str = "R2_ACCOUNT_ID";
pub const ACCESS_KEY_ID_ENV: &str = "R2_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "R2_SECRET_ACCESS_KEY";
pub const BUCKET_NAME_ENV: &str = "R2_BUCKET_NAME";

/// Connection settings for an R2 bucket
#[derive(Clone)]
pub struct S3Settings {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Overrides the account-derived R2 endpoint
    pub endpoint: Option<String>,
    /// Applies to connect and read alike
    pub timeout: Duration,
}

impl S3Settings {
    /// Read settings from R2_* environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, reporting every missing name at once
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |name: &str| match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };
        let account_id = read(ACCOUNT_ID_ENV);
        let access_key_id = read(ACCESS_KEY_ID_ENV);
        let secret_access_key = read(SECRET_ACCESS_KEY_ENV);
        let bucket = read(BUCKET_NAME_ENV);

        if !missing.is_empty() {
            return Err(StoreError::NotConfigured(missing));
        }
        Ok(Self {
            account_id,
            access_key_id,
            secret_access_key,
            bucket,
            endpoint: None,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.r2.cloudflarestorage.com", self.account_id))
    }
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint_url())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Object store client for an S3-compatible endpoint
pub struct S3Store {
    client: Client,
    bucket: String,
    endpoint: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Build a client with static credentials, region "auto" and path-style addressing
    pub async fn connect(settings: &S3Settings) -> Self {
        let endpoint = settings.endpoint_url();
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "avtools",
        );
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(settings.timeout)
            .read_timeout(settings.timeout)
            .build();

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(endpoint.clone())
            .region(Region::new("auto"))
            .credentials_provider(credentials)
            .timeout_config(timeouts)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        debug!(bucket = %settings.bucket, endpoint = %endpoint, "Object store client configured");
        Self::new(Client::from_conf(config), settings.bucket.clone(), endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %DisplayErrorContext(&e), "put_object failed");
                let status = e.raw_response().map(|r| r.status().as_u16());
                StoreError::from_status(&self.bucket, status, DisplayErrorContext(&e).to_string())
            })?;

        debug!(bucket = %self.bucket, key = %key, bytes = size, "Object written");
        Ok(())
    }

    async fn head_bucket(&self) -> Result<(), StoreError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                debug!(bucket = %self.bucket, status = ?status, "head_bucket failed");
                StoreError::from_status(&self.bucket, status, DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = S3Settings::from_lookup(lookup(&[
            (ACCOUNT_ID_ENV, "abc123"),
            (ACCESS_KEY_ID_ENV, "key"),
            (SECRET_ACCESS_KEY_ENV, "secret"),
            (BUCKET_NAME_ENV, "market-data"),
        ]))
        .unwrap();
        assert_eq!(settings.bucket, "market-data");
        assert_eq!(settings.endpoint_url(), "https://abc123.r2.cloudflarestorage.com");
        assert_eq!(settings.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_settings_report_all_missing() {
        let err = S3Settings::from_lookup(lookup(&[(ACCESS_KEY_ID_ENV, "key"), (BUCKET_NAME_ENV, " ")])).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotConfigured(vec![
                ACCOUNT_ID_ENV.to_string(),
                SECRET_ACCESS_KEY_ENV.to_string(),
                BUCKET_NAME_ENV.to_string(),
            ])
        );
    }

    #[test]
    fn test_endpoint_override_and_debug() {
        let settings = S3Settings::from_lookup(lookup(&[
            (ACCOUNT_ID_ENV, "abc123"),
            (ACCESS_KEY_ID_ENV, "key"),
            (SECRET_ACCESS_KEY_ENV, "top-secret"),
            (BUCKET_NAME_ENV, "b"),
        ]))
        .unwrap()
        .with_endpoint("http://localhost:9000")
        .with_timeout(Duration::from_secs(3));
        assert_eq!(settings.endpoint_url(), "http://localhost:9000");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("localhost:9000"));
    }
}
