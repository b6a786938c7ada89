use avtools::store::{S3Settings, StoreError};
use avtools::tools::DEFAULT_MAX_INLINE_BYTES;
use avtools::upstream::{AlphaVantageConfig, Entitlement};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub api: ApiConfig,
    pub output: OutputConfig,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Falls back to ALPHAVANTAGE_API_KEY when unset
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub entitlement: Option<Entitlement>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: avtools::upstream::alpha_vantage::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_ms: 30000,
            entitlement: None,
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> AlphaVantageConfig {
        AlphaVantageConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub max_inline_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
        }
    }
}

/// Object store settings; unset values come from the R2_* environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_id: None,
            access_key_id: None,
            secret_access_key: None,
            bucket: None,
            endpoint: None,
            timeout_ms: 10000,
        }
    }
}

impl StorageConfig {
    /// Resolve settings, preferring config values over the environment
    pub fn settings(&self) -> Result<S3Settings, StoreError> {
        self.settings_with(|name| std::env::var(name).ok())
    }

    fn settings_with<F>(&self, env: F) -> Result<S3Settings, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = S3Settings::from_lookup(|name| {
            let configured = match name {
                avtools::store::s3::ACCOUNT_ID_ENV => &self.account_id,
                avtools::store::s3::ACCESS_KEY_ID_ENV => &self.access_key_id,
                avtools::store::s3::SECRET_ACCESS_KEY_ENV => &self.secret_access_key,
                avtools::store::s3::BUCKET_NAME_ENV => &self.bucket,
                _ => &None,
            };
            configured.clone().or_else(|| env(name))
        })?;

        let settings = settings.with_timeout(Duration::from_millis(self.timeout_ms));
        Ok(match &self.endpoint {
            Some(endpoint) => settings.with_endpoint(endpoint),
            None => settings,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub marker: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            marker: avtools::ingest::DEFAULT_MARKER.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            storage: StorageConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.api.base_url, "https://www.alphavantage.co/query");
        assert_eq!(config.api.timeout_ms, 30000);
        assert!(config.api.entitlement.is_none());
        assert_eq!(config.output.max_inline_bytes, 100_000);
        assert_eq!(config.storage.timeout_ms, 10000);
        assert_eq!(config.ingest.marker, "[USAGE]");
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api:\n  timeout_ms: 5000\n  entitlement: delayed\noutput:\n  max_inline_bytes: 2048\nstorage:\n  bucket: market-data"
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.api.entitlement, Some(Entitlement::Delayed));
        assert_eq!(config.api.base_url, "https://www.alphavantage.co/query");
        assert_eq!(config.output.max_inline_bytes, 2048);
        assert_eq!(config.storage.bucket.as_deref(), Some("market-data"));
        assert_eq!(config.ingest.marker, "[USAGE]");
    }

    #[test]
    fn test_load_invalid_entitlement_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api:\n  entitlement: premium").unwrap();
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/avtools.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_storage_config_overrides_environment() {
        let storage = StorageConfig {
            bucket: Some("from-config".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            timeout_ms: 2500,
            ..StorageConfig::default()
        };
        let env = |name: &str| match name {
            "R2_ACCOUNT_ID" => Some("acct".to_string()),
            "R2_ACCESS_KEY_ID" => Some("key".to_string()),
            "R2_SECRET_ACCESS_KEY" => Some("secret".to_string()),
            "R2_BUCKET_NAME" => Some("from-env".to_string()),
            _ => None,
        };

        let settings = storage.settings_with(env).unwrap();
        assert_eq!(settings.bucket, "from-config");
        assert_eq!(settings.account_id, "acct");
        assert_eq!(settings.endpoint_url(), "http://localhost:9000");
        assert_eq!(settings.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_storage_config_reports_missing() {
        let err = StorageConfig::default().settings_with(|_| None).unwrap_err();
        match err {
            StoreError::NotConfigured(names) => assert_eq!(names.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }
}
