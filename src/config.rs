//! Client configuration loaded from `storefront.yaml` and the environment.
//!
//! The YAML file is optional: when it is missing, defaults apply. The
//! environment always has the last word:
//! - `STOREFRONT_API_URL`: catalog API base URL
//! - `STOREFRONT_STORE`: storage backend (`memory`, `file` or `redis`)
//! - `CACHE_PATH`: directory used by the `file` backend
//! - `REDIS_URL`: connection string used by the `redis` backend

use crate::infrastructure::catalog_client::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "storefront.yaml";

/// Top-level configuration.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
}

/// Remote API settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
    Redis,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageBackend::Memory => "memory",
            StorageBackend::File => "file",
            StorageBackend::Redis => "redis",
        })
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "redis" => Ok(StorageBackend::Redis),
            other => anyhow::bail!("unknown storage backend '{}', expected memory, file or redis", other),
        }
    }
}

/// Key-value store settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for the `file` backend (default: ".storefront-cache")
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default)]
    pub redis_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            redis_url: None,
        }
    }
}

fn default_storage_path() -> String {
    ".storefront-cache".to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Number of products requested from the API (default: 8)
    #[serde(default = "default_list_limit")]
    pub list_limit: Option<usize>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

fn default_list_limit() -> Option<usize> {
    Some(8)
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AlertsConfig {
    /// Lifetime of auto-closing alerts (default: 5000)
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: default_duration_ms(),
        }
    }
}

fn default_duration_ms() -> u64 {
    crate::domain::DEFAULT_ALERT_DURATION_MS
}

impl StorefrontConfig {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse storefront config - check YAML syntax and structure")
    }

    /// Read `path`, falling back to defaults when the file does not exist,
    /// then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// [`Self::load`] with overrides taken from `lookup`.
    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => {
                info!("Loaded configuration from {}", path.display());
                Self::from_yaml(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found, using default configuration", path.display());
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load from the file named by `STOREFRONT_CONFIG`, or `storefront.yaml`.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOREFRONT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(backend) = lookup("STOREFRONT_STORE") {
            self.storage.backend = backend
                .parse()
                .context("Invalid STOREFRONT_STORE value")?;
        }
        if let Some(path) = lookup("CACHE_PATH") {
            self.storage.path = path;
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.storage.redis_url = Some(url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.catalog.list_limit, Some(8));
        assert_eq!(config.alerts.default_duration_ms, 5000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
api:
  base_url: "https://shop.example.test/api"
storage:
  backend: redis
  redis_url: "redis://localhost:6379"
"#;
        let config = StorefrontConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://shop.example.test/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.storage.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.catalog.list_limit, Some(8));
    }

    #[test]
    fn test_unlimited_list() {
        let config = StorefrontConfig::from_yaml("catalog:\n  list_limit: null\n").unwrap();
        assert_eq!(config.catalog.list_limit, None);
    }

    #[test]
    fn test_invalid_backend_is_rejected() {
        assert!(StorefrontConfig::from_yaml("storage:\n  backend: sqlite\n").is_err());
        assert!("sqlite".parse::<StorageBackend>().is_err());
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
    }

    #[test]
    fn test_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("STOREFRONT_API_URL", "http://127.0.0.1:4000/api"),
            ("STOREFRONT_STORE", "memory"),
            ("CACHE_PATH", "/tmp/storefront"),
            ("REDIS_URL", "redis://cache:6379"),
        ]
        .into_iter()
        .collect();

        let mut config = StorefrontConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api.base_url, "http://127.0.0.1:4000/api");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.path, "/tmp/storefront");
        assert_eq!(config.storage.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn test_bad_backend_override_is_an_error() {
        let mut config = StorefrontConfig::default();
        let result = config.apply_overrides(|name| (name == "STOREFRONT_STORE").then(|| "disk".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alerts:\n  default_duration_ms: 8000").unwrap();

        let config = StorefrontConfig::load_with(file.path(), |_| None).unwrap();
        assert_eq!(config.alerts.default_duration_ms, 8000);
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig::load_with(dir.path().join("absent.yaml"), |_| None).unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_overrides_apply_to_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig::load_with(dir.path().join("absent.yaml"), |name| {
            (name == "STOREFRONT_STORE").then(|| "memory".to_string())
        })
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }
}
