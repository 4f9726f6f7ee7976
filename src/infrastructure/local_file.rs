//! Local filesystem key-value store.
//!
//! Each key is a JSON-or-text file under a base directory, useful when the
//! cache should survive restarts of the CLI. The store reports itself as
//! unavailable when the directory cannot be created.

use crate::domain::KeyValueStore;
use anyhow::Context;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// File-per-key store rooted at a base directory.
pub struct LocalFileStore {
    base_path: PathBuf,
    available: bool,
}

impl LocalFileStore {
    /// Open (and create if needed) the store directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_client::infrastructure::LocalFileStore;
    ///
    /// let dir = std::env::temp_dir().join("storefront-doc-cache");
    /// let store = LocalFileStore::new(&dir);
    /// assert!(store.base_path().ends_with("storefront-doc-cache"));
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base_path = base_path.as_ref().to_path_buf();
        let available = match std::fs::create_dir_all(&base_path) {
            Ok(()) => {
                info!("Local cache directory: {}", base_path.display());
                true
            }
            Err(e) => {
                warn!(
                    "Cache directory {} is unusable, caching disabled: {}",
                    base_path.display(),
                    e
                );
                false
            }
        };
        Self {
            base_path,
            available,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a key to a file name that cannot escape the base directory.
    ///
    /// Path separators and every other reserved byte are percent-escaped, so
    /// distinct keys always land in distinct files.
    fn resolve_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl KeyValueStore for LocalFileStore {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.resolve_path(key);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.resolve_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.resolve_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert!(store.is_available());

        store.set("product-abc", r#"{"value":1}"#).await.unwrap();
        assert_eq!(
            store.get("product-abc").await.unwrap().as_deref(),
            Some(r#"{"value":1}"#)
        );

        store.set("product-abc", r#"{"value":2}"#).await.unwrap();
        assert_eq!(
            store.get("product-abc").await.unwrap().as_deref(),
            Some(r#"{"value":2}"#)
        );
        assert!(!dir.path().join("product-abc.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert_eq!(store.get("products-cache-8").await.unwrap(), None);
        store.remove("products-cache-8").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        store.set("cart-count", "3").await.unwrap();
        store.remove("cart-count").await.unwrap();
        assert_eq!(store.get("cart-count").await.unwrap(), None);
    }

    #[test]
    fn test_keys_cannot_escape_base_path() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());
        let path = store.resolve_path("../../etc/passwd");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "..%2F..%2Fetc%2Fpasswd.json");
    }

    #[tokio::test]
    async fn test_similar_keys_stay_distinct() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        store.set("product-a.b", "detail of a.b").await.unwrap();
        store.set("product-a%2Eb", "detail of a%2Eb").await.unwrap();
        assert_eq!(store.get("product-a_b").await.unwrap(), None);

        store.set("product-a_b", "detail of a_b").await.unwrap();
        assert_eq!(
            store.get("product-a.b").await.unwrap().as_deref(),
            Some("detail of a.b")
        );
        assert_eq!(
            store.get("product-a_b").await.unwrap().as_deref(),
            Some("detail of a_b")
        );
        assert_eq!(
            store.get("product-a%2Eb").await.unwrap().as_deref(),
            Some("detail of a%2Eb")
        );
    }

    #[test]
    fn test_unusable_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let store = LocalFileStore::new(blocker.join("cache"));
        assert!(!store.is_available());
    }
}
