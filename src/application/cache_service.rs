//! Time-bounded cache over a key-value store.
//!
//! Every value is stored as a JSON envelope `{"value": ..., "storedAtEpochMs": ...}`.
//! An entry older than [`TTL_MS`] is deleted the first time it is read.
//! Storage faults never escape this module: they are logged and behave like
//! a cache miss (on read) or a dropped write (on write).

use crate::domain::{Clock, KeyValueStore, SystemClock};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum age of a cache entry (1 hour)
pub const TTL_MS: i64 = 60 * 60 * 1000;

/// Envelope persisted for every cached value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at_epoch_ms: i64,
}

impl<T> CacheEntry<T> {
    /// An entry is valid while its age does not exceed the TTL. An age that
    /// cannot be represented counts as expired.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms
            .checked_sub(self.stored_at_epoch_ms)
            .is_some_and(|age| age <= TTL_MS)
    }
}

/// Hit/miss counters since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// TTL cache fronting the remote catalog
pub struct CacheService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl CacheService {
    /// Create a new cache service
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn with_system_clock(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    /// The underlying store, for keys that are not TTL-managed
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cache_operations_total", "operation" => "hit").increment(1);
    }

    fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("cache_operations_total", "operation" => "miss").increment(1);
    }

    /// Read a cached value.
    ///
    /// Returns `None` when the key is absent, expired (the key is then
    /// deleted), unreadable, or the store is unavailable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.store.is_available() {
            return None;
        }

        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!("Cache get failed for key {}: {:#}", key, e);
                self.record_miss();
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Cache get failed for key {}: {}", key, e);
                self.record_miss();
                return None;
            }
        };

        if !entry.is_valid_at(self.clock.now_ms()) {
            debug!("Cache entry expired: {}", key);
            if let Err(e) = self.store.remove(key).await {
                warn!("Failed to evict expired cache key {}: {:#}", key, e);
            }
            self.record_miss();
            return None;
        }

        debug!("Cache hit: {}", key);
        self.record_hit();
        Some(entry.value)
    }

    /// Store a value stamped with the current time.
    ///
    /// On failure the previous entry, if any, is left as it was.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        if !self.store.is_available() {
            return;
        }

        let entry = CacheEntry {
            value,
            stored_at_epoch_ms: self.clock.now_ms(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!("Cache set failed for key {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(key, &json).await {
            warn!("Cache set failed for key {}: {:#}", key, e);
        }
    }

    /// Delete a cache entry so the next read misses.
    pub async fn evict(&self, key: &str) {
        if !self.store.is_available() {
            return;
        }
        if let Err(e) = self.store.remove(key).await {
            warn!("Cache evict failed for key {}: {:#}", key, e);
        } else {
            info!("Invalidated cache: {}", key);
        }
    }

    /// Get a value from the cache, falling back to `fetcher` on a miss.
    ///
    /// Flow:
    /// 1. Check the store
    /// 2. Fetch from the remote API & populate the cache
    ///
    /// Fetch errors are returned as-is and nothing is cached for them.
    pub async fn get_cached<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        info!("Cache miss, fetching from API: {}", key);
        let value = fetcher().await?;
        self.set(key, &value).await;
        Ok(value)
    }

    /// Force refresh: evict the entry, then take the normal miss path
    pub async fn refresh<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        info!("Force refreshing: {}", key);
        self.evict(key).await;
        self.get_cached(key, fetcher).await
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.cache_hits.load(Ordering::Relaxed),
            misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}
