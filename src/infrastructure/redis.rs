use crate::domain::KeyValueStore;
use anyhow::Context;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, Runtime};
use tracing::{error, info};

/// Shared Redis-backed store. Expiry is carried by the cache envelope, so
/// keys are written without a Redis TTL.
pub struct RedisStore {
    pool: Option<Pool>,
}

impl RedisStore {
    pub fn new(url: Option<String>) -> Self {
        if let Some(redis_url) = url {
            match Config::from_url(&redis_url).create_pool(Some(Runtime::Tokio1)) {
                Ok(pool) => {
                    info!("Redis connection pool initialized");
                    Self { pool: Some(pool) }
                }
                Err(e) => {
                    error!("Failed to create Redis connection pool: {}", e);
                    Self { pool: None }
                }
            }
        } else {
            info!("Redis URL not provided, caching disabled");
            Self { pool: None }
        }
    }

    fn pool(&self) -> anyhow::Result<&Pool> {
        self.pool
            .as_ref()
            .context("Redis store is not configured")
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self
            .pool()?
            .get()
            .await
            .context("Failed to get Redis connection from pool")?;
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("Redis GET {} failed", key))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut conn = self
            .pool()?
            .get()
            .await
            .context("Failed to get Redis connection from pool")?;
        let _: () = conn
            .set(key, value)
            .await
            .with_context(|| format!("Redis SET {} failed", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self
            .pool()?
            .get()
            .await
            .context("Failed to get Redis connection from pool")?;
        let _: () = conn
            .del(key)
            .await
            .with_context(|| format!("Redis DEL {} failed", key))?;
        Ok(())
    }
}
