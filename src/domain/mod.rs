//! Domain layer - Core storefront entities and collaborator traits.
//!
//! This module defines the domain model for the storefront client,
//! following clean architecture principles. It contains:
//! - Traits for the external collaborators (catalog API, cart API, key-value store)
//! - Catalog, cart and notification models
//! - The error type surfaced by the application layer

pub mod alert_models;
pub mod clock;
pub mod error;
pub mod product_models;

pub use alert_models::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StorefrontError};
pub use product_models::*;

use async_trait::async_trait;

/// Remote catalog API.
///
/// Implementations must be thread-safe (`Send + Sync`) for use in async
/// contexts.
///
/// # Implementations
///
/// See `infrastructure::catalog_client::CatalogClient` for the HTTP implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch the product list, optionally bounded by `limit`.
    ///
    /// # Errors
    ///
    /// - Returns error if network communication fails
    /// - Returns error if the API answers with a non-success status
    /// - Returns error if the body is not a product list
    async fn fetch_products(&self, limit: Option<usize>) -> anyhow::Result<Vec<Product>>;

    /// Fetch the raw, not yet normalized, detail of one product.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CatalogApi::fetch_products`].
    async fn fetch_product_detail(&self, id: &str) -> anyhow::Result<RawProductDetail>;
}

/// Remote cart API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Submit one add-to-cart request. Exactly one round trip per call.
    async fn add_to_cart(&self, request: &AddToCartRequest) -> anyhow::Result<AddToCartResponse>;
}

/// Persistent key-value store backing the TTL cache and the cart count.
///
/// A store may be unavailable (no backing medium in this environment). In
/// that case callers treat every operation as a no-op.
///
/// # Implementations
///
/// - `infrastructure::MemoryStore` - process-local map
/// - `infrastructure::LocalFileStore` - one file per key under a directory
/// - `infrastructure::RedisStore` - Redis via a connection pool
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Whether the backing medium can be used at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the raw string stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent, and an error only when the
    /// medium itself fails.
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Delete `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
