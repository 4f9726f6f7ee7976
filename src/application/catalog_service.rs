//! Catalog data service with cache-first approach.
//!
//! Product lists and details are served from the TTL cache when possible and
//! fetched from the remote catalog API otherwise. Details are normalized
//! before they are cached, so the cache only ever holds canonical records.

use crate::application::cache_service::CacheService;
use crate::application::lifecycle::ViewLifecycle;
use crate::application::normalizer::normalize_detail;
use crate::domain::{CatalogApi, Product, ProductDetail, Result, StorefrontError};
use std::sync::Arc;
use tracing::{info, instrument};

/// Base cache key for product lists
pub const PRODUCT_LIST_CACHE_KEY: &str = "products-cache";

/// Cache key for a product list; limited queries get their own entry.
pub fn product_list_key(limit: Option<usize>) -> String {
    match limit {
        Some(limit) => format!("{}-{}", PRODUCT_LIST_CACHE_KEY, limit),
        None => PRODUCT_LIST_CACHE_KEY.to_string(),
    }
}

/// Cache key for a product detail
pub fn product_detail_key(id: &str) -> String {
    format!("product-{}", id)
}

/// Catalog data service
///
/// Provides cache-first access to the catalog API endpoints.
pub struct CatalogService {
    cache: Arc<CacheService>,
    api: Arc<dyn CatalogApi>,
}

impl CatalogService {
    /// Create a new service instance
    pub fn new(cache: Arc<CacheService>, api: Arc<dyn CatalogApi>) -> Self {
        Self { cache, api }
    }

    pub fn cache(&self) -> &Arc<CacheService> {
        &self.cache
    }

    /// Get the product list, optionally bounded by `limit`
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: Option<usize>) -> Result<Vec<Product>> {
        let key = product_list_key(limit);
        let api = self.api.clone();

        self.cache
            .get_cached(&key, || async move { api.fetch_products(limit).await })
            .await
            .map_err(StorefrontError::Fetch)
    }

    /// Get the normalized detail of one product
    #[instrument(skip(self))]
    pub async fn get_details(&self, id: &str) -> Result<ProductDetail> {
        let key = product_detail_key(id);
        let api = self.api.clone();
        let id = id.to_string();

        self.cache
            .get_cached(&key, || async move {
                api.fetch_product_detail(&id).await.map(normalize_detail)
            })
            .await
            .map_err(StorefrontError::Fetch)
    }

    /// Evict the cached list and fetch it again
    pub async fn refresh_products(&self, limit: Option<usize>) -> Result<Vec<Product>> {
        let key = product_list_key(limit);
        let api = self.api.clone();
        info!("Refreshing product list: {}", key);

        self.cache
            .refresh(&key, || async move { api.fetch_products(limit).await })
            .await
            .map_err(StorefrontError::Fetch)
    }

    /// Evict the cached detail and fetch it again
    pub async fn refresh_details(&self, id: &str) -> Result<ProductDetail> {
        let key = product_detail_key(id);
        let api = self.api.clone();
        let id = id.to_string();
        info!("Refreshing product detail: {}", key);

        self.cache
            .refresh(&key, || async move {
                api.fetch_product_detail(&id).await.map(normalize_detail)
            })
            .await
            .map_err(StorefrontError::Fetch)
    }

    /// [`Self::list_products`] on behalf of a view; nothing is delivered
    /// once the view is torn down.
    pub async fn list_products_for(
        &self,
        limit: Option<usize>,
        lifecycle: &ViewLifecycle,
    ) -> Result<Vec<Product>> {
        lifecycle.run(self.list_products(limit)).await
    }

    /// [`Self::get_details`] on behalf of a view
    pub async fn get_details_for(&self, id: &str, lifecycle: &ViewLifecycle) -> Result<ProductDetail> {
        lifecycle.run(self.get_details(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KeyValueStore, ManualClock, MockCatalogApi, RawProductDetail};
    use crate::infrastructure::MemoryStore;
    use serde_json::json;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            brand: "Acer".to_string(),
            model: "Iconia".to_string(),
            price: Some("170".to_string()),
            img_url: String::new(),
        }
    }

    fn service(api: MockCatalogApi) -> (CatalogService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(CacheService::new(
            store.clone(),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        ));
        (CatalogService::new(cache, Arc::new(api)), store)
    }

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(product_list_key(None), "products-cache");
        assert_eq!(product_list_key(Some(8)), "products-cache-8");
        assert_eq!(product_detail_key("abc"), "product-abc");
    }

    #[tokio::test]
    async fn test_list_is_fetched_once_then_cached() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .withf(|limit| *limit == Some(8))
            .times(1)
            .returning(|_| Ok(vec![product("1"), product("2")]));
        let (service, _) = service(api);

        let first = service.list_products(Some(8)).await.unwrap();
        let second = service.list_products(Some(8)).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_differently_limited_lists_do_not_collide() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .times(2)
            .returning(|limit| Ok(vec![product(&format!("{:?}", limit))]));
        let (service, store) = service(api);

        let limited = service.list_products(Some(4)).await.unwrap();
        let unlimited = service.list_products(None).await.unwrap();

        assert_ne!(limited, unlimited);
        assert!(store.contains("products-cache-4").await);
        assert!(store.contains("products-cache").await);
    }

    #[tokio::test]
    async fn test_list_errors_propagate_and_are_not_cached() {
        let mut api = MockCatalogApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_fetch_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
        api.expect_fetch_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![product("1")]));
        let (service, _) = service(api);

        let err = service.list_products(None).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Fetch(_)));

        let retried = service.list_products(None).await.unwrap();
        assert_eq!(retried.len(), 1);
    }

    #[tokio::test]
    async fn test_details_are_normalized_before_caching() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_product_detail()
            .withf(|id| id == "p1")
            .times(1)
            .returning(|_| {
                Ok(serde_json::from_value::<RawProductDetail>(json!({
                    "id": "p1",
                    "brand": "Acer",
                    "colors": ["Black", "White"],
                    "options": {"colors": [{"code": 1000, "name": "Black"}]}
                }))
                .unwrap())
            });
        let (service, store) = service(api);

        let detail = service.get_details("p1").await.unwrap();
        assert_eq!(detail.colors.as_deref(), Some("Black, White"));
        assert_eq!(detail.options.colors[0].code, "1000");

        let raw = store.get("product-p1").await.unwrap().unwrap();
        let cached: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached["value"]["colors"], "Black, White");

        let again = service.get_details("p1").await.unwrap();
        assert_eq!(again, detail);
    }

    #[tokio::test]
    async fn test_refresh_refetches_fresh_entry() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .times(2)
            .returning(|_| Ok(vec![product("1")]));
        let (service, _) = service(api);

        service.list_products(Some(8)).await.unwrap();
        service.refresh_products(Some(8)).await.unwrap();
    }

    #[tokio::test]
    async fn test_torn_down_view_gets_nothing() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products().times(0);
        let (service, _) = service(api);

        let lifecycle = ViewLifecycle::new();
        lifecycle.teardown();
        let result = service.list_products_for(Some(8), &lifecycle).await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
