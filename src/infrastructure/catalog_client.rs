//! HTTP client for the storefront catalog and cart API.
//!
//! Used only on cache misses and for cart submissions. Failures are returned
//! to the caller as-is: nothing here retries, so a cart POST is exactly one
//! round trip.

use crate::domain::{
    AddToCartRequest, AddToCartResponse, CartApi, CatalogApi, Product, RawProductDetail,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Default API location
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Storefront API client
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("StorefrontClient/1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /product?limit=N
    fn products_path(limit: Option<usize>) -> String {
        match limit {
            Some(limit) => format!("/product?limit={}", limit),
            None => "/product".to_string(),
        }
    }

    /// GET /product/{id}
    fn product_path(id: &str) -> String {
        format!("/product/{}", urlencoding::encode(id))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("Fetching from catalog API: {}", url);
        self.send(self.client.get(&url), &url).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &AddToCartRequest) -> Result<T> {
        let url = self.url(path);
        debug!("POST to catalog API: {}", url);
        self.send(self.client.post(&url).json(body), &url).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("API request failed with status {}: {}", status, error_body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn fetch_products(&self, limit: Option<usize>) -> Result<Vec<Product>> {
        let products: Vec<Product> = self.get(&Self::products_path(limit)).await?;
        info!("Fetched {} products from catalog API", products.len());
        Ok(products)
    }

    async fn fetch_product_detail(&self, id: &str) -> Result<RawProductDetail> {
        info!("Fetching product {} from catalog API", id);
        self.get(&Self::product_path(id)).await
    }
}

#[async_trait]
impl CartApi for CatalogClient {
    async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<AddToCartResponse> {
        self.post("/cart", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CatalogClient::new(DEFAULT_BASE_URL, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);

        let trailing = CatalogClient::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(trailing.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_paths() {
        assert_eq!(CatalogClient::products_path(Some(8)), "/product?limit=8");
        assert_eq!(CatalogClient::products_path(None), "/product");
        assert_eq!(CatalogClient::product_path("ZmGrkLRPXOTpxsU4jjAcv"), "/product/ZmGrkLRPXOTpxsU4jjAcv");
    }

    #[test]
    fn test_product_id_is_a_single_path_segment() {
        assert_eq!(CatalogClient::product_path("a/b?c#d"), "/product/a%2Fb%3Fc%23d");
        assert_eq!(CatalogClient::product_path("id with space"), "/product/id%20with%20space");
    }

    #[test]
    fn test_url_joining() {
        let client = CatalogClient::new("https://shop.example.test/api", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/cart"), "https://shop.example.test/api/cart");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let client = CatalogClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client.fetch_products(Some(8)).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to reach"));
    }
}
