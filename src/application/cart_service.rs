//! Add-to-cart submission and the locally tracked cart count.
//!
//! The remote cart answers every submission with the authoritative item
//! count. That number replaces the local one (it is never added to it) and is
//! persisted under [`CART_COUNT_KEY`] as a decimal string.

use crate::domain::{
    AddToCartRequest, AddToCartResponse, CartApi, KeyValueStore, Result, StorefrontError,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use validator::Validate;

pub const CART_COUNT_KEY: &str = "cart-count";

pub struct CartService {
    api: Arc<dyn CartApi>,
    store: Arc<dyn KeyValueStore>,
    count: watch::Sender<u64>,
}

impl CartService {
    /// Create the service, starting from the persisted count.
    pub async fn load(api: Arc<dyn CartApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let initial = load_persisted_count(store.as_ref()).await;
        let (count, _) = watch::channel(initial);
        Self { api, store, count }
    }

    /// Latest known cart count
    pub fn count(&self) -> u64 {
        *self.count.borrow()
    }

    /// Receive the cart count every time it is replaced
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.count.subscribe()
    }

    /// Submit one add-to-cart request.
    ///
    /// Invalid requests are rejected before any remote call. On remote
    /// failure the tracked count is left untouched.
    pub async fn submit_cart(&self, request: &AddToCartRequest) -> Result<AddToCartResponse> {
        request.validate()?;

        info!(
            "Adding product {} to cart (color {}, storage {})",
            request.product_id, request.color_code, request.storage_code
        );
        let response = self
            .api
            .add_to_cart(request)
            .await
            .map_err(StorefrontError::Fetch)?;

        self.persist_count(response.count).await;
        Ok(response)
    }

    async fn persist_count(&self, count: u64) {
        self.count.send_replace(count);

        if !self.store.is_available() {
            return;
        }
        if let Err(e) = self.store.set(CART_COUNT_KEY, &count.to_string()).await {
            warn!("Failed to persist cart count: {:#}", e);
        }
    }
}

async fn load_persisted_count(store: &dyn KeyValueStore) -> u64 {
    if !store.is_available() {
        return 0;
    }
    match store.get(CART_COUNT_KEY).await {
        Ok(Some(raw)) => parse_count(&raw),
        Ok(None) => 0,
        Err(e) => {
            warn!("Failed to read persisted cart count: {:#}", e);
            0
        }
    }
}

/// Anything that is not a plain non-negative integer counts as empty.
fn parse_count(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}
