//! Product list controller.
//!
//! Owns the fetched product collection for one list view, re-derives the
//! visible window whenever the search term or sort order changes, and
//! publishes the whole view model on a watch channel.

use crate::application::alert_service::AlertQueue;
use crate::application::catalog_service::CatalogService;
use crate::application::catalog_view::apply_view;
use crate::application::lifecycle::ViewLifecycle;
use crate::application::search::DebouncedSearch;
use crate::domain::{
    AlertKind, AlertOptions, Product, ProductStats, Result, SortMode, StorefrontError,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const LOAD_ERROR_MESSAGE: &str = "Could not load products. Please try again.";
pub const CATALOG_UPDATED_MESSAGE: &str = "Catalog updated successfully.";

/// View model published to list observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListState {
    pub loading: bool,
    pub error_message: Option<String>,
    pub visible: Vec<Product>,
    pub filtered_count: usize,
    pub stats: ProductStats,
    pub search_term: String,
    pub sort: SortMode,
    pub has_active_filters: bool,
}

impl Default for ProductListState {
    fn default() -> Self {
        Self {
            loading: true,
            error_message: None,
            visible: Vec::new(),
            filtered_count: 0,
            stats: ProductStats::default(),
            search_term: String::new(),
            sort: SortMode::Featured,
            has_active_filters: false,
        }
    }
}

#[derive(Default)]
struct ListModel {
    products: Vec<Product>,
    search_term: String,
    sort: SortMode,
}

impl ListModel {
    fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty() || self.sort != SortMode::Featured
    }

    /// Re-derive the filter-dependent parts of `state`.
    fn apply_to(&self, state: &mut ProductListState) {
        let view = apply_view(&self.products, &self.search_term, self.sort);
        state.filtered_count = view.filtered.len();
        state.visible = view.visible;
        state.search_term = self.search_term.clone();
        state.sort = self.sort;
        state.has_active_filters = self.has_active_filters();
    }
}

pub struct ProductListFlow {
    catalog: Arc<CatalogService>,
    alerts: AlertQueue,
    lifecycle: ViewLifecycle,
    list_limit: Option<usize>,
    model: Mutex<ListModel>,
    state: watch::Sender<ProductListState>,
}

impl ProductListFlow {
    pub fn new(catalog: Arc<CatalogService>, alerts: AlertQueue, list_limit: Option<usize>) -> Self {
        let (state, _) = watch::channel(ProductListState::default());
        Self {
            catalog,
            alerts,
            lifecycle: ViewLifecycle::new(),
            list_limit,
            model: Mutex::new(ListModel::default()),
            state,
        }
    }

    /// Initial load; served from the cache when possible.
    pub async fn load(&self) -> Result<()> {
        self.fetch(false, false).await
    }

    /// User-invoked retry after a failed load.
    pub async fn retry(&self) -> Result<()> {
        self.fetch(false, true).await
    }

    /// Drop the cached list and fetch it again.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch(true, true).await
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.update_model(|model| model.search_term = term);
    }

    pub fn set_sort(&self, sort: SortMode) {
        self.update_model(|model| model.sort = sort);
    }

    pub fn reset_filters(&self) {
        self.update_model(|model| {
            model.search_term.clear();
            model.sort = SortMode::Featured;
        });
    }

    /// Current view model
    pub fn state(&self) -> ProductListState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProductListState> {
        self.state.subscribe()
    }

    /// All products matching the current filters, not only the visible window
    pub fn filtered(&self) -> Vec<Product> {
        let model = self.lock_model();
        apply_view(&model.products, &model.search_term, model.sort).filtered
    }

    pub fn lifecycle(&self) -> &ViewLifecycle {
        &self.lifecycle
    }

    /// Tear the view down; pending loads are never delivered.
    pub fn teardown(&self) {
        info!("Product list torn down");
        self.lifecycle.teardown();
    }

    /// Feed settled search terms into the list until the view is torn down.
    pub fn spawn_search(self: &Arc<Self>, mut search: DebouncedSearch) -> JoinHandle<()> {
        let flow = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let term = tokio::select! {
                    biased;
                    _ = flow.lifecycle.torn_down() => break,
                    term = search.next() => term,
                };
                match term {
                    Some(term) => {
                        debug!("Search term settled: {:?}", term);
                        flow.set_search_term(term);
                    }
                    None => break,
                }
            }
        })
    }

    async fn fetch(&self, refresh: bool, announce: bool) -> Result<()> {
        if self.lifecycle.is_torn_down() {
            debug!("Product list load skipped after teardown");
            return Err(StorefrontError::Cancelled);
        }
        self.state.send_modify(|state| {
            state.loading = true;
            state.error_message = None;
        });

        let fetched = if refresh {
            self.lifecycle
                .run(self.catalog.refresh_products(self.list_limit))
                .await
        } else {
            self.catalog
                .list_products_for(self.list_limit, &self.lifecycle)
                .await
        };

        match fetched {
            Ok(products) => {
                info!("Loaded {} products", products.len());
                let stats = ProductStats::from_products(&products);
                let mut model = self.lock_model();
                model.products = products;
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.stats = stats;
                    model.apply_to(state);
                });
                drop(model);

                if announce {
                    self.alerts.success(CATALOG_UPDATED_MESSAGE);
                }
                Ok(())
            }
            Err(StorefrontError::Cancelled) => {
                debug!("Product list load dropped after teardown");
                Err(StorefrontError::Cancelled)
            }
            Err(e) => {
                warn!("Failed to load products: {}", e);
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error_message = Some(LOAD_ERROR_MESSAGE.to_string());
                });
                self.alerts
                    .push(AlertKind::Error, LOAD_ERROR_MESSAGE, AlertOptions::pinned());
                Err(e)
            }
        }
    }

    fn update_model(&self, change: impl FnOnce(&mut ListModel)) {
        let mut model = self.lock_model();
        change(&mut model);
        self.state.send_modify(|state| model.apply_to(state));
    }

    fn lock_model(&self) -> MutexGuard<'_, ListModel> {
        self.model.lock().unwrap_or_else(|poisoned| {
            warn!("Product list model lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache_service::CacheService;
    use crate::application::search::SearchInput;
    use crate::domain::{ManualClock, MockCatalogApi};
    use crate::infrastructure::MemoryStore;
    use std::time::Duration;

    fn product(id: &str, brand: &str, model: &str, price: &str) -> Product {
        Product {
            id: id.to_string(),
            brand: brand.to_string(),
            model: model.to_string(),
            price: Some(price.to_string()),
            img_url: String::new(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Samsung", "Galaxy S9", "700"),
            product("2", "Apple", "iPhone 8", "800"),
            product("3", "Samsung", "Galaxy A5", "250"),
            product("4", "Acer", "Liquid Z6", "120"),
        ]
    }

    fn flow(api: MockCatalogApi) -> (Arc<ProductListFlow>, AlertQueue) {
        let cache = Arc::new(CacheService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        ));
        let catalog = Arc::new(CatalogService::new(cache, Arc::new(api)));
        let alerts = AlertQueue::new();
        let flow = ProductListFlow::new(catalog, alerts.clone(), Some(8));
        (Arc::new(flow), alerts)
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_publishes_stats_and_window() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .withf(|limit| *limit == Some(8))
            .times(1)
            .returning(|_| Ok(catalog()));
        let (flow, alerts) = flow(api);
        assert!(flow.state().loading);

        flow.load().await.unwrap();

        let state = flow.state();
        assert!(!state.loading);
        assert_eq!(state.error_message, None);
        assert_eq!(state.stats, ProductStats { total: 4, brands: 3 });
        assert_eq!(state.filtered_count, 4);
        assert_eq!(ids(&state.visible), vec!["1", "2", "3", "4"]);
        assert!(!state.has_active_filters);
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_filters_reapply_without_refetch() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .times(1)
            .returning(|_| Ok(catalog()));
        let (flow, _) = flow(api);
        flow.load().await.unwrap();

        flow.set_search_term("galaxy");
        flow.set_sort(SortMode::PriceAsc);
        let state = flow.state();
        assert_eq!(ids(&state.visible), vec!["3", "1"]);
        assert_eq!(state.filtered_count, 2);
        assert!(state.has_active_filters);
        assert_eq!(state.stats.total, 4);

        flow.reset_filters();
        let state = flow.state();
        assert_eq!(ids(&state.visible), vec!["1", "2", "3", "4"]);
        assert_eq!(state.search_term, "");
        assert!(!state.has_active_filters);
    }

    #[tokio::test]
    async fn test_sort_alone_counts_as_active_filter() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products().returning(|_| Ok(catalog()));
        let (flow, _) = flow(api);
        flow.load().await.unwrap();

        flow.set_sort(SortMode::Brand);
        let state = flow.state();
        assert!(state.has_active_filters);
        assert_eq!(ids(&state.visible), vec!["4", "2", "1", "3"]);
    }

    #[tokio::test]
    async fn test_failed_load_pins_error_alert() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("502 Bad Gateway")));
        let (flow, alerts) = flow(api);

        let err = flow.load().await.unwrap_err();
        assert!(matches!(err, StorefrontError::Fetch(_)));

        let state = flow.state();
        assert!(!state.loading);
        assert_eq!(state.error_message.as_deref(), Some(LOAD_ERROR_MESSAGE));

        let snapshot = alerts.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].kind, AlertKind::Error);
        assert_eq!(snapshot[0].message, LOAD_ERROR_MESSAGE);
        assert!(!snapshot[0].auto_close);
    }

    #[tokio::test]
    async fn test_retry_announces_success() {
        let mut api = MockCatalogApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_fetch_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("timeout")));
        api.expect_fetch_products()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(catalog()));
        let (flow, alerts) = flow(api);

        assert!(flow.load().await.is_err());
        flow.retry().await.unwrap();

        let state = flow.state();
        assert_eq!(state.error_message, None);
        assert_eq!(state.stats.total, 4);

        let messages: Vec<String> = alerts.snapshot().into_iter().map(|a| a.message).collect();
        assert_eq!(messages, vec![LOAD_ERROR_MESSAGE, CATALOG_UPDATED_MESSAGE]);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products()
            .times(2)
            .returning(|_| Ok(catalog()));
        let (flow, _) = flow(api);

        flow.load().await.unwrap();
        flow.load().await.unwrap();
        flow.refresh().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_after_teardown_is_dropped() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products().times(0);
        let (flow, alerts) = flow(api);
        let rx = flow.subscribe();

        flow.teardown();
        let err = flow.load().await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(!rx.has_changed().unwrap());
        assert!(flow.state().visible.is_empty());
        assert!(alerts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_search_drives_filter() {
        let mut api = MockCatalogApi::new();
        api.expect_fetch_products().returning(|_| Ok(catalog()));
        let (flow, _) = flow(api);
        flow.load().await.unwrap();

        let input = SearchInput::new();
        let task = flow.spawn_search(input.debounced());
        let mut rx = flow.subscribe();

        input.set(" iphone");
        rx.changed().await.unwrap();
        assert_eq!(ids(&rx.borrow_and_update().visible), vec!["2"]);

        flow.teardown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
