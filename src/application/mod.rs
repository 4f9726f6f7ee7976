pub mod alert_service;
pub mod cache_service;
pub mod cart_service;
pub mod catalog_service;
pub mod catalog_view;
pub mod lifecycle;
pub mod normalizer;
pub mod product_details;
pub mod product_list;
pub mod search;

pub use alert_service::AlertQueue;
pub use cache_service::{CacheEntry, CacheService, CacheStats, TTL_MS};
pub use cart_service::{CartService, CART_COUNT_KEY};
pub use catalog_service::CatalogService;
pub use catalog_view::{apply_view, CatalogView, PAGE_SIZE};
pub use lifecycle::ViewLifecycle;
pub use normalizer::normalize_detail;
pub use product_details::{spec_rows, ActionState, ProductDetailsFlow, ProductDetailsState, SpecRow};
pub use product_list::{ProductListFlow, ProductListState};
pub use search::{DebouncedSearch, SearchInput, SEARCH_DEBOUNCE};
