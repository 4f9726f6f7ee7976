//! Product detail controller.
//!
//! Loads one normalized product, tracks the color and storage selection and
//! drives the add-to-cart action.

use crate::application::alert_service::AlertQueue;
use crate::application::cart_service::CartService;
use crate::application::catalog_service::CatalogService;
use crate::application::lifecycle::ViewLifecycle;
use crate::domain::{
    AddToCartRequest, AddToCartResponse, AlertKind, AlertOptions, ProductDetail, ProductOption,
    Result, StorefrontError,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use validator::Validate;

pub const DETAIL_ERROR_MESSAGE: &str = "Could not load product details.";
pub const ADDED_TO_CART_MESSAGE: &str = "Product added to cart.";
pub const ADD_TO_CART_ERROR_MESSAGE: &str = "Could not add the product. Please try again.";

/// Placeholder for a missing specification value
pub const MISSING_VALUE: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// View model published to detail observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsState {
    pub loading: bool,
    pub error_message: Option<String>,
    pub detail: Option<ProductDetail>,
    pub selected_color: String,
    pub selected_storage: String,
    pub action_state: ActionState,
    pub action_message: Option<String>,
}

impl Default for ProductDetailsState {
    fn default() -> Self {
        Self {
            loading: true,
            error_message: None,
            detail: None,
            selected_color: String::new(),
            selected_storage: String::new(),
            action_state: ActionState::Idle,
            action_message: None,
        }
    }
}

impl ProductDetailsState {
    pub fn color_options(&self) -> &[ProductOption] {
        self.detail
            .as_ref()
            .map(|d| d.options.colors.as_slice())
            .unwrap_or_default()
    }

    pub fn storage_options(&self) -> &[ProductOption] {
        self.detail
            .as_ref()
            .map(|d| d.options.storages.as_slice())
            .unwrap_or_default()
    }

    /// Whether the add-to-cart action may be started
    pub fn can_submit(&self) -> bool {
        self.detail.is_some()
            && !self.selected_color.is_empty()
            && !self.selected_storage.is_empty()
            && self.action_state != ActionState::Loading
    }

    /// Build the cart request for the current selection.
    fn cart_request(&self) -> Result<AddToCartRequest> {
        if self.action_state == ActionState::Loading {
            return Err(StorefrontError::Rejected(
                "an add-to-cart request is already in flight".to_string(),
            ));
        }
        let Some(detail) = self.detail.as_ref() else {
            return Err(StorefrontError::Rejected("no product is loaded".to_string()));
        };
        let request = AddToCartRequest {
            product_id: detail.id.clone(),
            color_code: self.selected_color.clone(),
            storage_code: self.selected_storage.clone(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// One labelled line of the specification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecRow {
    pub label: &'static str,
    pub value: String,
}

pub struct SpecField {
    pub label: &'static str,
    pub value: fn(&ProductDetail) -> Option<&String>,
    pub suffix: Option<&'static str>,
}

pub const SPEC_FIELDS: [SpecField; 13] = [
    SpecField { label: "CPU", value: |d| d.cpu.as_ref(), suffix: None },
    SpecField { label: "RAM", value: |d| d.ram.as_ref(), suffix: None },
    SpecField { label: "Operating system", value: |d| d.os.as_ref(), suffix: None },
    SpecField { label: "Display", value: |d| d.display_resolution.as_ref(), suffix: None },
    SpecField { label: "Battery", value: |d| d.battery.as_ref(), suffix: None },
    SpecField { label: "Primary camera", value: |d| d.primary_camera.as_ref(), suffix: None },
    SpecField { label: "Secondary camera", value: |d| d.secondary_camera.as_ref(), suffix: None },
    SpecField { label: "Internal memory", value: |d| d.internal_memory.as_ref(), suffix: None },
    SpecField { label: "Colors", value: |d| d.colors.as_ref(), suffix: None },
    SpecField { label: "Dimensions", value: |d| d.dimensions.as_ref(), suffix: None },
    SpecField { label: "Weight", value: |d| d.weight.as_ref(), suffix: Some("g") },
    SpecField { label: "Network technology", value: |d| d.network_technology.as_ref(), suffix: None },
    SpecField { label: "Network speed", value: |d| d.network_speed.as_ref(), suffix: None },
];

/// Render the specification table; empty or missing values show as `N/A`.
pub fn spec_rows(detail: &ProductDetail) -> Vec<SpecRow> {
    SPEC_FIELDS
        .iter()
        .map(|field| {
            let value = match ((field.value)(detail), field.suffix) {
                (Some(v), _) if v.is_empty() => MISSING_VALUE.to_string(),
                (Some(v), Some(suffix)) => format!("{} {}", v, suffix),
                (Some(v), None) => v.clone(),
                (None, _) => MISSING_VALUE.to_string(),
            };
            SpecRow { label: field.label, value }
        })
        .collect()
}

pub struct ProductDetailsFlow {
    catalog: Arc<CatalogService>,
    cart: Arc<CartService>,
    alerts: AlertQueue,
    lifecycle: ViewLifecycle,
    requested_id: Mutex<Option<String>>,
    state: watch::Sender<ProductDetailsState>,
}

impl ProductDetailsFlow {
    pub fn new(catalog: Arc<CatalogService>, cart: Arc<CartService>, alerts: AlertQueue) -> Self {
        let (state, _) = watch::channel(ProductDetailsState::default());
        Self {
            catalog,
            cart,
            alerts,
            lifecycle: ViewLifecycle::new(),
            requested_id: Mutex::new(None),
            state,
        }
    }

    /// Load a product and preselect its first color and storage options.
    pub async fn load(&self, id: &str) -> Result<()> {
        if self.lifecycle.is_torn_down() {
            debug!("Product detail load skipped after teardown");
            return Err(StorefrontError::Cancelled);
        }
        self.set_requested_id(id);
        self.state.send_modify(|state| {
            state.loading = true;
            state.error_message = None;
            state.action_state = ActionState::Idle;
            state.action_message = None;
        });

        match self.catalog.get_details_for(id, &self.lifecycle).await {
            Ok(detail) => {
                info!("Loaded product detail {}", detail.id);
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.selected_color = first_code(&detail.options.colors);
                    state.selected_storage = first_code(&detail.options.storages);
                    state.detail = Some(detail);
                });
                Ok(())
            }
            Err(StorefrontError::Cancelled) => {
                debug!("Product detail load dropped after teardown");
                Err(StorefrontError::Cancelled)
            }
            Err(e) => {
                warn!("Failed to load product {}: {}", id, e);
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error_message = Some(DETAIL_ERROR_MESSAGE.to_string());
                });
                self.alerts
                    .push(AlertKind::Error, DETAIL_ERROR_MESSAGE, AlertOptions::pinned());
                Err(e)
            }
        }
    }

    /// Load the current product again, from the cache when still fresh.
    pub async fn retry(&self) -> Result<()> {
        let loaded = self.state.borrow().detail.as_ref().map(|d| d.id.clone());
        let id = match loaded.or_else(|| self.requested_id()) {
            Some(id) => id,
            None => return Err(StorefrontError::Rejected("no product was requested".to_string())),
        };
        self.load(&id).await
    }

    pub fn select_color(&self, code: impl Into<String>) {
        let code = code.into();
        self.state.send_modify(|state| state.selected_color = code);
    }

    pub fn select_storage(&self, code: impl Into<String>) {
        let code = code.into();
        self.state.send_modify(|state| state.selected_storage = code);
    }

    pub fn can_submit(&self) -> bool {
        self.state.borrow().can_submit()
    }

    /// Rendered specification rows of the loaded product
    pub fn spec_rows(&self) -> Vec<SpecRow> {
        self.state
            .borrow()
            .detail
            .as_ref()
            .map(spec_rows)
            .unwrap_or_default()
    }

    /// Add the selected configuration to the cart.
    ///
    /// An incomplete selection, a missing product or an action already in
    /// flight is rejected locally without an alert.
    pub async fn submit(&self) -> Result<AddToCartResponse> {
        let mut prepared = Err(StorefrontError::Cancelled);
        self.state.send_if_modified(|state| {
            prepared = state.cart_request();
            if prepared.is_err() {
                return false;
            }
            state.action_state = ActionState::Loading;
            state.action_message = None;
            true
        });
        let request = prepared?;

        let result = self.cart.submit_cart(&request).await;
        if self.lifecycle.is_torn_down() {
            debug!("Add-to-cart outcome dropped after teardown");
            return result;
        }

        match &result {
            Ok(response) => {
                info!("Cart now holds {} items", response.count);
                self.finish_action(ActionState::Success, ADDED_TO_CART_MESSAGE);
                self.alerts.success(ADDED_TO_CART_MESSAGE);
            }
            Err(e) => {
                warn!("Add to cart failed: {}", e);
                self.finish_action(ActionState::Error, ADD_TO_CART_ERROR_MESSAGE);
                self.alerts
                    .push(AlertKind::Error, ADD_TO_CART_ERROR_MESSAGE, AlertOptions::pinned());
            }
        }
        result
    }

    pub fn state(&self) -> ProductDetailsState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProductDetailsState> {
        self.state.subscribe()
    }

    pub fn teardown(&self) {
        info!("Product detail torn down");
        self.lifecycle.teardown();
    }

    fn finish_action(&self, action_state: ActionState, message: &str) {
        self.state.send_modify(|state| {
            state.action_state = action_state;
            state.action_message = Some(message.to_string());
        });
    }

    fn set_requested_id(&self, id: &str) {
        let mut requested = self
            .requested_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *requested = Some(id.to_string());
    }

    fn requested_id(&self) -> Option<String> {
        self.requested_id
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn first_code(options: &[ProductOption]) -> String {
    options.first().map(|o| o.code.clone()).unwrap_or_default()
}
