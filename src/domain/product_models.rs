//! Domain models for the remote catalog API.
//!
//! `Product` and `RawProductDetail` mirror what the catalog API returns, so
//! they are deliberately lenient: every field except the identifier may be
//! missing, and scalar fields tolerate numbers where strings are expected.
//! `ProductDetail` is the canonical record produced by the normalizer and is
//! what gets cached and handed to views.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

// ============================================================================
// Catalog Models
// ============================================================================

/// Product summary from `GET /product`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    /// Price as sent by the API; usually a numeric string, sometimes empty
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,
    #[serde(default)]
    pub img_url: String,
}

impl Product {
    /// Price parsed as a finite number, `None` when missing or unparseable.
    pub fn numeric_price(&self) -> Option<f64> {
        let price = self.price.as_deref()?.trim();
        if price.is_empty() {
            return None;
        }
        price.parse::<f64>().ok().filter(|p| p.is_finite())
    }

    /// Text the search filter matches against.
    pub fn search_haystack(&self) -> String {
        format!("{} {}", self.brand, self.model).to_lowercase()
    }
}

/// Product detail as returned by `GET /product/{id}`, before normalization.
///
/// Multi-value specification fields arrive either as a string or as a list
/// of strings, so they are kept as raw JSON until normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default)]
    pub img_url: String,
    pub cpu: Option<Value>,
    pub ram: Option<Value>,
    pub os: Option<Value>,
    pub display_resolution: Option<Value>,
    pub battery: Option<Value>,
    pub primary_camera: Option<Value>,
    /// The API spells this field `secondaryCmera`
    #[serde(rename = "secondaryCmera")]
    pub secondary_camera: Option<Value>,
    pub internal_memory: Option<Value>,
    pub colors: Option<Value>,
    /// The API spells this field `dimentions`
    #[serde(rename = "dimentions")]
    pub dimensions: Option<Value>,
    pub weight: Option<Value>,
    pub gprs: Option<Value>,
    pub network_technology: Option<Value>,
    pub network_speed: Option<Value>,
    pub options: Option<RawProductOptions>,
    /// Fields this client does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Purchase options before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProductOptions {
    #[serde(default)]
    pub colors: Option<Vec<RawProductOption>>,
    #[serde(default)]
    pub storages: Option<Vec<RawProductOption>>,
}

/// A single option entry: either a bare name or a `{code, name}` object
/// whose code may be numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawProductOption {
    Name(String),
    Structured {
        #[serde(default)]
        code: Option<Value>,
        #[serde(default)]
        name: Option<Value>,
    },
    Other(Value),
}

/// Canonical product detail produced by the normalizer.
///
/// Every specification field is a plain string and both option lists are
/// always present. Unknown upstream fields are carried in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default)]
    pub img_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_camera: Option<String>,
    #[serde(
        rename = "secondaryCmera",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    #[serde(rename = "dimentions", default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gprs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_technology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_speed: Option<String>,
    #[serde(default)]
    pub options: ProductOptions,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProductDetail {
    /// The summary part of this detail
    pub fn product(&self) -> Product {
        Product {
            id: self.id.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            price: self.price.clone(),
            img_url: self.img_url.clone(),
        }
    }
}

/// Purchase options for a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptions {
    #[serde(default)]
    pub colors: Vec<ProductOption>,
    #[serde(default)]
    pub storages: Vec<ProductOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub code: String,
    pub name: String,
}

// ============================================================================
// List View Models
// ============================================================================

/// Sort orders offered by the product list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Original fetch order
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    /// Brand A-Z
    Brand,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Featured,
        SortMode::PriceAsc,
        SortMode::PriceDesc,
        SortMode::Brand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Featured => "featured",
            SortMode::PriceAsc => "price-asc",
            SortMode::PriceDesc => "price-desc",
            SortMode::Brand => "brand",
        }
    }

    /// Human readable label for selectors
    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Featured => "Featured",
            SortMode::PriceAsc => "Price (low to high)",
            SortMode::PriceDesc => "Price (high to low)",
            SortMode::Brand => "Brand (A-Z)",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "featured" => Ok(SortMode::Featured),
            "price-asc" | "price-ascending" => Ok(SortMode::PriceAsc),
            "price-desc" | "price-descending" => Ok(SortMode::PriceDesc),
            "brand" | "brand-asc" | "brand-ascending" => Ok(SortMode::Brand),
            other => Err(format!(
                "unknown sort mode '{}', expected one of: featured, price-asc, price-desc, brand",
                other
            )),
        }
    }
}

/// Summary figures shown above the product list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStats {
    pub total: usize,
    /// Number of distinct brands
    pub brands: usize,
}

impl ProductStats {
    pub fn from_products(products: &[Product]) -> Self {
        let brands: HashSet<&str> = products.iter().map(|p| p.brand.as_str()).collect();
        Self {
            total: products.len(),
            brands: brands.len(),
        }
    }
}

// ============================================================================
// Cart Models
// ============================================================================

/// Body of `POST /cart`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(rename = "id")]
    #[validate(length(min = 1, message = "a product is required"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "a color must be selected"))]
    pub color_code: String,
    #[validate(length(min = 1, message = "a storage option must be selected"))]
    pub storage_code: String,
}

/// Response of `POST /cart`; `count` is the authoritative cart size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCartResponse {
    pub count: u64,
}

/// Accepts a string, number or bool; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

/// String form of a JSON scalar.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
