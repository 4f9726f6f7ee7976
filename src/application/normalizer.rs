//! Canonicalization of product detail payloads.
//!
//! The catalog API is inconsistent about multi-value specification fields
//! (a string on some products, a list of strings on others) and about option
//! entries (bare names or `{code, name}` objects with numeric codes). This
//! module turns any of those shapes into a [`ProductDetail`].

use crate::domain::product_models::scalar_to_string;
use crate::domain::{
    ProductDetail, ProductOption, ProductOptions, RawProductDetail, RawProductOption,
    RawProductOptions,
};
use serde_json::Value;

/// Separator used when joining list-valued fields
pub const LIST_SEPARATOR: &str = ", ";

/// Normalize a raw detail payload. Never fails; absent fields stay absent.
pub fn normalize_detail(raw: RawProductDetail) -> ProductDetail {
    ProductDetail {
        id: raw.id,
        brand: raw.brand,
        model: raw.model,
        price: raw.price,
        img_url: raw.img_url,
        cpu: normalize_value(raw.cpu),
        ram: normalize_value(raw.ram),
        os: normalize_value(raw.os),
        display_resolution: normalize_value(raw.display_resolution),
        battery: normalize_value(raw.battery),
        primary_camera: normalize_value(raw.primary_camera),
        secondary_camera: normalize_value(raw.secondary_camera),
        internal_memory: normalize_value(raw.internal_memory),
        colors: normalize_value(raw.colors),
        dimensions: normalize_value(raw.dimensions),
        weight: normalize_value(raw.weight),
        gprs: normalize_value(raw.gprs),
        network_technology: normalize_value(raw.network_technology),
        network_speed: normalize_value(raw.network_speed),
        options: normalize_options(raw.options),
        extra: raw.extra,
    }
}

/// Lists are joined (skipping empty entries), scalars pass through as text.
fn normalize_value(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_to_string)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
        ),
        other => scalar_to_string(&other),
    }
}

fn normalize_options(options: Option<RawProductOptions>) -> ProductOptions {
    match options {
        None => ProductOptions::default(),
        Some(options) => ProductOptions {
            colors: normalize_option_list(options.colors),
            storages: normalize_option_list(options.storages),
        },
    }
}

fn normalize_option_list(list: Option<Vec<RawProductOption>>) -> Vec<ProductOption> {
    list.unwrap_or_default()
        .into_iter()
        .filter_map(normalize_option)
        .collect()
}

/// Entries with neither a usable code nor a name are dropped.
fn normalize_option(option: RawProductOption) -> Option<ProductOption> {
    match option {
        RawProductOption::Name(name) => Some(ProductOption {
            code: name.clone(),
            name,
        }),
        RawProductOption::Structured { code, name } => {
            let code = code.as_ref().and_then(scalar_to_string);
            let name = name.as_ref().and_then(scalar_to_string);
            match (code, name) {
                (Some(code), Some(name)) => Some(ProductOption { code, name }),
                (Some(code), None) => Some(ProductOption {
                    name: code.clone(),
                    code,
                }),
                (None, Some(name)) => Some(ProductOption {
                    code: name.clone(),
                    name,
                }),
                (None, None) => None,
            }
        }
        RawProductOption::Other(value) => scalar_to_string(&value).map(|code| ProductOption {
            name: code.clone(),
            code,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawProductDetail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_list_fields_are_joined() {
        let detail = normalize_detail(raw(json!({
            "id": "1",
            "colors": ["red", "blue"],
            "primaryCamera": ["13 MP", "", "autofocus"],
            "secondaryCmera": "5 MP",
            "internalMemory": ["16 GB", "32 GB"]
        })));

        assert_eq!(detail.colors.as_deref(), Some("red, blue"));
        assert_eq!(detail.primary_camera.as_deref(), Some("13 MP, autofocus"));
        assert_eq!(detail.secondary_camera.as_deref(), Some("5 MP"));
        assert_eq!(detail.internal_memory.as_deref(), Some("16 GB, 32 GB"));
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let detail = normalize_detail(raw(json!({"id": "1"})));

        assert_eq!(detail.colors, None);
        assert_eq!(detail.primary_camera, None);
        assert_eq!(detail.weight, None);
        assert_eq!(detail.options, ProductOptions::default());
    }

    #[test]
    fn test_null_fields_stay_absent() {
        let detail = normalize_detail(raw(json!({"id": "1", "colors": null, "options": null})));
        assert_eq!(detail.colors, None);
        assert!(detail.options.colors.is_empty());
    }

    #[test]
    fn test_numeric_scalars_become_text() {
        let detail = normalize_detail(raw(json!({"id": "1", "weight": 155})));
        assert_eq!(detail.weight.as_deref(), Some("155"));
    }

    #[test]
    fn test_options_are_canonical() {
        let detail = normalize_detail(raw(json!({
            "id": "1",
            "options": {
                "colors": ["Black", {"code": 1001, "name": "White"}],
                "storages": [{"code": "2000", "name": "16 GB"}, {"name": "32 GB"}, null]
            }
        })));

        assert_eq!(
            detail.options.colors,
            vec![
                ProductOption { code: "Black".into(), name: "Black".into() },
                ProductOption { code: "1001".into(), name: "White".into() },
            ]
        );
        assert_eq!(
            detail.options.storages,
            vec![
                ProductOption { code: "2000".into(), name: "16 GB".into() },
                ProductOption { code: "32 GB".into(), name: "32 GB".into() },
            ]
        );
    }

    #[test]
    fn test_options_without_lists() {
        let detail = normalize_detail(raw(json!({"id": "1", "options": {"colors": ["Red"]}})));
        assert_eq!(detail.options.colors.len(), 1);
        assert!(detail.options.storages.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let detail = normalize_detail(raw(json!({"id": "1", "announced": "2016"})));
        assert_eq!(detail.extra.get("announced"), Some(&json!("2016")));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_detail(raw(json!({
            "id": "1",
            "brand": "Acer",
            "model": "Liquid Z6",
            "price": "120",
            "colors": ["Black", "White"],
            "primaryCamera": ["13 MP", "Autofocus"],
            "dimentions": "145.5 x 72.5 x 8.9 mm",
            "sim": "Dual SIM",
            "options": {"colors": [{"code": 1000, "name": "Black"}], "storages": ["16 GB"]}
        })));

        let reparsed = raw(serde_json::to_value(&once).unwrap());
        let twice = normalize_detail(reparsed);
        assert_eq!(once, twice);
    }
}
