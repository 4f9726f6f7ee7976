//! Client-side filter, sort and paging over a fetched product list.
//!
//! Everything here is pure: inputs are borrowed and never reordered, the
//! result is a fresh view.

use crate::domain::{Product, SortMode};
use serde::Serialize;
use std::cmp::Ordering;

/// Number of products shown at once
pub const PAGE_SIZE: usize = 8;

/// Filtered and sorted products plus the page-sized window that is shown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogView {
    pub filtered: Vec<Product>,
    pub visible: Vec<Product>,
}

/// Apply search, sort and the visible window to `products`.
pub fn apply_view(products: &[Product], search_term: &str, sort: SortMode) -> CatalogView {
    let filtered = sort_products(filter_products(products, search_term), sort);
    let visible = filtered.iter().take(PAGE_SIZE).cloned().collect();
    CatalogView { filtered, visible }
}

/// Case-insensitive substring match of the trimmed term against
/// `"<brand> <model>"`. A blank term keeps everything.
pub fn filter_products(products: &[Product], search_term: &str) -> Vec<Product> {
    let needle = search_term.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| p.search_haystack().contains(&needle))
        .cloned()
        .collect()
}

/// Stable sort into a new list.
pub fn sort_products(mut products: Vec<Product>, sort: SortMode) -> Vec<Product> {
    match sort {
        SortMode::Featured => {}
        SortMode::PriceAsc => products.sort_by(|a, b| compare_prices(a, b, false)),
        SortMode::PriceDesc => products.sort_by(|a, b| compare_prices(a, b, true)),
        SortMode::Brand => products.sort_by(|a, b| locale_compare(&a.brand, &b.brand)),
    }
    products
}

/// Products without a usable price go last in both directions.
fn compare_prices(a: &Product, b: &Product, descending: bool) -> Ordering {
    match (a.numeric_price(), b.numeric_price()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(pa), Some(pb)) => {
            let ord = pa.partial_cmp(&pb).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}

/// Case-insensitive ordering with lowercase before uppercase on ties,
/// matching dictionary order for brand names.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| b.cmp(a))
}
