//! Client-side product listing: filtering, sorting, and pagination.
//!
//! The backend returns the full active catalog; narrowing it down for display
//! happens here.

use std::cmp::Ordering;
use std::str::FromStr;

use edenshop_core::Price;
use rust_decimal::Decimal;

use crate::api::Product;

/// Category label that matches every product.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Products per page in the listing.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the title or description.
    pub search: String,
    /// Exact category; empty or [`ALL_CATEGORIES`] matches everything.
    pub category: String,
    /// Inclusive lower price bound.
    pub min_price: Price,
    /// Inclusive upper price bound.
    pub max_price: Price,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            min_price: Price::ZERO,
            max_price: Price::new(Decimal::ONE_THOUSAND),
        }
    }
}

impl ProductFilter {
    /// Whether `product` is listed under this filter.
    ///
    /// Inactive products never are.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        product.is_active
            && self.matches_search(product)
            && self.matches_category(product)
            && (self.min_price..=self.max_price).contains(&product.price)
    }

    fn matches_search(&self, product: &Product) -> bool {
        let needle = self.search.to_lowercase();
        product.title.to_lowercase().contains(&needle)
            || product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    fn matches_category(&self, product: &Product) -> bool {
        self.category.is_empty()
            || self.category == ALL_CATEGORIES
            || product.category.as_deref() == Some(self.category.as_str())
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Title, case-insensitive.
    #[default]
    Name,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
    /// Most recently created first; undated products last.
    Newest,
}

/// Unrecognized sort key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort key {0:?} (expected name, price-low, price-high, or newest)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price-low" => Ok(Self::PriceLow),
            "price-high" => Ok(Self::PriceHigh),
            "newest" => Ok(Self::Newest),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

impl SortKey {
    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::PriceLow => a.price.cmp(&b.price),
            Self::PriceHigh => b.price.cmp(&a.price),
            // `None < Some`, so reversing puts undated products last.
            Self::Newest => b.created_at.cmp(&a.created_at),
        }
    }
}

/// Apply `filter`, then order by `sort`. The sort is stable.
#[must_use]
pub fn filter_products(products: &[Product], filter: &ProductFilter, sort: SortKey) -> Vec<Product> {
    let mut listed: Vec<Product> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    listed.sort_by(|a, b| sort.compare(a, b));
    listed
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Items on this page.
    pub items: &'a [T],
    /// 1-based page number, clamped to the available range.
    pub page: usize,
    /// Total page count; at least 1.
    pub total_pages: usize,
}

/// Slice out 1-based `page` of `items`.
///
/// Out-of-range pages clamp to the first or last page. A zero `page_size`
/// is treated as 1.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Page {
        items: items.get(start..end).unwrap_or(&[]),
        page,
        total_pages,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use edenshop_core::Timestamp;

    use super::*;
    use crate::api::types::test_fixtures::product;

    fn titled(id: &str, title: &str, cents: i64) -> Product {
        Product {
            title: title.to_string(),
            ..product(id, cents, 5)
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_default_filter_keeps_active_products_in_range() {
        let mut inactive = product("p2", 100, 5);
        inactive.is_active = false;
        let products = vec![product("p1", 100, 5), inactive, product("p3", 150_000, 5)];

        let listed = filter_products(&products, &ProductFilter::default(), SortKey::Name);
        assert_eq!(ids(&listed), vec!["p1"]);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let mut described = titled("p2", "Worm castings", 100);
        described.description = Some("Rich HUMUS for gardens".to_string());
        let products = vec![titled("p1", "Humus bag", 100), described, titled("p3", "Seeds", 100)];

        let filter = ProductFilter {
            search: "humus".to_string(),
            ..ProductFilter::default()
        };
        let listed = filter_products(&products, &filter, SortKey::Name);
        assert_eq!(ids(&listed), vec!["p1", "p2"]);
    }

    #[test]
    fn test_category_filter() {
        let mut soil = product("p1", 100, 5);
        soil.category = Some("Soil".to_string());
        let products = vec![soil, product("p2", 100, 5)];

        let only_soil = ProductFilter {
            category: "Soil".to_string(),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter_products(&products, &only_soil, SortKey::Name)), vec!["p1"]);

        let all = ProductFilter {
            category: ALL_CATEGORIES.to_string(),
            ..ProductFilter::default()
        };
        assert_eq!(filter_products(&products, &all, SortKey::Name).len(), 2);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let products = vec![product("p1", 1000, 5), product("p2", 2000, 5), product("p3", 2001, 5)];
        let filter = ProductFilter {
            min_price: Price::from_cents(1000),
            max_price: Price::from_cents(2000),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&filter_products(&products, &filter, SortKey::PriceLow)), vec!["p1", "p2"]);
    }

    #[test]
    fn test_sort_orders() {
        let mut old = titled("a", "banana", 300);
        old.created_at = Some(Timestamp::parse("2024-01-01T00:00:00Z").unwrap());
        let mut new = titled("b", "Apple", 100);
        new.created_at = Some(Timestamp::parse("2024-06-01T00:00:00Z").unwrap());
        let undated = titled("c", "cherry", 200);
        let products = vec![old, new, undated];
        let filter = ProductFilter::default();

        assert_eq!(ids(&filter_products(&products, &filter, SortKey::Name)), vec!["b", "a", "c"]);
        assert_eq!(
            ids(&filter_products(&products, &filter, SortKey::PriceLow)),
            vec!["b", "c", "a"]
        );
        assert_eq!(
            ids(&filter_products(&products, &filter, SortKey::PriceHigh)),
            vec!["a", "c", "b"]
        );
        assert_eq!(
            ids(&filter_products(&products, &filter, SortKey::Newest)),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("price-high".parse::<SortKey>().unwrap(), SortKey::PriceHigh);
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert!("cheapest".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(&items, 1, 12);
        assert_eq!(first.items.len(), 12);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 3, 12);
        assert_eq!(last.items, &[25]);

        let clamped = paginate(&items, 99, 12);
        assert_eq!(clamped.page, 3);
    }

    #[test]
    fn test_paginate_empty_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 0, DEFAULT_PAGE_SIZE);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
