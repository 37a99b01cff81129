//! Product listing over a JSON product file.
//!
//! The file holds an array of products in the backend's wire format, e.g. a
//! saved `GET /api/products` response.

use std::path::Path;

use edenshop_storefront::api::Product;
use edenshop_storefront::catalog::{self, ProductFilter, SortKey};

use super::CliError;

/// Load a product list from `path`.
///
/// # Errors
///
/// Returns `CliError::ReadFile` or `CliError::InvalidCatalog`.
pub fn load_products(path: &Path) -> Result<Vec<Product>, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let products: Vec<Product> =
        serde_json::from_str(&raw).map_err(|source| CliError::InvalidCatalog {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), products = products.len(), "Loaded product list");
    Ok(products)
}

/// Look up one product by id.
///
/// # Errors
///
/// Returns `CliError::ProductNotFound` if no product has that id.
pub fn find_product(products: Vec<Product>, product_id: &str) -> Result<Product, CliError> {
    products
        .into_iter()
        .find(|p| p.id.as_str() == product_id)
        .ok_or_else(|| CliError::ProductNotFound(product_id.to_string()))
}

/// Filter, sort, and print one page of the listing.
///
/// # Errors
///
/// Returns an error if the product file cannot be loaded.
#[allow(clippy::print_stdout)]
pub fn list(
    path: &Path,
    filter: &ProductFilter,
    sort: SortKey,
    page: usize,
    page_size: usize,
) -> Result<(), CliError> {
    let products = load_products(path)?;
    let listed = catalog::filter_products(&products, filter, sort);
    let page = catalog::paginate(&listed, page, page_size);

    println!("{} products found", listed.len());
    for product in page.items {
        let stock = if product.is_available() {
            format!("{} in stock", product.stock)
        } else {
            "out of stock".to_string()
        };
        println!(
            "  {:<38} {:<32} {:>10}  {}",
            product.id, product.title, product.price, stock
        );
    }
    if page.total_pages > 1 {
        println!("Page {} of {}", page.page, page.total_pages);
    }
    Ok(())
}
