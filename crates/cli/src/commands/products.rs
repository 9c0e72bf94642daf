//! Catalog browsing commands.

use souk_core::Product;
use souk_storefront::ApiClient;
use souk_storefront::error::Result;

/// List the catalog, optionally restricted to one category.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(api: &ApiClient, category: Option<&str>) -> Result<()> {
    let products = match category {
        Some(category) => api.products_by_category(category).await?,
        None => api.products().await?,
    };

    if products.is_empty() {
        tracing::info!("No products found");
        return Ok(());
    }
    for product in &products {
        log_product(product);
    }
    tracing::info!(count = products.len(), "Products listed");
    Ok(())
}

/// Show one product with its resolved image URL.
///
/// # Errors
///
/// Returns an error if the product does not exist or cannot be fetched.
pub async fn show(api: &ApiClient, id: &str) -> Result<()> {
    let product = api.product(id).await?;
    log_product(&product);
    tracing::info!(
        description = %product.description,
        image = %api.image_url(&product.image),
        "Product details"
    );
    Ok(())
}

fn log_product(product: &Product) {
    tracing::info!(
        id = %product.id,
        price = %product.price,
        category = %product.category,
        "{}",
        product.title
    );
}
