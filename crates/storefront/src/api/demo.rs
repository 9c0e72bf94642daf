//! Built-in demo catalog served when the backend is unreachable.

use souk_core::{Price, Product, ProductId};

use super::PLACEHOLDER_IMAGE;

fn product(id: &str, title: &str, description: &str, price: i64, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        price: Price::from_units(price),
        category: category.to_string(),
        image: PLACEHOLDER_IMAGE.to_string(),
    }
}

/// The six demo products.
#[must_use]
pub fn demo_products() -> Vec<Product> {
    vec![
        product(
            "1",
            "Premium Wireless Headphones",
            "High-quality wireless headphones with noise cancellation",
            15000,
            "electronics",
        ),
        product(
            "2",
            "Smart Watch",
            "Feature-rich smartwatch with health monitoring",
            25000,
            "electronics",
        ),
        product(
            "3",
            "Cotton T-Shirt",
            "Comfortable 100% cotton t-shirt",
            2500,
            "clothing",
        ),
        product(
            "4",
            "Running Shoes",
            "Professional running shoes for athletes",
            8000,
            "footwear",
        ),
        product(
            "5",
            "Laptop Bag",
            "Durable laptop bag with multiple compartments",
            3500,
            "accessories",
        ),
        product(
            "6",
            "Mobile Phone",
            "Latest smartphone with advanced features",
            45000,
            "electronics",
        ),
    ]
}

/// Demo products in `category`.
#[must_use]
pub fn demo_products_in(category: &str) -> Vec<Product> {
    demo_products()
        .into_iter()
        .filter(|p| p.category == category)
        .collect()
}

/// Demo product with `id`, if any.
#[must_use]
pub fn demo_product(id: &str) -> Option<Product> {
    demo_products().into_iter().find(|p| p.id.as_str() == id)
}
