//! Catalog records.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as listed by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category: String,
    /// Image path relative to the API host (may be empty).
    #[serde(default)]
    pub image: String,
}

/// The fields of a product the cart copies when an item is added.
///
/// Price and title are snapshotted at add time and never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
        }
    }
}

impl From<Product> for ProductSnapshot {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_tolerates_missing_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id":"3","title":"Cotton T-Shirt","price":2500}"#).unwrap();
        assert_eq!(product.category, "");
        assert_eq!(product.image, "");

        let snapshot = ProductSnapshot::from(&product);
        assert_eq!(snapshot.id.as_str(), "3");
        assert_eq!(snapshot.price, Price::from_units(2500));
    }
}
