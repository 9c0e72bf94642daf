//! Pure cart state: line items and the rules that keep them consistent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_core::{Price, ProductId, ProductSnapshot};

/// One product-quantity pair held in the cart.
///
/// Field order and names match the persisted layout:
/// `{"productId", "title", "price", "quantity", "image"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    /// Unit price captured when the product was added.
    pub price: Price,
    pub quantity: u32,
    pub image: String,
}

impl LineItem {
    /// Start a line for `product` with the given quantity.
    #[must_use]
    pub fn new(product: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            quantity,
            image: product.image.clone(),
        }
    }

    /// `price × quantity`, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_times(self.quantity)
    }
}

/// Cheap derived view of a cart, suitable for badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    pub item_count: u64,
    pub total: Decimal,
}

/// Ordered line items, at most one per product, every quantity >= 1.
///
/// All mutators return whether anything changed. Mutators do not check
/// that the total stays representable; use [`checked_summary`](Self::checked_summary)
/// before accepting a new state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    items: Vec<LineItem>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild a cart from untrusted line items (e.g. loaded from storage).
    ///
    /// Lines with quantity 0 are dropped and repeated product ids are folded
    /// into the first occurrence. A line that would push the total out of
    /// [`Decimal`] range is dropped, so the restored cart always has a
    /// computable total.
    #[must_use]
    pub fn restore(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut state = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            let mut next = state.clone();
            next.merge_line(item);
            if next.checked_total().is_some() {
                state = next;
            }
        }
        state
    }

    /// Decode the persisted JSON array.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not an array of line items.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<LineItem> = serde_json::from_str(json)?;
        Ok(Self::restore(items))
    }

    /// Encode as the persisted JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price × quantity` over all lines, or `None` on overflow.
    #[must_use]
    pub fn checked_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
    }

    /// Sum of `price × quantity` over all lines.
    ///
    /// Saturates at [`Decimal::MAX`] when the total is not representable.
    /// Carts held by a `CartStore` never get there.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            item_count: self.item_count(),
            total: self.total(),
        }
    }

    /// Like [`summary`](Self::summary), but `None` if the total overflows.
    #[must_use]
    pub fn checked_summary(&self) -> Option<CartSummary> {
        Some(CartSummary {
            item_count: self.item_count(),
            total: self.checked_total()?,
        })
    }

    /// Add `quantity` units of `product`, incrementing an existing line.
    ///
    /// A zero quantity changes nothing. An existing line keeps its
    /// original price and title.
    pub fn add(&mut self, product: &ProductSnapshot, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        self.merge_line(LineItem::new(product, quantity));
        true
    }

    /// Remove the line for `product_id`.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        self.items.len() != before
    }

    /// Set an absolute quantity. Zero or negative removes the line.
    ///
    /// Quantities above `u32::MAX` are clamped.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|item| &item.product_id == product_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Fold other lines into this cart with add semantics.
    pub fn merge(&mut self, lines: impl IntoIterator<Item = LineItem>) -> bool {
        let mut changed = false;
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            self.merge_line(line);
            changed = true;
        }
        changed
    }

    /// Drop every line.
    pub fn clear(&mut self) -> bool {
        let changed = !self.items.is_empty();
        self.items.clear();
        changed
    }

    fn merge_line(&mut self, line: LineItem) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == line.product_id)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.items.push(line),
        }
    }
}
