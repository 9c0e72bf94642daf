//! Property tests for the cart store.
//!
//! Random sequences of add/remove/update operations are applied to a store
//! and the resulting cart is checked against its invariants and against a
//! reload from storage.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use souk_core::{Price, ProductId, ProductSnapshot};
use souk_storefront::{CartStore, MemoryStorage};

#[derive(Debug, Clone)]
enum Op {
    Add { product: u8, quantity: u32 },
    Remove { product: u8 },
    Update { product: u8, quantity: i64 },
    Clear,
}

fn product(n: u8) -> ProductSnapshot {
    ProductSnapshot {
        id: ProductId::new(n.to_string()),
        title: format!("Product {n}"),
        price: Price::from_units(i64::from(n) * 3 + 1),
        image: String::new(),
    }
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..6, 0u32..20).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        1 => (0u8..6).prop_map(|product| Op::Remove { product }),
        2 => (0u8..6, -3i64..20).prop_map(|(product, quantity)| Op::Update { product, quantity }),
        1 => Just(Op::Clear),
    ]
}

fn apply(cart: &CartStore, op: &Op) {
    match op {
        Op::Add { product: n, quantity } => cart.add_item(&product(*n), *quantity).unwrap(),
        Op::Remove { product: n } => cart.remove_item(&product(*n).id).unwrap(),
        Op::Update { product: n, quantity } => {
            cart.update_quantity(&product(*n).id, *quantity).unwrap();
        }
        Op::Clear => cart.clear().unwrap(),
    }
}

proptest! {
    #[test]
    fn lines_stay_unique_and_positive(ops in prop::collection::vec(op(), 0..40)) {
        let cart = CartStore::load(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&cart, op);
        }

        let items = cart.items();
        let ids: HashSet<_> = items.iter().map(|item| item.product_id.clone()).collect();
        prop_assert_eq!(ids.len(), items.len());
        prop_assert!(items.iter().all(|item| item.quantity >= 1));
    }

    #[test]
    fn totals_are_derived_from_lines(ops in prop::collection::vec(op(), 0..40)) {
        let cart = CartStore::load(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&cart, op);
        }

        let items = cart.items();
        let count: u64 = items.iter().map(|item| u64::from(item.quantity)).sum();
        let total: Decimal = items
            .iter()
            .map(|item| item.price.amount() * Decimal::from(item.quantity))
            .sum();
        prop_assert_eq!(cart.item_count(), count);
        prop_assert_eq!(cart.total(), total);
        prop_assert_eq!(cart.summary().total, total);
    }

    #[test]
    fn reload_reproduces_cart(ops in prop::collection::vec(op(), 0..40)) {
        let storage = MemoryStorage::new();
        let cart = CartStore::load(Arc::new(storage.clone()));
        for op in &ops {
            apply(&cart, op);
        }

        let reloaded = CartStore::load(Arc::new(storage));
        prop_assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn update_to_non_positive_removes(
        ops in prop::collection::vec(op(), 0..20),
        target in 0u8..6,
        quantity in -10i64..=0,
    ) {
        let updated = CartStore::load(Arc::new(MemoryStorage::new()));
        let removed = CartStore::load(Arc::new(MemoryStorage::new()));
        for op in &ops {
            apply(&updated, op);
            apply(&removed, op);
        }

        updated.update_quantity(&product(target).id, quantity).unwrap();
        removed.remove_item(&product(target).id).unwrap();
        prop_assert_eq!(updated.items(), removed.items());
    }
}
