//! Cart validation against a fresh inventory snapshot.
//!
//! Runs once per relevant page load: the persisted cart is reconciled with
//! what the server currently knows about products, variants, and stock.
//! Stale lines are dropped, over-limit quantities are clamped, and the
//! outcome is reported as batched notifications rather than one toast per
//! line. Validation is idempotent: a second pass over the same snapshot
//! changes nothing.

use serde::{Deserialize, Serialize};

use crate::inventory::InventoryPool;
use crate::types::{LineItemId, VariantId, VendorProductId};

use super::{CartPersistence, CartStore};

/// Authoritative per-product state fetched from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: VendorProductId,
    /// Variants that currently exist for the product.
    pub variant_ids: Vec<VariantId>,
    pub inventory: InventoryPool,
}

/// A line dropped during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedLine {
    pub line_item_id: LineItemId,
    pub product_name: String,
    pub nickname: String,
}

/// A line whose quantity was reduced during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedLine {
    pub line_item_id: LineItemId,
    pub product_name: String,
    pub nickname: String,
    pub from: u32,
    pub to: u32,
}

/// Batched outcome of a validation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub removed: Vec<RemovedLine>,
    pub adjusted: Vec<AdjustedLine>,
}

impl ValidationReport {
    /// True when validation made no changes.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.adjusted.is_empty()
    }

    /// User-facing notification messages, one per category.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();

        if !self.removed.is_empty() {
            let names: Vec<String> = self
                .removed
                .iter()
                .map(|r| format!("{} ({})", r.product_name, r.nickname))
                .collect();
            messages.push(format!(
                "No longer available and removed from your cart: {}",
                names.join(", ")
            ));
        }

        if !self.adjusted.is_empty() {
            let details: Vec<String> = self
                .adjusted
                .iter()
                .map(|a| {
                    format!(
                        "{} ({}) {} \u{2192} {}",
                        a.product_name, a.nickname, a.from, a.to
                    )
                })
                .collect();
            messages.push(format!(
                "Quantities adjusted to current stock: {}",
                details.join(", ")
            ));
        }

        messages
    }
}

impl<P: CartPersistence> CartStore<P> {
    /// Reconcile the cart against a fresh inventory snapshot.
    ///
    /// Lines whose product is missing from the snapshot, marked unavailable,
    /// or whose variant no longer exists are dropped. Remaining lines are
    /// clamped against the fresh pools, with lines clamped to zero dropped
    /// as well. All changes are persisted and reported.
    pub fn validate(&mut self, snapshot: &[ProductSnapshot]) -> ValidationReport {
        let mut report = ValidationReport::default();

        // Stale-line pass: product gone, product unavailable, variant gone.
        let mut index = 0;
        while index < self.lines.len() {
            let Some(line) = self.lines.get(index) else {
                break;
            };
            let product = snapshot.iter().find(|p| p.product_id == line.product_id);
            let stale = match product {
                None => true,
                Some(product) => {
                    !product.inventory.available
                        || !product.variant_ids.contains(&line.variant_id)
                }
            };

            if stale {
                let removed = self.lines.remove(index);
                report.removed.push(RemovedLine {
                    line_item_id: removed.line_item_id,
                    product_name: removed.product_name,
                    nickname: removed.nickname,
                });
                continue;
            }
            index += 1;
        }

        // Adopt the fresh pools, then re-clamp every product still in cart.
        for product in snapshot {
            self.record_pool(product.product_id.clone(), product.inventory);
        }

        let products_in_cart: Vec<VendorProductId> = {
            let mut seen = Vec::new();
            for line in &self.lines {
                if !seen.contains(&line.product_id) {
                    seen.push(line.product_id.clone());
                }
            }
            seen
        };

        for product_id in products_in_cart {
            for change in self.refresh_product(&product_id) {
                if change.after == 0 {
                    report.removed.push(RemovedLine {
                        line_item_id: change.line.line_item_id,
                        product_name: change.line.product_name,
                        nickname: change.line.nickname,
                    });
                } else {
                    report.adjusted.push(AdjustedLine {
                        line_item_id: change.line.line_item_id,
                        product_name: change.line.product_name,
                        nickname: change.line.nickname,
                        from: change.before,
                        to: change.after,
                    });
                }
            }
        }

        self.persist();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{MemoryCartPersistence, NewCartItem};

    fn item(product: &str, variant: &str, quantity: u32, multiplier: u32) -> NewCartItem {
        NewCartItem {
            product_id: VendorProductId::new(product),
            variant_id: VariantId::new(variant),
            product_name: format!("Product {product}"),
            nickname: variant.to_string(),
            unit_price_cents: 1400,
            quantity,
            base_unit_multiplier: multiplier,
        }
    }

    fn snapshot(product: &str, variants: &[&str], pool: InventoryPool) -> ProductSnapshot {
        ProductSnapshot {
            product_id: VendorProductId::new(product),
            variant_ids: variants.iter().map(|v| VariantId::new(*v)).collect(),
            inventory: pool,
        }
    }

    #[test]
    fn test_clamp_down_on_shrunk_pool() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        // 25 bags of 1 lb consume all 100 base units
        store.add_item(item("p", "1lb", 25, 4), InventoryPool::tracked(100));

        // Vendor cuts stock to 40 base units => floor(40 / 4) = 10
        let report = store.validate(&[snapshot("p", &["1lb"], InventoryPool::tracked(40))]);

        assert_eq!(report.adjusted.len(), 1);
        let adjusted = report.adjusted.first().expect("adjusted line");
        assert_eq!(adjusted.from, 25);
        assert_eq!(adjusted.to, 10);
        assert_eq!(store.lines()[0].quantity, 10);
    }

    #[test]
    fn test_removal_on_stockout() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(100));

        let report = store.validate(&[snapshot("p", &["8oz"], InventoryPool::unavailable())]);

        assert!(store.is_empty());
        assert_eq!(report.removed.len(), 1);
        assert_eq!(
            report.removed.first().expect("removed line").product_name,
            "Product p"
        );
    }

    #[test]
    fn test_removal_when_product_missing() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("gone", "8oz", 1, 2), InventoryPool::tracked(100));

        let report = store.validate(&[]);

        assert!(store.is_empty());
        assert_eq!(report.removed.len(), 1);
    }

    #[test]
    fn test_removal_when_variant_discontinued() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 1, 2), InventoryPool::tracked(100));
        store.add_item(item("p", "1lb", 1, 4), InventoryPool::tracked(100));

        // The 8oz price was deleted vendor-side
        let report = store.validate(&[snapshot("p", &["1lb"], InventoryPool::tracked(100))]);

        assert_eq!(store.lines().len(), 1);
        assert_eq!(store.lines()[0].nickname, "1lb");
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed.first().expect("removed").nickname, "8oz");
    }

    #[test]
    fn test_line_clamped_to_zero_is_removed() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "1lb", 2, 4), InventoryPool::tracked(100));

        // 3 base units left: floor(3 / 4) = 0 => drop, not clamp
        let report = store.validate(&[snapshot("p", &["1lb"], InventoryPool::tracked(3))]);

        assert!(store.is_empty());
        assert_eq!(report.removed.len(), 1);
        assert!(report.adjusted.is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "4oz", 10, 1), InventoryPool::tracked(100));
        store.add_item(item("p", "1lb", 20, 4), InventoryPool::tracked(100));

        let fresh = [snapshot("p", &["4oz", "1lb"], InventoryPool::tracked(40))];

        let first = store.validate(&fresh);
        assert!(!first.is_clean());
        let lines_after_first: Vec<_> = store.lines().to_vec();

        let second = store.validate(&fresh);
        assert!(second.is_clean(), "second pass must be a no-op");
        assert_eq!(store.lines(), lines_after_first.as_slice());
    }

    #[test]
    fn test_clean_cart_reports_clean() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(100));

        let report = store.validate(&[snapshot("p", &["8oz"], InventoryPool::tracked(100))]);
        assert!(report.is_clean());
        assert!(report.messages().is_empty());
    }

    #[test]
    fn test_messages_are_batched() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("a", "8oz", 2, 2), InventoryPool::tracked(100));
        store.add_item(item("b", "1lb", 25, 4), InventoryPool::tracked(100));

        let report = store.validate(&[
            // product "a" gone entirely; product "b" shrank
            snapshot("b", &["1lb"], InventoryPool::tracked(40)),
        ]);

        let messages = report.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("Product a"));
        assert!(messages[1].contains("25 \u{2192} 10"));
    }

    #[test]
    fn test_invariant_after_validation() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "4oz", 30, 1), InventoryPool::tracked(100));
        store.add_item(item("p", "8oz", 20, 2), InventoryPool::tracked(100));
        store.add_item(item("p", "1lb", 7, 4), InventoryPool::tracked(100));

        store.validate(&[snapshot(
            "p",
            &["4oz", "8oz", "1lb"],
            InventoryPool::tracked(25),
        )]);

        let usage: u64 = store.lines().iter().map(super::super::CartLineItem::usage).sum();
        assert!(usage <= 25, "usage {usage} exceeds pool");
    }
}
