//! Client cart store with pluggable persistence.
//!
//! The cart lives client-side and survives page reloads; the store here is
//! the logic behind it, an explicit object with an injected
//! [`CartPersistence`] port so it can be tested without a UI framework or
//! browser storage.
//!
//! All variants of a product draw from one shared base-unit pool, so every
//! mutation re-derives each sibling line's purchasable maximum and clamps
//! quantities that no longer fit. The store is single-writer by construction
//! (one active browser tab, synchronous event handlers); cross-tab races are
//! out of scope.
//!
//! # Invariant
//!
//! After every mutation, for every product with a tracked pool:
//! `sum(quantity * base_unit_multiplier)` across its lines never exceeds the
//! pool's total base units.

mod validate;

pub use validate::{AdjustedLine, ProductSnapshot, RemovedLine, ValidationReport};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::inventory::{Allocation, InventoryPool, base_unit_usage, max_purchasable};
use crate::types::{LineItemId, VariantId, VendorProductId};

/// One line of the cart: a (product, variant) pair with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub line_item_id: LineItemId,
    pub product_id: VendorProductId,
    pub variant_id: VariantId,
    /// Product display name, carried for notifications.
    pub product_name: String,
    /// Variant display label, e.g. "8oz".
    pub nickname: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub base_unit_multiplier: u32,
    /// Maximum total quantity this line may hold given its siblings, as of
    /// the last recomputation. Display-only; authoritative clamping happens
    /// on every mutation.
    pub cached_max_quantity: Allocation,
}

impl CartLineItem {
    /// Base units this line draws from the product's pool.
    #[must_use]
    pub const fn usage(&self) -> u64 {
        base_unit_usage(self.quantity, self.base_unit_multiplier)
    }
}

/// Input for [`CartStore::add_item`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: VendorProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub nickname: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub base_unit_multiplier: u32,
}

/// Result of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    /// The requested quantity was applied as-is.
    Applied { quantity: u32 },
    /// The quantity was reduced to fit the shared pool.
    Clamped { quantity: u32 },
    /// The line was removed (explicitly, or clamped to zero).
    Removed,
    /// Nothing fit in the pool; no line was created.
    Rejected,
    /// No line with the given ID exists.
    NotFound,
}

/// Storage port for the serialized cart.
///
/// The browser front end backs this with local storage; tests and the
/// stateless validation endpoint use [`MemoryCartPersistence`].
pub trait CartPersistence {
    /// Load the last saved snapshot, if any.
    fn load(&self) -> Option<String>;
    /// Replace the saved snapshot.
    fn save(&mut self, snapshot: &str);
    /// Delete the saved snapshot.
    fn clear(&mut self);
}

/// In-memory persistence, the default for tests and stateless use.
#[derive(Debug, Default, Clone)]
pub struct MemoryCartPersistence {
    stored: Option<String>,
}

impl CartPersistence for MemoryCartPersistence {
    fn load(&self) -> Option<String> {
        self.stored.clone()
    }

    fn save(&mut self, snapshot: &str) {
        self.stored = Some(snapshot.to_string());
    }

    fn clear(&mut self) {
        self.stored = None;
    }
}

/// Serialized cart shape. Only lines are persisted; inventory pools are
/// re-learned from the server and the persisted cart is trusted only until
/// the next validation pass.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    lines: Vec<CartLineItem>,
}

/// The authoritative client-side cart.
pub struct CartStore<P: CartPersistence> {
    lines: Vec<CartLineItem>,
    /// Latest known inventory pool per product, updated on add and validate.
    pools: HashMap<VendorProductId, InventoryPool>,
    persistence: P,
}

impl<P: CartPersistence> CartStore<P> {
    /// Load the cart from persistence. An absent or unreadable snapshot
    /// yields an empty cart.
    #[must_use]
    pub fn load(persistence: P) -> Self {
        let lines = persistence
            .load()
            .and_then(|snapshot| serde_json::from_str::<PersistedCart>(&snapshot).ok())
            .map(|persisted| persisted.lines)
            .unwrap_or_default();

        Self {
            lines,
            pools: HashMap::new(),
            persistence,
        }
    }

    /// Build a cart directly from lines (stateless validation path).
    #[must_use]
    pub fn from_lines(lines: Vec<CartLineItem>, persistence: P) -> Self {
        Self {
            lines,
            pools: HashMap::new(),
            persistence,
        }
    }

    /// Current cart lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total item count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Cart subtotal in cents.
    #[must_use]
    pub fn subtotal_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| line.unit_price_cents * i64::from(line.quantity))
            .sum()
    }

    /// Add an item, merging with an existing line for the same variant.
    ///
    /// The resulting quantity is clamped to what fits in the product's pool
    /// given the cart's other lines; sibling maxima are recomputed
    /// afterwards, since one variant's quantity changes every sibling's cap.
    pub fn add_item(&mut self, item: NewCartItem, pool: InventoryPool) -> CartMutation {
        self.pools.insert(item.product_id.clone(), pool);

        let line_item_id = LineItemId::from_parts(&item.product_id, &item.variant_id);
        let multiplier = item.base_unit_multiplier.max(1);
        let existing_quantity = self
            .find_line(&line_item_id)
            .map_or(0, |line| line.quantity);

        let other_usage = self.usage_excluding(&item.product_id, &line_item_id);
        let max = max_purchasable(&pool, other_usage, multiplier);
        let desired = existing_quantity.saturating_add(item.quantity);
        let quantity = max.clamp(desired);

        if quantity == 0 {
            if existing_quantity > 0 {
                return self.remove_item(&line_item_id);
            }
            return CartMutation::Rejected;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.line_item_id == line_item_id) {
            line.quantity = quantity;
        } else {
            self.lines.push(CartLineItem {
                line_item_id,
                product_id: item.product_id.clone(),
                variant_id: item.variant_id,
                product_name: item.product_name,
                nickname: item.nickname,
                unit_price_cents: item.unit_price_cents,
                quantity,
                base_unit_multiplier: multiplier,
                cached_max_quantity: max,
            });
        }

        self.refresh_product(&item.product_id);
        self.persist();

        if quantity < desired {
            CartMutation::Clamped { quantity }
        } else {
            CartMutation::Applied { quantity }
        }
    }

    /// Set a line's quantity. Zero (or less, at the API boundary) removes
    /// the line; anything else is clamped to the recomputed maximum.
    pub fn update_quantity(&mut self, line_item_id: &LineItemId, quantity: u32) -> CartMutation {
        if quantity == 0 {
            return self.remove_item(line_item_id);
        }

        let Some(line) = self.find_line(line_item_id) else {
            return CartMutation::NotFound;
        };
        let product_id = line.product_id.clone();
        let multiplier = line.base_unit_multiplier;

        let pool = self.pool_for(&product_id);
        let other_usage = self.usage_excluding(&product_id, line_item_id);
        let max = max_purchasable(&pool, other_usage, multiplier);
        let clamped = max.clamp(quantity);

        if clamped == 0 {
            return self.remove_item(line_item_id);
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.line_item_id == line_item_id) {
            line.quantity = clamped;
        }
        self.refresh_product(&product_id);
        self.persist();

        if clamped < quantity {
            CartMutation::Clamped { quantity: clamped }
        } else {
            CartMutation::Applied { quantity: clamped }
        }
    }

    /// Remove a line. Sibling maxima are recomputed afterwards, since
    /// removal frees pool capacity.
    pub fn remove_item(&mut self, line_item_id: &LineItemId) -> CartMutation {
        let Some(position) = self
            .lines
            .iter()
            .position(|line| &line.line_item_id == line_item_id)
        else {
            return CartMutation::NotFound;
        };

        let product_id = self.lines.remove(position).product_id;
        self.refresh_product(&product_id);
        self.persist();
        CartMutation::Removed
    }

    /// Empty the cart and its persisted snapshot.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.pools.clear();
        self.persistence.clear();
    }

    fn find_line(&self, line_item_id: &LineItemId) -> Option<&CartLineItem> {
        self.lines
            .iter()
            .find(|line| &line.line_item_id == line_item_id)
    }

    /// Latest known pool for a product. Unknown products (a reloaded cart
    /// before validation) are provisionally treated as unlimited.
    fn pool_for(&self, product_id: &VendorProductId) -> InventoryPool {
        self.pools
            .get(product_id)
            .copied()
            .unwrap_or_else(InventoryPool::unlimited)
    }

    /// Base units committed to a product by every line except the one named.
    fn usage_excluding(&self, product_id: &VendorProductId, line_item_id: &LineItemId) -> u64 {
        self.lines
            .iter()
            .filter(|line| &line.product_id == product_id && &line.line_item_id != line_item_id)
            .map(CartLineItem::usage)
            .sum()
    }

    /// Re-derive every line of a product against the shared pool: clamp
    /// quantities that no longer fit (dropping lines clamped to zero) and
    /// refresh each survivor's cached maximum.
    ///
    /// Returns the lines that changed, with before/after quantities
    /// (`after == 0` means the line was dropped). Mutations discard the
    /// changes (clamping is silent there); validation turns them into
    /// notifications.
    fn refresh_product(&mut self, product_id: &VendorProductId) -> Vec<LineChange> {
        let pool = self.pool_for(product_id);
        let mut changes = Vec::new();

        // Clamp pass. Each line is sized against the *current* usage of its
        // siblings, so earlier clamps free capacity for later lines but a
        // line is never clamped below what the final state permits.
        let mut index = 0;
        while index < self.lines.len() {
            let Some(line) = self.lines.get(index) else {
                break;
            };
            if &line.product_id != product_id {
                index += 1;
                continue;
            }

            let line_id = line.line_item_id.clone();
            let before = line.quantity;
            let multiplier = line.base_unit_multiplier;
            let other_usage = self.usage_excluding(product_id, &line_id);
            let max = max_purchasable(&pool, other_usage, multiplier);
            let after = max.clamp(before);

            if after == 0 {
                let removed = self.lines.remove(index);
                changes.push(LineChange {
                    line: removed,
                    before,
                    after: 0,
                });
                continue;
            }

            if let Some(line) = self.lines.get_mut(index) {
                line.quantity = after;
                if after != before {
                    changes.push(LineChange {
                        line: line.clone(),
                        before,
                        after,
                    });
                }
            }
            index += 1;
        }

        // Cached-max pass over the settled state.
        let maxima: Vec<(LineItemId, Allocation)> = self
            .lines
            .iter()
            .filter(|line| &line.product_id == product_id)
            .map(|line| {
                let other_usage = self.usage_excluding(product_id, &line.line_item_id);
                let max = max_purchasable(&pool, other_usage, line.base_unit_multiplier);
                (line.line_item_id.clone(), max)
            })
            .collect();
        for (line_id, max) in maxima {
            if let Some(line) = self.lines.iter_mut().find(|l| l.line_item_id == line_id) {
                line.cached_max_quantity = max;
            }
        }

        changes
    }

    /// Record a fresh inventory pool for a product (validation path).
    fn record_pool(&mut self, product_id: VendorProductId, pool: InventoryPool) {
        self.pools.insert(product_id, pool);
    }

    fn persist(&mut self) {
        #[allow(clippy::expect_used)]
        let snapshot = serde_json::to_string(&PersistedCart {
            lines: self.lines.clone(),
        })
        .expect("cart lines serialize to JSON");
        self.persistence.save(&snapshot);
    }
}

/// A line whose quantity changed during a refresh.
#[derive(Debug, Clone)]
pub(crate) struct LineChange {
    pub line: CartLineItem,
    pub before: u32,
    pub after: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn line_id(product: &str, variant: &str) -> LineItemId {
        LineItemId::from_parts(&VendorProductId::new(product), &VariantId::new(variant))
    }

    fn product_usage<P: CartPersistence>(store: &CartStore<P>, product: &str) -> u64 {
        let id = VendorProductId::new(product);
        store
            .lines()
            .iter()
            .filter(|line| line.product_id == id)
            .map(CartLineItem::usage)
            .sum()
    }

    #[test]
    fn test_add_within_pool() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        let result = store.add_item(item("p", "8oz", 3, 2), InventoryPool::tracked(100));
        assert_eq!(result, CartMutation::Applied { quantity: 3 });
        assert_eq!(store.item_count(), 3);
        assert_eq!(product_usage(&store, "p"), 6);
    }

    #[test]
    fn test_add_merges_existing_line() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(100));
        store.add_item(item("p", "8oz", 3, 2), InventoryPool::tracked(100));
        assert_eq!(store.lines().len(), 1);
        assert_eq!(store.lines()[0].quantity, 5);
    }

    #[test]
    fn test_add_clamps_to_pool() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        // 10 base units, multiplier 4 => at most 2
        let result = store.add_item(item("p", "1lb", 5, 4), InventoryPool::tracked(10));
        assert_eq!(result, CartMutation::Clamped { quantity: 2 });
        assert_eq!(store.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_rejected_when_nothing_fits() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "4oz", 10, 1), InventoryPool::tracked(10));
        let result = store.add_item(item("p", "1lb", 1, 4), InventoryPool::tracked(10));
        assert_eq!(result, CartMutation::Rejected);
        assert_eq!(store.lines().len(), 1);
    }

    #[test]
    fn test_sibling_max_shrinks_as_pool_fills() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "1lb", 1, 4), InventoryPool::tracked(100));
        assert_eq!(
            store.lines()[0].cached_max_quantity,
            Allocation::Limited(25)
        );

        // 10 base units of 4oz reduce the 1lb max to floor(90 / 4) = 22
        store.add_item(item("p", "4oz", 10, 1), InventoryPool::tracked(100));
        let one_lb = store
            .lines()
            .iter()
            .find(|l| l.nickname == "1lb")
            .expect("1lb line");
        assert_eq!(one_lb.cached_max_quantity, Allocation::Limited(22));
    }

    #[test]
    fn test_update_quantity_clamps() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "1lb", 1, 4), InventoryPool::tracked(20));
        let result = store.update_quantity(&line_id("p", "1lb"), 50);
        assert_eq!(result, CartMutation::Clamped { quantity: 5 });
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(20));
        let result = store.update_quantity(&line_id("p", "8oz"), 0);
        assert_eq!(result, CartMutation::Removed);
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_missing_line() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        assert_eq!(
            store.update_quantity(&line_id("p", "8oz"), 1),
            CartMutation::NotFound
        );
    }

    #[test]
    fn test_remove_frees_capacity_for_siblings() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "4oz", 10, 1), InventoryPool::tracked(20));
        store.add_item(item("p", "1lb", 2, 4), InventoryPool::tracked(20));
        let one_lb_max_before = store
            .lines()
            .iter()
            .find(|l| l.nickname == "1lb")
            .expect("1lb line")
            .cached_max_quantity;
        assert_eq!(one_lb_max_before, Allocation::Limited(2));

        store.remove_item(&line_id("p", "4oz"));
        let one_lb_max_after = store
            .lines()
            .iter()
            .find(|l| l.nickname == "1lb")
            .expect("1lb line")
            .cached_max_quantity;
        assert_eq!(one_lb_max_after, Allocation::Limited(5));
    }

    #[test]
    fn test_invariant_holds_across_mutation_sequence() {
        let pool = InventoryPool::tracked(30);
        let mut store = CartStore::load(MemoryCartPersistence::default());

        store.add_item(item("p", "4oz", 12, 1), pool);
        assert!(product_usage(&store, "p") <= 30);
        store.add_item(item("p", "8oz", 6, 2), pool);
        assert!(product_usage(&store, "p") <= 30);
        store.add_item(item("p", "1lb", 9, 4), pool);
        assert!(product_usage(&store, "p") <= 30);
        store.update_quantity(&line_id("p", "4oz"), 30);
        assert!(product_usage(&store, "p") <= 30);
        store.remove_item(&line_id("p", "8oz"));
        assert!(product_usage(&store, "p") <= 30);
        store.update_quantity(&line_id("p", "1lb"), 100);
        assert!(product_usage(&store, "p") <= 30);
    }

    #[test]
    fn test_products_do_not_share_pools() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("a", "4oz", 10, 1), InventoryPool::tracked(10));
        let result = store.add_item(item("b", "4oz", 10, 1), InventoryPool::tracked(10));
        assert_eq!(result, CartMutation::Applied { quantity: 10 });
    }

    #[test]
    fn test_unlimited_pool_never_clamps() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        let result = store.add_item(item("p", "1lb", 500, 4), InventoryPool::unlimited());
        assert_eq!(result, CartMutation::Applied { quantity: 500 });
        assert_eq!(
            store.lines()[0].cached_max_quantity,
            Allocation::Unlimited
        );
    }

    #[test]
    fn test_persistence_roundtrip() {
        let mut persistence = MemoryCartPersistence::default();
        {
            let mut store = CartStore::load(persistence.clone());
            store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(100));
            persistence = store.persistence;
        }

        let reloaded = CartStore::load(persistence);
        assert_eq!(reloaded.lines().len(), 1);
        assert_eq!(reloaded.lines()[0].quantity, 2);
        assert_eq!(reloaded.lines()[0].nickname, "8oz");
    }

    #[test]
    fn test_corrupt_snapshot_yields_empty_cart() {
        let mut persistence = MemoryCartPersistence::default();
        persistence.save("not json at all");
        let store = CartStore::load(persistence);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_empties_store_and_persistence() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 2, 2), InventoryPool::tracked(100));
        store.clear();
        assert!(store.is_empty());
        assert!(store.persistence.load().is_none());
    }

    #[test]
    fn test_subtotal() {
        let mut store = CartStore::load(MemoryCartPersistence::default());
        store.add_item(item("p", "8oz", 3, 2), InventoryPool::tracked(100));
        assert_eq!(store.subtotal_cents(), 3 * 1400);
    }
}
