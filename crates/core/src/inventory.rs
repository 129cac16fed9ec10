//! Shared base-unit inventory pool and allocation math.
//!
//! Every product tracks one stock count in 4oz base units, shared by all of
//! its size variants. A "1 lb" variant draws four base units per bag, an
//! "8oz" variant draws two, and so on. The allocation calculator converts
//! that shared pool into a per-variant purchasable maximum given what the
//! rest of the cart has already committed.

use serde::{Deserialize, Serialize};

/// The maximum quantity a variant may hold in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "max", rename_all = "snake_case")]
pub enum Allocation {
    /// The product does not track inventory; no cap applies.
    Unlimited,
    /// At most this many units of the variant fit in the remaining pool.
    Limited(u32),
}

impl Allocation {
    /// Whether a given quantity fits within this allocation.
    #[must_use]
    pub const fn permits(&self, quantity: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited(max) => quantity <= *max,
        }
    }

    /// Clamp a requested quantity to this allocation.
    #[must_use]
    pub const fn clamp(&self, quantity: u32) -> u32 {
        match self {
            Self::Unlimited => quantity,
            Self::Limited(max) => {
                if quantity > *max {
                    *max
                } else {
                    quantity
                }
            }
        }
    }
}

/// The shared stock pool for one product, expressed in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPool {
    /// Total base units in stock. `None` means the vendor does not track
    /// inventory for this product and quantities are uncapped.
    pub total_base_units: Option<u64>,
    /// Whether the product is purchasable at all.
    pub available: bool,
}

impl InventoryPool {
    /// A pool with a fixed number of base units.
    #[must_use]
    pub const fn tracked(total_base_units: u64) -> Self {
        Self {
            total_base_units: Some(total_base_units),
            available: true,
        }
    }

    /// A pool with no inventory tracking.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            total_base_units: None,
            available: true,
        }
    }

    /// A pool marked unavailable regardless of count.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            total_base_units: Some(0),
            available: false,
        }
    }
}

/// Maximum total quantity of a variant purchasable from a shared pool.
///
/// `other_usage` is the sum of `quantity * base_unit_multiplier` across all
/// *other* cart lines of the same product; the candidate line's own usage is
/// excluded so the result is the total the line may hold, not the headroom
/// above its current quantity.
///
/// If the pool has already been over-committed (`other_usage` exceeds the
/// total because stock shrank after items were added), the remaining capacity
/// saturates at zero rather than going negative.
#[must_use]
pub fn max_purchasable(
    pool: &InventoryPool,
    other_usage: u64,
    candidate_multiplier: u32,
) -> Allocation {
    let Some(total) = pool.total_base_units else {
        return Allocation::Unlimited;
    };
    if !pool.available {
        return Allocation::Limited(0);
    }

    let remaining = total.saturating_sub(other_usage);
    let max = remaining / u64::from(candidate_multiplier.max(1));
    Allocation::Limited(u32::try_from(max).unwrap_or(u32::MAX))
}

/// Base units consumed by a line: `quantity * multiplier`, widened to avoid
/// overflow when summing across lines.
#[must_use]
pub const fn base_unit_usage(quantity: u32, multiplier: u32) -> u64 {
    quantity as u64 * multiplier as u64
}
