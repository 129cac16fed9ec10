//! Vendor/CMS catalog merge.
//!
//! The payment vendor is the source of truth for identity, prices, variants,
//! and inventory; the CMS is the source of truth for editorial content
//! (display name, rich description, imagery, featured flag). The storefront
//! renders the merge of the two, keyed by the vendor product ID.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::inventory::InventoryPool;
use crate::sizing::resolve_base_units;
use crate::types::{VariantId, VendorProductId};

/// A purchasable size/price option belonging to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceVariant {
    pub variant_id: VariantId,
    /// Display label, e.g. "8oz" or "1 lb".
    pub nickname: String,
    pub unit_price_cents: i64,
    /// How many 4oz base units one item of this variant draws from the pool.
    /// Always at least 1.
    pub base_unit_multiplier: u32,
    /// True when the multiplier came from nickname inference rather than
    /// explicit metadata. Sync uses this to write the value back.
    #[serde(default)]
    pub multiplier_inferred: bool,
}

impl PriceVariant {
    /// Build a variant, resolving the multiplier from explicit metadata with
    /// nickname inference as the fallback.
    #[must_use]
    pub fn new(
        variant_id: VariantId,
        nickname: impl Into<String>,
        unit_price_cents: i64,
        explicit_base_units: Option<u32>,
    ) -> Self {
        let nickname = nickname.into();
        let explicit = explicit_base_units.filter(|units| *units >= 1);
        let base_unit_multiplier = resolve_base_units(explicit, &nickname);
        Self {
            variant_id,
            nickname,
            unit_price_cents,
            base_unit_multiplier,
            multiplier_inferred: explicit.is_none(),
        }
    }
}

/// A product as reported by the payment vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProduct {
    pub id: VendorProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub variants: Vec<PriceVariant>,
    pub inventory: InventoryPool,
}

/// Editorial content for a product, as stored in the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmsContent {
    /// The CMS's own document ID.
    pub document_id: String,
    /// Vendor product this document mirrors.
    pub vendor_id: VendorProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// The unified product record the storefront renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// CMS document ID when editorial content exists, otherwise a synthetic
    /// ID derived deterministically from the vendor ID.
    pub id: String,
    pub vendor_id: VendorProductId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub variants: Vec<PriceVariant>,
    pub inventory: InventoryPool,
}

/// Deterministic placeholder ID for a vendor product with no CMS document.
///
/// Stable across merges so repeated renders key the same record identically.
#[must_use]
pub fn synthetic_document_id(vendor_id: &VendorProductId) -> String {
    let digest = Sha256::digest(vendor_id.as_str().as_bytes());
    format!("vendor-{}", &hex::encode(digest)[..16])
}

/// Merge vendor products with CMS editorial content.
///
/// Editorial fields prefer the CMS and fall back to vendor data; inventory
/// and variants always come from the vendor (the CMS copy is only a cache).
/// Missing fields degrade to empty defaults. The result is sorted featured
/// first, then by name (case-insensitive).
#[must_use]
pub fn merge_catalog(
    vendor_products: Vec<VendorProduct>,
    cms_content: &[CmsContent],
) -> Vec<CatalogProduct> {
    let mut merged: Vec<CatalogProduct> = vendor_products
        .into_iter()
        .map(|product| {
            let content = cms_content.iter().find(|c| c.vendor_id == product.id);
            merge_one(product, content)
        })
        .collect();

    merged.sort_by(|a, b| {
        b.is_featured
            .cmp(&a.is_featured)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    merged
}

fn merge_one(product: VendorProduct, content: Option<&CmsContent>) -> CatalogProduct {
    match content {
        Some(content) => CatalogProduct {
            id: content.document_id.clone(),
            name: content
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| product.name.clone()),
            description: content
                .description
                .clone()
                .or_else(|| product.description.clone())
                .unwrap_or_default(),
            image_url: content.image_url.clone().or(product.image_url),
            is_featured: content.is_featured,
            vendor_id: product.id,
            variants: product.variants,
            inventory: product.inventory,
        },
        None => CatalogProduct {
            id: synthetic_document_id(&product.id),
            name: product.name,
            description: product.description.unwrap_or_default(),
            image_url: product.image_url,
            is_featured: false,
            vendor_id: product.id,
            variants: product.variants,
            inventory: product.inventory,
        },
    }
}
