//! Integration tests for Driftwood Roasters.
//!
//! The storefront router is exercised in-process with
//! `tower::ServiceExt::oneshot` against a mock payment vendor, so no
//! external service or network access is needed.
//!
//! ```bash
//! cargo test -p driftwood-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use driftwood_core::catalog::{PriceVariant, VendorProduct};
use driftwood_core::inventory::InventoryPool;
use driftwood_core::types::{OrderId, VariantId, VendorProductId};
use driftwood_storefront::config::{
    EmailConfig, SanityConfig, StorefrontConfig, StripeConfig, VendorConfig,
};
use driftwood_storefront::state::AppState;
use driftwood_storefront::vendor::{
    CheckoutLine, CheckoutSession, OrderSummary, PaymentVendorPort, ProductUsage, VendorError,
};

/// Webhook signing secret used by the test configuration.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_integration_gK9rTq2xVb7mHs4w";

/// A recorded checkout session creation.
#[derive(Debug, Clone)]
pub struct RecordedCheckout {
    pub lines: Vec<CheckoutLine>,
    pub usage: Vec<ProductUsage>,
}

/// In-memory [`PaymentVendorPort`] backed by a fixed product list.
///
/// Mutating calls are recorded so tests can assert on them.
#[derive(Default)]
pub struct MockVendor {
    pub products: Mutex<Vec<VendorProduct>>,
    pub decrements: Mutex<Vec<(VendorProductId, u64)>>,
    pub checkouts: Mutex<Vec<RecordedCheckout>>,
    pub metadata_writes: Mutex<Vec<(VariantId, u32)>>,
    pub archived: Mutex<Vec<VendorProductId>>,
}

impl MockVendor {
    #[must_use]
    pub fn with_products(products: Vec<VendorProduct>) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(products),
            ..Self::default()
        })
    }
}

#[async_trait]
impl PaymentVendorPort for MockVendor {
    async fn list_products(&self) -> Result<Vec<VendorProduct>, VendorError> {
        Ok(self.products.lock().unwrap().clone())
    }

    async fn get_product(&self, id: &VendorProductId) -> Result<VendorProduct, VendorError> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| VendorError::NotFound(id.to_string()))
    }

    async fn list_prices(
        &self,
        product_id: &VendorProductId,
    ) -> Result<Vec<PriceVariant>, VendorError> {
        Ok(self.get_product(product_id).await?.variants)
    }

    async fn get_inventory(
        &self,
        product_id: &VendorProductId,
    ) -> Result<InventoryPool, VendorError> {
        Ok(self.get_product(product_id).await?.inventory)
    }

    async fn decrement_inventory(
        &self,
        product_id: &VendorProductId,
        base_units: u64,
    ) -> Result<(), VendorError> {
        let mut products = self.products.lock().unwrap();
        if let Some(product) = products.iter_mut().find(|p| &p.id == product_id) {
            if let Some(total) = product.inventory.total_base_units {
                product.inventory.total_base_units = Some(total.saturating_sub(base_units));
            }
        }
        self.decrements
            .lock()
            .unwrap()
            .push((product_id.clone(), base_units));
        Ok(())
    }

    async fn update_price_metadata(
        &self,
        variant_id: &VariantId,
        base_units: u32,
    ) -> Result<(), VendorError> {
        self.metadata_writes
            .lock()
            .unwrap()
            .push((variant_id.clone(), base_units));
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        lines: &[CheckoutLine],
        usage: &[ProductUsage],
    ) -> Result<CheckoutSession, VendorError> {
        self.checkouts.lock().unwrap().push(RecordedCheckout {
            lines: lines.to_vec(),
            usage: usage.to_vec(),
        });
        Ok(CheckoutSession {
            id: "sess_test_1".to_string(),
            url: "https://vendor.example/pay/sess_test_1".to_string(),
        })
    }

    async fn retrieve_order(&self, order_id: &OrderId) -> Result<OrderSummary, VendorError> {
        if order_id.as_str() == "sess_missing" {
            return Err(VendorError::NotFound(order_id.to_string()));
        }
        Ok(OrderSummary {
            id: order_id.clone(),
            total_cents: 4800,
            currency: "usd".to_string(),
            customer_email: Some("customer@example.com".to_string()),
            item_count: 2,
        })
    }

    async fn archive_product(&self, id: &VendorProductId) -> Result<(), VendorError> {
        self.archived.lock().unwrap().push(id.clone());
        Ok(())
    }
}

/// Build application state around a mock vendor.
///
/// The CMS and email endpoints in this config point nowhere; routes that
/// fall back gracefully on CMS failure are exercised through that path.
#[must_use]
pub fn test_state(vendor: Arc<dyn PaymentVendorPort>) -> AppState {
    let config = StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        vendor: VendorConfig::Stripe(StripeConfig {
            secret_key: SecretString::from("sk_test_unused"),
        }),
        webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET),
        sanity: SanityConfig {
            project_id: "invalid-test-project".to_string(),
            dataset: "test".to_string(),
            api_version: "2024-01-01".to_string(),
            write_token: SecretString::from("sk_test_unused"),
        },
        email: EmailConfig {
            api_key: SecretString::from("re_test_unused"),
            from_address: "shop@driftwood.test".to_string(),
            contact_address: "inbox@driftwood.test".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    };
    AppState::with_vendor(config, vendor)
}

/// A tracked two-variant coffee product for test fixtures.
#[must_use]
pub fn coffee_product(id: &str, name: &str, total_base_units: u64) -> VendorProduct {
    VendorProduct {
        id: VendorProductId::new(id),
        name: name.to_string(),
        description: Some("Single origin".to_string()),
        image_url: None,
        variants: vec![
            PriceVariant::new(VariantId::new(format!("{id}-4oz")), "4oz", 1200, Some(1)),
            PriceVariant::new(VariantId::new(format!("{id}-1lb")), "1lb", 3900, Some(4)),
        ],
        inventory: InventoryPool {
            total_base_units: Some(total_base_units),
            available: true,
        },
    }
}
