//! CLI command implementations.

pub mod cms;
pub mod migrate;
pub mod sync;
pub mod vendor;

use std::sync::Arc;

use driftwood_storefront::config::{SanityConfig, VendorConfig};
use driftwood_storefront::vendor::{PaymentVendorPort, build_vendor};

/// Build the active vendor adapter from the environment.
pub(crate) fn vendor_from_env() -> Result<Arc<dyn PaymentVendorPort>, Box<dyn std::error::Error>> {
    let config = VendorConfig::from_env()?;
    let base_url = std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    Ok(build_vendor(&config, &base_url))
}

/// Build the CMS client from the environment.
pub(crate) fn cms_from_env()
-> Result<driftwood_storefront::cms::CmsClient, Box<dyn std::error::Error>> {
    let config = SanityConfig::from_env()?;
    Ok(driftwood_storefront::cms::CmsClient::new(&config))
}
