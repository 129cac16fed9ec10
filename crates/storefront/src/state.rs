//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::cms::CmsClient;
use crate::config::StorefrontConfig;
use crate::services::email::EmailClient;
use crate::sync::{SyncHandler, SyncMetrics};
use crate::vendor::{PaymentVendorPort, build_vendor};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds configuration and the external
/// service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    vendor: Arc<dyn PaymentVendorPort>,
    cms: CmsClient,
    email: EmailClient,
    catalog: CatalogService,
    sync: SyncHandler,
}

impl AppState {
    /// Create application state with the vendor adapter named in config.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let vendor = build_vendor(&config.vendor, &config.base_url);
        Self::with_vendor(config, vendor)
    }

    /// Create application state with an explicit vendor port.
    ///
    /// Integration tests use this to substitute a mock vendor.
    #[must_use]
    pub fn with_vendor(config: StorefrontConfig, vendor: Arc<dyn PaymentVendorPort>) -> Self {
        let cms = CmsClient::new(&config.sanity);
        let email = EmailClient::new(&config.email);
        let catalog = CatalogService::new(Arc::clone(&vendor), cms.clone());
        let sync = SyncHandler::new(
            Arc::clone(&vendor),
            Arc::new(cms.clone()),
            Arc::new(SyncMetrics::default()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                vendor,
                cms,
                email,
                catalog,
                sync,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the payment vendor port.
    #[must_use]
    pub fn vendor(&self) -> &Arc<dyn PaymentVendorPort> {
        &self.inner.vendor
    }

    /// Get a reference to the CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }

    /// Get a reference to the transactional email client.
    #[must_use]
    pub fn email(&self) -> &EmailClient {
        &self.inner.email
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the vendor-to-CMS sync handler.
    #[must_use]
    pub fn sync(&self) -> &SyncHandler {
        &self.inner.sync
    }
}
