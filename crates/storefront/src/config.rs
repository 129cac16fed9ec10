//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `VENDOR_WEBHOOK_SECRET` - Webhook signing secret (high entropy)
//! - `STRIPE_SECRET_KEY` - Stripe API key (when `PAYMENT_VENDOR=stripe`)
//! - `SQUARE_ACCESS_TOKEN` - Square API token (when `PAYMENT_VENDOR=square`)
//! - `SQUARE_LOCATION_ID` - Square location (when `PAYMENT_VENDOR=square`)
//! - `SANITY_PROJECT_ID` - Sanity project identifier
//! - `SANITY_DATASET` - Sanity dataset name (e.g. production)
//! - `SANITY_WRITE_TOKEN` - Sanity token with write access
//! - `RESEND_API_KEY` - Transactional email API key
//! - `CONTACT_FROM_EMAIL` - Sender address for contact form mail
//! - `CONTACT_TO_EMAIL` - Recipient address for contact form mail
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `PAYMENT_VENDOR` - `stripe` or `square` (default: stripe)
//! - `SANITY_API_VERSION` - Sanity API version (default: 2024-01-01)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Which payment vendor backs the catalog
    pub vendor: VendorConfig,
    /// Webhook signing secret shared with the vendor
    pub webhook_secret: SecretString,
    /// Sanity CMS configuration
    pub sanity: SanityConfig,
    /// Transactional email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Payment vendor selection with per-vendor credentials.
#[derive(Debug, Clone)]
pub enum VendorConfig {
    Stripe(StripeConfig),
    Square(SquareConfig),
}

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub secret_key: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Square API configuration.
#[derive(Clone)]
pub struct SquareConfig {
    /// Personal access token
    pub access_token: SecretString,
    /// Location checkouts are created against
    pub location_id: String,
}

impl std::fmt::Debug for SquareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SquareConfig")
            .field("access_token", &"[REDACTED]")
            .field("location_id", &self.location_id)
            .finish()
    }
}

/// Sanity CMS configuration.
///
/// Implements `Debug` manually to redact the write token.
#[derive(Clone)]
pub struct SanityConfig {
    /// Sanity project identifier
    pub project_id: String,
    /// Dataset name (e.g. production)
    pub dataset: String,
    /// API version date string
    pub api_version: String,
    /// Token with write access to the dataset
    pub write_token: SecretString,
}

impl std::fmt::Debug for SanityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("write_token", &"[REDACTED]")
            .finish()
    }
}

/// Transactional email configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// Email API key
    pub api_key: SecretString,
    /// Sender address for outbound mail
    pub from_address: String,
    /// Where contact form submissions land
    pub contact_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("contact_address", &self.contact_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the webhook secret fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let vendor = VendorConfig::from_env()?;
        let webhook_secret = get_validated_secret("VENDOR_WEBHOOK_SECRET")?;
        let sanity = SanityConfig::from_env()?;
        let email = EmailConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            vendor,
            webhook_secret,
            sanity,
            email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl VendorConfig {
    /// Select and load the active payment vendor from `PAYMENT_VENDOR`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection is unrecognized or the selected
    /// vendor's credentials are unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("PAYMENT_VENDOR", "stripe").to_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe(StripeConfig::from_env()?)),
            "square" => Ok(Self::Square(SquareConfig::from_env()?)),
            other => Err(ConfigError::InvalidEnvVar(
                "PAYMENT_VENDOR".to_string(),
                format!("expected 'stripe' or 'square', got '{other}'"),
            )),
        }
    }
}

impl StripeConfig {
    /// Load Stripe credentials from the environment.
    ///
    /// Public so the migration CLI can talk to Stripe regardless of which
    /// vendor is active.
    ///
    /// # Errors
    ///
    /// Returns an error if `STRIPE_SECRET_KEY` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_required_secret("STRIPE_SECRET_KEY")?,
        })
    }
}

impl SquareConfig {
    /// Load Square credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQUARE_ACCESS_TOKEN` or `SQUARE_LOCATION_ID`
    /// is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_token: get_required_secret("SQUARE_ACCESS_TOKEN")?,
            location_id: get_required_env("SQUARE_LOCATION_ID")?,
        })
    }
}

impl SanityConfig {
    /// Load CMS connection settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("SANITY_PROJECT_ID")?,
            dataset: get_required_env("SANITY_DATASET")?,
            api_version: get_env_or_default("SANITY_API_VERSION", "2024-01-01"),
            write_token: get_required_secret("SANITY_WRITE_TOKEN")?,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_secret("RESEND_API_KEY")?,
            from_address: get_required_env("CONTACT_FROM_EMAIL")?,
            contact_address: get_required_env("CONTACT_TO_EMAIL")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Secret length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real signing secrets are randomly generated and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
