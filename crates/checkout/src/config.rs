//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_URL` - GraphQL endpoint of the commerce API
//!   (e.g., <https://store.example.com/graphql/>)
//! - `COMMERCE_PRODUCT_VARIANT_ID` - Variant the checkout is created with
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `COMMERCE_CHANNEL` - Sales channel slug (default: default-channel)
//! - `COMMERCE_APP_TOKEN` - App token sent as a bearer header
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use bramble_core::VariantId;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout application configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Commerce API configuration
    pub api: CommerceApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Commerce API configuration.
///
/// Implements `Debug` manually to redact the app token.
#[derive(Clone)]
pub struct CommerceApiConfig {
    /// GraphQL endpoint URL
    pub api_url: Url,
    /// Sales channel slug the checkout is created in
    pub channel: String,
    /// Product variant added to every new checkout
    pub product_variant_id: VariantId,
    /// Optional app token, sent as a bearer header
    pub app_token: Option<SecretString>,
}

impl std::fmt::Debug for CommerceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceApiConfig")
            .field("api_url", &self.api_url.as_str())
            .field("channel", &self.channel)
            .field("product_variant_id", &self.product_variant_id)
            .field(
                "app_token",
                &self.app_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("CHECKOUT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("CHECKOUT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_PORT".to_string(), e.to_string()))?;

        let api = CommerceApiConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            api,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("COMMERCE_API_URL")?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("COMMERCE_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            api_url,
            channel: get_env_or_default("COMMERCE_CHANNEL", "default-channel"),
            product_variant_id: VariantId::new(get_required_env("COMMERCE_PRODUCT_VARIANT_ID")?),
            app_token: get_optional_env("COMMERCE_APP_TOKEN").map(SecretString::from),
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
