//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::CommerceClient;
use crate::config::CheckoutConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the commerce API client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    commerce: CommerceClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: CheckoutConfig) -> Self {
        let commerce = CommerceClient::new(&config.api);

        Self {
            inner: Arc::new(AppStateInner { config, commerce }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }
}
