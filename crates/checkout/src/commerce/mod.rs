//! Commerce GraphQL API client.
//!
//! # Architecture
//!
//! - Uses the `graphql-client` request/response envelope with hand-written
//!   operation documents (the remote schema is a fixed external contract)
//! - The remote API is the source of truth - NO local persistence, direct
//!   API calls only
//! - Mutation payloads carry business-level errors inline; only transport
//!   and GraphQL-level failures produce a [`CommerceError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use bramble_checkout::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.api);
//!
//! // Create a checkout with the configured product
//! let created = client.create_checkout("default-channel", &variant_id, 1).await?;
//!
//! // Load it again later
//! let checkout = client.get_checkout(&checkout_id).await?;
//! ```

mod client;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use bramble_core::{CheckoutId, MetadataItem, ShippingMethodId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when interacting with the commerce API.
///
/// Business-level failures (invalid input, unavailable operations) are NOT
/// errors at this layer; they travel inside the mutation payloads as
/// [`UserError`] lists.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the remote API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// A GraphQL error returned by the commerce API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The mutation surface the checkout flow drives.
///
/// One implementation talks to the real commerce API
/// ([`CommerceClient`]); tests substitute a call-recording fake. Every
/// method takes plain scalar/structured arguments and resolves to a payload
/// whose nested `errors` list carries business-level failures; an `Err`
/// means the request itself failed (transport or GraphQL layer).
pub trait CommerceApi {
    /// Merge metadata entries into the checkout's metadata list.
    fn update_metadata(
        &self,
        id: &CheckoutId,
        input: Vec<MetadataItem>,
    ) -> impl Future<Output = Result<MetadataUpdated, CommerceError>>;

    /// Set the buyer email.
    fn update_email(
        &self,
        id: &CheckoutId,
        email: &str,
    ) -> impl Future<Output = Result<EmailUpdated, CommerceError>>;

    /// Replace the shipping address.
    fn update_shipping_address(
        &self,
        id: &CheckoutId,
        address: AddressInput,
    ) -> impl Future<Output = Result<ShippingAddressUpdated, CommerceError>>;

    /// Select a delivery method by id.
    fn update_delivery_method(
        &self,
        id: &CheckoutId,
        delivery_method_id: &ShippingMethodId,
    ) -> impl Future<Output = Result<DeliveryMethodUpdated, CommerceError>>;

    /// Replace the billing address.
    fn update_billing_address(
        &self,
        id: &CheckoutId,
        address: AddressInput,
    ) -> impl Future<Output = Result<BillingAddressUpdated, CommerceError>>;

    /// Create a payment for the given amount.
    fn create_payment(
        &self,
        id: &CheckoutId,
        amount: Decimal,
        gateway: &str,
        token: &str,
    ) -> impl Future<Output = Result<PaymentCreated, CommerceError>>;

    /// Convert the checkout into an order, attaching the given metadata.
    fn complete_checkout(
        &self,
        id: &CheckoutId,
        metadata: Vec<MetadataItem>,
    ) -> impl Future<Output = Result<CheckoutCompleted, CommerceError>>;
}
