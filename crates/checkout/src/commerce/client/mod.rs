//! Commerce API client implementation.
//!
//! Uses the `graphql_client` envelope types with `reqwest` 0.13 for HTTP.
//! Checkout state is mutable and owned by the remote API, so nothing here is
//! cached; every call goes to the network.

mod conversions;
pub mod queries;

use std::sync::Arc;

use bramble_core::{CheckoutId, MetadataItem, OrderId, ShippingMethodId, VariantId};
use graphql_client::{GraphQLQuery, Response};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::commerce::types::{
    AddressInput, BillingAddressUpdated, CheckoutCompleted, CheckoutCreated, DeliveryMethodUpdated,
    EmailUpdated, MetadataUpdated, PaymentCreated, PaymentInput, ShippingAddressUpdated,
};
use crate::commerce::{Checkout, CommerceApi, CommerceError, Order, ValidationRules};
use crate::config::CommerceApiConfig;

use conversions::{
    convert_checkout, convert_metadata, convert_order, convert_user_errors,
    convert_validation_rules,
};
use queries::{
    AddressValidationRules, CheckoutBillingAddressUpdate, CheckoutComplete, CheckoutCreate,
    CheckoutDeliveryMethodUpdate, CheckoutEmailUpdate, CheckoutMetadataUpdate,
    CheckoutPaymentCreate, CheckoutShippingAddressUpdate, GetCheckout, GetOrder,
    address_validation_rules, checkout_billing_address_update, checkout_complete, checkout_create,
    checkout_delivery_method_update, checkout_email_update, checkout_metadata_update,
    checkout_payment_create, checkout_shipping_address_update, get_checkout, get_order,
};

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce GraphQL API.
///
/// Provides type-safe access to the checkout, order and address-validation
/// operations. Cloning is cheap; the HTTP client and endpoint are shared.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    endpoint: String,
    app_token: Option<String>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                endpoint: config.api_url.to_string(),
                app_token: config
                    .app_token
                    .as_ref()
                    .map(|token| token.expose_secret().to_string()),
            }),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, CommerceError>
    where
        Q::Variables: serde::Serialize,
    {
        let request_body = Q::build_query(variables);

        let mut request = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);

        if let Some(token) = &self.inner.app_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        // Check for non-success status codes
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::GraphQL(vec![super::GraphQLError {
                message: format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
                locations: vec![],
                path: vec![],
            }]));
        }

        // Parse the response
        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse commerce GraphQL response"
                );
                return Err(CommerceError::Parse(e));
            }
        };

        // Check for GraphQL errors
        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");

            return Err(CommerceError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| super::GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| super::GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce GraphQL response has no data and no errors"
            );
            CommerceError::GraphQL(vec![super::GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Checkout Queries
    // =========================================================================

    /// Create a checkout with one line of the given variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; business-level failures are
    /// reported in the returned payload's `errors` list.
    #[instrument(skip(self), fields(channel = %channel))]
    pub async fn create_checkout(
        &self,
        channel: &str,
        variant_id: &VariantId,
        quantity: i64,
    ) -> Result<CheckoutCreated, CommerceError> {
        let variables = checkout_create::Variables {
            channel: channel.to_string(),
            lines: vec![checkout_create::CheckoutLineInput {
                quantity,
                variant_id: variant_id.as_str().to_string(),
            }],
        };

        let data = self.execute::<CheckoutCreate>(variables).await?;
        let payload = data.checkout_create.unwrap_or_else(|| {
            tracing::warn!("checkoutCreate returned null payload");
            checkout_create::Payload {
                checkout: None,
                errors: vec![],
            }
        });

        Ok(CheckoutCreated {
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    /// Get an existing checkout by id.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if the checkout does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(checkout_id = %id))]
    pub async fn get_checkout(&self, id: &CheckoutId) -> Result<Checkout, CommerceError> {
        let variables = get_checkout::Variables {
            id: id.as_str().to_string(),
        };

        let data = self.execute::<GetCheckout>(variables).await?;

        data.checkout
            .map(convert_checkout)
            .ok_or_else(|| CommerceError::NotFound(format!("Checkout not found: {id}")))
    }

    /// Get a completed order by id.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::NotFound`] if the order does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, CommerceError> {
        let variables = get_order::Variables {
            id: id.as_str().to_string(),
        };

        let data = self.execute::<GetOrder>(variables).await?;

        data.order
            .map(convert_order)
            .ok_or_else(|| CommerceError::NotFound(format!("Order not found: {id}")))
    }

    /// Fetch address validation rules for a country, optionally narrowed to a
    /// country subdivision.
    ///
    /// A country the rule source knows nothing about yields `Ok(None)`; the
    /// schema builder falls back to its base schema in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(country = %country_code))]
    pub async fn address_validation_rules(
        &self,
        country_code: &str,
        country_area: Option<&str>,
    ) -> Result<Option<ValidationRules>, CommerceError> {
        let variables = address_validation_rules::Variables {
            country_code: country_code.to_string(),
            country_area: country_area
                .filter(|area| !area.is_empty())
                .map(ToString::to_string),
        };

        let data = self.execute::<AddressValidationRules>(variables).await?;

        Ok(data.address_validation_rules.map(convert_validation_rules))
    }
}

// =============================================================================
// Checkout Mutations (CommerceApi)
// =============================================================================

impl CommerceApi for CommerceClient {
    #[instrument(skip(self, input), fields(checkout_id = %id))]
    async fn update_metadata(
        &self,
        id: &CheckoutId,
        input: Vec<MetadataItem>,
    ) -> Result<MetadataUpdated, CommerceError> {
        let variables = checkout_metadata_update::Variables {
            id: id.as_str().to_string(),
            input,
        };

        let data = self.execute::<CheckoutMetadataUpdate>(variables).await?;
        let payload = data.update_metadata.unwrap_or_else(|| {
            tracing::warn!("updateMetadata returned null payload");
            checkout_metadata_update::Payload {
                item: None,
                errors: vec![],
            }
        });

        Ok(MetadataUpdated {
            metadata: payload.item.map(|item| convert_metadata(item.metadata)),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self, email), fields(checkout_id = %id))]
    async fn update_email(
        &self,
        id: &CheckoutId,
        email: &str,
    ) -> Result<EmailUpdated, CommerceError> {
        let variables = checkout_email_update::Variables {
            id: id.as_str().to_string(),
            email: email.to_string(),
        };

        let data = self.execute::<CheckoutEmailUpdate>(variables).await?;
        let payload = data.checkout_email_update.unwrap_or_else(|| {
            tracing::warn!("checkoutEmailUpdate returned null payload");
            checkout_email_update::Payload {
                checkout: None,
                errors: vec![],
            }
        });

        Ok(EmailUpdated {
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self, address), fields(checkout_id = %id))]
    async fn update_shipping_address(
        &self,
        id: &CheckoutId,
        address: AddressInput,
    ) -> Result<ShippingAddressUpdated, CommerceError> {
        let variables = checkout_shipping_address_update::Variables {
            id: id.as_str().to_string(),
            shipping_address: address,
        };

        let data = self
            .execute::<CheckoutShippingAddressUpdate>(variables)
            .await?;
        let payload = data.checkout_shipping_address_update.unwrap_or_else(|| {
            tracing::warn!("checkoutShippingAddressUpdate returned null payload");
            checkout_shipping_address_update::Payload {
                checkout: None,
                errors: vec![],
            }
        });

        Ok(ShippingAddressUpdated {
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self), fields(checkout_id = %id, delivery_method_id = %delivery_method_id))]
    async fn update_delivery_method(
        &self,
        id: &CheckoutId,
        delivery_method_id: &ShippingMethodId,
    ) -> Result<DeliveryMethodUpdated, CommerceError> {
        let variables = checkout_delivery_method_update::Variables {
            id: id.as_str().to_string(),
            delivery_method_id: delivery_method_id.as_str().to_string(),
        };

        let data = self
            .execute::<CheckoutDeliveryMethodUpdate>(variables)
            .await?;
        let payload = data.checkout_delivery_method_update.unwrap_or_else(|| {
            tracing::warn!("checkoutDeliveryMethodUpdate returned null payload");
            checkout_delivery_method_update::Payload {
                checkout: None,
                errors: vec![],
            }
        });

        Ok(DeliveryMethodUpdated {
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self, address), fields(checkout_id = %id))]
    async fn update_billing_address(
        &self,
        id: &CheckoutId,
        address: AddressInput,
    ) -> Result<BillingAddressUpdated, CommerceError> {
        let variables = checkout_billing_address_update::Variables {
            id: id.as_str().to_string(),
            billing_address: address,
        };

        let data = self
            .execute::<CheckoutBillingAddressUpdate>(variables)
            .await?;
        let payload = data.checkout_billing_address_update.unwrap_or_else(|| {
            tracing::warn!("checkoutBillingAddressUpdate returned null payload");
            checkout_billing_address_update::Payload {
                checkout: None,
                errors: vec![],
            }
        });

        Ok(BillingAddressUpdated {
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self, amount, token), fields(checkout_id = %id, gateway = %gateway))]
    async fn create_payment(
        &self,
        id: &CheckoutId,
        amount: Decimal,
        gateway: &str,
        token: &str,
    ) -> Result<PaymentCreated, CommerceError> {
        let variables = checkout_payment_create::Variables {
            checkout_id: id.as_str().to_string(),
            input: PaymentInput {
                amount,
                gateway: gateway.to_string(),
                token: token.to_string(),
            },
        };

        let data = self.execute::<CheckoutPaymentCreate>(variables).await?;
        let payload = data.checkout_payment_create.unwrap_or_else(|| {
            tracing::warn!("checkoutPaymentCreate returned null payload");
            checkout_payment_create::Payload {
                payment: None,
                checkout: None,
                errors: vec![],
            }
        });

        Ok(PaymentCreated {
            payment_id: payload.payment.map(|payment| payment.id),
            checkout: payload.checkout.map(convert_checkout),
            errors: convert_user_errors(payload.errors),
        })
    }

    #[instrument(skip(self, metadata), fields(checkout_id = %id))]
    async fn complete_checkout(
        &self,
        id: &CheckoutId,
        metadata: Vec<MetadataItem>,
    ) -> Result<CheckoutCompleted, CommerceError> {
        let variables = checkout_complete::Variables {
            checkout_id: id.as_str().to_string(),
            metadata,
        };

        let data = self.execute::<CheckoutComplete>(variables).await?;
        let payload = data.checkout_complete.unwrap_or_else(|| {
            tracing::warn!("checkoutComplete returned null payload");
            checkout_complete::Payload {
                order: None,
                errors: vec![],
            }
        });

        Ok(CheckoutCompleted {
            order_id: payload.order.map(|order| OrderId::new(order.id)),
            errors: convert_user_errors(payload.errors),
        })
    }
}
