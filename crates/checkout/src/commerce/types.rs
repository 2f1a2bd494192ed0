//! Domain types for the commerce API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! wire-format types in the client module. They also serialize to the
//! snapshot format stored in order metadata at completion time, which is why
//! every type here derives both `Serialize` and `Deserialize`.

use bramble_core::{
    CheckoutId, Metadata, MetadataItem, Money, OrderId, ShippingMethodId, TaxedMoney,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Country Types
// =============================================================================

/// A country code paired with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDisplay {
    /// Two-letter country code (e.g., "US").
    pub code: String,
    /// Localized country name (e.g., "United States of America").
    pub country: String,
}

/// The sales channel a checkout was created in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel slug.
    pub slug: String,
    /// Countries the channel sells to.
    #[serde(default)]
    pub countries: Vec<CountryDisplay>,
}

// =============================================================================
// Address Types
// =============================================================================

/// A postal address as stored on the remote checkout.
///
/// The remote schema has no native street number or subdivision fallback;
/// both travel in [`Address::metadata`] under the keys named in
/// [`bramble_core::types::metadata::keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub street_address1: String,
    pub city: String,
    pub postal_code: String,
    /// Country code plus display name.
    pub country: Option<CountryDisplay>,
    /// Country subdivision code; may be empty when only the metadata
    /// fallback was written.
    pub country_area: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Input for address-update mutations.
///
/// Field names follow the remote schema; the metadata list carries the
/// street number and subdivision fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub street_address1: String,
    pub city: String,
    pub postal_code: String,
    /// Two-letter country code.
    pub country: String,
    pub country_area: String,
    pub metadata: Vec<MetadataItem>,
}

// =============================================================================
// Checkout Types
// =============================================================================

/// A shipping method offered for the current shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub price: Option<Money>,
}

/// A payment gateway available for the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGateway {
    /// Gateway identifier (e.g., "mirumee.payments.dummy").
    pub id: String,
    /// Human-readable gateway name.
    pub name: String,
}

/// A single checkout line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub quantity: i64,
    pub total_price: TaxedMoney,
    /// Product display name.
    pub product_name: String,
    /// Thumbnail URL of the first product media entry.
    pub media_url: Option<String>,
}

/// The checkout aggregate, replaced wholesale from every successful server
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: CheckoutId,
    pub email: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub available_payment_gateways: Vec<PaymentGateway>,
    pub total_price: TaxedMoney,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub lines: Vec<CheckoutLine>,
}

impl Checkout {
    /// Buyer name stashed in metadata by the contact section.
    #[must_use]
    pub fn buyer_name(&self) -> Option<&str> {
        self.metadata.get(bramble_core::types::metadata::keys::NAME)
    }

    /// Whether the contact section has completed (email known).
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|email| !email.is_empty())
    }

    /// Whether the shipping section has completed.
    #[must_use]
    pub const fn has_shipping_address(&self) -> bool {
        self.shipping_address.is_some()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A payment recorded on a completed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    /// Gateway identifier, used for display only.
    pub gateway: String,
}

/// A completed order.
///
/// The order metadata carries the serialized checkout snapshot under the
/// `checkoutData` key; once the order exists the checkout itself may no
/// longer be queryable, so that snapshot is the sole source for the
/// confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub number: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub payments: Vec<OrderPayment>,
    #[serde(default)]
    pub metadata: Metadata,
}

// =============================================================================
// Validation Rules
// =============================================================================

/// A subdivision choice offered for a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAreaChoice {
    /// Raw subdivision code (e.g., "CA").
    pub raw: String,
    /// Display label (e.g., "California").
    pub verbose: String,
}

/// Per-country (optionally per-subdivision) address validation rules.
///
/// `required_fields` is a subset of `allowed_fields` by contract of the
/// remote rule source; `postal_code_matchers` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    pub required_fields: Vec<String>,
    pub allowed_fields: Vec<String>,
    pub postal_code_matchers: Vec<String>,
    pub postal_code_examples: Vec<String>,
    pub country_area_choices: Vec<CountryAreaChoice>,
}

// =============================================================================
// Mutation Payloads
// =============================================================================

/// A business-level error returned inside a mutation payload.
///
/// Transport and GraphQL-level failures never reach this type; they surface
/// as [`super::CommerceError`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Remote field name the error applies to, when field-specific.
    pub field: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
}

/// Payload of the create-checkout mutation.
#[derive(Debug, Clone)]
pub struct CheckoutCreated {
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the update-metadata mutation.
#[derive(Debug, Clone)]
pub struct MetadataUpdated {
    /// Full metadata list of the updated entity.
    pub metadata: Option<Metadata>,
    pub errors: Vec<UserError>,
}

/// Payload of the update-email mutation.
#[derive(Debug, Clone)]
pub struct EmailUpdated {
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the update-shipping-address mutation.
#[derive(Debug, Clone)]
pub struct ShippingAddressUpdated {
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the update-delivery-method mutation.
#[derive(Debug, Clone)]
pub struct DeliveryMethodUpdated {
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the update-billing-address mutation.
#[derive(Debug, Clone)]
pub struct BillingAddressUpdated {
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the create-payment mutation.
#[derive(Debug, Clone)]
pub struct PaymentCreated {
    /// Identifier of the created payment, absent on business failure.
    pub payment_id: Option<String>,
    pub checkout: Option<Checkout>,
    pub errors: Vec<UserError>,
}

/// Payload of the complete-checkout mutation.
#[derive(Debug, Clone)]
pub struct CheckoutCompleted {
    /// Identifier of the created order, absent on business failure.
    pub order_id: Option<OrderId>,
    pub errors: Vec<UserError>,
}

/// Input for the create-payment mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInput {
    pub amount: Decimal,
    pub gateway: String,
    pub token: String,
}
