//! GraphQL operation definitions for the commerce API.
//!
//! The remote schema is an external contract and is not vendored into this
//! repository, so instead of derive codegen each operation implements
//! [`GraphQLQuery`] by hand: the document text lives in `graphql/` and the
//! variable/response types are written out below with the same module shape
//! the derive would produce. The client's generic `execute` only depends on
//! the trait, so swapping back to codegen later is a local change.

use graphql_client::{GraphQLQuery, QueryBody};

/// Implement [`GraphQLQuery`] for an operation whose `Variables`,
/// `ResponseData`, `QUERY` and `OPERATION_NAME` live in `$module`.
macro_rules! graphql_operation {
    ($op:ident, $module:ident) => {
        pub struct $op;

        impl GraphQLQuery for $op {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

graphql_operation!(CheckoutCreate, checkout_create);
graphql_operation!(GetCheckout, get_checkout);
graphql_operation!(CheckoutEmailUpdate, checkout_email_update);
graphql_operation!(CheckoutMetadataUpdate, checkout_metadata_update);
graphql_operation!(CheckoutShippingAddressUpdate, checkout_shipping_address_update);
graphql_operation!(CheckoutDeliveryMethodUpdate, checkout_delivery_method_update);
graphql_operation!(CheckoutBillingAddressUpdate, checkout_billing_address_update);
graphql_operation!(CheckoutPaymentCreate, checkout_payment_create);
graphql_operation!(CheckoutComplete, checkout_complete);
graphql_operation!(GetOrder, get_order);
graphql_operation!(AddressValidationRules, address_validation_rules);

/// Raw response types shared across operations, mirroring the fragments in
/// `graphql/checkout.graphql`.
pub mod wire {
    use rust_decimal::Decimal;
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Error {
        pub field: Option<String>,
        pub message: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MetadataItem {
        pub key: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CountryDisplay {
        pub code: String,
        pub country: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Money {
        pub amount: Decimal,
        pub currency: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct TaxedMoney {
        pub net: Money,
        pub gross: Money,
        pub tax: Money,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Address {
        #[serde(default)]
        pub first_name: String,
        #[serde(default)]
        pub last_name: String,
        #[serde(default)]
        pub company_name: String,
        #[serde(default)]
        pub street_address1: String,
        #[serde(default)]
        pub city: String,
        #[serde(default)]
        pub postal_code: String,
        #[serde(default)]
        pub country_area: String,
        pub country: Option<CountryDisplay>,
        #[serde(default)]
        pub metadata: Vec<MetadataItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ShippingMethod {
        pub id: String,
        pub name: String,
        pub price: Option<Money>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PaymentGateway {
        pub id: String,
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Channel {
        pub slug: String,
        #[serde(default)]
        pub countries: Option<Vec<CountryDisplay>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Product {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductMedia {
        pub url: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductVariant {
        pub product: Product,
        #[serde(default)]
        pub media: Option<Vec<ProductMedia>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CheckoutLine {
        pub quantity: i64,
        pub total_price: TaxedMoney,
        pub variant: ProductVariant,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Checkout {
        pub id: String,
        pub email: Option<String>,
        #[serde(default)]
        pub metadata: Vec<MetadataItem>,
        pub shipping_address: Option<Address>,
        pub billing_address: Option<Address>,
        #[serde(default)]
        pub shipping_methods: Option<Vec<ShippingMethod>>,
        #[serde(default)]
        pub available_payment_gateways: Vec<PaymentGateway>,
        pub total_price: TaxedMoney,
        pub channel: Option<Channel>,
        #[serde(default)]
        pub lines: Vec<CheckoutLine>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderPayment {
        pub gateway: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Order {
        pub id: String,
        pub number: String,
        pub created: chrono::DateTime<chrono::Utc>,
        #[serde(default)]
        pub payments: Vec<OrderPayment>,
        #[serde(default)]
        pub metadata: Vec<MetadataItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ChoiceValue {
        pub raw: Option<String>,
        pub verbose: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ValidationRules {
        #[serde(default)]
        pub required_fields: Vec<String>,
        #[serde(default)]
        pub allowed_fields: Vec<String>,
        #[serde(default)]
        pub postal_code_matchers: Vec<String>,
        #[serde(default)]
        pub postal_code_examples: Vec<String>,
        #[serde(default)]
        pub country_area_choices: Option<Vec<ChoiceValue>>,
    }
}

pub mod checkout_create {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "CheckoutCreate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CheckoutLineInput {
        pub quantity: i64,
        pub variant_id: String,
    }

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub channel: String,
        pub lines: Vec<CheckoutLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }
}

pub mod get_checkout {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "GetCheckout";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub checkout: Option<wire::Checkout>,
    }
}

pub mod checkout_email_update {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "CheckoutEmailUpdate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
        pub email: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_email_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }
}

pub mod checkout_metadata_update {
    use bramble_core::MetadataItem;
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "CheckoutMetadataUpdate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
        pub input: Vec<MetadataItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub update_metadata: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub item: Option<Item>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Item {
        #[serde(default)]
        pub metadata: Vec<wire::MetadataItem>,
    }
}

pub mod checkout_shipping_address_update {
    use serde::{Deserialize, Serialize};

    use super::wire;
    use crate::commerce::types::AddressInput;

    pub const OPERATION_NAME: &str = "CheckoutShippingAddressUpdate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub shipping_address: AddressInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_shipping_address_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }
}

pub mod checkout_delivery_method_update {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "CheckoutDeliveryMethodUpdate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub delivery_method_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_delivery_method_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }
}

pub mod checkout_billing_address_update {
    use serde::{Deserialize, Serialize};

    use super::wire;
    use crate::commerce::types::AddressInput;

    pub const OPERATION_NAME: &str = "CheckoutBillingAddressUpdate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub id: String,
        pub billing_address: AddressInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_billing_address_update: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }
}

pub mod checkout_payment_create {
    use serde::{Deserialize, Serialize};

    use super::wire;
    use crate::commerce::types::PaymentInput;

    pub const OPERATION_NAME: &str = "CheckoutPaymentCreate";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub checkout_id: String,
        pub input: PaymentInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_payment_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub payment: Option<PaymentRef>,
        pub checkout: Option<wire::Checkout>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PaymentRef {
        pub id: String,
    }
}

pub mod checkout_complete {
    use bramble_core::MetadataItem;
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "CheckoutComplete";
    pub const QUERY: &str = include_str!("../../../graphql/checkout.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub checkout_id: String,
        pub metadata: Vec<MetadataItem>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub checkout_complete: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Payload {
        pub order: Option<OrderRef>,
        #[serde(default)]
        pub errors: Vec<wire::Error>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderRef {
        pub id: String,
    }
}

pub mod get_order {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "GetOrder";
    pub const QUERY: &str = include_str!("../../../graphql/order.graphql");

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub order: Option<wire::Order>,
    }
}

pub mod address_validation_rules {
    use serde::{Deserialize, Serialize};

    use super::wire;

    pub const OPERATION_NAME: &str = "AddressValidationRules";
    pub const QUERY: &str = include_str!("../../../graphql/validation.graphql");

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub country_code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub country_area: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub address_validation_rules: Option<wire::ValidationRules>,
    }
}
