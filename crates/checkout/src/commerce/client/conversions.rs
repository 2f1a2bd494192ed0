//! Wire-to-domain type conversion functions.

use bramble_core::{CheckoutId, Metadata, MetadataItem, Money, OrderId, ShippingMethodId, TaxedMoney};

use super::queries::wire;
use crate::commerce::types::{
    Address, Channel, Checkout, CheckoutLine, CountryAreaChoice, CountryDisplay, Order,
    OrderPayment, PaymentGateway, ShippingMethod, UserError, ValidationRules,
};

pub fn convert_user_error(error: wire::Error) -> UserError {
    UserError {
        field: error.field,
        message: error.message,
    }
}

pub fn convert_user_errors(errors: Vec<wire::Error>) -> Vec<UserError> {
    errors.into_iter().map(convert_user_error).collect()
}

pub fn convert_metadata(items: Vec<wire::MetadataItem>) -> Metadata {
    items
        .into_iter()
        .map(|item| MetadataItem::new(item.key, item.value))
        .collect()
}

fn convert_money(money: wire::Money) -> Money {
    Money::new(money.amount, money.currency)
}

fn convert_taxed_money(money: wire::TaxedMoney) -> TaxedMoney {
    TaxedMoney {
        net: convert_money(money.net),
        gross: convert_money(money.gross),
        tax: convert_money(money.tax),
    }
}

fn convert_country(country: wire::CountryDisplay) -> CountryDisplay {
    CountryDisplay {
        code: country.code,
        country: country.country,
    }
}

pub fn convert_address(address: wire::Address) -> Address {
    Address {
        first_name: address.first_name,
        last_name: address.last_name,
        company_name: address.company_name,
        street_address1: address.street_address1,
        city: address.city,
        postal_code: address.postal_code,
        country: address.country.map(convert_country),
        country_area: address.country_area,
        metadata: convert_metadata(address.metadata),
    }
}

fn convert_shipping_method(method: wire::ShippingMethod) -> ShippingMethod {
    ShippingMethod {
        id: ShippingMethodId::new(method.id),
        name: method.name,
        price: method.price.map(convert_money),
    }
}

fn convert_line(line: wire::CheckoutLine) -> CheckoutLine {
    CheckoutLine {
        quantity: line.quantity,
        total_price: convert_taxed_money(line.total_price),
        product_name: line.variant.product.name,
        media_url: line
            .variant
            .media
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|media| media.url),
    }
}

fn convert_channel(channel: Option<wire::Channel>) -> Channel {
    channel.map_or_else(Channel::default, |channel| Channel {
        slug: channel.slug,
        countries: channel
            .countries
            .unwrap_or_default()
            .into_iter()
            .map(convert_country)
            .collect(),
    })
}

pub fn convert_checkout(checkout: wire::Checkout) -> Checkout {
    Checkout {
        id: CheckoutId::new(checkout.id),
        email: checkout.email,
        metadata: convert_metadata(checkout.metadata),
        shipping_address: checkout.shipping_address.map(convert_address),
        billing_address: checkout.billing_address.map(convert_address),
        shipping_methods: checkout
            .shipping_methods
            .unwrap_or_default()
            .into_iter()
            .map(convert_shipping_method)
            .collect(),
        available_payment_gateways: checkout
            .available_payment_gateways
            .into_iter()
            .map(|gateway| PaymentGateway {
                id: gateway.id,
                name: gateway.name,
            })
            .collect(),
        total_price: convert_taxed_money(checkout.total_price),
        channel: convert_channel(checkout.channel),
        lines: checkout.lines.into_iter().map(convert_line).collect(),
    }
}

pub fn convert_order(order: wire::Order) -> Order {
    Order {
        id: OrderId::new(order.id),
        number: order.number,
        created: order.created,
        payments: order
            .payments
            .into_iter()
            .map(|payment| OrderPayment {
                gateway: payment.gateway,
            })
            .collect(),
        metadata: convert_metadata(order.metadata),
    }
}

pub fn convert_validation_rules(rules: wire::ValidationRules) -> ValidationRules {
    ValidationRules {
        required_fields: rules.required_fields,
        allowed_fields: rules.allowed_fields,
        postal_code_matchers: rules.postal_code_matchers,
        postal_code_examples: rules.postal_code_examples,
        country_area_choices: rules
            .country_area_choices
            .unwrap_or_default()
            .into_iter()
            .filter_map(|choice| match (choice.raw, choice.verbose) {
                (Some(raw), Some(verbose)) => Some(CountryAreaChoice { raw, verbose }),
                _ => None,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkout_json() -> &'static str {
        r#"{
            "id": "Q2hlY2tvdXQ6MQ==",
            "email": "buyer@example.com",
            "metadata": [{"key": "name", "value": "Ada Lovelace"}],
            "shippingAddress": {
                "firstName": "Ada",
                "lastName": "Lovelace",
                "companyName": "",
                "streetAddress1": "Main Street",
                "city": "Amsterdam",
                "postalCode": "1011 AB",
                "countryArea": "",
                "country": {"code": "NL", "country": "Netherlands"},
                "metadata": [{"key": "streetNumber", "value": "12"}]
            },
            "billingAddress": null,
            "shippingMethods": [
                {"id": "U2hpcHBpbmdNZXRob2Q6MQ==", "name": "DHL", "price": {"amount": 5.5, "currency": "EUR"}}
            ],
            "availablePaymentGateways": [
                {"id": "mirumee.payments.dummy", "name": "Dummy"}
            ],
            "totalPrice": {
                "net": {"amount": 10.0, "currency": "EUR"},
                "gross": {"amount": 12.5, "currency": "EUR"},
                "tax": {"amount": 2.5, "currency": "EUR"}
            },
            "channel": {
                "slug": "default-channel",
                "countries": [{"code": "NL", "country": "Netherlands"}]
            },
            "lines": [{
                "quantity": 1,
                "totalPrice": {
                    "net": {"amount": 10.0, "currency": "EUR"},
                    "gross": {"amount": 12.5, "currency": "EUR"},
                    "tax": {"amount": 2.5, "currency": "EUR"}
                },
                "variant": {
                    "product": {"name": "Monospace Tee"},
                    "media": [{"url": "https://example.com/tee.png"}]
                }
            }]
        }"#
    }

    #[test]
    fn test_convert_checkout_from_wire_json() {
        let wire: super::wire::Checkout =
            serde_json::from_str(sample_checkout_json()).expect("valid wire checkout");
        let checkout = convert_checkout(wire);

        assert_eq!(checkout.id.as_str(), "Q2hlY2tvdXQ6MQ==");
        assert_eq!(checkout.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(checkout.buyer_name(), Some("Ada Lovelace"));

        let shipping = checkout.shipping_address.expect("shipping address");
        assert_eq!(shipping.city, "Amsterdam");
        assert_eq!(shipping.metadata.get("streetNumber"), Some("12"));
        assert_eq!(
            shipping.country.as_ref().map(|c| c.code.as_str()),
            Some("NL")
        );

        assert_eq!(checkout.shipping_methods.len(), 1);
        assert_eq!(
            checkout.shipping_methods[0].id.as_str(),
            "U2hpcHBpbmdNZXRob2Q6MQ=="
        );
        assert_eq!(checkout.lines[0].product_name, "Monospace Tee");
        assert_eq!(
            checkout.lines[0].media_url.as_deref(),
            Some("https://example.com/tee.png")
        );
        assert_eq!(checkout.total_price.gross.display(), "\u{20ac} 12.5");
    }

    #[test]
    fn test_convert_checkout_snapshot_roundtrip() {
        // The domain type serializes to the snapshot stored in order
        // metadata; it must parse back to the same value.
        let wire: super::wire::Checkout =
            serde_json::from_str(sample_checkout_json()).expect("valid wire checkout");
        let checkout = convert_checkout(wire);

        let snapshot = serde_json::to_string(&checkout).expect("serialize snapshot");
        let back: crate::commerce::types::Checkout =
            serde_json::from_str(&snapshot).expect("parse snapshot");
        assert_eq!(back, checkout);
    }

    #[test]
    fn test_convert_validation_rules_drops_incomplete_choices() {
        let wire = super::wire::ValidationRules {
            required_fields: vec!["city".to_string()],
            allowed_fields: vec!["city".to_string(), "companyName".to_string()],
            postal_code_matchers: vec![],
            postal_code_examples: vec![],
            country_area_choices: Some(vec![
                super::wire::ChoiceValue {
                    raw: Some("CA".to_string()),
                    verbose: Some("California".to_string()),
                },
                super::wire::ChoiceValue {
                    raw: Some("??".to_string()),
                    verbose: None,
                },
            ]),
        };

        let rules = convert_validation_rules(wire);
        assert_eq!(rules.country_area_choices.len(), 1);
        assert_eq!(rules.country_area_choices[0].verbose, "California");
    }

    #[test]
    fn test_convert_checkout_without_optional_parts() {
        let json = r#"{
            "id": "Q2hlY2tvdXQ6Mg==",
            "email": null,
            "metadata": [],
            "shippingAddress": null,
            "billingAddress": null,
            "shippingMethods": null,
            "availablePaymentGateways": [],
            "totalPrice": {
                "net": {"amount": "0", "currency": "USD"},
                "gross": {"amount": "0", "currency": "USD"},
                "tax": {"amount": "0", "currency": "USD"}
            },
            "channel": null,
            "lines": []
        }"#;

        let wire: super::wire::Checkout = serde_json::from_str(json).expect("valid wire checkout");
        let checkout = convert_checkout(wire);

        assert!(!checkout.has_email());
        assert!(!checkout.has_shipping_address());
        assert!(checkout.shipping_methods.is_empty());
        assert!(checkout.channel.countries.is_empty());
    }
}
