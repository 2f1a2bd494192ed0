//! Checkout step state machine.
//!
//! Four ordered sections: Contact, Shipping, Payment and the terminal
//! order confirmation. Each section derives its render state from the
//! current checkout snapshot, and each submit runs a fixed sequence of
//! remote mutations through a [`CommerceApi`] implementation.
//!
//! # State ownership
//!
//! [`CheckoutFlow`] is the single owner of the in-memory checkout snapshot.
//! Handlers construct it from the loaded checkout, pass it into a submit,
//! and read the (possibly replaced) snapshot back out; there is no shared
//! ambient state. On every successful mutation that returns a checkout the
//! snapshot is replaced wholesale, never patched field by field.
//!
//! # Failure model
//!
//! Forward-only. A failing step aborts the remaining calls in its sequence
//! and surfaces a stage-specific message; mutations that already succeeded
//! are not compensated, matching the remote system's own lack of multi-step
//! transactions.

pub mod card;

use bramble_core::types::metadata::keys;
use bramble_core::{Email, EmailError, MetadataItem, OrderId};
use serde::Deserialize;

use crate::address::schema::FieldError;
use crate::address::{
    FieldValues, address_input_from_values, autocomplete_key, build_schema, to_autocomplete_format,
};
use crate::commerce::types::{Checkout, CountryDisplay, UserError, ValidationRules};
use crate::commerce::CommerceApi;

/// Banner message for transport-level failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, try again later";

/// Banner message when the shipping address yields no shipping methods.
pub const NO_SHIPPING_METHODS_MESSAGE: &str = "There are no shipping methods to choose from";

/// The one payment gateway this flow charges through.
pub const SELECTED_PAYMENT_GATEWAY_ID: &str = "mirumee.payments.dummy";

/// Country preselected in the payment country dropdown.
pub const DEFAULT_PAYMENT_COUNTRY: &str = "NL";

/// Country the billing address form starts from before the buyer picks one.
pub const DEFAULT_BILLING_COUNTRY: &str = "US";

/// Display name for a payment gateway id, where one is known.
#[must_use]
pub fn payment_gateway_display_name(id: &str) -> Option<&'static str> {
    match id {
        SELECTED_PAYMENT_GATEWAY_ID => Some("Mirumee Dummy Payment"),
        _ => None,
    }
}

// =============================================================================
// Section States
// =============================================================================

/// One collapsible step of the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Contact,
    Shipping,
    Payment,
}

impl Section {
    /// Route-segment name of the section.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        }
    }

    /// Parse a route-segment name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "contact" => Some(Self::Contact),
            "shipping" => Some(Self::Shipping),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

/// Render state of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Predecessor incomplete (or overview page): nothing actionable.
    Locked,
    /// Read-only rendering of previously accepted values.
    Collapsed,
    /// Live form.
    Expanded,
}

impl SectionState {
    #[must_use]
    pub const fn is_expanded(self) -> bool {
        matches!(self, Self::Expanded)
    }

    #[must_use]
    pub const fn is_collapsed(self) -> bool {
        matches!(self, Self::Collapsed)
    }

    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Render states for all three interactive sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStates {
    pub contact: SectionState,
    pub shipping: SectionState,
    pub payment: SectionState,
}

/// Derive the section states from the checkout snapshot.
///
/// - Contact auto-expands while neither name nor email is known.
/// - Shipping auto-expands exactly when contact is complete (email known)
///   and no shipping address is set; it is locked until then.
/// - Payment unlocks once a shipping address is set.
/// - In overview mode every section renders collapsed.
/// - `edit` re-expands a collapsed (never a locked) section.
#[must_use]
pub fn section_states(checkout: &Checkout, overview: bool, edit: Option<Section>) -> SectionStates {
    if overview {
        return SectionStates {
            contact: SectionState::Collapsed,
            shipping: SectionState::Collapsed,
            payment: SectionState::Collapsed,
        };
    }

    let contact_known = checkout.buyer_name().is_some() || checkout.has_email();
    let contact = if !contact_known || edit == Some(Section::Contact) {
        SectionState::Expanded
    } else {
        SectionState::Collapsed
    };

    let shipping = if !checkout.has_email() {
        SectionState::Locked
    } else if !checkout.has_shipping_address() || edit == Some(Section::Shipping) {
        SectionState::Expanded
    } else {
        SectionState::Collapsed
    };

    let payment = if checkout.has_shipping_address() {
        SectionState::Expanded
    } else {
        SectionState::Locked
    };

    SectionStates {
        contact,
        shipping,
        payment,
    }
}

// =============================================================================
// Submit Outcomes
// =============================================================================

/// Result of a section submit.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Section completed; the snapshot was updated and the section
    /// collapses.
    Advanced,
    /// Terminal: the checkout became an order.
    Placed(OrderId),
    /// Field-level failures in autofill-key space; the form stays open with
    /// the submitted values.
    Invalid(Vec<FieldError>),
    /// Section-level failure message; the form stays open, nothing already
    /// applied is rolled back.
    Failed(String),
}

/// Contact form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
}

fn validate_contact(form: &ContactForm) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if form.name.is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    } else if form.name.len() > 255 {
        errors.push(FieldError::new(
            "name",
            "Name must be at most 255 characters long",
        ));
    }

    match Email::parse(&form.email) {
        Ok(_) => {}
        Err(EmailError::Empty) => errors.push(FieldError::new("email", "Email is required")),
        Err(EmailError::TooLong { .. }) => errors.push(FieldError::new(
            "email",
            "Email must be at most 255 characters long",
        )),
        Err(_) => errors.push(FieldError::new("email", "Invalid email address")),
    }

    errors
}

/// Map a business-level error into an outcome: field errors translate to
/// autofill-key space and attach to the form, field-less errors become a
/// section-level banner.
fn user_error_outcome(error: Option<&UserError>) -> Option<Outcome> {
    let error = error?;
    let message = error
        .message
        .clone()
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

    Some(match &error.field {
        Some(field) => Outcome::Invalid(vec![FieldError::new(
            autocomplete_key(field).unwrap_or(field.as_str()),
            message,
        )]),
        None => Outcome::Failed(message),
    })
}

// =============================================================================
// CheckoutFlow
// =============================================================================

/// Owner of the in-memory checkout snapshot and driver of the section
/// mutation sequences.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    checkout: Checkout,
}

impl CheckoutFlow {
    #[must_use]
    pub const fn new(checkout: Checkout) -> Self {
        Self { checkout }
    }

    /// Current snapshot.
    #[must_use]
    pub const fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    /// Consume the flow and return the snapshot.
    #[must_use]
    pub fn into_checkout(self) -> Checkout {
        self.checkout
    }

    /// Submit the contact section.
    ///
    /// Change-detects against the snapshot: the name mutation is only issued
    /// when the name changed, the email mutation only when the email
    /// changed. Resubmitting identical values issues zero mutations and
    /// still collapses the section.
    pub async fn submit_contact(
        &mut self,
        api: &impl CommerceApi,
        form: &ContactForm,
    ) -> Outcome {
        let errors = validate_contact(form);
        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        if self.checkout.buyer_name() != Some(form.name.as_str()) {
            let payload = match api
                .update_metadata(
                    &self.checkout.id,
                    vec![MetadataItem::new(keys::NAME, form.name.clone())],
                )
                .await
            {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::error!(%error, "name update failed");
                    return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
                }
            };

            if let Some(error) = payload.errors.first()
                && error.field.as_deref() == Some("name")
            {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                return Outcome::Invalid(vec![FieldError::new("name", message)]);
            }

            match payload.metadata {
                Some(metadata) => self.checkout.metadata = metadata,
                None => self.checkout.metadata.set(keys::NAME, form.name.clone()),
            }
        }

        if self.checkout.email.as_deref() != Some(form.email.as_str()) {
            let payload = match api.update_email(&self.checkout.id, &form.email).await {
                Ok(payload) => payload,
                Err(error) => {
                    tracing::error!(%error, "email update failed");
                    return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
                }
            };

            if let Some(error) = payload.errors.first()
                && error.field.as_deref() == Some("email")
            {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                return Outcome::Invalid(vec![FieldError::new("email", message)]);
            }

            match payload.checkout {
                Some(checkout) => self.checkout = checkout,
                None => self.checkout.email = Some(form.email.clone()),
            }
        }

        Outcome::Advanced
    }

    /// Submit the shipping section.
    ///
    /// Validates against the schema built from `rules`, updates the shipping
    /// address with the metadata folding, then auto-selects the FIRST
    /// shipping method the response offers. The section only completes when
    /// both mutations succeed; zero offered methods is a dedicated,
    /// non-generic failure.
    pub async fn submit_shipping(
        &mut self,
        api: &impl CommerceApi,
        values: &FieldValues,
        rules: Option<&ValidationRules>,
    ) -> Outcome {
        let schema = build_schema(rules);
        let errors = schema.validate(values);
        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        let input = address_input_from_values(values);
        let payload = match api.update_shipping_address(&self.checkout.id, input).await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "shipping address update failed");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        if let Some(outcome) = user_error_outcome(payload.errors.first()) {
            return outcome;
        }
        if let Some(checkout) = payload.checkout {
            self.checkout = checkout;
        }

        let Some(first_method) = self.checkout.shipping_methods.first().cloned() else {
            return Outcome::Failed(NO_SHIPPING_METHODS_MESSAGE.to_string());
        };

        let payload = match api
            .update_delivery_method(&self.checkout.id, &first_method.id)
            .await
        {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "delivery method update failed");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        if let Some(outcome) = user_error_outcome(payload.errors.first()) {
            return outcome;
        }
        if let Some(checkout) = payload.checkout {
            self.checkout = checkout;
        }

        Outcome::Advanced
    }

    /// Submit the payment section.
    ///
    /// Runs the four-step sequence: billing address update (form values when
    /// `billing_address` is checked and validated against `rules`, otherwise
    /// the shipping address, unvalidated), gateway availability gate,
    /// payment create, checkout complete. Any failing step aborts the rest;
    /// nothing already applied is compensated.
    pub async fn submit_payment(
        &mut self,
        api: &impl CommerceApi,
        values: &FieldValues,
        billing_address: bool,
        rules: Option<&ValidationRules>,
    ) -> Outcome {
        let mut errors = card::validate(values);

        let billing_values = if billing_address {
            let schema = build_schema(rules);
            errors.extend(schema.validate(values));
            values.clone()
        } else {
            to_autocomplete_format(self.checkout.shipping_address.as_ref())
        };

        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        let input = address_input_from_values(&billing_values);
        let payload = match api.update_billing_address(&self.checkout.id, input).await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "billing address update failed");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        if let Some(outcome) = user_error_outcome(payload.errors.first()) {
            return outcome;
        }
        if let Some(checkout) = payload.checkout {
            self.checkout = checkout;
        }

        if !self
            .checkout
            .available_payment_gateways
            .iter()
            .any(|gateway| gateway.id == SELECTED_PAYMENT_GATEWAY_ID)
        {
            let name = payment_gateway_display_name(SELECTED_PAYMENT_GATEWAY_ID)
                .unwrap_or(SELECTED_PAYMENT_GATEWAY_ID);
            return Outcome::Failed(format!("The {name} payment gateway is not available"));
        }

        let token = values
            .get(card::CARD_NUMBER)
            .map(String::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let amount = self.checkout.total_price.gross.amount;

        let payload = match api
            .create_payment(&self.checkout.id, amount, SELECTED_PAYMENT_GATEWAY_ID, &token)
            .await
        {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "payment create failed");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        if payload.payment_id.is_none() {
            return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
        }
        if let Some(checkout) = payload.checkout {
            self.checkout = checkout;
        }

        let snapshot = match self.order_snapshot() {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::error!(%error, "failed to serialize checkout snapshot");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        let payload = match api
            .complete_checkout(
                &self.checkout.id,
                vec![MetadataItem::new(keys::CHECKOUT_DATA, snapshot)],
            )
            .await
        {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "checkout complete failed");
                return Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        };

        payload.order_id.map_or_else(
            || Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string()),
            Outcome::Placed,
        )
    }

    /// Serialize the snapshot stored on the completed order.
    ///
    /// The channel country list is reconstructed from the two address
    /// countries so the confirmation page can resolve country labels without
    /// the (possibly no longer queryable) channel.
    fn order_snapshot(&self) -> Result<String, serde_json::Error> {
        let mut snapshot = self.checkout.clone();

        let mut countries: Vec<CountryDisplay> = Vec::new();
        for address in [&snapshot.shipping_address, &snapshot.billing_address]
            .into_iter()
            .flatten()
        {
            if let Some(country) = &address.country
                && !countries.iter().any(|c| c.code == country.code)
            {
                countries.push(country.clone());
            }
        }
        snapshot.channel.countries = countries;

        serde_json::to_string(&snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bramble_core::{CheckoutId, Metadata, Money, ShippingMethodId, TaxedMoney};
    use rust_decimal::Decimal;

    use super::*;
    use crate::address::autocomplete;
    use crate::commerce::types::{
        Address, AddressInput, BillingAddressUpdated, Channel, CheckoutCompleted, CheckoutLine,
        DeliveryMethodUpdated, EmailUpdated, MetadataUpdated, PaymentCreated, PaymentGateway,
        ShippingAddressUpdated, ShippingMethod,
    };
    use crate::commerce::CommerceError;

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn usd(amount: i64) -> Money {
        Money::new(Decimal::new(amount, 0), "USD")
    }

    fn taxed(amount: i64) -> TaxedMoney {
        TaxedMoney {
            net: usd(amount),
            gross: usd(amount),
            tax: usd(0),
        }
    }

    fn checkout_fixture() -> Checkout {
        Checkout {
            id: CheckoutId::new("checkout-1"),
            email: None,
            metadata: Metadata::new(),
            shipping_address: None,
            billing_address: None,
            shipping_methods: vec![],
            available_payment_gateways: vec![PaymentGateway {
                id: SELECTED_PAYMENT_GATEWAY_ID.to_string(),
                name: "Dummy".to_string(),
            }],
            total_price: taxed(25),
            channel: Channel::default(),
            lines: vec![CheckoutLine {
                quantity: 1,
                total_price: taxed(25),
                product_name: "Monospace Tee".to_string(),
                media_url: None,
            }],
        }
    }

    fn shipping_address_fixture() -> Address {
        Address {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            company_name: String::new(),
            street_address1: "Main Street".to_string(),
            city: "Amsterdam".to_string(),
            postal_code: "1011 AB".to_string(),
            country: Some(CountryDisplay {
                code: "NL".to_string(),
                country: "Netherlands".to_string(),
            }),
            country_area: String::new(),
            metadata: Metadata::from(vec![MetadataItem::new(keys::STREET_NUMBER, "12")]),
        }
    }

    fn shipping_form_values() -> FieldValues {
        let mut values = to_autocomplete_format(None);
        values.insert(autocomplete::GIVEN_NAME.to_string(), "Ada".to_string());
        values.insert(autocomplete::FAMILY_NAME.to_string(), "Lovelace".to_string());
        values.insert(
            autocomplete::STREET_ADDRESS.to_string(),
            "Main Street".to_string(),
        );
        values.insert(autocomplete::STREET_NUMBER.to_string(), "12".to_string());
        values.insert(autocomplete::CITY.to_string(), "Amsterdam".to_string());
        values.insert(autocomplete::COUNTRY.to_string(), "NL".to_string());
        values
    }

    fn card_values() -> FieldValues {
        let mut values = FieldValues::new();
        values.insert(
            card::CARD_NUMBER.to_string(),
            "4111 1111 1111 1111".to_string(),
        );
        values.insert(card::EXPIRY_DATE.to_string(), "12/99".to_string());
        values.insert(card::CVC.to_string(), "123".to_string());
        values
    }

    // =========================================================================
    // Call-recording fake API
    // =========================================================================

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        UpdateMetadata(Vec<MetadataItem>),
        UpdateEmail(String),
        UpdateShippingAddress(AddressInput),
        UpdateDeliveryMethod(ShippingMethodId),
        UpdateBillingAddress(AddressInput),
        CreatePayment { gateway: String, token: String },
        CompleteCheckout(Vec<MetadataItem>),
    }

    #[derive(Default)]
    struct FakeApi {
        calls: RefCell<Vec<Call>>,
        /// Checkout returned by the shipping address update, carrying the
        /// offered shipping methods.
        shipping_response: Option<Checkout>,
        email_error: Option<UserError>,
        payment_transport_failure: bool,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl CommerceApi for FakeApi {
        async fn update_metadata(
            &self,
            _id: &CheckoutId,
            input: Vec<MetadataItem>,
        ) -> Result<MetadataUpdated, CommerceError> {
            self.record(Call::UpdateMetadata(input));
            Ok(MetadataUpdated {
                metadata: None,
                errors: vec![],
            })
        }

        async fn update_email(
            &self,
            _id: &CheckoutId,
            email: &str,
        ) -> Result<EmailUpdated, CommerceError> {
            self.record(Call::UpdateEmail(email.to_string()));
            Ok(EmailUpdated {
                checkout: None,
                errors: self.email_error.clone().into_iter().collect(),
            })
        }

        async fn update_shipping_address(
            &self,
            _id: &CheckoutId,
            address: AddressInput,
        ) -> Result<ShippingAddressUpdated, CommerceError> {
            self.record(Call::UpdateShippingAddress(address));
            Ok(ShippingAddressUpdated {
                checkout: self.shipping_response.clone(),
                errors: vec![],
            })
        }

        async fn update_delivery_method(
            &self,
            _id: &CheckoutId,
            delivery_method_id: &ShippingMethodId,
        ) -> Result<DeliveryMethodUpdated, CommerceError> {
            self.record(Call::UpdateDeliveryMethod(delivery_method_id.clone()));
            Ok(DeliveryMethodUpdated {
                checkout: None,
                errors: vec![],
            })
        }

        async fn update_billing_address(
            &self,
            _id: &CheckoutId,
            address: AddressInput,
        ) -> Result<BillingAddressUpdated, CommerceError> {
            self.record(Call::UpdateBillingAddress(address));
            Ok(BillingAddressUpdated {
                checkout: None,
                errors: vec![],
            })
        }

        async fn create_payment(
            &self,
            _id: &CheckoutId,
            _amount: Decimal,
            gateway: &str,
            token: &str,
        ) -> Result<PaymentCreated, CommerceError> {
            self.record(Call::CreatePayment {
                gateway: gateway.to_string(),
                token: token.to_string(),
            });
            if self.payment_transport_failure {
                return Err(CommerceError::GraphQL(vec![]));
            }
            Ok(PaymentCreated {
                payment_id: Some("payment-1".to_string()),
                checkout: None,
                errors: vec![],
            })
        }

        async fn complete_checkout(
            &self,
            _id: &CheckoutId,
            metadata: Vec<MetadataItem>,
        ) -> Result<CheckoutCompleted, CommerceError> {
            self.record(Call::CompleteCheckout(metadata));
            Ok(CheckoutCompleted {
                order_id: Some(OrderId::new("order-1")),
                errors: vec![],
            })
        }
    }

    // =========================================================================
    // Section state derivation
    // =========================================================================

    #[test]
    fn test_contact_auto_expands_on_fresh_checkout() {
        let states = section_states(&checkout_fixture(), false, None);
        assert_eq!(states.contact, SectionState::Expanded);
        assert_eq!(states.shipping, SectionState::Locked);
        assert_eq!(states.payment, SectionState::Locked);
    }

    #[test]
    fn test_shipping_auto_expands_after_contact() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.metadata.set(keys::NAME, "Ada");

        let states = section_states(&checkout, false, None);
        assert_eq!(states.contact, SectionState::Collapsed);
        assert_eq!(states.shipping, SectionState::Expanded);
        assert_eq!(states.payment, SectionState::Locked);
    }

    #[test]
    fn test_payment_unlocks_after_shipping() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.shipping_address = Some(shipping_address_fixture());

        let states = section_states(&checkout, false, None);
        assert_eq!(states.shipping, SectionState::Collapsed);
        assert_eq!(states.payment, SectionState::Expanded);
    }

    #[test]
    fn test_overview_collapses_everything() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.shipping_address = Some(shipping_address_fixture());

        let states = section_states(&checkout, true, None);
        assert_eq!(states.contact, SectionState::Collapsed);
        assert_eq!(states.shipping, SectionState::Collapsed);
        assert_eq!(states.payment, SectionState::Collapsed);
    }

    #[test]
    fn test_edit_reopens_collapsed_but_not_locked() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());

        let states = section_states(&checkout, false, Some(Section::Contact));
        assert_eq!(states.contact, SectionState::Expanded);

        // Shipping has no address yet, so payment stays locked regardless.
        let states = section_states(&checkout, false, Some(Section::Payment));
        assert_eq!(states.payment, SectionState::Locked);
    }

    // =========================================================================
    // Contact submits
    // =========================================================================

    #[tokio::test]
    async fn test_idempotent_contact_submit_issues_zero_mutations() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.metadata.set(keys::NAME, "Ada Lovelace");

        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(checkout);
        let outcome = flow
            .submit_contact(
                &api,
                &ContactForm {
                    name: "Ada Lovelace".to_string(),
                    email: "buyer@example.com".to_string(),
                },
            )
            .await;

        assert_eq!(outcome, Outcome::Advanced);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_contact_submits_only_the_changed_field() {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.metadata.set(keys::NAME, "Ada");

        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(checkout);
        let outcome = flow
            .submit_contact(
                &api,
                &ContactForm {
                    name: "Ada Lovelace".to_string(),
                    email: "buyer@example.com".to_string(),
                },
            )
            .await;

        assert_eq!(outcome, Outcome::Advanced);
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls.first(), Some(Call::UpdateMetadata(_))));
        assert_eq!(flow.checkout().buyer_name(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_contact_validation_rejects_bad_email() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(checkout_fixture());
        let outcome = flow
            .submit_contact(
                &api,
                &ContactForm {
                    name: "Ada".to_string(),
                    email: "not-an-email".to_string(),
                },
            )
            .await;

        let Outcome::Invalid(errors) = outcome else {
            panic!("expected field errors");
        };
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].message, "Invalid email address");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_contact_remote_field_error_attaches_to_email() {
        let api = FakeApi {
            email_error: Some(UserError {
                field: Some("email".to_string()),
                message: Some("Email already used".to_string()),
            }),
            ..FakeApi::default()
        };
        let mut flow = CheckoutFlow::new(checkout_fixture());
        let outcome = flow
            .submit_contact(
                &api,
                &ContactForm {
                    name: "Ada".to_string(),
                    email: "buyer@example.com".to_string(),
                },
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Invalid(vec![FieldError::new("email", "Email already used")])
        );
    }

    // =========================================================================
    // Shipping submits
    // =========================================================================

    fn shipping_response(method_ids: &[&str]) -> Checkout {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.shipping_address = Some(shipping_address_fixture());
        checkout.shipping_methods = method_ids
            .iter()
            .map(|id| ShippingMethod {
                id: ShippingMethodId::new(*id),
                name: format!("Method {id}"),
                price: Some(usd(5)),
            })
            .collect();
        checkout
    }

    #[tokio::test]
    async fn test_shipping_auto_selects_first_method() {
        let api = FakeApi {
            shipping_response: Some(shipping_response(&["sm_1", "sm_2"])),
            ..FakeApi::default()
        };
        let mut flow = CheckoutFlow::new(checkout_fixture());
        let outcome = flow
            .submit_shipping(&api, &shipping_form_values(), None)
            .await;

        assert_eq!(outcome, Outcome::Advanced);
        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls.get(1),
            Some(&Call::UpdateDeliveryMethod(ShippingMethodId::new("sm_1")))
        );
    }

    #[tokio::test]
    async fn test_shipping_zero_methods_keeps_section_open() {
        let api = FakeApi {
            shipping_response: Some(shipping_response(&[])),
            ..FakeApi::default()
        };
        let mut flow = CheckoutFlow::new(checkout_fixture());
        let outcome = flow
            .submit_shipping(&api, &shipping_form_values(), None)
            .await;

        assert_eq!(
            outcome,
            Outcome::Failed(NO_SHIPPING_METHODS_MESSAGE.to_string())
        );
        // The address mutation was applied; only the derived step aborted.
        assert_eq!(api.calls().len(), 1);
        assert!(flow.checkout().has_shipping_address());
    }

    #[tokio::test]
    async fn test_shipping_folds_metadata_into_input() {
        let api = FakeApi {
            shipping_response: Some(shipping_response(&["sm_1"])),
            ..FakeApi::default()
        };
        let mut flow = CheckoutFlow::new(checkout_fixture());
        flow.submit_shipping(&api, &shipping_form_values(), None)
            .await;

        let calls = api.calls();
        let Some(Call::UpdateShippingAddress(input)) = calls.first() else {
            panic!("expected shipping address update");
        };
        assert_eq!(input.street_address1, "Main Street");
        assert_eq!(input.metadata[0].key, keys::STREET_NUMBER);
        assert_eq!(input.metadata[0].value, "12");
        assert_eq!(input.metadata[1].key, keys::COUNTRY_AREA);
    }

    #[tokio::test]
    async fn test_shipping_rejects_invalid_values_without_mutations() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(checkout_fixture());

        let mut values = shipping_form_values();
        values.insert(autocomplete::COUNTRY.to_string(), String::new());
        let outcome = flow.submit_shipping(&api, &values, None).await;

        let Outcome::Invalid(errors) = outcome else {
            panic!("expected field errors");
        };
        assert_eq!(errors[0].field, autocomplete::COUNTRY);
        assert!(api.calls().is_empty());
    }

    // =========================================================================
    // Payment submits
    // =========================================================================

    fn payment_ready_checkout() -> Checkout {
        let mut checkout = checkout_fixture();
        checkout.email = Some("buyer@example.com".to_string());
        checkout.metadata.set(keys::NAME, "Ada Lovelace");
        checkout.shipping_address = Some(shipping_address_fixture());
        checkout
    }

    #[tokio::test]
    async fn test_payment_happy_path_places_order() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(payment_ready_checkout());
        let outcome = flow.submit_payment(&api, &card_values(), false, None).await;

        assert_eq!(outcome, Outcome::Placed(OrderId::new("order-1")));
        let calls = api.calls();
        assert!(matches!(calls.first(), Some(Call::UpdateBillingAddress(_))));
        assert!(matches!(calls.get(1), Some(Call::CreatePayment { .. })));
        assert!(matches!(calls.get(2), Some(Call::CompleteCheckout(_))));
    }

    #[tokio::test]
    async fn test_payment_token_is_trimmed_card_number() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(payment_ready_checkout());

        let mut values = card_values();
        values.insert(
            card::CARD_NUMBER.to_string(),
            " 4111 1111 1111 1111 ".to_string(),
        );
        flow.submit_payment(&api, &values, false, None).await;

        let calls = api.calls();
        let Some(Call::CreatePayment { gateway, token }) = calls.get(1) else {
            panic!("expected payment create");
        };
        assert_eq!(gateway, SELECTED_PAYMENT_GATEWAY_ID);
        assert_eq!(token, "4111 1111 1111 1111");
    }

    #[tokio::test]
    async fn test_gateway_gate_blocks_payment_create() {
        let mut checkout = payment_ready_checkout();
        checkout.available_payment_gateways = vec![PaymentGateway {
            id: "other.gateway".to_string(),
            name: "Other".to_string(),
        }];

        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(checkout);
        let outcome = flow.submit_payment(&api, &card_values(), false, None).await;

        assert_eq!(
            outcome,
            Outcome::Failed(
                "The Mirumee Dummy Payment payment gateway is not available".to_string()
            )
        );
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls.first(), Some(Call::UpdateBillingAddress(_))));
    }

    #[tokio::test]
    async fn test_forward_only_failure_after_billing_update() {
        let api = FakeApi {
            payment_transport_failure: true,
            ..FakeApi::default()
        };
        let mut flow = CheckoutFlow::new(payment_ready_checkout());
        let outcome = flow.submit_payment(&api, &card_values(), false, None).await;

        assert_eq!(outcome, Outcome::Failed(GENERIC_ERROR_MESSAGE.to_string()));
        // Billing address was applied and stays applied; no compensating
        // mutation follows the failed payment create.
        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls.first(), Some(Call::UpdateBillingAddress(_))));
        assert!(matches!(calls.get(1), Some(Call::CreatePayment { .. })));
    }

    #[tokio::test]
    async fn test_unchecked_billing_reuses_shipping_address() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(payment_ready_checkout());
        flow.submit_payment(&api, &card_values(), false, None).await;

        let calls = api.calls();
        let Some(Call::UpdateBillingAddress(input)) = calls.first() else {
            panic!("expected billing address update");
        };
        assert_eq!(input.city, "Amsterdam");
        assert_eq!(input.country, "NL");
        assert_eq!(input.metadata[0].value, "12");
    }

    #[tokio::test]
    async fn test_checked_billing_validates_against_rules() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(payment_ready_checkout());

        let rules = ValidationRules {
            required_fields: vec!["city".to_string()],
            allowed_fields: vec!["city".to_string()],
            ..ValidationRules::default()
        };

        // Card fields only; the billing form fields are all empty.
        let mut values = card_values();
        values.insert(autocomplete::COUNTRY.to_string(), "US".to_string());
        let outcome = flow.submit_payment(&api, &values, true, Some(&rules)).await;

        let Outcome::Invalid(errors) = outcome else {
            panic!("expected field errors");
        };
        assert!(errors.iter().any(|e| e.field == autocomplete::CITY));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_order_snapshot_reconstructs_channel_countries() {
        let api = FakeApi::default();
        let mut flow = CheckoutFlow::new(payment_ready_checkout());
        flow.submit_payment(&api, &card_values(), false, None).await;

        let calls = api.calls();
        let Some(Call::CompleteCheckout(metadata)) = calls.get(2) else {
            panic!("expected checkout complete");
        };
        assert_eq!(metadata[0].key, keys::CHECKOUT_DATA);

        let snapshot: Checkout =
            serde_json::from_str(&metadata[0].value).expect("snapshot parses");
        // Billing reused the NL shipping address, so the reconstructed
        // channel country list is exactly the shipping country.
        assert_eq!(snapshot.channel.countries.len(), 1);
        assert_eq!(snapshot.channel.countries[0].code, "NL");
    }
}
