//! Checkout page and section submit handlers.
//!
//! Submits follow the POST/redirect/GET pattern on success; on failure the
//! full page re-renders with the submitted values, field errors attached in
//! autofill-key space and the failing section forced open. The address
//! fieldset is additionally exposed as an HTMX fragment so a country or
//! subdivision change re-resolves the validation rules without a full page
//! load.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bramble_core::CheckoutId;
use serde::Deserialize;
use tracing::instrument;

use crate::address::schema::{AddressSchema, FieldError};
use crate::address::{
    FALLBACK_COUNTRY, FieldValues, autocomplete, build_schema, display, format::FIELD_MAP,
    to_autocomplete_format,
};
use crate::commerce::types::{Checkout, CountryDisplay, ValidationRules};
use crate::error::Result;
use crate::filters;
use crate::flow::{
    CheckoutFlow, ContactForm, DEFAULT_BILLING_COUNTRY, DEFAULT_PAYMENT_COUNTRY, Outcome, Section,
    SectionState, card, section_states,
};
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// A `<select>` option.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Address fieldset display data, shared by the shipping form, the billing
/// form and the HTMX fragment.
#[derive(Clone)]
pub struct AddressFieldsView {
    /// Section the fieldset belongs to ("shipping" or "payment").
    pub section: String,
    /// Fragment URL the country/subdivision selects re-fetch from.
    pub rules_url: String,
    pub countries: Vec<OptionView>,
    pub area_choices: Vec<OptionView>,
    values: FieldValues,
    errors: Vec<FieldError>,
    required: Vec<&'static str>,
}

impl AddressFieldsView {
    /// Current value of a field.
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Error message attached to a field, if any.
    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    /// Whether the field is required under the current schema.
    #[must_use]
    pub fn required(&self, field: &str) -> bool {
        self.required.contains(&field)
    }
}

/// Contact section display data.
pub struct ContactSectionView {
    pub expanded: bool,
    pub locked: bool,
    pub can_edit: bool,
    pub name: String,
    pub email: String,
    pub name_error: Option<String>,
    pub email_error: Option<String>,
    pub banner: Option<String>,
    pub overview: Option<String>,
}

/// Shipping section display data.
pub struct ShippingSectionView {
    pub expanded: bool,
    pub locked: bool,
    pub can_edit: bool,
    pub fields: AddressFieldsView,
    pub banner: Option<String>,
    pub overview: Option<String>,
}

/// Payment section display data.
pub struct PaymentSectionView {
    pub expanded: bool,
    pub locked: bool,
    pub card_number: String,
    pub expiry_date: String,
    pub cvc: String,
    pub payment_countries: Vec<OptionView>,
    pub show_billing: bool,
    pub fields: AddressFieldsView,
    pub banner: Option<String>,
    /// "Paid with ..." line on the order page.
    pub overview_gateway: Option<String>,
    pub overview_billing: Option<String>,
    errors: Vec<FieldError>,
}

impl PaymentSectionView {
    /// Error message attached to a card field, if any.
    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

/// Order summary panel display data.
pub struct SummaryView {
    pub order_number: Option<String>,
    pub order_date: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub product_price: String,
    pub shipping_price: Option<String>,
    pub tax: Option<String>,
    pub total: String,
    pub thumbnail: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutPageTemplate {
    pub checkout_id: String,
    pub contact: ContactSectionView,
    pub shipping: ShippingSectionView,
    pub payment: PaymentSectionView,
    pub summary: Option<SummaryView>,
}

/// Address fieldset fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/address_fields.html")]
pub struct AddressFieldsTemplate {
    pub fields: AddressFieldsView,
}

// =============================================================================
// Section Feedback
// =============================================================================

/// Re-render data for a section whose submit did not advance: the submitted
/// values, the errors to attach and the rules that were already resolved for
/// the submit (so rendering does not fetch them twice).
pub struct Feedback {
    pub section: Section,
    pub values: FieldValues,
    pub errors: Vec<FieldError>,
    pub banner: Option<String>,
    pub rules: Option<ValidationRules>,
    pub billing_checked: bool,
}

impl Feedback {
    fn for_section(&self, section: Section) -> Option<&Self> {
        (self.section == section).then_some(self)
    }
}

fn section_feedback(feedback: Option<&Feedback>, section: Section) -> Option<&Feedback> {
    feedback.and_then(|f| f.for_section(section))
}

// =============================================================================
// View Builders
// =============================================================================

pub(crate) fn contact_view(
    checkout: &Checkout,
    state: SectionState,
    overview: bool,
    feedback: Option<&Feedback>,
) -> ContactSectionView {
    let feedback = section_feedback(feedback, Section::Contact);
    let value = |key: &str, stored: Option<&str>| {
        feedback
            .and_then(|f| f.values.get(key).cloned())
            .unwrap_or_else(|| stored.unwrap_or_default().to_string())
    };
    let error = |key: &str| {
        feedback.and_then(|f| {
            f.errors
                .iter()
                .find(|error| error.field == key)
                .map(|error| error.message.clone())
        })
    };

    let overview_line = match (checkout.buyer_name(), checkout.email.as_deref()) {
        (Some(name), Some(email)) => Some(format!("{name}, {email}")),
        _ => None,
    };

    ContactSectionView {
        expanded: state.is_expanded(),
        locked: state.is_locked(),
        can_edit: !overview && state.is_collapsed(),
        name: value("name", checkout.buyer_name()),
        email: value("email", checkout.email.as_deref()),
        name_error: error("name"),
        email_error: error("email"),
        banner: feedback.and_then(|f| f.banner.clone()),
        overview: overview_line,
    }
}

fn address_fields_view(
    section: Section,
    checkout_id: &str,
    values: FieldValues,
    errors: Vec<FieldError>,
    schema: &AddressSchema,
    countries: &[CountryDisplay],
    rules: Option<&ValidationRules>,
) -> AddressFieldsView {
    let selected_country = values
        .get(autocomplete::COUNTRY)
        .cloned()
        .unwrap_or_default();
    let selected_area = values
        .get(autocomplete::COUNTRY_AREA)
        .cloned()
        .unwrap_or_default();

    let required = FIELD_MAP
        .iter()
        .map(|(_, key)| *key)
        .filter(|key| schema.is_required(key))
        .collect();

    AddressFieldsView {
        section: section.as_str().to_string(),
        rules_url: format!(
            "/checkout/{checkout_id}/address-fields?section={}",
            section.as_str()
        ),
        countries: countries
            .iter()
            .map(|country| OptionView {
                value: country.code.clone(),
                label: country.country.clone(),
                selected: country.code == selected_country,
            })
            .collect(),
        area_choices: rules
            .map(|rules| {
                rules
                    .country_area_choices
                    .iter()
                    .map(|choice| OptionView {
                        value: choice.raw.clone(),
                        label: choice.verbose.clone(),
                        selected: choice.raw == selected_area,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        values,
        errors,
        required,
    }
}

pub(crate) fn shipping_view(
    checkout: &Checkout,
    checkout_id: &str,
    state: SectionState,
    overview: bool,
    rules: Option<&ValidationRules>,
    feedback: Option<&Feedback>,
) -> ShippingSectionView {
    let feedback = section_feedback(feedback, Section::Shipping);

    let values = feedback.map_or_else(
        || to_autocomplete_format(checkout.shipping_address.as_ref()),
        |f| f.values.clone(),
    );
    let errors = feedback.map(|f| f.errors.clone()).unwrap_or_default();

    let schema = build_schema(rules);
    let fields = address_fields_view(
        Section::Shipping,
        checkout_id,
        values,
        errors,
        &schema,
        &checkout.channel.countries,
        rules,
    );

    ShippingSectionView {
        expanded: state.is_expanded(),
        locked: state.is_locked(),
        can_edit: !overview && state.is_collapsed(),
        fields,
        banner: feedback.and_then(|f| f.banner.clone()),
        overview: checkout
            .shipping_address
            .as_ref()
            .map(|address| display(address, &checkout.channel.countries)),
    }
}

pub(crate) fn payment_view(
    checkout: &Checkout,
    checkout_id: &str,
    state: SectionState,
    rules: Option<&ValidationRules>,
    feedback: Option<&Feedback>,
    paid_with: Option<String>,
) -> PaymentSectionView {
    let feedback = section_feedback(feedback, Section::Payment);

    let show_billing = feedback.map_or_else(
        || checkout.billing_address.is_some(),
        |f| f.billing_checked,
    );
    let values = feedback.map_or_else(
        || {
            // The payment form starts from the shipping address, like the
            // billing-reuse default.
            let mut values = to_autocomplete_format(checkout.shipping_address.as_ref());
            values.insert(
                "paymentCountry".to_string(),
                DEFAULT_PAYMENT_COUNTRY.to_string(),
            );
            values
        },
        |f| f.values.clone(),
    );
    let errors = feedback.map(|f| f.errors.clone()).unwrap_or_default();

    let field = |key: &str| values.get(key).cloned().unwrap_or_default();
    let payment_country = {
        let selected = field("paymentCountry");
        if selected.is_empty() {
            DEFAULT_PAYMENT_COUNTRY.to_string()
        } else {
            selected
        }
    };

    let schema = build_schema(rules);
    let fields = address_fields_view(
        Section::Payment,
        checkout_id,
        values.clone(),
        errors.clone(),
        &schema,
        &checkout.channel.countries,
        rules,
    );

    PaymentSectionView {
        expanded: state.is_expanded(),
        locked: state.is_locked(),
        card_number: field(card::CARD_NUMBER),
        expiry_date: field(card::EXPIRY_DATE),
        cvc: field(card::CVC),
        payment_countries: checkout
            .channel
            .countries
            .iter()
            .map(|country| OptionView {
                value: country.code.clone(),
                label: country.country.clone(),
                selected: country.code == payment_country,
            })
            .collect(),
        show_billing,
        fields,
        banner: feedback.and_then(|f| f.banner.clone()),
        overview_gateway: paid_with,
        overview_billing: checkout
            .billing_address
            .as_ref()
            .map(|address| display(address, &checkout.channel.countries)),
        errors,
    }
}

pub(crate) fn summary_view(
    checkout: &Checkout,
    order: Option<(&str, &str)>,
) -> Option<SummaryView> {
    let line = checkout.lines.first()?;

    Some(SummaryView {
        order_number: order.map(|(number, _)| number.to_string()),
        order_date: order.map(|(_, date)| date.to_string()),
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        product_price: line.total_price.net.display(),
        shipping_price: checkout
            .shipping_methods
            .first()
            .and_then(|method| method.price.as_ref())
            .map(bramble_core::Money::display),
        tax: (!checkout.total_price.tax.is_zero()).then(|| checkout.total_price.tax.display()),
        total: checkout.total_price.gross.display(),
        thumbnail: line.media_url.clone(),
    })
}

// =============================================================================
// Rule Resolution
// =============================================================================

/// Resolve validation rules for a country, treating lookup failures as "no
/// rules" so the base schema applies.
async fn resolve_rules(
    state: &AppState,
    country: &str,
    area: Option<&str>,
) -> Option<ValidationRules> {
    if country.is_empty() {
        return None;
    }

    match state
        .commerce()
        .address_validation_rules(country, area)
        .await
    {
        Ok(rules) => rules,
        Err(error) => {
            tracing::warn!(%error, country, "validation rules lookup failed");
            None
        }
    }
}

// =============================================================================
// Page Assembly
// =============================================================================

async fn render_page(
    state: &AppState,
    checkout: Checkout,
    edit: Option<Section>,
    feedback: Option<Feedback>,
) -> CheckoutPageTemplate {
    // A failed submit forces its own section open.
    let edit = feedback.as_ref().map(|f| f.section).or(edit);
    let states = section_states(&checkout, false, edit);
    let checkout_id = checkout.id.as_str().to_string();

    // Rules are resolved only for an expanded address section; collapsed and
    // locked sections skip resolution entirely. A submit that already
    // resolved them hands them over instead of fetching twice.
    let shipping_rules = if states.shipping.is_expanded() {
        match section_feedback(feedback.as_ref(), Section::Shipping) {
            Some(f) => f.rules.clone(),
            None => {
                let values = to_autocomplete_format(checkout.shipping_address.as_ref());
                let country = values
                    .get(autocomplete::COUNTRY)
                    .map(String::as_str)
                    .unwrap_or(FALLBACK_COUNTRY)
                    .to_string();
                let area = values
                    .get(autocomplete::COUNTRY_AREA)
                    .filter(|area| !area.is_empty())
                    .cloned();
                resolve_rules(state, &country, area.as_deref()).await
            }
        }
    } else {
        None
    };

    let billing_checked = section_feedback(feedback.as_ref(), Section::Payment)
        .map_or_else(|| checkout.billing_address.is_some(), |f| f.billing_checked);
    let payment_rules = if states.payment.is_expanded() && billing_checked {
        match section_feedback(feedback.as_ref(), Section::Payment) {
            Some(f) => f.rules.clone(),
            None => resolve_rules(state, DEFAULT_BILLING_COUNTRY, None).await,
        }
    } else {
        None
    };

    CheckoutPageTemplate {
        contact: contact_view(&checkout, states.contact, false, feedback.as_ref()),
        shipping: shipping_view(
            &checkout,
            &checkout_id,
            states.shipping,
            false,
            shipping_rules.as_ref(),
            feedback.as_ref(),
        ),
        payment: payment_view(
            &checkout,
            &checkout_id,
            states.payment,
            payment_rules.as_ref(),
            feedback.as_ref(),
            None,
        ),
        summary: summary_view(&checkout, None),
        checkout_id,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Query parameters of the checkout page.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    /// Section to re-expand, by its route-segment name.
    pub edit: Option<String>,
}

/// Display the checkout page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ShowQuery>,
) -> Result<CheckoutPageTemplate> {
    let id = CheckoutId::new(id);
    let checkout = state.commerce().get_checkout(&id).await?;
    let edit = query.edit.as_deref().and_then(Section::parse);

    Ok(render_page(&state, checkout, edit, None).await)
}

/// Submit the contact section.
#[instrument(skip(state, form))]
pub async fn submit_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let id = CheckoutId::new(id);
    let checkout = state.commerce().get_checkout(&id).await?;

    let mut flow = CheckoutFlow::new(checkout);
    let outcome = flow.submit_contact(state.commerce(), &form).await;

    let feedback = |errors: Vec<FieldError>, banner: Option<String>| {
        let mut values = FieldValues::new();
        values.insert("name".to_string(), form.name.clone());
        values.insert("email".to_string(), form.email.clone());
        Feedback {
            section: Section::Contact,
            values,
            errors,
            banner,
            rules: None,
            billing_checked: false,
        }
    };

    Ok(match outcome {
        Outcome::Advanced => Redirect::to(&format!("/checkout/{id}")).into_response(),
        Outcome::Placed(order_id) => Redirect::to(&format!("/order/{order_id}")).into_response(),
        Outcome::Invalid(errors) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(errors, None)))
                .await
                .into_response()
        }
        Outcome::Failed(message) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(vec![], Some(message))))
                .await
                .into_response()
        }
    })
}

/// Submit the shipping section.
#[instrument(skip(state, values))]
pub async fn submit_shipping(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(values): Form<FieldValues>,
) -> Result<Response> {
    let id = CheckoutId::new(id);
    let checkout = state.commerce().get_checkout(&id).await?;

    let country = values
        .get(autocomplete::COUNTRY)
        .map(String::as_str)
        .unwrap_or_default();
    let area = values
        .get(autocomplete::COUNTRY_AREA)
        .filter(|area| !area.is_empty())
        .map(String::as_str);
    let rules = resolve_rules(&state, country, area).await;

    let mut flow = CheckoutFlow::new(checkout);
    let outcome = flow
        .submit_shipping(state.commerce(), &values, rules.as_ref())
        .await;

    let feedback = |errors: Vec<FieldError>, banner: Option<String>| Feedback {
        section: Section::Shipping,
        values: values.clone(),
        errors,
        banner,
        rules: rules.clone(),
        billing_checked: false,
    };

    Ok(match outcome {
        Outcome::Advanced => Redirect::to(&format!("/checkout/{id}")).into_response(),
        Outcome::Placed(order_id) => Redirect::to(&format!("/order/{order_id}")).into_response(),
        Outcome::Invalid(errors) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(errors, None)))
                .await
                .into_response()
        }
        Outcome::Failed(message) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(vec![], Some(message))))
                .await
                .into_response()
        }
    })
}

/// Submit the payment section.
#[instrument(skip(state, values))]
pub async fn submit_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(values): Form<FieldValues>,
) -> Result<Response> {
    let id = CheckoutId::new(id);
    let checkout = state.commerce().get_checkout(&id).await?;

    let billing_checked = values
        .get("billingAddress")
        .is_some_and(|value| value == "on");
    let rules = if billing_checked {
        let country = values
            .get(autocomplete::COUNTRY)
            .filter(|country| !country.is_empty())
            .map_or(DEFAULT_BILLING_COUNTRY, String::as_str);
        let area = values
            .get(autocomplete::COUNTRY_AREA)
            .filter(|area| !area.is_empty())
            .map(String::as_str);
        resolve_rules(&state, country, area).await
    } else {
        None
    };

    let mut flow = CheckoutFlow::new(checkout);
    let outcome = flow
        .submit_payment(state.commerce(), &values, billing_checked, rules.as_ref())
        .await;

    let feedback = |errors: Vec<FieldError>, banner: Option<String>| Feedback {
        section: Section::Payment,
        values: values.clone(),
        errors,
        banner,
        rules: rules.clone(),
        billing_checked,
    };

    Ok(match outcome {
        Outcome::Placed(order_id) => Redirect::to(&format!("/order/{order_id}")).into_response(),
        Outcome::Advanced => Redirect::to(&format!("/checkout/{id}")).into_response(),
        Outcome::Invalid(errors) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(errors, None)))
                .await
                .into_response()
        }
        Outcome::Failed(message) => {
            render_page(&state, flow.into_checkout(), None, Some(feedback(vec![], Some(message))))
                .await
                .into_response()
        }
    })
}

/// Re-render the address fieldset for a changed country or subdivision
/// (HTMX fragment).
///
/// This is the reactive half of rule resolution: every change of the
/// country or subdivision selects re-fetches the authoritative rules and
/// re-renders the fieldset with the preserved form values.
#[instrument(skip(state, values))]
pub async fn address_fields(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(values): Query<FieldValues>,
) -> Result<AddressFieldsTemplate> {
    let id = CheckoutId::new(id);
    let checkout = state.commerce().get_checkout(&id).await?;

    let section = values
        .get("section")
        .map(String::as_str)
        .and_then(Section::parse)
        .unwrap_or(Section::Shipping);

    // A country change invalidates the pending subdivision selection.
    let mut values = values;
    if values.get("changed").map(String::as_str) == Some("country") {
        values.insert(autocomplete::COUNTRY_AREA.to_string(), String::new());
    }

    let country = values
        .get(autocomplete::COUNTRY)
        .filter(|country| !country.is_empty())
        .map_or(FALLBACK_COUNTRY, String::as_str)
        .to_string();
    let area = values
        .get(autocomplete::COUNTRY_AREA)
        .filter(|area| !area.is_empty())
        .cloned();

    let rules = resolve_rules(&state, &country, area.as_deref()).await;
    let schema = build_schema(rules.as_ref());

    Ok(AddressFieldsTemplate {
        fields: address_fields_view(
            section,
            id.as_str(),
            values,
            vec![],
            &schema,
            &checkout.channel.countries,
            rules.as_ref(),
        ),
    })
}
