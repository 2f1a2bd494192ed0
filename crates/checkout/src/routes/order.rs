//! Order confirmation page.
//!
//! Once an order exists the checkout entity may no longer be queryable, so
//! the page reconstructs the contact/shipping/payment overview entirely from
//! the checkout snapshot stored in the order metadata at completion time.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use bramble_core::types::metadata::keys;
use bramble_core::{CheckoutId, Metadata, Money, OrderId, TaxedMoney};
use tracing::instrument;

use super::checkout::{
    ContactSectionView, PaymentSectionView, ShippingSectionView, SummaryView, contact_view,
    payment_view, shipping_view, summary_view,
};
use crate::commerce::types::{Channel, Checkout};
use crate::error::Result;
use crate::filters;
use crate::flow::{payment_gateway_display_name, section_states};
use crate::state::AppState;

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "order/show.html")]
pub struct OrderPageTemplate {
    /// Present for the shared section partials; the overview sections render
    /// no links or forms.
    pub checkout_id: String,
    pub contact: ContactSectionView,
    pub shipping: ShippingSectionView,
    pub payment: PaymentSectionView,
    pub summary: Option<SummaryView>,
}

/// Display the order confirmation.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<OrderPageTemplate> {
    let id = OrderId::new(id);
    let order = state.commerce().get_order(&id).await?;

    let checkout = order
        .metadata
        .get(keys::CHECKOUT_DATA)
        .and_then(|raw| match serde_json::from_str::<Checkout>(raw) {
            Ok(checkout) => Some(checkout),
            Err(error) => {
                tracing::warn!(%error, order_id = %id, "order snapshot unreadable");
                None
            }
        })
        .unwrap_or_else(empty_checkout);

    let states = section_states(&checkout, true, None);
    let paid_with = order.payments.first().map(|payment| {
        payment_gateway_display_name(&payment.gateway)
            .map_or_else(|| payment.gateway.clone(), str::to_string)
    });
    let order_date = order.created.format("%d %B %Y").to_string();

    Ok(OrderPageTemplate {
        checkout_id: String::new(),
        contact: contact_view(&checkout, states.contact, true, None),
        shipping: shipping_view(&checkout, "", states.shipping, true, None, None),
        payment: payment_view(&checkout, "", states.payment, None, None, paid_with),
        summary: summary_view(&checkout, Some((&order.number, &order_date))),
    })
}

/// Fallback for an order whose snapshot is missing or unreadable: the page
/// still renders the order header, with nothing to show in the sections.
fn empty_checkout() -> Checkout {
    Checkout {
        id: CheckoutId::new(""),
        email: None,
        metadata: Metadata::new(),
        shipping_address: None,
        billing_address: None,
        shipping_methods: vec![],
        available_payment_gateways: vec![],
        total_price: TaxedMoney {
            net: Money::zero("USD"),
            gross: Money::zero("USD"),
            tax: Money::zero("USD"),
        },
        channel: Channel::default(),
        lines: vec![],
    }
}
