//! HTTP route handlers for the checkout.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Home page with the create-checkout button
//! POST /                               - Create a checkout, redirect to it
//! GET  /health                         - Health check
//!
//! # Checkout
//! GET  /checkout/{id}                  - The four checkout sections (?edit=<section> re-expands one)
//! POST /checkout/{id}/contact          - Contact section submit
//! POST /checkout/{id}/shipping         - Shipping section submit
//! POST /checkout/{id}/payment          - Payment section submit
//! GET  /checkout/{id}/address-fields   - Address fieldset fragment (HTMX), re-resolves
//!                                        validation rules for the selected country
//!
//! # Order
//! GET  /order/{id}                     - Order confirmation: sections in overview mode
//! ```

pub mod checkout;
pub mod home;
pub mod order;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(checkout::show))
        .route("/{id}/contact", post(checkout::submit_contact))
        .route("/{id}/shipping", post(checkout::submit_shipping))
        .route("/{id}/payment", post(checkout::submit_payment))
        .route("/{id}/address-fields", get(checkout::address_fields))
}

/// Create all routes for the checkout application.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::show).post(home::create))
        // Checkout sections
        .nest("/checkout", checkout_routes())
        // Order confirmation
        .route("/order/{id}", get(order::show))
}
