//! Home page route handlers.
//!
//! The home page has a single action: create a checkout preloaded with the
//! configured product variant and redirect to it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::filters;
use crate::flow::GENERIC_ERROR_MESSAGE;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home/show.html")]
pub struct HomeTemplate {
    pub error: Option<String>,
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn show() -> HomeTemplate {
    HomeTemplate { error: None }
}

/// Create a checkout and redirect to it.
///
/// Business and transport failures both render back on the home page with a
/// message; there is nothing to retry automatically.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Response {
    let api = &state.config().api;

    match state
        .commerce()
        .create_checkout(&api.channel, &api.product_variant_id, 1)
        .await
    {
        Ok(created) => {
            if let Some(error) = created.errors.first() {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                tracing::warn!(%message, "checkout creation rejected");
                return HomeTemplate {
                    error: Some(format!("Error while creating a checkout: {message}")),
                }
                .into_response();
            }

            match created.checkout {
                Some(checkout) => {
                    Redirect::to(&format!("/checkout/{}", checkout.id)).into_response()
                }
                None => HomeTemplate {
                    error: Some(GENERIC_ERROR_MESSAGE.to_string()),
                }
                .into_response(),
            }
        }
        Err(error) => {
            tracing::error!(%error, "checkout creation failed");
            HomeTemplate {
                error: Some("Error while creating a checkout".to_string()),
            }
            .into_response()
        }
    }
}
