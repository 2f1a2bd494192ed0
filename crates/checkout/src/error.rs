//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return
//! `Result<T, AppError>`.
//!
//! Note that submit-time transport failures are NOT app errors: the flow
//! turns them into section-level messages so the form stays open with the
//! submitted values. `AppError` covers page loads and genuinely broken
//! requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::commerce::CommerceError;

/// Dedicated not-found view for unknown checkout and order ids.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate;

/// Application-level error type for the checkout.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce API operation failed.
    #[error("Commerce error: {0}")]
    Commerce(#[from] CommerceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Commerce(CommerceError::NotFound(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry; a missing checkout or order is an
        // expected outcome, not an incident.
        if matches!(self, Self::Commerce(_) | Self::Internal(_)) && !self.is_not_found() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if self.is_not_found() {
            return (StatusCode::NOT_FOUND, NotFoundTemplate).into_response();
        }

        let status = match &self {
            Self::Commerce(CommerceError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Commerce(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Commerce(_) => "External service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("checkout-123".to_string());
        assert_eq!(err.to_string(), "Not found: checkout-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_commerce_entity_renders_not_found() {
        let err = AppError::Commerce(CommerceError::NotFound("checkout".to_string()));
        assert_eq!(get_status(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rate_limit_propagates_status() {
        let err = AppError::Commerce(CommerceError::RateLimited(30));
        assert_eq!(get_status(err), StatusCode::TOO_MANY_REQUESTS);
    }
}
