//! Central error-to-response translation.
//!
//! Every handler returns `Result<_, AppError>`; this module is the single
//! place where error kinds become HTTP responses, replacing per-handler
//! catch blocks.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use bolster_auth::AuthError;
use bolster_commerce::CommerceError;
use bolster_payments::PaymentError;
use serde_json::json;

/// Application error, keyed by kind.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("validation: {0}")]
    Validation(String),

    /// Resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No authenticated user; page routes bounce to login.
    #[error("unauthenticated")]
    Unauthorized,

    /// Authenticated but lacking the required role.
    #[error("forbidden")]
    Forbidden,

    /// Payment callback signature mismatch.
    #[error("invalid payment signature")]
    PaymentSignature,

    /// Upstream dependency failed (gateway, database).
    #[error("upstream: {0}")]
    Upstream(String),

    /// Anything else.
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Shorthand for a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::NotFound(what) => {
                tracing::debug!(what = %what, "not found");
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            AppError::Unauthorized => Redirect::to("/auth/login").into_response(),
            AppError::Forbidden => Redirect::to("/").into_response(),
            AppError::PaymentSignature => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid payment signature" })),
            )
                .into_response(),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<CommerceError> for AppError {
    fn from(e: CommerceError) -> Self {
        match e {
            CommerceError::ProductNotFound(id) => AppError::NotFound(format!("product {id}")),
            CommerceError::CategoryNotFound(id) => AppError::NotFound(format!("category {id}")),
            CommerceError::OrderNotFound(id) => AppError::NotFound(format!("order {id}")),
            CommerceError::InvalidQuantity(_)
            | CommerceError::QuantityExceedsLimit(_, _)
            | CommerceError::InsufficientStock { .. }
            | CommerceError::Validation(_)
            | CommerceError::Csv(_) => AppError::Validation(e.to_string()),
            CommerceError::CurrencyMismatch { .. } | CommerceError::Overflow => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::SessionExpired => AppError::Unauthorized,
            AuthError::InsufficientPermissions => AppError::Forbidden,
            AuthError::CsrfMismatch => AppError::Validation("invalid CSRF token".to_string()),
            AuthError::WeakPassword(msg) => AppError::Validation(msg),
            AuthError::UserNotFound(who) => AppError::NotFound(format!("user {who}")),
            AuthError::UserAlreadyExists(_) | AuthError::InvalidToken => {
                AppError::Validation(e.to_string())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::InvalidSignature => AppError::PaymentSignature,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Internal(format!("template error: {e}"))
    }
}

/// Static 404 page body, used where no session context is available.
const NOT_FOUND_PAGE: &str = r#"<!doctype html>
<html><head><title>Not Found - Bolster</title></head>
<body><h1>404</h1><p>We couldn't find that page.</p><p><a href="/">Back to the store</a></p></body></html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::validation("missing field").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::not_found("product x").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::PaymentSignature.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_redirects() {
        let resp = AppError::Unauthorized.into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/auth/login");

        let resp = AppError::Forbidden.into_response();
        assert_eq!(resp.headers()["location"], "/");
    }

    #[test]
    fn test_commerce_error_mapping() {
        let err: AppError = CommerceError::ProductNotFound("p1".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = CommerceError::InvalidQuantity(0).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
