//! # API Error Type
//!
//! Unified error type for route handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Hopline                                │
//! │                                                                         │
//! │  Browser                     Rust Backend                               │
//! │  ───────                     ────────────                               │
//! │                                                                         │
//! │  POST /api/auth/request-code                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store failed? ─── DbError::QueryFailed("...") ────┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule broken? ─── CoreError::UnknownMerchant ─── ApiError ─────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄── 404 { "code": "UNKNOWN_MERCHANT",                                  │
//! │            "message": "No merchant account for shop@exmaple.com" }      │
//! │                                                                         │
//! │  The form shows `message` inline. Nothing is retried.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use hopline_core::CoreError;
use hopline_db::DbError;
use hopline_sync::SyncError;

/// Convenience alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from route handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "RESEND_COOLDOWN",
///   "message": "Please wait 12s before requesting another code",
///   "retryAfterSecs": 12
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Set for cooldown errors; also sent as `Retry-After`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<i64>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Nobody is signed in (401)
    Unauthenticated,

    /// Signed in with the wrong role (403)
    Forbidden,

    /// Email is not a merchant or admin (404)
    UnknownMerchant,

    /// The email provider did not take the code (502)
    DeliveryFailed,

    /// Submitted code is wrong (400)
    CodeMismatch,

    /// Asked for a new code too soon (429)
    ResendCooldown,

    /// Signup email already in use (409)
    EmailAlreadyRegistered,

    /// Cart operation failed (422)
    CartError,

    /// POS checkout stopped part way (409)
    PartialCheckout,

    /// Hosted service not configured (503)
    RemoteUnavailable,

    /// Hosted service call failed (502)
    RemoteError,

    /// Local store failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound | ErrorCode::UnknownMerchant => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::CodeMismatch => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::ResendCooldown => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::EmailAlreadyRegistered | ErrorCode::PartialCheckout => StatusCode::CONFLICT,
            ErrorCode::CartError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DeliveryFailed | ErrorCode::RemoteError => StatusCode::BAD_GATEWAY,
            ErrorCode::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn unauthenticated() -> Self {
        ApiError::new(ErrorCode::Unauthenticated, "Please sign in first")
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "You do not have access to this page")
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after_secs;
        let mut response = (status, Json(self)).into_response();

        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::UnknownMerchant { .. } => ApiError::new(ErrorCode::UnknownMerchant, message),
            CoreError::DeliveryFailed { .. } => ApiError::new(ErrorCode::DeliveryFailed, message),
            CoreError::CodeMismatch => ApiError::new(ErrorCode::CodeMismatch, message),
            CoreError::ResendCooldown { retry_after_secs } => ApiError {
                retry_after_secs: Some(retry_after_secs),
                ..ApiError::new(ErrorCode::ResendCooldown, message)
            },
            CoreError::EmailAlreadyRegistered { .. } => {
                ApiError::new(ErrorCode::EmailAlreadyRegistered, message)
            }
            CoreError::NotSignedIn => ApiError::new(ErrorCode::Unauthenticated, message),
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::UserNotFound(id) => ApiError::not_found("Merchant", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::EmptyCart
            | CoreError::QuantityTooLarge { .. }
            | CoreError::CartTooLarge { .. } => ApiError::new(ErrorCode::CartError, message),
            CoreError::PartialCheckout { .. } => ApiError::new(ErrorCode::PartialCheckout, message),
            CoreError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
        }
    }
}

/// Converts local store errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => {
                // Log the actual error but return a generic message
                error!(error = %other, "Local store operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Could not save your changes")
            }
        }
    }
}

/// Converts remote errors to API errors. Only reached from the awaited
/// remote calls (login fallback, merchant refresh).
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::RemoteUnavailable(service) => ApiError::new(
                ErrorCode::RemoteUnavailable,
                format!("{service} not configured"),
            ),
            other => {
                error!(error = %other, transient = other.is_transient(), "Remote call failed");
                ApiError::new(ErrorCode::RemoteError, "The hosted service could not be reached")
            }
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(err: askama::Error) -> Self {
        error!(error = %err, "Template rendering failed");
        ApiError::internal("Could not render the page")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopline_core::ValidationError;

    #[test]
    fn test_core_error_codes_and_status() {
        let err: ApiError = CoreError::UnknownMerchant {
            email: "nobody@example.com".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::UnknownMerchant);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "No merchant account for nobody@example.com");

        let err: ApiError = CoreError::NotSignedIn.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = CoreError::PartialCheckout {
            recorded: 2,
            product_id: "9".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_error_keeps_field_message() {
        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "shopName".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "shopName is required");
    }

    #[test]
    fn test_cooldown_sets_retry_after() {
        let err: ApiError = CoreError::ResendCooldown {
            retry_after_secs: 12,
        }
        .into();
        assert_eq!(err.retry_after_secs, Some(12));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::unauthenticated()).unwrap();
        assert_eq!(json["code"], "UNAUTHENTICATED");
        assert_eq!(json["message"], "Please sign in first");
        assert!(json.get("retryAfterSecs").is_none());
    }

    #[test]
    fn test_sync_errors() {
        let err: ApiError = SyncError::RemoteUnavailable("Hosted tables").into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = SyncError::Timeout.into();
        assert_eq!(err.code, ErrorCode::RemoteError);
    }
}
