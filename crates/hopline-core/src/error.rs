//! # Error Types
//!
//! Domain-specific error types for hopline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  hopline-core errors (this file)                                       │
//! │  ├── CoreError        - Identity, cart, catalog, ledger failures       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  hopline-db errors                                                     │
//! │  └── DbError          - Local blob store failures                      │
//! │                                                                         │
//! │  hopline-sync errors                                                   │
//! │  └── SyncError        - Hosted table / email failures (logged only)    │
//! │                                                                         │
//! │  apps/web                                                              │
//! │  └── ApiError         - What the browser sees (inline message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → inline form message    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal and none trigger a retry. The merchant reads the
//! message and resubmits.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Email is neither a registered merchant nor an administrator.
    ///
    /// ## When This Occurs
    /// - Typo in the login email
    /// - Merchant signed up on another device and the hosted table is
    ///   unreachable (or not configured)
    ///
    /// ## User Workflow
    /// ```text
    /// Login form: "shop@exmaple.com"
    ///      │
    ///      ▼
    /// resolve_subject() → no User, not on allow-list
    ///      │
    ///      ▼
    /// UnknownMerchant  (no code generated, nothing sent)
    ///      │
    ///      ▼
    /// UI shows: "No merchant account for shop@exmaple.com"
    /// ```
    #[error("No merchant account for {email}")]
    UnknownMerchant { email: String },

    /// The email provider rejected or never received the send request.
    ///
    /// Administrators never see this: their code is issued anyway through
    /// the diagnostic log.
    #[error("Could not deliver a login code to {email}")]
    DeliveryFailed { email: String },

    /// Submitted OTP does not equal the last issued code.
    #[error("The code you entered is incorrect")]
    CodeMismatch,

    /// A new code was requested before the resend window elapsed.
    #[error("Please wait {retry_after_secs}s before requesting another code")]
    ResendCooldown { retry_after_secs: i64 },

    /// Signup attempted with an email that already has an account.
    #[error("An account for {email} already exists")]
    EmailAlreadyRegistered { email: String },

    /// A session-scoped command ran with nobody signed in.
    #[error("Please sign in first")]
    NotSignedIn,

    /// Checkout with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Product cannot be found in the catalog.
    ///
    /// ## When This Occurs
    /// - Admin deleted the product while it sat in a cart
    /// - Stale product id from an old page
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// User cannot be found.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// POS checkout stopped part way through the cart.
    ///
    /// ## User Workflow
    /// ```text
    /// POS cart: [Whisky ×2] [Vodka ×1] [Deleted product ×1]
    ///      │
    ///      ▼
    /// line 1 → CounterSale ✓   line 2 → CounterSale ✓   line 3 → ✗
    ///      │
    ///      ▼
    /// PartialCheckout { recorded: 2, .. }  (lines 1-2 leave the cart, nothing rolled back)
    /// ```
    #[error("Recorded {recorded} line(s) before failing on product {product_id}")]
    PartialCheckout { recorded: usize, product_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email, unsupported image URI).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownMerchant {
            email: "nobody@example.com".to_string(),
        };
        assert_eq!(err.to_string(), "No merchant account for nobody@example.com");

        let err = CoreError::ResendCooldown {
            retry_after_secs: 12,
        };
        assert_eq!(
            err.to_string(),
            "Please wait 12s before requesting another code"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "shopName".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: shopName is required");
    }
}
