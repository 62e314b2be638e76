//! # Validation Module
//!
//! Input validation for signup forms and the admin product form.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  └── Required fields, input types                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (apps/web)                                      │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: AppStore commands                                            │
//! │  └── Referential checks (ProductNotFound, EmailAlreadyRegistered)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_STOCK, MAX_UNIT_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identity Validators
// =============================================================================

/// Validates an email address and returns its normalized form.
///
/// ## Rules
/// - Trimmed and lowercased
/// - Exactly one `@`, with a non-empty local part
/// - Domain contains a dot that is not at either end
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain.tld".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates a phone number.
///
/// ## Rules
/// - 7 to 15 digits once spaces, dashes and a leading `+` are ignored
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces and dashes".to_string(),
        });
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 7,
            max: 15,
        });
    }

    Ok(())
}

/// Validates a required free-text field (shop name, address).
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use hopline_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Tuborg Beer").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates a unit price. Zero is allowed (samples, promotional stock).
///
/// ## Rules
/// - 0 to MAX_UNIT_PRICE (10,000,000)
pub fn validate_price(units: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE).contains(&units) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE,
        });
    }

    Ok(())
}

/// Validates opening stock on the creation form.
pub fn validate_opening_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a direct stock edit on an existing row.
///
/// Negative values pass (see `Catalog::set_stock`); only the magnitude is
/// bounded.
pub fn validate_stock_level(stock: i64) -> ValidationResult<()> {
    if !(-MAX_STOCK..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a product image reference.
///
/// ## Rules
/// - Embedded `data:image/<type>;base64,...` from the file picker, or
/// - an `http://` / `https://` URL
pub fn validate_image(image: &str) -> ValidationResult<()> {
    let image = image.trim();

    if image.starts_with("data:image/") && image.contains(";base64,") {
        return Ok(());
    }

    if image.starts_with("https://") || image.starts_with("http://") {
        return Ok(());
    }

    Err(ValidationError::InvalidFormat {
        field: "image".to_string(),
        reason: "must be an embedded image or an http(s) URL".to_string(),
    })
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
