//! # Sync Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Remote-        │  │  SerializationFailed    │ │
//! │  │  InvalidUrl     │  │   Unavailable   │  │  Rejected {status,body} │ │
//! │  │  ConfigLoad-    │  │  RequestFailed  │  │                         │ │
//! │  │   Failed        │  │  Timeout        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is retried. Callers log the error and carry on.

use thiserror::Error;

/// Result type alias for remote operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from the hosted-table and email services.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid remote configuration.
    #[error("Invalid remote configuration: {0}")]
    InvalidConfig(String),

    /// A service URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Config file unreadable or not valid TOML.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// No credentials configured for this service.
    ///
    /// ## When This Occurs
    /// - `HOPLINE_TABLE_URL` / `HOPLINE_TABLE_KEY` not set
    /// - Admin presses "refresh" on a standalone install
    #[error("{0} is not configured")]
    RemoteUnavailable(&'static str),

    /// Connection refused, DNS failure, TLS error...
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// No response within the configured timeout.
    #[error("Remote request timed out")]
    Timeout,

    /// The service answered with a non-2xx status.
    #[error("Remote rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// Row or request body could not be encoded / decoded.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_decode() {
            SyncError::SerializationFailed(err.to_string())
        } else {
            SyncError::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<askama::Error> for SyncError {
    fn from(err: askama::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for logging)
// =============================================================================

impl SyncError {
    /// Returns true if the same call might succeed later on its own.
    ///
    /// Used only to pick the log message; nothing retries.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::RequestFailed(_) | SyncError::Timeout => true,
            SyncError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::RemoteUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(SyncError::Timeout.is_transient());
        assert!(SyncError::RequestFailed("connection refused".into()).is_transient());
        assert!(SyncError::Rejected {
            status: 503,
            body: String::new()
        }
        .is_transient());

        assert!(!SyncError::Rejected {
            status: 401,
            body: "bad key".into()
        }
        .is_transient());
        assert!(!SyncError::RemoteUnavailable("Hosted tables").is_transient());
    }

    #[test]
    fn test_config_errors() {
        assert!(SyncError::InvalidUrl("nope".into()).is_config_error());
        assert!(SyncError::RemoteUnavailable("Email").is_config_error());
        assert!(!SyncError::Timeout.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Rejected {
            status: 409,
            body: "duplicate key".into(),
        };
        assert_eq!(
            err.to_string(),
            "Remote rejected request with status 409: duplicate key"
        );
    }
}
