//! # OTP Email Sender
//!
//! Delivers a login code through an HTTP transactional-email API.
//!
//! ```text
//! POST {api_url}
//! Authorization: Bearer <key>
//! { "from": "...", "to": ["shop@example.com"], "subject": "...", "html": "..." }
//!
//! 2xx          → true
//! anything else → false (logged at warn)
//! ```
//!
//! The identity flow only needs to know whether the code went out, so the
//! [`CodeMailer`] trait reports a bool.

use askama::Template;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::config::MailSettings;
use crate::error::{SyncError, SyncResult};

/// Subject line of every code email.
pub const CODE_SUBJECT: &str = "Your Hopline sign-in code";

#[derive(Template)]
#[template(path = "otp_email.html")]
struct CodeEmailHtml<'a> {
    brand: &'a str,
    code: &'a str,
}

/// Request body for the email API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Builds the request body for a code email.
pub fn code_email(from: &str, to: &str, code: &str) -> SyncResult<EmailPayload> {
    let html = CodeEmailHtml {
        brand: "Hopline",
        code,
    }
    .render()?;

    Ok(EmailPayload {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: CODE_SUBJECT.to_string(),
        html,
    })
}

/// Something that can deliver a login code.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    /// Returns true when the provider accepted the message.
    async fn send_code(&self, to: &str, code: &str) -> bool;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// Sends codes through the configured email API.
#[derive(Debug, Clone)]
pub struct TransactionalMailer {
    http: Client,
    api_url: Url,
    api_key: SecretString,
    from: String,
}

impl TransactionalMailer {
    pub fn new(settings: &MailSettings, timeout: Duration) -> SyncResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(TransactionalMailer {
            http,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            from: settings.from.clone(),
        })
    }

    async fn deliver(&self, to: &str, code: &str) -> SyncResult<()> {
        let payload = code_email(&self.from, to, code)?;

        let response = self
            .http
            .post(self.api_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(SyncError::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl CodeMailer for TransactionalMailer {
    async fn send_code(&self, to: &str, code: &str) -> bool {
        match self.deliver(to, code).await {
            Ok(()) => {
                info!(to = %to, "Login code sent");
                true
            }
            Err(e) => {
                warn!(to = %to, error = %e, transient = e.is_transient(), "Login code delivery failed");
                false
            }
        }
    }
}

// =============================================================================
// No Provider
// =============================================================================

/// Used when no email API is configured. Every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl CodeMailer for DisabledMailer {
    async fn send_code(&self, to: &str, _code: &str) -> bool {
        warn!(to = %to, "No email provider configured, code not sent");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_email_payload() {
        let payload = code_email("Hopline <no-reply@hopline.com.np>", "shop@example.com", "4821").unwrap();

        assert_eq!(payload.to, vec!["shop@example.com".to_string()]);
        assert_eq!(payload.subject, CODE_SUBJECT);
        assert!(payload.html.contains("4821"));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["from"], "Hopline <no-reply@hopline.com.np>");
        assert!(json["to"].is_array());
    }

    #[tokio::test]
    async fn test_disabled_mailer_reports_failure() {
        assert!(!DisabledMailer.send_code("shop@example.com", "4821").await);
    }

    #[tokio::test]
    async fn test_unreachable_provider_reports_failure() {
        let settings = MailSettings {
            // Port 9 (discard) on loopback: connection refused, no network used.
            api_url: Url::parse("http://127.0.0.1:9/emails").unwrap(),
            api_key: SecretString::from("k".to_string()),
            from: "Hopline <no-reply@hopline.com.np>".to_string(),
        };
        let mailer = TransactionalMailer::new(&settings, Duration::from_secs(2)).unwrap();

        assert!(!mailer.send_code("shop@example.com", "4821").await);
    }
}
