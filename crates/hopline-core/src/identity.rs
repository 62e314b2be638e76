//! # Identity & Session Manager (pure half)
//!
//! Email-plus-passcode login with no passwords. This module decides *who*
//! an email belongs to and whether a submitted code is right. Sending the
//! email and remembering trusted devices is done by the web layer through
//! `hopline-sync` and `hopline-db`.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        request_code(email)                              │
//! │                                                                         │
//! │  normalize_email ──► resolve_subject ──┬── unknown ──► UnknownMerchant  │
//! │                                        │               (no code made)   │
//! │                                        ▼                                │
//! │                              trusted device? ──yes──► session now       │
//! │                                        │ no                              │
//! │                                        ▼                                │
//! │                              cooldown elapsed? ──no──► ResendCooldown   │
//! │                                        │ yes                             │
//! │                                        ▼                                │
//! │                              generate_code (1000..=9999)                │
//! │                                        │                                │
//! │                              send ─────┼── ok ──────────► code entry    │
//! │                                        ├── fail, admin ─► code entry    │
//! │                                        │                  (diag. log)   │
//! │                                        └── fail, other ─► DeliveryFailed│
//! │                                                                         │
//! │                        verify_code(email, code)                         │
//! │                                                                         │
//! │  code == last issued ──no──► CodeMismatch                               │
//! │         │ yes                                                           │
//! │         ▼                                                               │
//! │  trust device ──► resolve / materialize User ──► AuthState              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Trusted Devices
//! A verified email is trusted on this install forever. There is no expiry
//! or rotation; clearing the flag is the only way to force a new code.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{Role, User, UserStatus};
use crate::validation;
use crate::RESEND_COOLDOWN_SECS;

/// Lowest code that can be issued.
pub const CODE_MIN: u32 = 1000;

/// Highest code that can be issued.
pub const CODE_MAX: u32 = 9999;

/// Trims and lowercases an email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generates a 4-digit code, uniformly in `1000..=9999`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(CODE_MIN..=CODE_MAX).to_string()
}

// =============================================================================
// Admin Allow-List
// =============================================================================

/// The fixed set of administrator emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAllowList {
    emails: Vec<String>,
}

impl AdminAllowList {
    /// Builds an allow-list, normalizing and de-duplicating entries.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        AdminAllowList { emails: normalized }
    }

    /// The built-in roster.
    pub fn defaults() -> Self {
        Self::new(crate::seed::DEFAULT_ADMIN_EMAILS.iter().copied())
    }

    /// Returns true if the (already normalized) email is an administrator.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.iter().any(|e| e == email)
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }
}

// =============================================================================
// Subject Resolution
// =============================================================================

/// Who an email belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// An existing User record (merchant or admin).
    Registered(User),
    /// On the allow-list but not yet in the Users list.
    Admin { email: String },
}

impl Subject {
    /// Returns true for either flavour of administrator.
    pub fn is_admin(&self, admins: &AdminAllowList) -> bool {
        match self {
            Subject::Registered(user) => user.is_admin() || admins.contains(&user.email),
            Subject::Admin { .. } => true,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Subject::Registered(user) => &user.email,
            Subject::Admin { email } => email,
        }
    }

    /// Produces the session User.
    ///
    /// ## Returns
    /// `(user, materialized)`: `materialized` is true when an admin record
    /// was synthesized and must be added to the Users list.
    pub fn into_user(self, now: DateTime<Utc>) -> (User, bool) {
        match self {
            Subject::Registered(user) => (user, false),
            Subject::Admin { email } => (
                User {
                    id: Uuid::new_v4().to_string(),
                    email,
                    phone: String::new(),
                    shop_name: String::new(),
                    address: String::new(),
                    role: Role::Admin,
                    status: UserStatus::Approved,
                    created_at: now,
                },
                true,
            ),
        }
    }
}

/// Resolves a normalized email to a [`Subject`].
///
/// ## Returns
/// `UnknownMerchant` unless the email is a registered User or an admin.
pub fn resolve_subject(users: &[User], admins: &AdminAllowList, email: &str) -> CoreResult<Subject> {
    if let Some(user) = users.iter().find(|u| u.email == email) {
        return Ok(Subject::Registered(user.clone()));
    }

    if admins.contains(email) {
        return Ok(Subject::Admin {
            email: email.to_string(),
        });
    }

    Err(CoreError::UnknownMerchant {
        email: email.to_string(),
    })
}

// =============================================================================
// Signup
// =============================================================================

/// What a merchant fills in on the signup page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub email: String,
    pub phone: String,
    pub shop_name: String,
    pub address: String,
}

impl SignupForm {
    /// Validates every field and returns the form with a normalized email
    /// and trimmed text.
    pub fn validated(self) -> CoreResult<SignupForm> {
        let email = validation::validate_email(&self.email)?;
        validation::validate_phone(&self.phone)?;
        validation::validate_required_text("shopName", &self.shop_name, 120)?;
        validation::validate_required_text("address", &self.address, 300)?;

        Ok(SignupForm {
            email,
            phone: self.phone.trim().to_string(),
            shop_name: self.shop_name.trim().to_string(),
            address: self.address.trim().to_string(),
        })
    }

    /// Creates the pending merchant record for this form.
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            email: self.email,
            phone: self.phone,
            shop_name: self.shop_name,
            address: self.address,
            role: Role::Customer,
            status: UserStatus::Pending,
            created_at: now,
        }
    }
}

/// Fails if `email` already belongs to a User or the allow-list.
pub fn ensure_available(users: &[User], admins: &AdminAllowList, email: &str) -> CoreResult<()> {
    if admins.contains(email) || users.iter().any(|u| u.email == email) {
        return Err(CoreError::EmailAlreadyRegistered {
            email: email.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// OTP Challenge
// =============================================================================

/// Why the code was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengePurpose {
    Login,
    Signup(SignupForm),
}

/// The single outstanding code for this device. Held in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpChallenge {
    pub email: String,
    code: String,
    pub issued_at: DateTime<Utc>,
    pub purpose: ChallengePurpose,

    /// False when the code only reached the diagnostic log.
    pub delivered: bool,
}

impl OtpChallenge {
    pub fn new(
        email: impl Into<String>,
        code: impl Into<String>,
        purpose: ChallengePurpose,
        issued_at: DateTime<Utc>,
        delivered: bool,
    ) -> Self {
        OtpChallenge {
            email: email.into(),
            code: code.into(),
            issued_at,
            purpose,
            delivered,
        }
    }

    /// The issued code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// When another code may be requested.
    pub fn resend_available_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(RESEND_COOLDOWN_SECS)
    }

    /// Whole seconds left on the cooldown, if it is still running.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = self.resend_available_at() - now;
        let millis = remaining.num_milliseconds();
        (millis > 0).then(|| (millis + 999) / 1000)
    }

    /// Checks a submitted code.
    ///
    /// Succeeds only when `email` is the challenged email and `submitted`
    /// is exactly the issued code: no trimming, no leading-zero tricks.
    pub fn verify(&self, email: &str, submitted: &str) -> CoreResult<()> {
        if normalize_email(email) == self.email && submitted == self.code {
            Ok(())
        } else {
            Err(CoreError::CodeMismatch)
        }
    }
}

/// Rejects a new challenge for `email` while an earlier one is cooling
/// down.
pub fn check_cooldown(
    existing: Option<&OtpChallenge>,
    email: &str,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    match existing {
        Some(challenge) if challenge.email == email => match challenge.retry_after_secs(now) {
            Some(retry_after_secs) => Err(CoreError::ResendCooldown { retry_after_secs }),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn merchant(email: &str) -> User {
        SignupForm {
            email: email.to_string(),
            phone: "9841234567".to_string(),
            shop_name: "Corner Store".to_string(),
            address: "Thamel, Kathmandu".to_string(),
        }
        .into_user(Utc::now())
    }

    #[test]
    fn test_generate_code_range_and_digits() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), 4);
            let value: u32 = code.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&value));
        }
    }

    #[test]
    fn test_unknown_email_is_rejected() {
        let users = vec![merchant("shop@example.com")];
        let admins = AdminAllowList::new(["admin@example.com"]);

        let result = resolve_subject(&users, &admins, "stranger@example.com");
        assert!(matches!(result, Err(CoreError::UnknownMerchant { .. })));
    }

    #[test]
    fn test_registered_user_resolves() {
        let users = vec![merchant("shop@example.com")];
        let admins = AdminAllowList::default();

        let subject = resolve_subject(&users, &admins, "shop@example.com").unwrap();
        assert!(!subject.is_admin(&admins));

        let (user, materialized) = subject.into_user(Utc::now());
        assert_eq!(user.email, "shop@example.com");
        assert!(!materialized);
    }

    #[test]
    fn test_admin_is_materialized_approved() {
        let admins = AdminAllowList::new(["  Admin@Example.com "]);
        let subject = resolve_subject(&[], &admins, "admin@example.com").unwrap();
        assert!(subject.is_admin(&admins));

        let (user, materialized) = subject.into_user(Utc::now());
        assert!(materialized);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.status, UserStatus::Approved);
    }

    #[test]
    fn test_verify_requires_exact_code() {
        let challenge = OtpChallenge::new(
            "shop@example.com",
            "4821",
            ChallengePurpose::Login,
            Utc::now(),
            true,
        );

        assert!(challenge.verify("shop@example.com", "4821").is_ok());
        assert!(challenge.verify(" SHOP@example.com", "4821").is_ok());

        for wrong in ["4822", "", "04821", "4821 ", "abcd", "1000"] {
            assert!(matches!(
                challenge.verify("shop@example.com", wrong),
                Err(CoreError::CodeMismatch)
            ));
        }
        assert!(challenge.verify("other@example.com", "4821").is_err());
    }

    #[test]
    fn test_cooldown_window() {
        let issued = Utc::now();
        let challenge = OtpChallenge::new(
            "shop@example.com",
            "4821",
            ChallengePurpose::Login,
            issued,
            true,
        );

        let early = issued + Duration::seconds(10);
        assert!(matches!(
            check_cooldown(Some(&challenge), "shop@example.com", early),
            Err(CoreError::ResendCooldown {
                retry_after_secs: 20
            })
        ));

        // A different email is not blocked.
        assert!(check_cooldown(Some(&challenge), "other@example.com", early).is_ok());

        let later = issued + Duration::seconds(RESEND_COOLDOWN_SECS);
        assert!(check_cooldown(Some(&challenge), "shop@example.com", later).is_ok());
        assert!(check_cooldown(None, "shop@example.com", early).is_ok());
    }

    #[test]
    fn test_signup_form_validation_and_duplicates() {
        let form = SignupForm {
            email: " New@Shop.com ".to_string(),
            phone: "9841234567".to_string(),
            shop_name: " Fresh Mart ".to_string(),
            address: "Lalitpur".to_string(),
        }
        .validated()
        .unwrap();
        assert_eq!(form.email, "new@shop.com");
        assert_eq!(form.shop_name, "Fresh Mart");

        let user = form.into_user(Utc::now());
        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.role, Role::Customer);

        let users = vec![user];
        let admins = AdminAllowList::new(["admin@example.com"]);
        assert!(ensure_available(&users, &admins, "new@shop.com").is_err());
        assert!(ensure_available(&users, &admins, "admin@example.com").is_err());
        assert!(ensure_available(&users, &admins, "free@shop.com").is_ok());
    }
}
