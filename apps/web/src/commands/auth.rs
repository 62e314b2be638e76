//! # Auth Commands
//!
//! Passwordless sign-in: the merchant types an email, receives a 4-digit
//! code, and types the code back.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/auth/request-code { email }                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  resolve locally ──miss──► hosted table lookup ──miss──► UNKNOWN_MERCHANT│
//! │         │                        │ hit: adopt into Users                │
//! │         ▼◄───────────────────────┘                                      │
//! │  trusted device? ──yes──► signed in, no code                            │
//! │         │ no                                                            │
//! │         ▼                                                               │
//! │  cooldown running? ──yes──► RESEND_COOLDOWN                             │
//! │         │ no                                                            │
//! │         ▼                                                               │
//! │  generate 1000..=9999 ──► mailer.send_code                              │
//! │         │                   │ failed: admin → code at warn, go on       │
//! │         │                   │         others → DELIVERY_FAILED          │
//! │         ▼                                                               │
//! │  challenge pending (30s resend cooldown)                                │
//! │                                                                         │
//! │  POST /api/auth/verify { email, code }                                  │
//! │         │  exact match only                                             │
//! │         ▼                                                               │
//! │  trust device ──► resolve / materialize admin / create signup ──► session│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hopline_core::identity::{
    check_cooldown, ensure_available, generate_code, normalize_email, resolve_subject,
    ChallengePurpose, OtpChallenge, SignupForm, Subject,
};
use hopline_core::store::Slice;
use hopline_core::types::User;
use hopline_core::CoreError;

use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBody {
    pub email: String,
    pub code: String,
}

/// The current session as the browser sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub is_admin: bool,
}

impl SessionView {
    /// Reads the session from the store, with the user refreshed from the
    /// Users list.
    pub fn current(app: &AppState) -> Self {
        match app.session_user() {
            Some(user) => SessionView {
                is_authenticated: true,
                is_admin: app.is_admin(&user),
                user: Some(user),
            },
            None => SessionView {
                is_authenticated: false,
                user: None,
                is_admin: false,
            },
        }
    }
}

/// Outcome of a code request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CodeRequest {
    /// The device is trusted: the session started without a code.
    #[serde(rename_all = "camelCase")]
    SignedIn { session: SessionView },

    /// A code is pending.
    #[serde(rename_all = "camelCase")]
    CodeSent {
        email: String,
        /// False when the code only reached the server log.
        delivered: bool,
        resend_available_at: DateTime<Utc>,
    },
}

impl CodeRequest {
    fn sent(challenge: &OtpChallenge) -> Self {
        CodeRequest::CodeSent {
            email: challenge.email.clone(),
            delivered: challenge.delivered,
            resend_available_at: challenge.resend_available_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgetDeviceResponse {
    pub forgotten: bool,
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolves `email` locally, falling back to the hosted users table.
async fn resolve(app: &AppState, email: &str) -> ApiResult<Subject> {
    let local = app
        .store
        .with_store(|s| resolve_subject(&s.users, &app.config.admins, email));

    let unknown = match local {
        Ok(subject) => return Ok(subject),
        Err(e @ CoreError::UnknownMerchant { .. }) => e,
        Err(other) => return Err(other.into()),
    };

    if !app.remote.mirror.is_enabled() {
        return Err(unknown.into());
    }

    match app.remote.mirror.lookup_user_by_email(email).await {
        Ok(Some(mut user)) => {
            user.email = normalize_email(&user.email);
            info!(email = %email, id = %user.id, "Merchant found in hosted table, adopting");
            let adopted = user.clone();
            app.mutate(&[Slice::Users], move |s| {
                s.adopt_user(adopted);
                Ok(())
            })
            .await?;
            Ok(Subject::Registered(user))
        }
        Ok(None) => Err(unknown.into()),
        Err(e) => {
            warn!(email = %email, error = %e, "Hosted table lookup failed");
            Err(unknown.into())
        }
    }
}

/// Signs `subject` in, adding a materialized admin to Users.
async fn start_session(app: &AppState, subject: Subject) -> ApiResult<SessionView> {
    let (user, materialized) = subject.into_user(Utc::now());
    if materialized {
        info!(email = %user.email, "Administrator added to users");
    }

    let email = user.email.clone();
    app.mutate(&[Slice::Auth, Slice::Users], move |s| {
        s.sign_in(user);
        Ok(())
    })
    .await?;

    info!(email = %email, "Signed in");
    Ok(SessionView::current(app))
}

/// Generates, sends and records a code for `email`.
///
/// With `admin_fallback`, a failed delivery still issues the code and logs
/// it at warn level; otherwise the failure is `DeliveryFailed`.
async fn issue_code(
    app: &AppState,
    email: String,
    purpose: ChallengePurpose,
    admin_fallback: bool,
) -> ApiResult<CodeRequest> {
    let now = Utc::now();
    check_cooldown(app.challenge.current().as_ref(), &email, now)?;

    let code = generate_code(&mut rand::rng());
    let delivered = app.remote.mailer.send_code(&email, &code).await;

    if !delivered {
        if !admin_fallback {
            return Err(CoreError::DeliveryFailed { email }.into());
        }
        warn!(email = %email, code = %code, "Code email not delivered, administrator code issued here");
    }

    let challenge = OtpChallenge::new(email, code, purpose, now, delivered);
    let response = CodeRequest::sent(&challenge);
    app.challenge.issue(challenge);
    Ok(response)
}

// =============================================================================
// Handlers
// =============================================================================

/// Starts a login.
///
/// ## Returns
/// `signedIn` for a trusted device, otherwise `codeSent`.
pub async fn request_code(
    State(app): State<AppState>,
    Json(body): Json<EmailBody>,
) -> ApiResult<Json<CodeRequest>> {
    let email = normalize_email(&body.email);
    debug!(email = %email, "request_code");

    let subject = resolve(&app, &email).await?;

    if app.db.inner().trusted_devices().is_trusted(&email).await? {
        info!(email = %email, "Trusted device, skipping code");
        let session = start_session(&app, subject).await?;
        return Ok(Json(CodeRequest::SignedIn { session }));
    }

    let is_admin = subject.is_admin(&app.config.admins);
    let response = issue_code(&app, email, ChallengePurpose::Login, is_admin).await?;
    Ok(Json(response))
}

/// Starts a signup: validates the form and sends a code.
pub async fn request_signup(
    State(app): State<AppState>,
    Json(form): Json<SignupForm>,
) -> ApiResult<Json<CodeRequest>> {
    let form = form.validated()?;
    let email = form.email.clone();
    debug!(email = %email, "request_signup");

    app.store
        .with_store(|s| ensure_available(&s.users, &app.config.admins, &email))?;

    let response = issue_code(&app, email, ChallengePurpose::Signup(form), false).await?;
    Ok(Json(response))
}

/// Completes a login or signup.
pub async fn verify_code(
    State(app): State<AppState>,
    Json(body): Json<VerifyBody>,
) -> ApiResult<Json<SessionView>> {
    let challenge = app.challenge.current().ok_or(CoreError::CodeMismatch)?;
    if let Err(e) = challenge.verify(&body.email, &body.code) {
        debug!(email = %challenge.email, "Code mismatch");
        return Err(e.into());
    }
    app.challenge.consume(&challenge);

    let email = challenge.email.clone();
    app.db.inner().trusted_devices().mark_trusted(&email).await?;

    let session = match challenge.purpose {
        ChallengePurpose::Login => {
            let subject = app
                .store
                .with_store(|s| resolve_subject(&s.users, &app.config.admins, &email))?;
            start_session(&app, subject).await?
        }
        ChallengePurpose::Signup(form) => {
            let user = form.into_user(Utc::now());
            let mirrored = user.clone();
            app.mutate(&[Slice::Auth, Slice::Users], move |s| {
                s.register_merchant(user.clone())?;
                s.sign_in(user);
                Ok(())
            })
            .await?;

            app.remote.mirror.upsert_user(&mirrored);
            info!(email = %email, id = %mirrored.id, "Merchant signed up, awaiting approval");
            SessionView::current(&app)
        }
    };

    Ok(Json(session))
}

/// Ends the session and empties both carts.
pub async fn logout(State(app): State<AppState>) -> ApiResult<Json<SessionView>> {
    app.mutate(&[Slice::Auth], |s| {
        s.sign_out();
        Ok(())
    })
    .await?;
    app.challenge.clear();

    info!("Signed out");
    Ok(Json(SessionView::current(&app)))
}

/// Removes the trusted-device flag for an email.
pub async fn forget_device(
    State(app): State<AppState>,
    Json(body): Json<EmailBody>,
) -> ApiResult<Json<ForgetDeviceResponse>> {
    let email = normalize_email(&body.email);
    let forgotten = app.db.inner().trusted_devices().forget(&email).await?;
    info!(email = %email, forgotten, "Trusted device cleared");
    Ok(Json(ForgetDeviceResponse { forgotten }))
}

/// The current session.
pub async fn get_session(State(app): State<AppState>) -> Json<SessionView> {
    Json(SessionView::current(&app))
}
