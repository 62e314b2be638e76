//! Route guards as extractors.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────┬──────────────────────────┐
//! │ request              │ page (/storefront..) │ API (/api/..)            │
//! ├──────────────────────┼──────────────────────┼──────────────────────────┤
//! │ nobody signed in     │ 303 → /login         │ 401 UNAUTHENTICATED      │
//! │ wrong role           │ 303 → /login         │ 403 FORBIDDEN            │
//! │ right role           │ handler runs         │ handler runs             │
//! └──────────────────────┴──────────────────────┴──────────────────────────┘
//! ```
//!
//! A pending merchant passes [`RequireCustomer`]: they may browse, the
//! cart just ignores their adds.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use hopline_core::types::User;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Where rejected page requests land.
pub const LOGIN_PATH: &str = "/login";

/// A signed-in merchant.
#[derive(Debug, Clone)]
pub struct RequireCustomer(pub User);

/// A signed-in administrator.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

/// Why a guard turned the request away.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin,
    /// JSON error (for API requests).
    Api(ApiError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            AuthRejection::Api(err) => err.into_response(),
        }
    }
}

fn reject(parts: &Parts, err: ApiError) -> AuthRejection {
    debug!(path = %parts.uri.path(), code = ?err.code, "Guard rejected request");
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Api(err)
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = state
            .session_user()
            .ok_or_else(|| reject(parts, ApiError::unauthenticated()))?;

        if state.is_admin(&user) {
            return Err(reject(parts, ApiError::forbidden()));
        }
        Ok(RequireCustomer(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = state
            .session_user()
            .ok_or_else(|| reject(parts, ApiError::unauthenticated()))?;

        if !state.is_admin(&user) {
            return Err(reject(parts, ApiError::forbidden()));
        }
        Ok(RequireAdmin(user))
    }
}
