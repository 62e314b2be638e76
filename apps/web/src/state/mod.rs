//! # State Module
//!
//! Manages application state for the axum server.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  Router::with_state(AppState)      (cloned per request, all Arc)       │
//! │                              │                                          │
//! │      ┌───────────────┬───────┴────────┬────────────────┬─────────────┐ │
//! │      ▼               ▼                ▼                ▼             ▼ │
//! │  ┌──────────┐  ┌──────────┐  ┌────────────────┐  ┌──────────┐ ┌──────┐│
//! │  │StoreState│  │ DbState  │  │ ChallengeState │  │ Remote   │ │Config││
//! │  │Mutex<    │  │ Database │  │ Mutex<Option<  │  │ Services │ │State ││
//! │  │ AppStore>│  │ (pool)   │  │  OtpChallenge>>│  │          │ │      ││
//! │  └──────────┘  └──────────┘  └────────────────┘  └──────────┘ └──────┘│
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • StoreState: every mutation serialized through one Mutex             │
//! │  • DbState: write lock held from snapshot to persist                   │
//! │  • ChallengeState: one slot, Mutex                                     │
//! │  • RemoteServices / ConfigState: read-only after initialization        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Session Per Process
//! The signed-in user lives in `AppStore::auth`, not in a cookie. Whoever
//! signs in last is the session for every client that can reach the bind
//! address, so a second browser acts as that user with no code of its own.
//! Bind to loopback (the default) unless every client on the network is
//! trusted to act as the signed-in user.

mod challenge;
mod config;
mod db;
mod store;

pub use challenge::ChallengeState;
pub use config::{ConfigState, DEFAULT_BIND};
pub use db::DbState;
pub use store::StoreState;

use hopline_core::store::{AppStore, Slice};
use hopline_core::types::User;
use hopline_db::Database;
use hopline_sync::RemoteServices;
use std::sync::Arc;

use crate::error::ApiResult;

/// Everything a handler can reach.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: StoreState,
    pub db: DbState,
    pub challenge: ChallengeState,
    pub remote: RemoteServices,
    pub config: Arc<ConfigState>,
}

impl AppState {
    pub fn new(store: AppStore, db: Database, remote: RemoteServices, config: ConfigState) -> Self {
        AppState {
            store: StoreState::new(store),
            db: DbState::new(db),
            challenge: ChallengeState::new(),
            remote,
            config: Arc::new(config),
        }
    }

    /// Runs a store command, then writes `slices` before returning the
    /// command's result. Nothing is written when the command fails.
    ///
    /// Concurrent calls persist in the order they changed the store.
    pub async fn mutate<F, R>(&self, slices: &[Slice], f: F) -> ApiResult<R>
    where
        F: FnOnce(&mut AppStore) -> hopline_core::CoreResult<R>,
    {
        let _writes = self.db.lock_writes().await;
        let (result, snapshot) = self.store.mutate(f);
        let value = result?;
        self.db.persist(&snapshot, slices).await?;
        Ok(value)
    }

    /// The signed-in user, if any.
    pub fn session_user(&self) -> Option<User> {
        self.store.with_store(|s| s.session_user().cloned())
    }

    /// Returns true for administrators, by role or allow-list.
    pub fn is_admin(&self, user: &User) -> bool {
        user.is_admin() || self.config.is_admin_email(&user.email)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    use crate::test_support::test_app;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_match_memory() {
        let app = Arc::new(test_app(true).await);
        app.sign_in_admin();

        for round in 0..5 {
            let mut requests = JoinSet::new();
            for stock in 0..32 {
                let app = app.clone();
                requests.spawn(async move {
                    let uri = "/api/admin/products/1/stock";
                    let body = json!({ "stock": round * 100 + stock });
                    app.json(Method::PUT, uri, Some(body)).await.0
                });
            }
            while let Some(status) = requests.join_next().await {
                assert_eq!(status.unwrap(), StatusCode::OK);
            }

            let memory = app.state.store.with_store(|s| s.catalog.get("1").unwrap().stock);
            let disk = app.state.db.inner().state().load_store().await.unwrap();
            assert_eq!(disk.catalog.get("1").unwrap().stock, memory, "round {round}");
        }
    }
}
