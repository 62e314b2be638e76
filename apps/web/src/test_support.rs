//! Shared fixtures for router tests: an in-memory store, a mailer that
//! records what it was asked to send, and a `oneshot` request helper.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use hopline_core::identity::SignupForm;
use hopline_core::store::Slice;
use hopline_core::types::{User, UserStatus};
use hopline_db::{Database, DbConfig};
use hopline_sync::{CodeMailer, RemoteMirror, RemoteServices};

use crate::build_router;
use crate::state::{AppState, ConfigState};

pub const ADMIN_EMAIL: &str = "admin@hopline.com.np";
pub const MERCHANT_EMAIL: &str = "shop@example.com";

/// Records every code instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    deliver: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new(deliver: bool) -> Arc<Self> {
        Arc::new(RecordingMailer {
            deliver,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl CodeMailer for RecordingMailer {
    async fn send_code(&self, to: &str, code: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        self.deliver
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
}

/// A fresh app over an in-memory database. `deliver` decides whether the
/// mailer reports success.
pub async fn test_app(deliver: bool) -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let store = db.state().load_store().await.unwrap();

    let mailer = RecordingMailer::new(deliver);
    let dyn_mailer: Arc<dyn CodeMailer> = mailer.clone();
    let remote = RemoteServices {
        mirror: RemoteMirror::disabled(),
        mailer: dyn_mailer,
    };

    let state = AppState::new(store, db, remote, ConfigState::default());
    let router = build_router(state.clone());
    TestApp {
        state,
        router,
        mailer,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and decodes the JSON reply (`Null` for no body).
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn text(&self, uri: &str) -> (StatusCode, String) {
        let response = self.send(Method::GET, uri, None).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Adds a merchant with the given status straight into the store.
    pub async fn add_merchant(&self, email: &str, status: UserStatus) -> User {
        let mut user = SignupForm {
            email: email.to_string(),
            phone: "9841234567".to_string(),
            shop_name: "Corner Store".to_string(),
            address: "Baneshwor, Kathmandu".to_string(),
        }
        .into_user(Utc::now());
        user.status = status;

        let added = user.clone();
        self.state
            .mutate(&[Slice::Users], move |s| {
                s.register_merchant(added).map(|_| ())
            })
            .await
            .unwrap();
        user
    }

    /// Starts a session for `user` without the code step.
    pub fn sign_in(&self, user: User) {
        self.state.store.with_store_mut(|s| {
            s.sign_in(user);
        });
    }

    pub async fn sign_in_approved_merchant(&self) -> User {
        let user = self.add_merchant(MERCHANT_EMAIL, UserStatus::Approved).await;
        self.sign_in(user.clone());
        user
    }

    /// Signs in as a materialized administrator.
    pub fn sign_in_admin(&self) -> User {
        let subject = self.state.store.with_store(|s| {
            hopline_core::identity::resolve_subject(&s.users, &self.state.config.admins, ADMIN_EMAIL)
                .unwrap()
        });
        let (user, _) = subject.into_user(Utc::now());
        self.sign_in(user.clone());
        user
    }
}
