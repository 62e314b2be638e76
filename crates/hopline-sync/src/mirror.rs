//! # Remote Mirror
//!
//! Copies local changes to the hosted tables without making the caller
//! wait.
//!
//! ## Fire-and-Forget Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  handler                                                                │
//! │    │  store.approve_user(id)        (local, authoritative)             │
//! │    │  db.state().save_slice(..)     (awaited)                          │
//! │    │  mirror.patch_user_status(..)  ───► tokio::spawn ──► PATCH users  │
//! │    ▼                                                │                   │
//! │  200 OK                                             └─ error? warn!    │
//! │                                                                         │
//! │  Awaited calls (the UI needs the answer):                              │
//! │    lookup_user_by_email  - login fallback                              │
//! │    pull_users            - admin "refresh"                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With no hosted tables configured every push is a no-op and the awaited
//! calls return `RemoteUnavailable`.

use hopline_core::types::{CounterSale, Order, Product, User, UserStatus};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::table::{HostedTableClient, Table};

const SERVICE: &str = "Hosted tables";

/// Handle for mirroring to the hosted tables. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RemoteMirror {
    client: Option<Arc<HostedTableClient>>,
}

impl RemoteMirror {
    pub fn new(client: Option<HostedTableClient>) -> Self {
        RemoteMirror {
            client: client.map(Arc::new),
        }
    }

    /// A mirror that never talks to anything.
    pub fn disabled() -> Self {
        RemoteMirror { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> SyncResult<&HostedTableClient> {
        self.client
            .as_deref()
            .ok_or(SyncError::RemoteUnavailable(SERVICE))
    }

    /// Runs `op` in the background if a client is configured.
    fn spawn<F, Fut>(&self, what: &'static str, table: Table, op: F)
    where
        F: FnOnce(Arc<HostedTableClient>) -> Fut,
        Fut: Future<Output = SyncResult<()>> + Send + 'static,
    {
        let Some(client) = self.client.clone() else {
            debug!(what, "Remote mirror disabled, skipping");
            return;
        };

        let task = op(client);
        tokio::spawn(async move {
            if let Err(e) = task.await {
                warn!(
                    what,
                    table = %table,
                    error = %e,
                    transient = e.is_transient(),
                    "Remote mirror failed"
                );
            }
        });
    }

    // =========================================================================
    // Fire-and-forget pushes
    // =========================================================================

    pub fn upsert_user(&self, user: &User) {
        let user = user.clone();
        self.spawn("upsert_user", Table::Users, move |client| async move {
            client.upsert(Table::Users, &user).await
        });
    }

    /// Sends a status-only patch for `id`.
    pub fn patch_user_status(&self, id: &str, status: UserStatus) {
        let id = id.to_string();
        self.spawn("patch_user_status", Table::Users, move |client| async move {
            client
                .patch(Table::Users, &id, json!({ "status": status }))
                .await
        });
    }

    pub fn upsert_product(&self, product: &Product) {
        let product = product.clone();
        self.spawn("upsert_product", Table::Products, move |client| async move {
            client.upsert(Table::Products, &product).await
        });
    }

    /// Pushes several products in one request (after a checkout).
    pub fn upsert_products(&self, products: Vec<Product>) {
        if products.is_empty() {
            return;
        }
        self.spawn("upsert_products", Table::Products, move |client| async move {
            client.upsert(Table::Products, &products).await
        });
    }

    pub fn delete_product(&self, id: &str) {
        let id = id.to_string();
        self.spawn("delete_product", Table::Products, move |client| async move {
            client.delete(Table::Products, &id).await
        });
    }

    pub fn upsert_order(&self, order: &Order) {
        let order = order.clone();
        self.spawn("upsert_order", Table::Orders, move |client| async move {
            client.upsert(Table::Orders, &order).await
        });
    }

    pub fn insert_counter_sales(&self, sales: Vec<CounterSale>) {
        if sales.is_empty() {
            return;
        }
        self.spawn("insert_counter_sales", Table::CounterSales, move |client| async move {
            client.upsert(Table::CounterSales, &sales).await
        });
    }

    // =========================================================================
    // Awaited reads
    // =========================================================================

    /// Looks a user up by (normalized) email.
    pub async fn lookup_user_by_email(&self, email: &str) -> SyncResult<Option<User>> {
        let users: Vec<User> = self.client()?.select_by_email(Table::Users, email).await?;
        Ok(users.into_iter().find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Every user in the hosted table.
    pub async fn pull_users(&self) -> SyncResult<Vec<User>> {
        self.client()?.select_all(Table::Users).await
    }
}
