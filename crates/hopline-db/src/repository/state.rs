//! # AppStore Persistence
//!
//! Reads every slice once at startup and rewrites a slice in full whenever
//! a command changes it.
//!
//! ## First-Run Defaults
//! ```text
//! ┌──────────────┬───────────────────────────┬──────────────────────────┐
//! │ key          │ value                     │ when missing / unreadable │
//! ├──────────────┼───────────────────────────┼──────────────────────────┤
//! │ ns:theme     │ "light" | "dark"          │ light                     │
//! │ ns:auth      │ AuthState                 │ signed out                │
//! │ ns:products  │ [Product]                 │ seed catalog              │
//! │ ns:users     │ [User]                    │ []                        │
//! │ ns:orders    │ [Order]                   │ []                        │
//! │ ns:counter_  │ [CounterSale]             │ []                        │
//! │   sales      │                           │                           │
//! └──────────────┴───────────────────────────┴──────────────────────────┘
//! ```
//!
//! A value that fails to decode is logged and replaced by its default; the
//! next write of that slice overwrites it.

use hopline_core::catalog::Catalog;
use hopline_core::seed;
use hopline_core::store::{AppStore, Slice};
use hopline_core::types::{AuthState, CounterSale, Order, Theme, User};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::namespaced_key;
use crate::repository::blob::BlobRepository;

#[derive(Debug, Clone)]
pub struct StateRepository {
    blobs: BlobRepository,
    namespace: String,
}

impl StateRepository {
    pub fn new(blobs: BlobRepository, namespace: String) -> Self {
        StateRepository { blobs, namespace }
    }

    /// Full key for a slice.
    pub fn key(&self, slice: Slice) -> String {
        namespaced_key(&self.namespace, slice.key())
    }

    async fn load_or<T, F>(&self, slice: Slice, default: F) -> DbResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let key = self.key(slice);
        match self.blobs.get_json::<T>(&key).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                debug!(key = %key, "No stored value, using default");
                Ok(default())
            }
            Err(DbError::Serialization { key, message }) => {
                warn!(key = %key, error = %message, "Stored value unreadable, using default");
                Ok(default())
            }
            Err(e) => Err(e),
        }
    }

    /// Loads the whole store. Carts always start empty.
    pub async fn load_store(&self) -> DbResult<AppStore> {
        let theme: Theme = self.load_or(Slice::Theme, Theme::default).await?;
        let auth: AuthState = self.load_or(Slice::Auth, AuthState::default).await?;
        let catalog: Catalog = self.load_or(Slice::Products, seed::catalog).await?;
        let users: Vec<User> = self.load_or(Slice::Users, Vec::new).await?;
        let orders: Vec<Order> = self.load_or(Slice::Orders, Vec::new).await?;
        let counter_sales: Vec<CounterSale> =
            self.load_or(Slice::CounterSales, Vec::new).await?;

        info!(
            namespace = %self.namespace,
            products = catalog.len(),
            users = users.len(),
            orders = orders.len(),
            counter_sales = counter_sales.len(),
            signed_in = auth.is_authenticated,
            "Store loaded"
        );

        let mut store = AppStore {
            theme,
            auth,
            catalog,
            users,
            ..AppStore::default()
        };
        store.ledger.orders = orders;
        store.ledger.counter_sales = counter_sales;
        Ok(store)
    }

    /// Rewrites one slice in full.
    pub async fn save_slice(&self, store: &AppStore, slice: Slice) -> DbResult<()> {
        let key = self.key(slice);
        match slice {
            Slice::Theme => self.blobs.put_json(&key, &store.theme).await,
            Slice::Auth => self.blobs.put_json(&key, &store.auth).await,
            Slice::Products => self.blobs.put_json(&key, &store.catalog).await,
            Slice::Users => self.blobs.put_json(&key, &store.users).await,
            Slice::Orders => self.blobs.put_json(&key, &store.ledger.orders).await,
            Slice::CounterSales => self.blobs.put_json(&key, &store.ledger.counter_sales).await,
        }
    }

    /// Rewrites several slices, stopping at the first failure.
    pub async fn save_slices(&self, store: &AppStore, slices: &[Slice]) -> DbResult<()> {
        for slice in slices {
            self.save_slice(store, *slice).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
