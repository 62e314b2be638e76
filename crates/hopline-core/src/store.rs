//! # Application State Container
//!
//! [`AppStore`] holds every slice the app persists plus the two in-memory
//! carts. Each mutation is a named `&mut self` command that returns the
//! value it changed; the web layer runs them under one mutex and then
//! writes back the [`Slice`]s the command touched.
//!
//! ```text
//! ┌───────────────────────────── AppStore ─────────────────────────────────┐
//! │  persisted                               in memory only               │
//! │  ─────────                               ──────────────               │
//! │  theme      ── Slice::Theme              cart      (storefront)       │
//! │  auth       ── Slice::Auth               pos_cart  (admin counter)    │
//! │  catalog    ── Slice::Products                                        │
//! │  users      ── Slice::Users                                           │
//! │  ledger     ── Slice::Orders + Slice::CounterSales                    │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is a single session for the whole process: whoever signed in last
//! is the current user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::admin::{self, Analytics, MerchantDetail, MerchantQueue, NewProduct};
use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::seed;
use crate::storefront::{self, CatalogFilter, Confirmation};
use crate::types::{AuthState, Order, Product, Theme, User};

/// A persisted part of the store. Each maps to one blob on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Theme,
    Auth,
    Products,
    Users,
    Orders,
    CounterSales,
}

impl Slice {
    pub const ALL: [Slice; 6] = [
        Slice::Theme,
        Slice::Auth,
        Slice::Products,
        Slice::Users,
        Slice::Orders,
        Slice::CounterSales,
    ];

    /// Key suffix under the storage namespace.
    pub fn key(&self) -> &'static str {
        match self {
            Slice::Theme => "theme",
            Slice::Auth => "auth",
            Slice::Products => "products",
            Slice::Users => "users",
            Slice::Orders => "orders",
            Slice::CounterSales => "counter_sales",
        }
    }
}

/// What a successful storefront checkout hands back.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub confirmation: Confirmation,
    pub invoice_url: String,

    /// Ordered products that had already left the catalog.
    #[serde(skip)]
    pub missing_products: Vec<String>,
}

/// The whole application state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStore {
    pub theme: Theme,
    pub auth: AuthState,
    pub catalog: Catalog,
    pub users: Vec<User>,
    pub ledger: Ledger,
    pub cart: Cart,
    pub pos_cart: Cart,
}

impl AppStore {
    /// First-run state: seed catalog, nobody signed in, no history.
    pub fn seeded() -> Self {
        AppStore {
            catalog: seed::catalog(),
            ..AppStore::default()
        }
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// The signed-in user, refreshed from the Users list so an approval made
    /// after sign-in is visible straight away.
    pub fn session_user(&self) -> Option<&User> {
        let user = self.auth.current_user()?;
        self.users.iter().find(|u| u.id == user.id).or(Some(user))
    }

    fn require_user(&self) -> CoreResult<User> {
        self.session_user().cloned().ok_or(CoreError::NotSignedIn)
    }

    /// Adds `user` unless a record with the same id or email exists.
    ///
    /// ## Returns
    /// Whether the user was added.
    pub fn adopt_user(&mut self, user: User) -> bool {
        if self
            .users
            .iter()
            .any(|u| u.id == user.id || u.email == user.email)
        {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Starts a session for `user`, adding them to Users if they are new.
    pub fn sign_in(&mut self, user: User) -> &AuthState {
        self.adopt_user(user.clone());
        self.auth = AuthState::signed_in(user);
        &self.auth
    }

    /// Ends the session and empties both carts.
    pub fn sign_out(&mut self) {
        self.auth = AuthState::default();
        self.cart.clear();
        self.pos_cart.clear();
    }

    pub fn set_theme(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        theme
    }

    /// Adds a freshly signed-up merchant.
    pub fn register_merchant(&mut self, user: User) -> CoreResult<&User> {
        if self.users.iter().any(|u| u.email == user.email) {
            return Err(CoreError::EmailAlreadyRegistered { email: user.email });
        }
        self.users.push(user);
        Ok(&self.users[self.users.len() - 1])
    }

    // -------------------------------------------------------------------------
    // Storefront
    // -------------------------------------------------------------------------

    pub fn browse(&self, filter: &CatalogFilter) -> Vec<&Product> {
        filter.apply(self.catalog.products())
    }

    /// Adds one unit to the storefront cart.
    ///
    /// ## Returns
    /// `Ok(false)` when the add was ignored (pending merchant, no stock or
    /// the line is full).
    pub fn add_to_cart(&mut self, product_id: &str) -> CoreResult<bool> {
        let user = self.require_user()?;
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        Ok(storefront::add_to_cart(&user, product, &mut self.cart))
    }

    pub fn increment_cart(&mut self, product_id: &str) -> bool {
        self.cart.increment(product_id)
    }

    pub fn decrement_cart(&mut self, product_id: &str) -> bool {
        self.cart.decrement(product_id)
    }

    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        self.cart.remove(product_id)
    }

    /// Places the storefront cart as a COD order.
    pub fn place_order(&mut self, now: DateTime<Utc>) -> CoreResult<PlacedOrder> {
        let user = self.require_user()?;
        let order = storefront::build_order(&user, &self.cart, now)?;
        let missing_products = self.ledger.record_order(order.clone(), &mut self.catalog);
        self.cart.clear();

        Ok(PlacedOrder {
            confirmation: Confirmation::for_order(&order),
            invoice_url: format!("/api/orders/{}/invoice", order.id),
            order,
            missing_products,
        })
    }

    /// The signed-in merchant's orders, newest first.
    pub fn my_orders(&self) -> CoreResult<Vec<Order>> {
        let user = self.require_user()?;
        Ok(self.ledger.orders_for(&user.id).cloned().collect())
    }

    // -------------------------------------------------------------------------
    // Admin: merchants
    // -------------------------------------------------------------------------

    pub fn analytics(&self) -> Analytics {
        Analytics::compute(&self.catalog, &self.ledger, &self.users)
    }

    pub fn merchant_queue(&self) -> MerchantQueue {
        MerchantQueue::build(&self.users)
    }

    pub fn merchant_detail(&self, id: &str) -> CoreResult<MerchantDetail> {
        admin::merchant_detail(&self.users, &self.ledger, id)
    }

    pub fn approve_user(&mut self, id: &str) -> CoreResult<User> {
        admin::approve(&mut self.users, id).cloned()
    }

    /// Folds remote users in. Returns how many were new.
    pub fn merge_users(&mut self, remote: Vec<User>) -> usize {
        admin::merge_remote_users(&mut self.users, remote)
    }

    // -------------------------------------------------------------------------
    // Admin: vault
    // -------------------------------------------------------------------------

    pub fn add_product(&mut self, form: NewProduct) -> CoreResult<Product> {
        let product = form.into_product()?;
        self.catalog.add(product.clone());
        Ok(product)
    }

    pub fn delete_product(&mut self, id: &str) -> CoreResult<Product> {
        self.catalog.delete(id)
    }

    pub fn set_stock(&mut self, id: &str, stock: i64) -> CoreResult<Product> {
        crate::validation::validate_stock_level(stock)?;
        self.catalog.set_stock(id, stock).cloned()
    }

    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> CoreResult<Product> {
        self.catalog.adjust_stock(id, delta).cloned()
    }

    // -------------------------------------------------------------------------
    // Admin: point of sale
    // -------------------------------------------------------------------------

    /// Products offered in the POS picker.
    pub fn pos_products(&self, query: &str) -> Vec<&Product> {
        self.catalog.pos_picker(query)
    }

    /// Adds one unit to the POS cart. Out-of-stock products are ignored.
    pub fn pos_add(&mut self, product_id: &str) -> CoreResult<bool> {
        let product = self
            .catalog
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        if !product.in_stock() {
            return Ok(false);
        }
        Ok(self.pos_cart.add_product(product))
    }

    pub fn pos_increment(&mut self, product_id: &str) -> bool {
        self.pos_cart.increment(product_id)
    }

    pub fn pos_decrement(&mut self, product_id: &str) -> bool {
        self.pos_cart.decrement(product_id)
    }

    pub fn pos_remove(&mut self, product_id: &str) -> bool {
        self.pos_cart.remove(product_id)
    }

    /// Sets or clears the counter price of a POS line.
    pub fn pos_set_price(&mut self, product_id: &str, price: Option<Money>) -> CoreResult<()> {
        if let Some(price) = price {
            crate::validation::validate_price(price.units())?;
        }
        if self.pos_cart.set_custom_price(product_id, price) {
            Ok(())
        } else {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        }
    }

    pub fn pos_checkout(&mut self, now: DateTime<Utc>) -> CoreResult<usize> {
        admin::pos_checkout(&mut self.pos_cart, &mut self.catalog, &mut self.ledger, now)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
