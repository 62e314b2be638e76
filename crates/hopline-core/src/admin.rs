//! # Admin Console Workflow
//!
//! The four admin tabs as plain functions over the store's parts:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Analytics  │  Merchants        │  Vault              │  POS            │
//! │─────────────┼───────────────────┼─────────────────────┼─────────────────│
//! │  Analytics  │  MerchantQueue    │  NewProduct         │  pos_checkout   │
//! │  ::compute  │  approve          │  Catalog::*stock*   │  (line by line) │
//! │             │  merge_remote_    │  Catalog::delete    │                 │
//! │             │  users            │                     │                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is cached: analytics are recomputed for every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::types::{Category, Order, Product, Role, User, UserStatus, DEFAULT_UNIT, PLACEHOLDER_IMAGE};
use crate::validation;

// =============================================================================
// Analytics
// =============================================================================

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub wholesale_revenue: Money,
    pub counter_revenue: Money,
    pub total_revenue: Money,
    pub inventory_value: Money,
    pub order_count: usize,
    pub counter_sale_count: usize,
    pub wholesale_units_sold: i64,
    pub counter_units_sold: i64,
    pub units_in_stock: i64,
    pub pending_merchants: usize,
    pub approved_merchants: usize,
}

impl Analytics {
    pub fn compute(catalog: &Catalog, ledger: &Ledger, users: &[User]) -> Self {
        let wholesale_revenue: Money = ledger.orders.iter().map(|o| o.total).sum();
        let counter_revenue: Money = ledger.counter_sales.iter().map(|s| s.total).sum();
        let queue = MerchantQueue::build(users);

        Analytics {
            wholesale_revenue,
            counter_revenue,
            total_revenue: wholesale_revenue + counter_revenue,
            inventory_value: catalog.inventory_value(),
            order_count: ledger.orders.len(),
            counter_sale_count: ledger.counter_sales.len(),
            wholesale_units_sold: ledger.orders.iter().map(Order::unit_count).sum(),
            counter_units_sold: ledger.counter_sales.iter().map(|s| s.quantity).sum(),
            units_in_stock: catalog.units_in_stock(),
            pending_merchants: queue.pending.len(),
            approved_merchants: queue.approved.len(),
        }
    }
}

// =============================================================================
// Merchants
// =============================================================================

/// Customers split by approval status. Administrators never appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MerchantQueue {
    pub pending: Vec<User>,
    pub approved: Vec<User>,
}

impl MerchantQueue {
    pub fn build(users: &[User]) -> Self {
        let (approved, pending) = users
            .iter()
            .filter(|u| u.role == Role::Customer)
            .cloned()
            .partition(User::is_approved);

        MerchantQueue { pending, approved }
    }
}

/// One merchant with their order history.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MerchantDetail {
    pub merchant: User,
    pub orders: Vec<Order>,
}

pub fn merchant_detail(users: &[User], ledger: &Ledger, id: &str) -> CoreResult<MerchantDetail> {
    let merchant = users
        .iter()
        .find(|u| u.id == id && u.role == Role::Customer)
        .cloned()
        .ok_or_else(|| CoreError::UserNotFound(id.to_string()))?;

    let orders = ledger.orders_for(&merchant.id).cloned().collect();
    Ok(MerchantDetail { merchant, orders })
}

/// Marks a user approved. Approving twice is the same as approving once.
pub fn approve<'a>(users: &'a mut [User], id: &str) -> CoreResult<&'a User> {
    let user = users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| CoreError::UserNotFound(id.to_string()))?;
    user.status = UserStatus::Approved;
    Ok(user)
}

/// Folds a remote snapshot of the users table into the local list.
///
/// Matching ids are replaced by the remote record; remote-only users are
/// appended. Local-only users are kept.
///
/// ## Returns
/// How many users were added.
pub fn merge_remote_users(local: &mut Vec<User>, remote: Vec<User>) -> usize {
    let mut added = 0;
    for user in remote {
        match local.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => {
                local.push(user);
                added += 1;
            }
        }
    }
    added
}

// =============================================================================
// Vault
// =============================================================================

/// The "add product" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub volume: String,
    pub price: i64,
    pub stock: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewProduct {
    /// Validates the form and builds the product with a fresh id.
    pub fn into_product(self) -> CoreResult<Product> {
        validation::validate_product_name(&self.name)?;
        validation::validate_price(self.price)?;
        validation::validate_opening_stock(self.stock)?;

        let image = match self.image.as_deref().map(str::trim) {
            None | Some("") => PLACEHOLDER_IMAGE.to_string(),
            Some(image) => {
                validation::validate_image(image)?;
                image.to_string()
            }
        };

        let unit = match self.unit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_UNIT.to_string(),
            Some(unit) => unit.to_string(),
        };

        Ok(Product {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            category: self.category,
            volume: self.volume.trim().to_string(),
            price: Money::from_units(self.price),
            stock: self.stock,
            image,
            unit,
        })
    }
}

// =============================================================================
// Point of Sale
// =============================================================================

/// Records one CounterSale per POS cart line, in cart order.
///
/// Stops at the first line whose product is gone. Lines before it stay
/// recorded and leave the cart; the failed line and the ones after it are
/// kept, so checking out again only records what is left.
///
/// ## Returns
/// How many sales were recorded, or `PartialCheckout` with the count
/// recorded before the failure (zero when the first line failed).
pub fn pos_checkout(
    cart: &mut Cart,
    catalog: &mut Catalog,
    ledger: &mut Ledger,
    now: DateTime<Utc>,
) -> CoreResult<usize> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut recorded = 0;
    let mut failure = None;
    for line in &cart.lines {
        match ledger.record_counter_sale(
            catalog,
            &line.product_id,
            line.effective_price(),
            line.quantity,
            now,
        ) {
            Ok(_) => recorded += 1,
            Err(CoreError::ProductNotFound(product_id)) => {
                failure = Some(CoreError::PartialCheckout {
                    recorded,
                    product_id,
                });
                break;
            }
            Err(other) => {
                failure = Some(other);
                break;
            }
        }
    }

    cart.lines.drain(..recorded);
    match failure {
        Some(e) => Err(e),
        None => Ok(recorded),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
