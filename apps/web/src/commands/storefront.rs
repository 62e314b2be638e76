//! # Storefront Commands
//!
//! Catalog browsing, the merchant cart and checkout.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │ Browsing │────►│ In Cart  │────►│ Checkout │────►│Confirmed │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │   GET catalog     POST items        POST checkout    PlacedOrder        │
//! │                   increment         (COD order,      confirmation       │
//! │                   decrement          stock down,     expires in 5s      │
//! │                   DELETE item        cart cleared)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is held in memory only. A pending merchant's adds are ignored
//! (`added: false`), not rejected.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hopline_core::cart::{Cart, CartLine, CartTotals};
use hopline_core::invoice::render_invoice;
use hopline_core::store::{PlacedOrder, Slice};
use hopline_core::storefront::{CatalogFilter, CategoryFilter};
use hopline_core::types::{Order, Product};
use hopline_core::validation::validate_search_query;
use hopline_core::CoreError;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireCustomer;
use crate::state::AppState;

// =============================================================================
// Payloads
// =============================================================================

/// `?category=Beer&q=tub`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl CatalogQuery {
    pub fn filter(&self) -> ApiResult<CatalogFilter> {
        let query = validate_search_query(self.q.as_deref().unwrap_or_default())
            .map_err(CoreError::from)?;
        Ok(CatalogFilter::new(
            CategoryFilter::from_label(self.category.as_deref()),
            query,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: String,
}

/// Cart lines with calculated totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines.clone(),
            totals: CartTotals::from(cart),
        }
    }
}

/// Result of an add: the cart, and whether the add took effect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdate {
    pub added: bool,
    pub cart: CartResponse,
}

/// Fails with `NotFound` unless `cart` has a line for `product_id`.
pub(crate) fn require_line(cart: &Cart, product_id: &str) -> ApiResult<()> {
    match cart.line(product_id) {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Cart line", product_id)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Products matching the category and name filter.
pub async fn catalog(
    _customer: RequireCustomer,
    State(app): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let filter = query.filter()?;
    let products = app
        .store
        .with_store(|s| s.browse(&filter).into_iter().cloned().collect());
    Ok(Json(products))
}

pub async fn get_cart(_customer: RequireCustomer, State(app): State<AppState>) -> Json<CartResponse> {
    Json(app.store.with_store(|s| CartResponse::from(&s.cart)))
}

/// Adds one unit of a product.
///
/// ## Behavior
/// - Product already in cart: quantity increases (up to 999)
/// - Pending merchant or no stock: nothing changes, `added` is false
/// - Price is frozen at the time of adding
pub async fn add_item(
    _customer: RequireCustomer,
    State(app): State<AppState>,
    Json(body): Json<AddItemBody>,
) -> ApiResult<Json<CartUpdate>> {
    debug!(product_id = %body.product_id, "add_to_cart");
    let (added, cart) = app.store.with_store_mut(|s| {
        let added = s.add_to_cart(&body.product_id)?;
        Ok::<_, CoreError>((added, CartResponse::from(&s.cart)))
    })?;
    Ok(Json(CartUpdate { added, cart }))
}

pub async fn increment_item(
    _customer: RequireCustomer,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.cart, &product_id)?;
        s.increment_cart(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.cart))
    })?;
    Ok(Json(cart))
}

/// Takes one unit off; the line goes when it reaches zero.
pub async fn decrement_item(
    _customer: RequireCustomer,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.cart, &product_id)?;
        s.decrement_cart(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.cart))
    })?;
    Ok(Json(cart))
}

pub async fn remove_item(
    _customer: RequireCustomer,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.cart, &product_id)?;
        s.remove_from_cart(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.cart))
    })?;
    Ok(Json(cart))
}

/// Places the cart as a cash-on-delivery order.
///
/// ## Process
/// 1. Build the order from the cart snapshot (prices frozen)
/// 2. Prepend it to the ledger and take stock down, clamped at 0
/// 3. Clear the cart, persist products and orders
/// 4. Mirror the order and the new stock levels in the background
pub async fn checkout(
    RequireCustomer(customer): RequireCustomer,
    State(app): State<AppState>,
) -> ApiResult<Json<PlacedOrder>> {
    let placed = app
        .mutate(&[Slice::Products, Slice::Orders], |s| s.place_order(Utc::now()))
        .await?;

    if !placed.missing_products.is_empty() {
        warn!(
            order_id = %placed.order.id,
            missing = ?placed.missing_products,
            "Order placed for products no longer in the catalog"
        );
    }

    let touched: Vec<Product> = app.store.with_store(|s| {
        placed
            .order
            .items
            .iter()
            .filter_map(|item| s.catalog.get(&item.product_id).cloned())
            .collect()
    });
    app.remote.mirror.upsert_order(&placed.order);
    app.remote.mirror.upsert_products(touched);

    info!(
        order_id = %placed.order.id,
        email = %customer.email,
        total = %placed.order.total,
        "Order placed"
    );
    Ok(Json(placed))
}

/// The merchant's own orders, newest first.
pub async fn my_orders(
    _customer: RequireCustomer,
    State(app): State<AppState>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(app.store.with_store(|s| s.my_orders())?))
}

/// Printable invoice for one of the merchant's own orders.
pub async fn my_invoice(
    RequireCustomer(customer): RequireCustomer,
    State(app): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Html<String>> {
    let html = app.store.with_store(|s| {
        let order = s
            .ledger
            .order(&order_id)
            .filter(|o| o.customer_id == customer.id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.clone()))?;
        let merchant = s.users.iter().find(|u| u.id == order.customer_id);
        Ok::<_, ApiError>(render_invoice(order, merchant, &app.config.issuer)?)
    })?;
    Ok(Html(html))
}
