//! # Admin Commands
//!
//! The admin console: analytics, the merchant queue, the inventory vault
//! and the point-of-sale counter.
//!
//! ## Remote Mirroring
//! ```text
//! ┌──────────────────────────┬─────────────────────┬──────────────────────┐
//! │ command                  │ persisted slices    │ hosted table push    │
//! ├──────────────────────────┼─────────────────────┼──────────────────────┤
//! │ approve_merchant         │ users               │ PATCH users status   │
//! │ refresh_merchants        │ users               │ (GET users, awaited) │
//! │ create_product           │ products            │ upsert products      │
//! │ increment / decrement    │ products            │ upsert products      │
//! │ set_stock                │ products            │ upsert products      │
//! │ delete_product           │ products            │ DELETE products      │
//! │ pos_checkout             │ products, counter.. │ insert counter_sales │
//! │                          │                     │ + upsert products    │
//! └──────────────────────────┴─────────────────────┴──────────────────────┘
//! ```
//!
//! Pushes run in the background; a failed push is logged and the local
//! change stands.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hopline_core::admin::{Analytics, MerchantDetail, MerchantQueue, NewProduct};
use hopline_core::invoice::render_invoice;
use hopline_core::store::Slice;
use hopline_core::types::{CounterSale, Order, Product, User, UserStatus};
use hopline_core::validation::validate_search_query;
use hopline_core::{CoreError, Money};

use crate::commands::storefront::{require_line, AddItemBody, CartResponse, CartUpdate};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Users that only existed remotely.
    pub added: usize,
    pub merchants: MerchantQueue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBody {
    pub stock: i64,
}

/// `None` clears the override and the catalog price applies again.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBody {
    #[serde(default)]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PosQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosCheckoutResponse {
    pub recorded: usize,
    pub total: Money,
    pub sales: Vec<CounterSale>,
}

// =============================================================================
// Analytics & Merchants
// =============================================================================

/// Dashboard figures, recomputed on every request.
pub async fn analytics(_admin: RequireAdmin, State(app): State<AppState>) -> Json<Analytics> {
    Json(app.store.with_store(|s| s.analytics()))
}

pub async fn merchants(_admin: RequireAdmin, State(app): State<AppState>) -> Json<MerchantQueue> {
    Json(app.store.with_store(|s| s.merchant_queue()))
}

pub async fn merchant_detail(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MerchantDetail>> {
    Ok(Json(app.store.with_store(|s| s.merchant_detail(&id))?))
}

/// Approves a pending merchant. Approving twice is harmless.
///
/// ## User Workflow
/// ```text
/// Merchant queue ──► [Approve] ──► status = approved ──► merchant's next
///                                   │                     add-to-cart works
///                                   └─► PATCH users?id=eq.<id> (background)
/// ```
pub async fn approve_merchant(
    RequireAdmin(admin): RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = app
        .mutate(&[Slice::Users], |s| s.approve_user(&id))
        .await?;

    app.remote.mirror.patch_user_status(&user.id, UserStatus::Approved);
    info!(id = %user.id, email = %user.email, by = %admin.email, "Merchant approved");
    Ok(Json(user))
}

/// Pulls the hosted users table and merges it by id.
pub async fn refresh_merchants(
    _admin: RequireAdmin,
    State(app): State<AppState>,
) -> ApiResult<Json<RefreshResponse>> {
    let remote = app.remote.mirror.pull_users().await?;
    let pulled = remote.len();

    let added = app
        .mutate(&[Slice::Users], move |s| Ok(s.merge_users(remote)))
        .await?;

    info!(pulled, added, "Merchants refreshed from hosted table");
    Ok(Json(RefreshResponse {
        added,
        merchants: app.store.with_store(|s| s.merchant_queue()),
    }))
}

pub async fn all_orders(_admin: RequireAdmin, State(app): State<AppState>) -> Json<Vec<Order>> {
    Json(app.store.with_store(|s| s.ledger.orders.clone()))
}

pub async fn counter_sales(_admin: RequireAdmin, State(app): State<AppState>) -> Json<Vec<CounterSale>> {
    Json(app.store.with_store(|s| s.ledger.counter_sales.clone()))
}

/// Invoice for any order.
pub async fn invoice(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Html<String>> {
    let html = app.store.with_store(|s| {
        let order = s
            .ledger
            .order(&order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.clone()))?;
        let merchant = s.users.iter().find(|u| u.id == order.customer_id);
        Ok::<_, ApiError>(render_invoice(order, merchant, &app.config.issuer)?)
    })?;
    Ok(Html(html))
}

// =============================================================================
// Vault
// =============================================================================

pub async fn products(_admin: RequireAdmin, State(app): State<AppState>) -> Json<Vec<Product>> {
    Json(app.store.with_store(|s| s.catalog.products().to_vec()))
}

/// Adds a product from the vault form.
///
/// ## Validation
/// - name: required, at most 200 characters
/// - price, stock: not negative
/// - image: `data:image/..` or an http(s) URL; placeholder when blank
pub async fn create_product(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Json(form): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = app
        .mutate(&[Slice::Products], move |s| s.add_product(form))
        .await?;

    app.remote.mirror.upsert_product(&product);
    info!(id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn change_stock<F>(app: &AppState, id: &str, f: F) -> ApiResult<Json<Product>>
where
    F: FnOnce(&mut hopline_core::store::AppStore) -> hopline_core::CoreResult<Product>,
{
    let product = app.mutate(&[Slice::Products], f).await?;
    app.remote.mirror.upsert_product(&product);
    info!(id = %id, stock = product.stock, "Stock changed");
    Ok(Json(product))
}

pub async fn increment_stock(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    change_stock(&app, &id, |s| s.adjust_stock(&id, 1)).await
}

/// One unit down, never below zero.
pub async fn decrement_stock(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    change_stock(&app, &id, |s| s.adjust_stock(&id, -1)).await
}

/// Sets stock to exactly the given value.
pub async fn set_stock(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StockBody>,
) -> ApiResult<Json<Product>> {
    if body.stock < 0 {
        warn!(id = %id, stock = body.stock, "Negative stock set by admin");
    }
    change_stock(&app, &id, |s| s.set_stock(&id, body.stock)).await
}

pub async fn delete_product(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = app
        .mutate(&[Slice::Products], |s| s.delete_product(&id))
        .await?;

    app.remote.mirror.delete_product(&product.id);
    info!(id = %product.id, name = %product.name, "Product deleted");
    Ok(Json(product))
}

// =============================================================================
// Point of Sale
// =============================================================================

/// In-stock products matching the search box.
pub async fn pos_products(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Query(query): Query<PosQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let q = validate_search_query(query.q.as_deref().unwrap_or_default()).map_err(CoreError::from)?;
    Ok(Json(app.store.with_store(|s| {
        s.pos_products(&q).into_iter().cloned().collect()
    })))
}

pub async fn pos_cart(_admin: RequireAdmin, State(app): State<AppState>) -> Json<CartResponse> {
    Json(app.store.with_store(|s| CartResponse::from(&s.pos_cart)))
}

pub async fn pos_add_item(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Json(body): Json<AddItemBody>,
) -> ApiResult<Json<CartUpdate>> {
    let (added, cart) = app.store.with_store_mut(|s| {
        let added = s.pos_add(&body.product_id)?;
        Ok::<_, CoreError>((added, CartResponse::from(&s.pos_cart)))
    })?;
    Ok(Json(CartUpdate { added, cart }))
}

pub async fn pos_increment_item(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.pos_cart, &product_id)?;
        s.pos_increment(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.pos_cart))
    })?;
    Ok(Json(cart))
}

pub async fn pos_decrement_item(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.pos_cart, &product_id)?;
        s.pos_decrement(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.pos_cart))
    })?;
    Ok(Json(cart))
}

pub async fn pos_remove_item(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    let cart = app.store.with_store_mut(|s| {
        require_line(&s.pos_cart, &product_id)?;
        s.pos_remove(&product_id);
        Ok::<_, ApiError>(CartResponse::from(&s.pos_cart))
    })?;
    Ok(Json(cart))
}

/// Sets (or clears) the counter price of one line.
pub async fn pos_set_price(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(product_id): Path<String>,
    Json(body): Json<PriceBody>,
) -> ApiResult<Json<CartResponse>> {
    let price = body.price.map(Money::from_units);
    let cart = app.store.with_store_mut(|s| {
        s.pos_set_price(&product_id, price)?;
        Ok::<_, CoreError>(CartResponse::from(&s.pos_cart))
    })?;
    Ok(Json(cart))
}

/// Records one counter sale per POS line.
///
/// ## Partial Failure
/// ```text
/// [Whisky ×2] [Wine ×1] [deleted ×1]
///     ✓           ✓          ✗  ──► 409 PARTIAL_CHECKOUT
///
/// The two recorded sales and their stock changes are saved and mirrored.
/// Their lines leave the cart; the failed line and any after it stay.
/// ```
pub async fn pos_checkout(
    RequireAdmin(admin): RequireAdmin,
    State(app): State<AppState>,
) -> ApiResult<Json<PosCheckoutResponse>> {
    let writes = app.db.lock_writes().await;
    let ((result, sales, touched), snapshot) = app.store.mutate(|s| {
        let before = s.ledger.counter_sales.len();
        let result = s.pos_checkout(Utc::now());
        let added = s.ledger.counter_sales.len().saturating_sub(before);

        let sales: Vec<CounterSale> = s.ledger.counter_sales[..added].to_vec();
        let touched: Vec<Product> = sales
            .iter()
            .filter_map(|sale| s.catalog.get(&sale.product_id).cloned())
            .collect();
        (result, sales, touched)
    });

    if !sales.is_empty() {
        app.db
            .persist(&snapshot, &[Slice::Products, Slice::CounterSales])
            .await?;
        app.remote.mirror.insert_counter_sales(sales.clone());
        app.remote.mirror.upsert_products(touched);
    }
    drop(writes);

    let recorded = match result {
        Ok(recorded) => recorded,
        Err(e) => {
            warn!(error = %e, saved = sales.len(), "Counter checkout stopped");
            return Err(e.into());
        }
    };

    let total: Money = sales.iter().map(|sale| sale.total).sum();
    info!(recorded, total = %total, by = %admin.email, "Counter sale recorded");
    Ok(Json(PosCheckoutResponse {
        recorded,
        total,
        sales,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use hopline_core::types::UserStatus;
    use serde_json::json;

    use crate::test_support::{test_app, MERCHANT_EMAIL};

    #[tokio::test]
    async fn test_admin_routes_reject_customers() {
        let app = test_app(true).await;
        let (status, body) = app.json(Method::GET, "/api/admin/analytics", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        app.sign_in_approved_merchant().await;
        let (status, body) = app.json(Method::GET, "/api/admin/analytics", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_approval_unlocks_cart() {
        let app = test_app(true).await;
        let merchant = app.add_merchant(MERCHANT_EMAIL, UserStatus::Pending).await;

        app.sign_in_admin();
        let (_, queue) = app.json(Method::GET, "/api/admin/merchants", None).await;
        assert_eq!(queue["pending"][0]["id"], merchant.id.as_str());
        assert!(queue["approved"].as_array().unwrap().is_empty());

        let uri = format!("/api/admin/merchants/{}/approve", merchant.id);
        let (status, body) = app.json(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");

        let (status, _) = app.json(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert!(stored.users.iter().any(|u| u.id == merchant.id && u.is_approved()));

        app.sign_in(merchant);
        let (_, body) = app
            .json(Method::POST, "/api/cart/items", Some(json!({ "productId": "4" })))
            .await;
        assert_eq!(body["added"], true);
    }

    #[tokio::test]
    async fn test_merchant_detail() {
        let app = test_app(true).await;
        let merchant = app.sign_in_approved_merchant().await;
        app.json(Method::POST, "/api/cart/items", Some(json!({ "productId": "4" })))
            .await;
        let (_, placed) = app.json(Method::POST, "/api/cart/checkout", None).await;

        app.sign_in_admin();
        let (status, detail) = app
            .json(Method::GET, &format!("/api/admin/merchants/{}", merchant.id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["merchant"]["email"], MERCHANT_EMAIL);
        assert_eq!(detail["orders"][0]["id"], placed["order"]["id"]);

        let order_id = placed["order"]["id"].as_str().unwrap();
        let (status, html) = app.text(&format!("/api/admin/invoices/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Hopline Distributors"));

        let (status, _) = app.json(Method::GET, "/api/admin/merchants/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_without_hosted_tables() {
        let app = test_app(true).await;
        app.sign_in_admin();
        let (status, body) = app.json(Method::POST, "/api/admin/merchants/refresh", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "REMOTE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_vault_create_and_stock() {
        let app = test_app(true).await;
        app.sign_in_admin();

        let form = json!({
            "name": "Nepal Ice",
            "category": "Beer",
            "volume": "650ml",
            "price": 380,
            "stock": 10
        });
        let (status, product) = app.json(Method::POST, "/api/admin/products", Some(form)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["unit"], "bottle");
        let id = product["id"].as_str().unwrap().to_string();

        let (_, product) = app
            .json(Method::POST, &format!("/api/admin/products/{id}/increment"), None)
            .await;
        assert_eq!(product["stock"], 11);

        let (_, product) = app
            .json(
                Method::PUT,
                &format!("/api/admin/products/{id}/stock"),
                Some(json!({ "stock": 0 })),
            )
            .await;
        assert_eq!(product["stock"], 0);

        let (_, product) = app
            .json(Method::POST, &format!("/api/admin/products/{id}/decrement"), None)
            .await;
        assert_eq!(product["stock"], 0);

        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert_eq!(stored.catalog.get(&id).unwrap().stock, 0);

        let (status, _) = app
            .json(Method::DELETE, &format!("/api/admin/products/{id}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, products) = app.json(Method::GET, "/api/admin/products", None).await;
        assert!(products.as_array().unwrap().iter().all(|p| p["id"] != id.as_str()));
    }

    #[tokio::test]
    async fn test_vault_rejects_bad_form() {
        let app = test_app(true).await;
        app.sign_in_admin();

        let form = json!({ "name": "", "category": "Beer", "price": 100, "stock": 1 });
        let (status, body) = app.json(Method::POST, "/api/admin/products", Some(form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let form = json!({ "name": "Free", "category": "Beer", "price": -1, "stock": 1 });
        let (status, _) = app.json(Method::POST, "/api/admin/products", Some(form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_vault_rejects_out_of_range_amounts() {
        let app = test_app(true).await;
        app.sign_in_admin();

        let form = json!({
            "name": "Gold Reserve",
            "category": "Whisky",
            "price": 4_000_000_000_000_000_000_i64,
            "stock": 10
        });
        let (status, body) = app.json(Method::POST, "/api/admin/products", Some(form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app
            .json(
                Method::PUT,
                "/api/admin/products/1/stock",
                Some(json!({ "stock": i64::MAX })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .json(
                Method::PUT,
                "/api/admin/pos/items/1/price",
                Some(json!({ "price": i64::MAX })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, product) = app
            .json(Method::POST, "/api/admin/products/1/increment", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(product["stock"], 51);

        let (status, analytics) = app.json(Method::GET, "/api/admin/analytics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(analytics["inventoryValue"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_pos_scenario() {
        let app = test_app(true).await;
        app.sign_in_admin();

        app.json(Method::POST, "/api/admin/pos/items", Some(json!({ "productId": "1" })))
            .await;
        app.json(Method::POST, "/api/admin/pos/items/1/increment", None).await;
        let (status, _) = app
            .json(
                Method::PUT,
                "/api/admin/pos/items/1/price",
                Some(json!({ "price": 3000 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        app.json(Method::POST, "/api/admin/pos/items", Some(json!({ "productId": "2" })))
            .await;
        app.json(
            Method::PUT,
            "/api/admin/pos/items/2/price",
            Some(json!({ "price": 1800 })),
        )
        .await;

        let (status, body) = app.json(Method::POST, "/api/admin/pos/checkout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recorded"], 2);
        assert_eq!(body["total"], 7800);

        let (_, sales) = app.json(Method::GET, "/api/admin/counter-sales", None).await;
        let totals: Vec<i64> = sales
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["total"].as_i64().unwrap())
            .collect();
        assert_eq!(totals, vec![1800, 6000]);
        assert_eq!(sales[0]["productId"], "2");
        assert_eq!(sales[0]["price"], 1800);
        assert_eq!(sales[0]["quantity"], 1);

        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert_eq!(stored.catalog.get("1").unwrap().stock, 48);
        assert_eq!(stored.catalog.get("2").unwrap().stock, 79);

        let (_, cart) = app.json(Method::GET, "/api/admin/pos/cart", None).await;
        assert!(cart["lines"].as_array().unwrap().is_empty());

        let (_, analytics) = app.json(Method::GET, "/api/admin/analytics", None).await;
        assert_eq!(analytics["counterRevenue"], 7800);
        assert_eq!(analytics["counterSaleCount"], 2);
    }

    #[tokio::test]
    async fn test_pos_partial_checkout_keeps_unrecorded_lines() {
        let app = test_app(true).await;
        app.sign_in_admin();

        app.json(Method::POST, "/api/admin/pos/items", Some(json!({ "productId": "2" })))
            .await;
        app.json(Method::POST, "/api/admin/pos/items", Some(json!({ "productId": "3" })))
            .await;
        app.json(Method::DELETE, "/api/admin/products/3", None).await;

        let (status, body) = app.json(Method::POST, "/api/admin/pos/checkout", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PARTIAL_CHECKOUT");

        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert_eq!(stored.ledger.counter_sales.len(), 1);
        assert_eq!(stored.catalog.get("2").unwrap().stock, 79);

        let (_, cart) = app.json(Method::GET, "/api/admin/pos/cart", None).await;
        let lines = cart["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["productId"], "3");

        let (status, body) = app.json(Method::POST, "/api/admin/pos/checkout", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PARTIAL_CHECKOUT");
        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert_eq!(stored.ledger.counter_sales.len(), 1);
        assert_eq!(stored.catalog.get("2").unwrap().stock, 79);
    }

    #[tokio::test]
    async fn test_pos_ignores_out_of_stock() {
        let app = test_app(true).await;
        app.sign_in_admin();
        app.json(
            Method::PUT,
            "/api/admin/products/7/stock",
            Some(json!({ "stock": 0 })),
        )
        .await;

        let (_, body) = app
            .json(Method::POST, "/api/admin/pos/items", Some(json!({ "productId": "7" })))
            .await;
        assert_eq!(body["added"], false);

        let (_, picker) = app.json(Method::GET, "/api/admin/pos/products?q=coca", None).await;
        assert!(picker.as_array().unwrap().is_empty());
    }
}
