//! # Pages
//!
//! Server-rendered HTML shells. Each page renders the current state once;
//! buttons on the page call the JSON API and reload.
//!
//! ```text
//! /login ─┬─► code sent ──► verify ─┬─► /storefront  (merchant)
//!         │                         └─► /admin       (administrator)
//! /signup ┘
//! ```
//!
//! Guards redirect to `/login` instead of answering with JSON.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Html;

use hopline_core::admin::Analytics;
use hopline_core::storefront::CategoryFilter;
use hopline_core::types::{Category, Order, OrderStatus, Product, User};

use crate::commands::storefront::CatalogQuery;
use crate::error::ApiResult;
use crate::middleware::{RequireAdmin, RequireCustomer};
use crate::state::AppState;

// =============================================================================
// View Rows
// =============================================================================

/// A product, formatted for display.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: &'static str,
    pub volume: String,
    pub price: String,
    pub stock: i64,
    pub unit: String,
    pub image: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        ProductRow {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category.label(),
            volume: p.volume.clone(),
            price: p.price.to_string(),
            stock: p.stock,
            unit: p.unit.clone(),
            image: p.image.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MerchantRow {
    pub id: String,
    pub email: String,
    pub shop_name: String,
    pub phone: String,
    pub address: String,
    pub joined: String,
}

impl From<&User> for MerchantRow {
    fn from(u: &User) -> Self {
        MerchantRow {
            id: u.id.clone(),
            email: u.email.clone(),
            shop_name: u.shop_name.clone(),
            phone: u.phone.clone(),
            address: u.address.clone(),
            joined: u.created_at.format("%d %b %Y").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub date: String,
    pub units: i64,
    pub total: String,
    pub status: &'static str,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        OrderRow {
            id: o.id.clone(),
            date: o.created_at.format("%d %b %Y %H:%M").to_string(),
            units: o.unit_count(),
            total: o.total.to_string(),
            status: status_label(o.status),
        }
    }
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Pending",
        OrderStatus::Packed => "Packed",
        OrderStatus::Dispatched => "Dispatched",
        OrderStatus::Delivered => "Delivered",
        OrderStatus::Cancelled => "Cancelled",
    }
}

#[derive(Debug, Clone)]
pub struct Tab {
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct Stat {
    pub label: &'static str,
    pub value: String,
}

fn stats(a: &Analytics) -> Vec<Stat> {
    vec![
        Stat { label: "Total revenue", value: a.total_revenue.to_string() },
        Stat { label: "Wholesale revenue", value: a.wholesale_revenue.to_string() },
        Stat { label: "Counter revenue", value: a.counter_revenue.to_string() },
        Stat { label: "Inventory value", value: a.inventory_value.to_string() },
        Stat { label: "Orders", value: a.order_count.to_string() },
        Stat { label: "Counter sales", value: a.counter_sale_count.to_string() },
        Stat { label: "Units in stock", value: a.units_in_stock.to_string() },
        Stat { label: "Pending merchants", value: a.pending_merchants.to_string() },
    ]
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub cooldown_secs: i64,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub cooldown_secs: i64,
}

#[derive(Template)]
#[template(path = "storefront.html")]
pub struct StorefrontPage {
    pub shop_name: String,
    pub approved: bool,
    pub tabs: Vec<Tab>,
    pub query: String,
    pub products: Vec<ProductRow>,
    pub cart_units: i64,
    pub cart_total: String,
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminPage {
    pub admin_email: String,
    pub stats: Vec<Stat>,
    pub pending: Vec<MerchantRow>,
    pub approved: Vec<MerchantRow>,
    pub products: Vec<ProductRow>,
}

#[derive(Template)]
#[template(path = "merchant.html")]
pub struct MerchantPage {
    pub merchant: MerchantRow,
    pub approved: bool,
    pub orders: Vec<OrderRow>,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn login() -> ApiResult<Html<String>> {
    let page = LoginPage {
        cooldown_secs: hopline_core::RESEND_COOLDOWN_SECS,
    };
    Ok(Html(page.render()?))
}

pub async fn signup() -> ApiResult<Html<String>> {
    let page = SignupPage {
        cooldown_secs: hopline_core::RESEND_COOLDOWN_SECS,
    };
    Ok(Html(page.render()?))
}

/// Catalog grid with category tabs and search.
pub async fn storefront(
    RequireCustomer(user): RequireCustomer,
    State(app): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Html<String>> {
    let filter = query.filter()?;

    let tabs = std::iter::once(Tab {
        label: "All",
        active: filter.category == CategoryFilter::All,
    })
    .chain(Category::ALL.iter().map(|c| Tab {
        label: c.label(),
        active: filter.category == CategoryFilter::Only(*c),
    }))
    .collect();

    let page = app.store.with_store(|s| StorefrontPage {
        shop_name: user.shop_name.clone(),
        approved: s.session_user().is_some_and(User::is_approved),
        tabs,
        query: filter.query.clone(),
        products: s.browse(&filter).into_iter().map(ProductRow::from).collect(),
        cart_units: s.cart.total_quantity(),
        cart_total: s.cart.total().to_string(),
    });
    Ok(Html(page.render()?))
}

/// Dashboard: figures, the merchant queue and the vault.
pub async fn admin(
    RequireAdmin(admin): RequireAdmin,
    State(app): State<AppState>,
) -> ApiResult<Html<String>> {
    let page = app.store.with_store(|s| {
        let queue = s.merchant_queue();
        AdminPage {
            admin_email: admin.email.clone(),
            stats: stats(&s.analytics()),
            pending: queue.pending.iter().map(MerchantRow::from).collect(),
            approved: queue.approved.iter().map(MerchantRow::from).collect(),
            products: s.catalog.products().iter().map(ProductRow::from).collect(),
        }
    });
    Ok(Html(page.render()?))
}

pub async fn merchant(
    _admin: RequireAdmin,
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Html<String>> {
    let detail = app.store.with_store(|s| s.merchant_detail(&id))?;
    let page = MerchantPage {
        merchant: MerchantRow::from(&detail.merchant),
        approved: detail.merchant.is_approved(),
        orders: detail.orders.iter().map(OrderRow::from).collect(),
    };
    Ok(Html(page.render()?))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use hopline_core::types::UserStatus;

    use crate::test_support::{test_app, MERCHANT_EMAIL};

    #[tokio::test]
    async fn test_pages_redirect_to_login() {
        let app = test_app(true).await;
        for uri in ["/storefront", "/admin", "/admin/merchants/u1"] {
            let response = app.send(Method::GET, uri, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login");
        }
    }

    #[tokio::test]
    async fn test_api_rejects_with_json() {
        let app = test_app(true).await;
        let (status, body) = app.json(Method::GET, "/api/cart", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        app.sign_in_approved_merchant().await;
        let (status, _) = app.json(Method::GET, "/api/admin/merchants", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let response = app.send(Method::GET, "/admin", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_admin_is_kept_off_storefront() {
        let app = test_app(true).await;
        app.sign_in_admin();
        let (status, _) = app.json(Method::GET, "/api/catalog", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let response = app.send(Method::GET, "/storefront", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let app = test_app(true).await;
        let (status, html) = app.text("/login").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("/api/auth/request-code"));

        let (status, html) = app.text("/signup").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("/api/auth/signup"));
    }

    #[tokio::test]
    async fn test_storefront_page_filters() {
        let app = test_app(true).await;
        app.sign_in_approved_merchant().await;
        let (status, html) = app.text("/storefront?category=Beer").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Tuborg Beer"));
        assert!(!html.contains("Ruslan Vodka"));
        assert!(!html.contains("awaiting approval"));
    }

    #[tokio::test]
    async fn test_storefront_page_shows_pending_notice() {
        let app = test_app(true).await;
        let user = app.add_merchant(MERCHANT_EMAIL, UserStatus::Pending).await;
        app.sign_in(user);
        let (status, html) = app.text("/storefront").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("awaiting approval"));
    }

    #[tokio::test]
    async fn test_admin_pages_render() {
        let app = test_app(true).await;
        let merchant = app.add_merchant(MERCHANT_EMAIL, UserStatus::Pending).await;
        app.sign_in_admin();

        let (status, html) = app.text("/admin").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(MERCHANT_EMAIL));
        assert!(html.contains("Old Durbar Black Chimney"));

        let (status, html) = app.text(&format!("/admin/merchants/{}", merchant.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Corner Store"));
    }
}
