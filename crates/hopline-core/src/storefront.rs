//! # Storefront Workflow
//!
//! What an approved merchant does: browse, fill a cart, place a COD order.
//!
//! ```text
//! browsing ──add_to_cart──► cart-building ──checkout──► confirmed ──5s──► browsing
//!    ▲                            │
//!    └──────── clear / empty ─────┘
//! ```
//!
//! Pending merchants can browse but [`add_to_cart`] ignores them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::types::{Category, Order, OrderStatus, PaymentMethod, Product, User};
use crate::CONFIRMATION_WINDOW_SECS;

// =============================================================================
// Catalog Filter
// =============================================================================

/// Category tab on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Parses a tab label; `All`, an empty string or an unknown label means
    /// no category restriction.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(l) if l.eq_ignore_ascii_case("all") => CategoryFilter::All,
            Some(l) => Category::from_label(l)
                .map(CategoryFilter::Only)
                .unwrap_or(CategoryFilter::All),
        }
    }
}

/// Category tab plus free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: CategoryFilter,
    pub query: String,
}

impl CatalogFilter {
    pub fn new(category: CategoryFilter, query: impl Into<String>) -> Self {
        CatalogFilter {
            category,
            query: query.into(),
        }
    }

    /// Both the category and the name search must match.
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => product.category == category,
        };

        let needle = self.query.trim().to_lowercase();
        category_ok && (needle.is_empty() || product.name.to_lowercase().contains(&needle))
    }

    /// Filters `products`, keeping catalog order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

// =============================================================================
// Cart & Checkout
// =============================================================================

/// Adds one unit of `product` for `user`.
///
/// Silently does nothing unless the user is approved and the product has
/// stock. Returns whether the cart changed.
pub fn add_to_cart(user: &User, product: &Product, cart: &mut Cart) -> bool {
    if !user.is_approved() || !product.in_stock() {
        return false;
    }
    cart.add_product(product)
}

/// Builds a pending COD order from the cart contents.
///
/// The cart is left untouched; the caller clears it once the ledger has the
/// order.
pub fn build_order(user: &User, cart: &Cart, now: DateTime<Utc>) -> CoreResult<Order> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    Ok(Order {
        id: Uuid::new_v4().to_string(),
        customer_id: user.id.clone(),
        customer_email: user.email.clone(),
        shop_name: user.shop_name.clone(),
        items: cart.to_order_items(),
        total: cart.total(),
        status: OrderStatus::Pending,
        payment_method: PaymentMethod::Cod,
        created_at: now,
    })
}

/// The "order placed" banner shown after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub order_id: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

impl Confirmation {
    pub fn for_order(order: &Order) -> Self {
        Confirmation {
            order_id: order.id.clone(),
            expires_at: order.created_at + Duration::seconds(CONFIRMATION_WINDOW_SECS),
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use crate::types::{Role, UserStatus};

    fn user(status: UserStatus) -> User {
        User {
            id: "u1".to_string(),
            email: "shop@example.com".to_string(),
            phone: "9841234567".to_string(),
            shop_name: "Corner Store".to_string(),
            address: "Thamel".to_string(),
            role: Role::Customer,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_requires_category_and_query() {
        let products = seed::products();

        let beer = CatalogFilter::new(CategoryFilter::Only(Category::Beer), "");
        assert_eq!(beer.apply(&products).len(), 2);

        let gorkha = CatalogFilter::new(CategoryFilter::Only(Category::Beer), "GORKHA");
        let hits = gorkha.apply(&products);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "5");

        let wrong_tab = CatalogFilter::new(CategoryFilter::Only(Category::Wine), "gorkha");
        assert!(wrong_tab.apply(&products).is_empty());

        assert_eq!(CatalogFilter::default().apply(&products).len(), products.len());
    }

    #[test]
    fn test_category_filter_from_label() {
        assert_eq!(CategoryFilter::from_label(None), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_label(Some("All")), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_label(Some("soft drinks")),
            CategoryFilter::Only(Category::SoftDrinks)
        );
    }

    #[test]
    fn test_pending_user_cannot_add_to_cart() {
        let catalog = seed::catalog();
        let tuborg = catalog.get("4").unwrap();
        let mut cart = Cart::new();

        assert!(!add_to_cart(&user(UserStatus::Pending), tuborg, &mut cart));
        assert!(cart.is_empty());

        assert!(add_to_cart(&user(UserStatus::Approved), tuborg, &mut cart));
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_out_of_stock_is_ignored() {
        let mut catalog = seed::catalog();
        catalog.set_stock("4", 0).unwrap();
        let mut cart = Cart::new();

        assert!(!add_to_cart(&user(UserStatus::Approved), catalog.get("4").unwrap(), &mut cart));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_build_order_from_empty_cart() {
        let result = build_order(&user(UserStatus::Approved), &Cart::new(), Utc::now());
        assert!(matches!(result, Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_confirmation_expires_after_window() {
        let catalog = seed::catalog();
        let mut cart = Cart::new();
        cart.add_product(catalog.get("7").unwrap());

        let order = build_order(&user(UserStatus::Approved), &cart, Utc::now()).unwrap();
        let confirmation = Confirmation::for_order(&order);

        assert!(confirmation.is_visible(order.created_at));
        assert!(!confirmation.is_visible(order.created_at + Duration::seconds(5)));
    }
}
