//! # Domain Types
//!
//! Core domain types shared by every Hopline crate. Field names serialize in
//! camelCase because these exact shapes are what the local blob store holds
//! and what the browser client reads.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │    Product      │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  email (key)    │   │  category       │   │  items[]        │──┐    │
//! │  │  role, status   │   │  price, stock   │   │  total (frozen) │  │    │
//! │  │  shopName       │   │  volume, unit   │   │  status, COD    │  │    │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘  │    │
//! │                                                                    │    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │    │
//! │  │  CounterSale    │   │   AuthState     │   │   OrderItem     │◄─┘    │
//! │  │  one per POS    │   │  user | null    │   │  snapshot at    │       │
//! │  │  cart line      │   │  authenticated  │   │  cart-add time  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Image shown for products created without one.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x400?text=Hopline";

/// Default selling unit for new products.
pub const DEFAULT_UNIT: &str = "bottle";

// =============================================================================
// Role & Status
// =============================================================================

/// The two roles Hopline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Distributor staff on the allow-list.
    Admin,
    /// A merchant (shop) account.
    Customer,
}

/// Merchant approval status.
///
/// ## Lenient Parsing
/// Records written by older clients or pulled from the hosted table may
/// carry `"Approved"`, `"APPROVED"`, `null`, or nothing at all. Only a
/// case-insensitive `"approved"` counts as approved; everything else is
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
}

impl UserStatus {
    /// Parses a raw status string the lenient way.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("approved") => UserStatus::Approved,
            _ => UserStatus::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for UserStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(UserStatus::parse_lenient(raw.as_deref()))
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account: a merchant or an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Always stored normalized (trimmed, lowercase).
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub shop_name: String,

    #[serde(default)]
    pub address: String,

    pub role: Role,

    #[serde(default)]
    pub status: UserStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns true if this user may place items in a cart.
    #[inline]
    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }

    /// Returns true for administrators.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Category
// =============================================================================

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    Whisky,
    Vodka,
    Rum,
    Beer,
    Wine,
    #[serde(rename = "Soft Drinks")]
    SoftDrinks,
}

impl Category {
    /// Every category, in menu order.
    pub const ALL: [Category; 6] = [
        Category::Whisky,
        Category::Vodka,
        Category::Rum,
        Category::Beer,
        Category::Wine,
        Category::SoftDrinks,
    ];

    /// Display label (also the serialized form).
    pub fn label(&self) -> &'static str {
        match self {
            Category::Whisky => "Whisky",
            Category::Vodka => "Vodka",
            Category::Rum => "Rum",
            Category::Beer => "Beer",
            Category::Wine => "Wine",
            Category::SoftDrinks => "Soft Drinks",
        }
    }

    /// Parses a label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    pub name: String,

    pub category: Category,

    /// Free-form pack size, e.g. "650ml", "1.5L".
    pub volume: String,

    pub price: Money,

    /// Sales clamp this at zero; a direct admin edit may not.
    pub stock: i64,

    /// http(s) URL or an embedded `data:image/...` URI.
    pub image: String,

    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl Product {
    /// Checks if at least one unit is on hand.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Price × stock for the inventory valuation.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order fulfilment status. Only `Pending` is ever assigned today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Packed,
    Dispatched,
    Delivered,
    Cancelled,
}

/// The only supported payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    Cod,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "Cash on Delivery",
        }
    }
}

/// A product snapshot inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl OrderItem {
    /// Unit price × quantity.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// A wholesale order placed from the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub customer_email: String,
    pub shop_name: String,
    pub items: Vec<OrderItem>,

    /// Frozen at creation: later price edits never change it.
    pub total: Money,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    pub payment_method: PaymentMethod,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A single POS cart line, recorded at the counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CounterSale {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub price: Money,
    pub quantity: i64,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Session & Preferences
// =============================================================================

/// The process-wide login session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl AuthState {
    /// A signed-in session for `user`.
    pub fn signed_in(user: User) -> Self {
        AuthState {
            user: Some(user),
            is_authenticated: true,
        }
    }

    /// Returns the active user, if any.
    pub fn current_user(&self) -> Option<&User> {
        if self.is_authenticated {
            self.user.as_ref()
        } else {
            None
        }
    }
}

/// Light/dark preference. Persisted, otherwise ignored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing_is_lenient() {
        assert_eq!(UserStatus::parse_lenient(Some("approved")), UserStatus::Approved);
        assert_eq!(UserStatus::parse_lenient(Some("APPROVED")), UserStatus::Approved);
        assert_eq!(UserStatus::parse_lenient(Some("Pending")), UserStatus::Pending);
        assert_eq!(UserStatus::parse_lenient(Some("banana")), UserStatus::Pending);
        assert_eq!(UserStatus::parse_lenient(None), UserStatus::Pending);
    }

    #[test]
    fn test_user_without_status_is_pending() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "shop@example.com",
            "shopName": "Corner Store",
            "role": "customer",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(user.status, UserStatus::Pending);
        assert_eq!(user.shop_name, "Corner Store");
        assert!(!user.is_approved());
    }

    #[test]
    fn test_user_with_null_status_is_pending() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "email": "shop@example.com",
            "role": "customer",
            "status": null,
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.status, UserStatus::Pending);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(
            serde_json::to_string(&Category::SoftDrinks).unwrap(),
            "\"Soft Drinks\""
        );
        assert_eq!(Category::from_label("beer"), Some(Category::Beer));
        assert_eq!(Category::from_label("soft drinks"), Some(Category::SoftDrinks));
        assert_eq!(Category::from_label("Cider"), None);
    }

    #[test]
    fn test_payment_method_serializes_as_cod() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"COD\"");
    }

    #[test]
    fn test_auth_state_current_user() {
        assert!(AuthState::default().current_user().is_none());

        let stale = AuthState {
            user: None,
            is_authenticated: true,
        };
        assert!(stale.current_user().is_none());
    }
}
