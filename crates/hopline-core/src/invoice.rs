//! # Invoice Renderer
//!
//! A printable COD invoice for one order. [`Invoice::build`] is a pure
//! projection; [`render_invoice`] turns it into HTML through
//! `templates/invoice.html`.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Hopline Distributors        INVOICE INV-3F2A │
//! │ origin address              14 Oct 2026      │
//! │──────────────────────────────────────────────│
//! │ Bill to: shop name, address, phone, email    │
//! │──────────────────────────────────────────────│
//! │ Item        Volume   Qty   Unit    Subtotal  │
//! │ ...                                          │
//! │                             Total  Rs. 1,260 │
//! │──────────────────────────────────────────────│
//! │ payment terms • signature block              │
//! └──────────────────────────────────────────────┘
//! ```

use askama::Template;
use serde::{Deserialize, Serialize};

use crate::types::{Order, User};

/// Text printed under the totals.
pub const PAYMENT_TERMS: &str =
    "Payment terms: Cash on Delivery. Please pay the full amount to the delivery agent on receipt of goods.";

/// The distributor's own details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for IssuerProfile {
    fn default() -> Self {
        IssuerProfile {
            name: "Hopline Distributors".to_string(),
            address: "Kathmandu, Nepal".to_string(),
            phone: String::new(),
        }
    }
}

/// One row of the line table, already formatted for print.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub name: String,
    pub volume: String,
    pub quantity: i64,
    pub unit_price: String,
    pub subtotal: String,
}

/// Everything printed on an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Template)]
#[template(path = "invoice.html")]
pub struct Invoice {
    pub number: String,
    pub date: String,
    pub issuer: IssuerProfile,
    pub bill_to_name: String,
    pub bill_to_address: String,
    pub bill_to_phone: String,
    pub bill_to_email: String,
    pub lines: Vec<InvoiceLine>,
    pub total: String,
    pub payment_method: String,
    pub payment_terms: String,
}

/// `INV-` plus the first eight characters of the order id.
pub fn invoice_number(order_id: &str) -> String {
    let short: String = order_id.chars().take(8).collect();
    format!("INV-{}", short.to_uppercase())
}

impl Invoice {
    /// Projects an order into invoice form.
    ///
    /// Bill-to details come from `merchant` when the account still exists,
    /// otherwise from the shop name and email frozen on the order.
    pub fn build(order: &Order, merchant: Option<&User>, issuer: &IssuerProfile) -> Self {
        let lines = order
            .items
            .iter()
            .map(|item| InvoiceLine {
                name: item.name.clone(),
                volume: item.volume.clone().unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.price.to_string(),
                subtotal: item.subtotal().to_string(),
            })
            .collect();

        let (name, email, address, phone) = match merchant {
            Some(m) => (
                m.shop_name.clone(),
                m.email.clone(),
                m.address.clone(),
                m.phone.clone(),
            ),
            None => (
                order.shop_name.clone(),
                order.customer_email.clone(),
                String::new(),
                String::new(),
            ),
        };

        Invoice {
            number: invoice_number(&order.id),
            date: order.created_at.format("%d %b %Y").to_string(),
            issuer: issuer.clone(),
            bill_to_name: name,
            bill_to_address: address,
            bill_to_phone: phone,
            bill_to_email: email,
            lines,
            total: order.total.to_string(),
            payment_method: order.payment_method.label().to_string(),
            payment_terms: PAYMENT_TERMS.to_string(),
        }
    }
}

/// Renders the invoice HTML for an order.
pub fn render_invoice(
    order: &Order,
    merchant: Option<&User>,
    issuer: &IssuerProfile,
) -> Result<String, askama::Error> {
    Invoice::build(order, merchant, issuer).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{OrderItem, OrderStatus, PaymentMethod, Role, UserStatus};
    use chrono::{TimeZone, Utc};

    fn order() -> Order {
        Order {
            id: "3f2a9c1e-0000-4000-8000-000000000000".to_string(),
            customer_id: "u1".to_string(),
            customer_email: "shop@example.com".to_string(),
            shop_name: "Corner <Store>".to_string(),
            items: vec![OrderItem {
                product_id: "4".to_string(),
                name: "Tuborg Beer".to_string(),
                price: Money::from_units(420),
                quantity: 3,
                volume: Some("650ml".to_string()),
            }],
            total: Money::from_units(1260),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cod,
            created_at: Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_invoice_number_is_short_id() {
        assert_eq!(invoice_number("3f2a9c1e-aaaa"), "INV-3F2A9C1E");
        assert_eq!(invoice_number("ab"), "INV-AB");
    }

    #[test]
    fn test_build_prefers_merchant_record() {
        let merchant = User {
            id: "u1".to_string(),
            email: "orders@cornerstore.com.np".to_string(),
            phone: "9841234567".to_string(),
            shop_name: "Corner Store & Bar".to_string(),
            address: "Thamel, Kathmandu".to_string(),
            role: Role::Customer,
            status: UserStatus::Approved,
            created_at: Utc::now(),
        };

        let invoice = Invoice::build(&order(), Some(&merchant), &IssuerProfile::default());
        assert_eq!(invoice.bill_to_name, "Corner Store & Bar");
        assert_eq!(invoice.bill_to_email, "orders@cornerstore.com.np");
        assert_eq!(invoice.bill_to_address, "Thamel, Kathmandu");
        assert_eq!(invoice.date, "14 Oct 2026");
        assert_eq!(invoice.lines[0].subtotal, "Rs. 1,260");
    }

    #[test]
    fn test_build_without_merchant_uses_order() {
        let invoice = Invoice::build(&order(), None, &IssuerProfile::default());
        assert_eq!(invoice.bill_to_name, "Corner <Store>");
        assert_eq!(invoice.bill_to_email, "shop@example.com");
        assert!(invoice.bill_to_address.is_empty());
    }

    #[test]
    fn test_render_contains_totals_and_escapes() {
        let html = render_invoice(&order(), None, &IssuerProfile::default()).unwrap();

        assert!(html.contains("INV-3F2A9C1E"));
        assert!(html.contains("Tuborg Beer"));
        assert!(html.contains("Rs. 1,260"));
        assert!(html.contains("Cash on Delivery"));
        assert!(html.contains("Hopline Distributors"));
        assert!(!html.contains("<Store>"));
    }
}
