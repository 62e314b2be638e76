//! # Order & Sales Ledger
//!
//! Wholesale orders and counter sales, newest first. Recording either one
//! takes the sold quantity out of the catalog at the same moment.
//!
//! ```text
//! storefront checkout ──► record_order() ──► orders.insert(0, ..)
//!                                       └──► catalog.decrement_for_sale() per item
//!
//! POS checkout line ────► record_counter_sale() ──► counter_sales.insert(0, ..)
//!                                              └──► catalog.decrement_for_sale()
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CounterSale, Order};

/// Orders and counter sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub orders: Vec<Order>,
    pub counter_sales: Vec<CounterSale>,
}

impl Ledger {
    pub fn new(orders: Vec<Order>, counter_sales: Vec<CounterSale>) -> Self {
        Ledger {
            orders,
            counter_sales,
        }
    }

    /// Puts `order` at the head of the list and decrements stock for every
    /// item.
    ///
    /// Items whose product has since been deleted are still recorded; only
    /// the stock step is skipped for them.
    ///
    /// ## Returns
    /// Ids of ordered products that were no longer in the catalog.
    pub fn record_order(&mut self, order: Order, catalog: &mut Catalog) -> Vec<String> {
        let missing = order
            .items
            .iter()
            .filter(|item| {
                catalog
                    .decrement_for_sale(&item.product_id, item.quantity)
                    .is_err()
            })
            .map(|item| item.product_id.clone())
            .collect();

        self.orders.insert(0, order);
        missing
    }

    /// Records one counter sale line and decrements stock.
    ///
    /// ## Returns
    /// `ProductNotFound` (and records nothing) if the product is gone.
    pub fn record_counter_sale(
        &mut self,
        catalog: &mut Catalog,
        product_id: &str,
        price: Money,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<&CounterSale> {
        let product_name = catalog
            .get(product_id)
            .map(|p| p.name.clone())
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let sale = CounterSale {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            product_name,
            price,
            quantity,
            total: price.multiply_quantity(quantity),
            created_at: now,
        };

        catalog.decrement_for_sale(product_id, quantity)?;
        self.counter_sales.insert(0, sale);
        Ok(&self.counter_sales[0])
    }

    /// Looks up an order by id.
    pub fn order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Orders placed by `customer_id`, newest first.
    pub fn orders_for<'a>(&'a self, customer_id: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(move |o| o.customer_id == customer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use crate::types::{OrderItem, OrderStatus, PaymentMethod};

    fn order(id: &str, product_id: &str, qty: i64, price: i64) -> Order {
        Order {
            id: id.to_string(),
            customer_id: "c1".to_string(),
            customer_email: "shop@example.com".to_string(),
            shop_name: "Corner Store".to_string(),
            items: vec![OrderItem {
                product_id: product_id.to_string(),
                name: "Tuborg Beer".to_string(),
                price: Money::from_units(price),
                quantity: qty,
                volume: None,
            }],
            total: Money::from_units(price * qty),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cod,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_order_prepends_and_decrements() {
        let mut catalog = seed::catalog();
        let mut ledger = Ledger::default();

        ledger.record_order(order("o1", "4", 3, 420), &mut catalog);
        ledger.record_order(order("o2", "4", 500, 420), &mut catalog);

        assert_eq!(ledger.orders[0].id, "o2");
        assert_eq!(ledger.orders[1].id, "o1");
        assert_eq!(catalog.get("4").unwrap().stock, 0);
    }

    #[test]
    fn test_order_total_is_frozen() {
        let mut catalog = seed::catalog();
        let mut ledger = Ledger::default();
        ledger.record_order(order("o1", "4", 3, 420), &mut catalog);

        catalog.delete("4").unwrap();
        assert_eq!(ledger.order("o1").unwrap().total.units(), 1260);
    }

    #[test]
    fn test_record_order_tolerates_deleted_product() {
        let mut catalog = seed::catalog();
        catalog.delete("4").unwrap();
        let mut ledger = Ledger::default();

        let missing = ledger.record_order(order("o1", "4", 1, 420), &mut catalog);
        assert_eq!(missing, vec!["4".to_string()]);
        assert_eq!(ledger.orders.len(), 1);
    }

    #[test]
    fn test_counter_sale_for_missing_product_records_nothing() {
        let mut catalog = seed::catalog();
        let mut ledger = Ledger::default();

        let result =
            ledger.record_counter_sale(&mut catalog, "404", Money::from_units(1), 1, Utc::now());
        assert!(matches!(result, Err(CoreError::ProductNotFound(_))));
        assert!(ledger.counter_sales.is_empty());
    }
}
