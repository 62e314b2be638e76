//! # Cart
//!
//! One cart shape serves both the storefront and the admin point of sale.
//! The POS additionally sets a per-line `customPrice`.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Action                  Method                  Effect                 │
//! │  ──────                  ──────                  ──────                 │
//! │                                                                         │
//! │  Click product ────────► add_product() ────────► merge by productId    │
//! │                                                                         │
//! │  "+" on a line ────────► increment() ──────────► qty + 1 (max 999)     │
//! │                                                                         │
//! │  "−" on a line ────────► decrement() ──────────► qty − 1, drop at 0    │
//! │                                                                         │
//! │  Edit POS price ───────► set_custom_price() ───► override unit price   │
//! │                                                                         │
//! │  Checkout ─────────────► clear() ──────────────► empty                 │
//! │                                                                         │
//! │  INVARIANT: every line has quantity ≥ 1, and                           │
//! │             total() == Σ effective_price × quantity                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderItem, Product};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in a cart.
///
/// ## Design Notes
/// `name`, `price` and `volume` are frozen copies of the product taken when
/// the line was first added, so a later catalog edit does not reprice a cart
/// that is already on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub volume: Option<String>,

    /// POS-only override, independent of the catalog price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_price: Option<Money>,
}

impl CartLine {
    /// Creates a one-unit line from a product.
    pub fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
            volume: Some(product.volume.clone()),
            custom_price: None,
        }
    }

    /// The custom price when set, else the snapshot price.
    #[inline]
    pub fn effective_price(&self) -> Money {
        self.custom_price.unwrap_or(self.price)
    }

    /// Effective price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.effective_price().multiply_quantity(self.quantity)
    }

    /// Converts the line to the snapshot stored on an order.
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            price: self.effective_price(),
            quantity: self.quantity,
            volume: self.volume.clone(),
        }
    }
}

/// An in-progress cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of `product`, merging into an existing line.
    ///
    /// ## Returns
    /// `false` when the cart is full or the line is already at the maximum
    /// quantity; the cart is unchanged in that case.
    pub fn add_product(&mut self, product: &Product) -> bool {
        if let Some(line) = self.line_mut(&product.id) {
            if line.quantity >= MAX_ITEM_QUANTITY {
                return false;
            }
            line.quantity += 1;
            return true;
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return false;
        }

        self.lines.push(CartLine::from_product(product));
        true
    }

    /// Adds `quantity` units of `product` in one go.
    pub fn add_quantity(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        crate::validation::validate_quantity(quantity)?;

        if let Some(line) = self.line_mut(&product.id) {
            let requested = line.quantity + quantity;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = requested;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let mut line = CartLine::from_product(product);
        line.quantity = quantity;
        self.lines.push(line);
        Ok(())
    }

    /// Increases a line by one unit. Returns false if the line is absent or
    /// already at the maximum.
    pub fn increment(&mut self, product_id: &str) -> bool {
        match self.line_mut(product_id) {
            Some(line) if line.quantity < MAX_ITEM_QUANTITY => {
                line.quantity += 1;
                true
            }
            _ => false,
        }
    }

    /// Decreases a line by one unit, removing it when it reaches zero.
    pub fn decrement(&mut self, product_id: &str) -> bool {
        let Some(index) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return false;
        };

        if self.lines[index].quantity <= 1 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity -= 1;
        }
        true
    }

    /// Removes a line entirely.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Sets or clears the POS override price on a line.
    pub fn set_custom_price(&mut self, product_id: &str, price: Option<Money>) -> bool {
        match self.line_mut(product_id) {
            Some(line) => {
                line.custom_price = price;
                true
            }
            None => false,
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ effective price × quantity.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Snapshot of the lines as order items.
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines.iter().map(CartLine::to_order_item).collect()
    }
}

/// Cart summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.lines.len(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn test_product(id: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            category: Category::Beer,
            volume: "650ml".to_string(),
            price: Money::from_units(price),
            stock: 10,
            image: crate::types::PLACEHOLDER_IMAGE.to_string(),
            unit: "bottle".to_string(),
        }
    }

    fn assert_invariants(cart: &Cart) {
        assert!(cart.lines.iter().all(|l| l.quantity >= 1));
        let expected: i64 = cart
            .lines
            .iter()
            .map(|l| l.effective_price().units() * l.quantity)
            .sum();
        assert_eq!(cart.total().units(), expected);
    }

    #[test]
    fn test_add_merges_by_product_id() {
        let mut cart = Cart::new();
        let beer = test_product("4", 420);

        assert!(cart.add_product(&beer));
        assert!(cart.add_product(&beer));
        assert!(cart.add_product(&beer));

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.total().units(), 1260);
    }

    #[test]
    fn test_decrement_removes_last_unit() {
        let mut cart = Cart::new();
        let beer = test_product("4", 420);
        cart.add_product(&beer);

        assert!(cart.decrement("4"));
        assert!(cart.is_empty());
        assert!(!cart.decrement("4"));
    }

    #[test]
    fn test_invariants_hold_over_mixed_sequence() {
        let mut cart = Cart::new();
        let a = test_product("1", 3200);
        let b = test_product("2", 1900);
        let c = test_product("3", 1500);

        cart.add_product(&a);
        assert_invariants(&cart);
        cart.add_product(&b);
        cart.increment("1");
        assert_invariants(&cart);
        cart.decrement("2");
        assert_invariants(&cart);
        cart.add_product(&c);
        cart.add_product(&c);
        cart.decrement("3");
        cart.increment("404");
        assert_invariants(&cart);

        assert_eq!(cart.total().units(), 3200 * 2 + 1500);
    }

    #[test]
    fn test_snapshot_price_survives_catalog_edit() {
        let mut cart = Cart::new();
        let mut beer = test_product("4", 420);
        cart.add_product(&beer);

        beer.price = Money::from_units(999);
        cart.add_product(&beer);

        assert_eq!(cart.lines[0].price.units(), 420);
        assert_eq!(cart.total().units(), 840);
    }

    #[test]
    fn test_custom_price_overrides_line_total() {
        let mut cart = Cart::new();
        let whisky = test_product("1", 3200);
        cart.add_product(&whisky);
        cart.increment("1");

        assert!(cart.set_custom_price("1", Some(Money::from_units(3000))));
        assert_eq!(cart.total().units(), 6000);
        assert_eq!(cart.to_order_items()[0].price.units(), 3000);

        cart.set_custom_price("1", None);
        assert_eq!(cart.total().units(), 6400);
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        let beer = test_product("4", 420);
        cart.add_quantity(&beer, MAX_ITEM_QUANTITY).unwrap();

        assert!(!cart.add_product(&beer));
        assert!(!cart.increment("4"));
        assert!(matches!(
            cart.add_quantity(&beer, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(cart.lines[0].quantity, MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_remove_and_totals() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 100));
        cart.add_product(&test_product("2", 200));

        assert!(cart.remove("1"));
        assert!(!cart.remove("1"));

        let totals = CartTotals::from(&cart);
        assert_eq!(totals.line_count, 1);
        assert_eq!(totals.total.units(), 200);
    }
}
