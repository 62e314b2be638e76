//! # Catalog & Inventory Manager
//!
//! The list of sellable products with their price and stock.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Who Moves Stock                                  │
//! │                                                                         │
//! │  Storefront checkout ──► decrement_for_sale(id, qty)  max(0, s − q)     │
//! │  POS checkout ─────────► decrement_for_sale(id, qty)  max(0, s − q)     │
//! │  Vault "+" / "−" ──────► adjust_stock(id, ±1)          clamped ≥ 0      │
//! │  Vault stock field ────► set_stock(id, n)              stored as given  │
//! │                                                                         │
//! │  Nothing re-adds stock except the admin.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;

/// Ordered product list. Insertion order is the display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from existing products.
    pub fn new(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    /// All products in display order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Looks up a product by id.
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: &str) -> CoreResult<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Appends a product.
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Removes a product by id and returns it.
    ///
    /// Orders that reference the product keep their snapshot; there is no
    /// dependency check.
    pub fn delete(&mut self, id: &str) -> CoreResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        Ok(self.products.remove(index))
    }

    /// Overwrites stock with exactly `stock`.
    ///
    /// Negative values are stored as given. Callers that want a floor must
    /// clamp before calling.
    pub fn set_stock(&mut self, id: &str, stock: i64) -> CoreResult<&Product> {
        let product = self.get_mut(id)?;
        product.stock = stock;
        Ok(product)
    }

    /// Moves stock by `delta`, never going below zero.
    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> CoreResult<&Product> {
        let product = self.get_mut(id)?;
        product.stock = product.stock.saturating_add(delta).max(0);
        Ok(product)
    }

    /// Takes `quantity` out of stock for a sale: `max(0, stock − quantity)`.
    pub fn decrement_for_sale(&mut self, id: &str, quantity: i64) -> CoreResult<&Product> {
        let product = self.get_mut(id)?;
        product.stock = product.stock.saturating_sub(quantity).max(0);
        Ok(product)
    }

    /// Products with stock on hand whose name contains `query`
    /// (case-insensitive). This feeds the POS picker.
    pub fn pos_picker(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| p.in_stock())
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Σ price × stock over the whole catalog.
    pub fn inventory_value(&self) -> Money {
        self.products.iter().map(Product::stock_value).sum()
    }

    /// Σ stock over the whole catalog.
    pub fn units_in_stock(&self) -> i64 {
        self.products.iter().fold(0, |units, p| units.saturating_add(p.stock))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
