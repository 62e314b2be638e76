//! First-run data: the starter catalog and the default admin roster.
//!
//! Used when the local store has no `products` blob yet, and by tests.

use crate::catalog::Catalog;
use crate::money::Money;
use crate::types::{Category, Product, PLACEHOLDER_IMAGE};

/// Administrators recognised when no `HOPLINE_ADMIN_EMAILS` is configured.
pub const DEFAULT_ADMIN_EMAILS: &[&str] = &["admin@hopline.com.np", "ops@hopline.com.np"];

fn product(
    id: &str,
    name: &str,
    category: Category,
    volume: &str,
    price: i64,
    stock: i64,
    unit: &str,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category,
        volume: volume.to_string(),
        price: Money::from_units(price),
        stock,
        image: PLACEHOLDER_IMAGE.to_string(),
        unit: unit.to_string(),
    }
}

/// The starter catalog.
pub fn products() -> Vec<Product> {
    vec![
        product("1", "Old Durbar Black Chimney", Category::Whisky, "750ml", 3200, 50, "bottle"),
        product("2", "Ruslan Vodka", Category::Vodka, "750ml", 1900, 80, "bottle"),
        product("3", "Khukri XXX Rum", Category::Rum, "750ml", 1500, 60, "bottle"),
        product("4", "Tuborg Beer", Category::Beer, "650ml", 420, 200, "bottle"),
        product("5", "Gorkha Strong Beer", Category::Beer, "650ml", 400, 150, "bottle"),
        product("6", "Divine Red Wine", Category::Wine, "750ml", 1800, 40, "bottle"),
        product("7", "Coca-Cola", Category::SoftDrinks, "1.5L", 200, 300, "bottle"),
    ]
}

/// The starter catalog as a [`Catalog`].
pub fn catalog() -> Catalog {
    Catalog::new(products())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_contains_tuborg() {
        let catalog = catalog();
        let tuborg = catalog.get("4").unwrap();
        assert_eq!(tuborg.name, "Tuborg Beer");
        assert_eq!(tuborg.price.units(), 420);
        assert_eq!(tuborg.stock, 200);
    }

    #[test]
    fn test_seed_ids_are_unique() {
        let products = products();
        let mut ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), products.len());
    }
}
