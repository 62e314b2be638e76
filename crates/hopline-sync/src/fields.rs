//! Column-name translation between the app's camelCase JSON and the hosted
//! tables' snake_case columns.
//!
//! Only top-level keys are renamed. Nested values (an order's `items`
//! array) are stored as JSON columns and keep their camelCase keys.
//!
//! ```text
//! { "shopName": "Corner Store", "items": [{ "productId": "4" }] }
//!          │  to_remote                            │ untouched
//!          ▼                                       ▼
//! { "shop_name": "Corner Store", "items": [{ "productId": "4" }] }
//! ```

use serde_json::{Map, Value};

/// `shopName` → `shop_name`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `shop_name` → `shopName`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn rename_keys(value: Value, rename: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (rename(&k), v))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(rows) => Value::Array(
            rows.into_iter()
                .map(|row| match row {
                    Value::Object(_) => rename_keys(row, rename),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

/// App JSON → hosted-table row(s).
pub fn to_remote(value: Value) -> Value {
    rename_keys(value, camel_to_snake)
}

/// Hosted-table row(s) → app JSON.
pub fn from_remote(value: Value) -> Value {
    rename_keys(value, snake_to_camel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_conversion() {
        assert_eq!(camel_to_snake("shopName"), "shop_name");
        assert_eq!(camel_to_snake("createdAt"), "created_at");
        assert_eq!(camel_to_snake("id"), "id");
        assert_eq!(snake_to_camel("counter_sales"), "counterSales");
        assert_eq!(snake_to_camel("customer_email"), "customerEmail");
        assert_eq!(snake_to_camel("email"), "email");
    }

    #[test]
    fn test_user_row_translation() {
        let app = json!({
            "id": "u1",
            "shopName": "Corner Store",
            "createdAt": "2026-10-14T09:30:00Z",
        });

        let row = to_remote(app.clone());
        assert_eq!(row["shop_name"], "Corner Store");
        assert!(row.get("shopName").is_none());

        assert_eq!(from_remote(row), app);
    }

    #[test]
    fn test_nested_values_are_untouched() {
        let order = json!({
            "customerId": "u1",
            "items": [{ "productId": "4", "quantity": 3 }],
        });

        let row = to_remote(order);
        assert_eq!(row["customer_id"], "u1");
        assert_eq!(row["items"][0]["productId"], "4");
    }

    #[test]
    fn test_arrays_of_rows() {
        let rows = json!([{ "shop_name": "A" }, { "shop_name": "B" }]);
        let app = from_remote(rows);
        assert_eq!(app[1]["shopName"], "B");
    }
}
