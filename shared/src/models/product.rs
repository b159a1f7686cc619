//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Determines routing: food goes through the kitchen, beverages are
/// prepared and served by front-of-house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Food,
    Beverage,
}

/// Catalog entry. Order items snapshot `name`, `price` and `product_type`
/// when added, so later edits never change historical totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub product_type: ProductType,
    pub available: bool,
    #[serde(default)]
    pub version: u64,
}

/// Create or replace a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub id: Option<i64>,
    pub name: String,
    pub price: Decimal,
    pub product_type: ProductType,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}
