//! Money calculation utilities using rust_decimal for precision

use rust_decimal::prelude::*;
use shared::models::{ItemStatus, OrderItem};

/// Catalog prices are stored with 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per product
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Maximum allowed quantity per item
pub const MAX_QUANTITY: u32 = 999;

/// Round a catalog price to currency precision
pub fn normalize_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a catalog price
pub fn validate_price(price: Decimal) -> Result<(), String> {
    if price.is_sign_negative() {
        return Err(format!("price must be non-negative, got {}", price));
    }
    if price > MAX_PRICE {
        return Err(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        ));
    }
    Ok(())
}

/// Validate an item quantity
pub fn validate_quantity(quantity: u32) -> Result<(), String> {
    if quantity == 0 {
        return Err("quantity must be at least 1".to_string());
    }
    if quantity > MAX_QUANTITY {
        return Err(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        ));
    }
    Ok(())
}

/// Σ quantity × unit_price over items that are not canceled
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Decimal {
    items
        .into_iter()
        .filter(|item| item.status != ItemStatus::Canceled)
        .map(OrderItem::subtotal)
        .sum()
}
