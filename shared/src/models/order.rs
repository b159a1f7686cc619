//! Order Model

use super::product::ProductType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open,
    Closed,
    Canceled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
            OrderStatus::Canceled => "canceled",
        })
    }
}

/// Who drives the order: staff, or the customer through the self-service app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Waiter,
    CustomerSelfService,
}

/// Payment method accepted when closing a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Pix,
    Other,
}

/// Unknown payment method string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethod(pub String);

impl fmt::Display for UnknownPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown payment method: {}", self.0)
    }
}

impl std::error::Error for UnknownPaymentMethod {}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "credit" => Ok(PaymentMethod::Credit),
            "debit" => Ok(PaymentMethod::Debit),
            "pix" => Ok(PaymentMethod::Pix),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(UnknownPaymentMethod(s.to_string())),
        }
    }
}

/// Customer identity embedded in orders and waiter calls.
///
/// The CPF is stored normalized (digits only) and serves as the customer's
/// access credential for self-service actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub cpf: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Order (one table visit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub waiter_id: Option<i64>,
    pub customer: Option<CustomerInfo>,
    pub status: OrderStatus,
    pub order_type: OrderType,
    /// Item ids in submission order
    pub item_ids: Vec<i64>,
    /// Σ quantity × unit_price over non-canceled items
    pub total: Decimal,
    pub bill_requested: bool,
    pub payment_method: Option<PaymentMethod>,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
    #[serde(default)]
    pub version: u64,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }
}

/// Item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Canceled,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Delivered | ItemStatus::Canceled)
    }

    /// Kitchen has not finished with it yet
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Preparing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Preparing => "preparing",
            ItemStatus::Ready => "ready",
            ItemStatus::Delivered => "delivered",
            ItemStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order, with its own prep/delivery lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// Snapshot of the product name at add time
    pub product_name: String,
    /// Snapshot of the product type at add time
    pub product_type: ProductType,
    pub quantity: u32,
    /// Snapshot of the product price at add time
    pub unit_price: Decimal,
    pub notes: Option<String>,
    pub status: ItemStatus,
    pub preparation_start_time: Option<i64>,
    pub ready_time: Option<i64>,
    pub delivered_time: Option<i64>,
    pub created_at: i64,
    #[serde(default)]
    pub version: u64,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn is_food(&self) -> bool {
        self.product_type == ProductType::Food
    }
}

/// Order with its items, in submission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
