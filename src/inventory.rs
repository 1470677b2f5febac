//! Stock bookkeeping rules shared by checkout and the admin stock endpoints.
//!
//! Everything in here is pure: callers load product rows under a row lock,
//! ask these helpers what to write, then persist the product and its
//! `stock_logs` row inside the same transaction.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Reason recorded on every stock log written by checkout.
pub const CHECKOUT_REASON: &str = "Order checkout";
/// Reason recorded when a product is created with a non-zero stock.
pub const INITIAL_STOCK_REASON: &str = "Initial stock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Increase,
    Decrease,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Increase => "increase",
            ChangeType::Decrease => "decrease",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(ChangeType::Increase),
            "decrease" => Ok(ChangeType::Decrease),
            other => Err(format!("unknown change type: {other}")),
        }
    }
}

/// One discrete stock mutation, ready to be written as a `stock_logs` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub previous_stock: i32,
    pub new_stock: i32,
    pub change_amount: i32,
    pub change_type: ChangeType,
}

impl StockChange {
    /// Absolute move from `previous` to `new`.
    ///
    /// A zero delta is classified as an increase of 0.
    pub fn between(previous: i32, new: i32) -> Self {
        let delta = new - previous;
        let change_type = if delta < 0 {
            ChangeType::Decrease
        } else {
            ChangeType::Increase
        };
        Self {
            previous_stock: previous,
            new_stock: new,
            change_amount: delta.abs(),
            change_type,
        }
    }

    /// Remove `quantity` units. Callers must have checked availability.
    pub fn deduct(previous: i32, quantity: i32) -> Self {
        Self::between(previous, previous - quantity)
    }

    pub fn is_low(&self, threshold: i32) -> bool {
        self.new_stock < threshold
    }
}

/// A cart line checked against the locked product row.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockIssue {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested_quantity: i32,
    pub available_stock: i32,
    pub message: String,
}

impl StockIssue {
    pub fn new(product_id: Uuid, product_name: &str, requested: i32, available: i32) -> Self {
        Self {
            product_id,
            product_name: product_name.to_string(),
            requested_quantity: requested,
            available_stock: available,
            message: format!("Sorry, only {available} left in stock for {product_name}"),
        }
    }
}

/// Every line whose requested quantity exceeds the available stock, in line order.
pub fn find_stock_issues(lines: &[CheckoutLine]) -> Vec<StockIssue> {
    lines
        .iter()
        .filter(|line| line.stock < line.quantity)
        .map(|line| {
            StockIssue::new(line.product_id, &line.product_name, line.quantity, line.stock)
        })
        .collect()
}

pub fn order_total(lines: &[CheckoutLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Orders move forward through the fulfilment pipeline and may be cancelled
    /// until they ship. Delivered and cancelled orders are final. Re-applying
    /// the current status is accepted.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Shipped)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {s}"))
    }
}
