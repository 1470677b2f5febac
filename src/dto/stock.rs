use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Product, StockHistoryEntry};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0, message = "Stock must be a non-negative number"))]
    pub stock: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct BatchStockEntry {
    pub id: Uuid,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BatchStockUpdateRequest {
    #[validate(nested)]
    pub updates: Vec<BatchStockEntry>,
}

impl BatchStockUpdateRequest {
    /// First entry, in request order, that fails validation.
    pub fn first_invalid(&self) -> Option<&BatchStockEntry> {
        if self.validate().is_ok() {
            return None;
        }
        self.updates.iter().find(|entry| entry.validate().is_err())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UpdatedProducts {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StockHistory {
    #[schema(value_type = Vec<StockHistoryEntry>)]
    pub items: Vec<StockHistoryEntry>,
}
