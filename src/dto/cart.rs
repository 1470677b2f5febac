use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::CartItem;

/// Largest quantity a single cart line may hold.
pub const MAX_CART_QUANTITY: i32 = 10_000;

fn default_quantity() -> i32 {
    1
}

fn check_quantity(quantity: i32, message: &'static str) -> Result<(), ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::new("quantity").with_message(message.into()));
    }
    if quantity > MAX_CART_QUANTITY {
        return Err(ValidationError::new("quantity").with_message(
            format!("Quantity must not exceed {MAX_CART_QUANTITY}").into(),
        ));
    }
    Ok(())
}

fn add_quantity(quantity: i32) -> Result<(), ValidationError> {
    check_quantity(quantity, "Quantity must be at least 1")
}

fn line_quantity(quantity: i32) -> Result<(), ValidationError> {
    check_quantity(quantity, "Valid quantity is required")
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    #[validate(custom(function = "add_quantity"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(custom(function = "line_quantity"))]
    pub quantity: i32,
}

/// Result of an add-to-cart upsert.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartUpsert {
    /// `true` when a new line was created, `false` when an existing line grew.
    pub inserted: bool,
    pub item: CartItem,
}
