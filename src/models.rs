use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{addresses, categories, orders, products, users};
use crate::inventory::{ChangeType, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Public view of a user row. Secrets (password hash, OTP) never leave the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub has_password: bool,
    pub has_google_auth: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone_number: model.phone_number,
            role: model.role,
            is_verified: model.is_verified,
            has_password: model.password_hash.is_some(),
            has_google_auth: model.google_id.is_some(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model, category_name: Option<String>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category_id: model.category_id,
            category_name,
            stock: model.stock,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct StockLevel {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

/// A `stock_logs` row joined with the acting user's and product's names.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct StockHistoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub change_amount: i32,
    #[sqlx(try_from = "String")]
    pub change_type: ChangeType,
    pub reason: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<String> for ChangeType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub house_name: String,
    pub area_street_sector_village: String,
    pub landmark: Option<String>,
    pub pincode: String,
    pub town_city: String,
    pub state: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            house_name: model.house_name,
            area_street_sector_village: model.area_street_sector_village,
            landmark: model.landmark,
            pincode: model.pincode,
            town_city: model.town_city,
            state: model.state,
            is_default: model.is_default,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// A cart line joined with its product and category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartItem {
    pub cart_item_id: Uuid,
    pub quantity: i32,
    pub product_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub items: Vec<CartItem>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl Cart {
    /// Lines whose product is out of stock stay in the cart but do not count toward the total.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total = items
            .iter()
            .filter(|item| item.stock > 0)
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum();
        Self { items, total }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub shipping_address_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total_amount: model.total_amount,
            shipping_address_id: model.shipping_address_id,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl Order {
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }
}

/// An order line with the product details needed for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub image_url: Option<String>,
    pub category_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price_at_time: Decimal,
}

/// A favorite or wishlist entry together with the saved product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct SavedProduct {
    pub entry_id: Uuid,
    pub saved_at: DateTime<Utc>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
}
