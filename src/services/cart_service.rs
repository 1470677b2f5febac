use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, CartUpsert, MAX_CART_QUANTITY, UpdateCartItemRequest},
    error::{AppError, AppResult},
    inventory::StockIssue,
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::ApiResponse,
};

const CART_ITEM_SELECT: &str = r#"
    SELECT ci.id AS cart_item_id, ci.quantity,
           p.id AS product_id, p.name, p.price, p.image_url, p.stock,
           c.name AS category_name
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
    LEFT JOIN categories c ON c.id = p.category_id
"#;

pub async fn get_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = cart_for(pool, user.user_id).await?;
    Ok(ApiResponse::ok("Cart", cart))
}

/// Cart of any user; shared with the admin user views.
pub(crate) async fn cart_for(pool: &DbPool, user_id: Uuid) -> AppResult<Cart> {
    let items = sqlx::query_as::<_, CartItem>(&format!(
        "{CART_ITEM_SELECT} WHERE ci.user_id = $1 ORDER BY ci.created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(Cart::from_items(items))
}

/// Add `quantity` of a product, growing the existing line if there is one.
///
/// The upsert is a single statement so concurrent adds of the same product
/// always end up as one line with the summed quantity.
pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<CartUpsert> {
    payload.validate()?;

    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product.is_none() {
        return Err(AppError::not_found("Product"));
    }

    // The guard on the update arm keeps a grown line within MAX_CART_QUANTITY;
    // when it fails no row is returned.
    let upserted: Option<(Uuid, bool)> = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        WHERE cart_items.quantity::bigint + EXCLUDED.quantity <= $5
        RETURNING id, (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .bind(i64::from(MAX_CART_QUANTITY))
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        let err = AppError::from(err);
        // the product can disappear between the check and the insert
        if err.is_foreign_key_violation() {
            AppError::not_found("Product")
        } else {
            err
        }
    })?;
    let (item_id, inserted) = upserted.ok_or_else(|| {
        AppError::Validation(format!(
            "Quantity must not exceed {MAX_CART_QUANTITY} for a single product"
        ))
    })?;

    let item = cart_item(pool, user.user_id, item_id).await?;
    Ok(CartUpsert { inserted, item })
}

pub async fn update_quantity(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;

    let current = cart_item(pool, user.user_id, item_id).await?;
    if payload.quantity > current.stock {
        return Err(AppError::StockInsufficient(vec![StockIssue::new(
            current.product_id,
            &current.name,
            payload.quantity,
            current.stock,
        )]));
    }

    sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2 AND user_id = $3")
        .bind(payload.quantity)
        .bind(item_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    let item = CartItem {
        quantity: payload.quantity,
        ..current
    };
    Ok(ApiResponse::ok("Cart updated", item))
}

pub async fn remove_item(
    pool: &DbPool,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Cart item"));
    }

    Ok(ApiResponse::message_only("Item removed from cart"))
}

pub async fn clear_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;

    tracing::debug!(user_id = %user.user_id, removed = result.rows_affected(), "cart cleared");

    Ok(ApiResponse::message_only("Cart cleared"))
}

async fn cart_item(pool: &DbPool, user_id: Uuid, item_id: Uuid) -> AppResult<CartItem> {
    sqlx::query_as::<_, CartItem>(&format!(
        "{CART_ITEM_SELECT} WHERE ci.id = $1 AND ci.user_id = $2"
    ))
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Cart item"))
}
