//! Favorites and wishlist: two per-user product lists with identical rules.

use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::saved::{SaveProductRequest, SavedProductList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::SavedProduct,
    response::ApiResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedList {
    Favorites,
    Wishlist,
}

impl SavedList {
    pub fn label(self) -> &'static str {
        match self {
            SavedList::Favorites => "favorites",
            SavedList::Wishlist => "wishlist",
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            SavedList::Favorites => {
                "INSERT INTO favorites (id, user_id, product_id) VALUES ($1, $2, $3)"
            }
            SavedList::Wishlist => {
                "INSERT INTO wishlist (id, user_id, product_id) VALUES ($1, $2, $3)"
            }
        }
    }

    fn delete_sql(self) -> &'static str {
        match self {
            SavedList::Favorites => "DELETE FROM favorites WHERE user_id = $1 AND product_id = $2",
            SavedList::Wishlist => "DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2",
        }
    }

    fn list_sql(self) -> &'static str {
        match self {
            SavedList::Favorites => {
                r#"
                SELECT s.id AS entry_id, s.created_at AS saved_at,
                       p.id, p.name, p.description, p.price, p.category_id,
                       c.name AS category_name, p.stock, p.image_url, p.created_at, p.updated_at
                FROM favorites s
                JOIN products p ON p.id = s.product_id
                LEFT JOIN categories c ON c.id = p.category_id
                WHERE s.user_id = $1
                ORDER BY s.created_at DESC
                "#
            }
            SavedList::Wishlist => {
                r#"
                SELECT s.id AS entry_id, s.created_at AS saved_at,
                       p.id, p.name, p.description, p.price, p.category_id,
                       c.name AS category_name, p.stock, p.image_url, p.created_at, p.updated_at
                FROM wishlist s
                JOIN products p ON p.id = s.product_id
                LEFT JOIN categories c ON c.id = p.category_id
                WHERE s.user_id = $1
                ORDER BY s.created_at DESC
                "#
            }
        }
    }
}

pub async fn add(
    pool: &DbPool,
    list: SavedList,
    user: &AuthUser,
    payload: SaveProductRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product.is_none() {
        return Err(AppError::not_found("Product"));
    }

    sqlx::query(list.insert_sql())
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .execute(pool)
        .await
        .map_err(|e| {
            AppError::from(e)
                .conflict_on_unique(&format!("Product is already in your {}", list.label()))
        })?;

    Ok(ApiResponse::message_only(format!(
        "Product added to {}",
        list.label()
    )))
}

pub async fn list(
    pool: &DbPool,
    list: SavedList,
    user: &AuthUser,
) -> AppResult<ApiResponse<SavedProductList>> {
    let items = list_for(pool, list, user.user_id).await?;
    Ok(ApiResponse::ok(list.label(), SavedProductList { items }))
}

pub(crate) async fn list_for(
    pool: &DbPool,
    list: SavedList,
    user_id: Uuid,
) -> AppResult<Vec<SavedProduct>> {
    let items = sqlx::query_as::<_, SavedProduct>(list.list_sql())
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

pub async fn remove(
    pool: &DbPool,
    list: SavedList,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query(list.delete_sql())
        .bind(user.user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Product not found in {}",
            list.label()
        )));
    }

    Ok(ApiResponse::message_only(format!(
        "Product removed from {}",
        list.label()
    )))
}
