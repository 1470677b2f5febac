use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::log_stock_change,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        CartItems, Categories, Favorites, OrderItems, Products, StockLogs, Wishlist, cart_items,
        categories, favorites, order_items,
        products::{self, ActiveModel, Column},
        stock_logs, wishlist,
    },
    error::{AppError, AppResult},
    inventory::{INITIAL_STOCK_REASON, StockChange},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, StockLevel},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col((products::Entity, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((products::Entity, Column::Description)).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Stock => Column::Stock,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .find_also_related(Categories)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| Product::from_entity(product, category.map(|c| c.name)))
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Meta::page(page, limit, total),
    ))
}

/// Admin catalogue view: same filters as the storefront, admin only.
pub async fn admin_list_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    list_products(state, query).await
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    Ok(ApiResponse::ok(
        "Product",
        Product::from_entity(product, category.map(|c| c.name)),
    ))
}

pub async fn get_stock_level(state: &AppState, id: Uuid) -> AppResult<ApiResponse<StockLevel>> {
    let level = sqlx::query_as::<_, StockLevel>("SELECT id, name, stock FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    Ok(ApiResponse::ok("Stock level", level))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&txn, category_id).await?;
    }

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    if product.stock > 0 {
        log_stock_change(
            &txn,
            product.id,
            StockChange::between(0, product.stock),
            Some(INITIAL_STOCK_REASON),
            Some(user.user_id),
        )
        .await?;
    }

    let product = with_category(&txn, product).await?;
    txn.commit().await?;

    tracing::info!(product_id = %product.id, stock = product.stock, "product created");

    Ok(ApiResponse::ok("Product created", product))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    if let Some(Some(category_id)) = payload.category_id {
        ensure_category_exists(&state.orm, category_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;
    let product = with_category(&state.orm, product).await?;

    Ok(ApiResponse::ok("Product updated", product))
}

/// Remove a product and everything that only exists because of it.
///
/// Products that were ever ordered are kept so order history stays intact.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let ordered = OrderItems::find()
        .filter(order_items::Column::ProductId.eq(id))
        .count(&txn)
        .await?;
    if ordered > 0 {
        return Err(AppError::Conflict(
            "Cannot delete a product that appears in existing orders".into(),
        ));
    }

    StockLogs::delete_many()
        .filter(stock_logs::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    CartItems::delete_many()
        .filter(cart_items::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Favorites::delete_many()
        .filter(favorites::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Wishlist::delete_many()
        .filter(wishlist::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product.delete(&txn).await?;

    txn.commit().await?;

    tracing::info!(product_id = %id, "product deleted");

    Ok(ApiResponse::message_only("Product deleted successfully"))
}

/// Attach the category name to a product row.
pub(crate) async fn with_category<C: ConnectionTrait>(
    conn: &C,
    product: products::Model,
) -> AppResult<Product> {
    let category_name = match product.category_id {
        Some(category_id) => Categories::find_by_id(category_id)
            .one(conn)
            .await?
            .map(|c| c.name),
        None => None,
    };
    Ok(Product::from_entity(product, category_name))
}

async fn ensure_category_exists<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let found = Categories::find()
        .filter(categories::Column::Id.eq(id))
        .count(conn)
        .await?;
    if found == 0 {
        return Err(AppError::not_found("Category"));
    }
    Ok(())
}
