//! Admin stock adjustments. Every write locks the product rows first and
//! appends the matching `stock_logs` row in the same transaction.

use std::collections::HashMap;

use sea_orm::sea_query::LockType;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{apply_stock_change, warn_if_low},
    dto::stock::{BatchStockUpdateRequest, StockHistory, StockUpdateRequest, UpdatedProducts},
    entity::{Products, products},
    error::{AppError, AppResult},
    inventory::StockChange,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, StockHistoryEntry},
    response::ApiResponse,
    services::product_service::with_category,
    state::AppState,
};

pub async fn update_stock(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: StockUpdateRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let change = StockChange::between(product.stock, payload.stock);
    let updated = apply_stock_change(
        &txn,
        product,
        change,
        payload.reason.as_deref(),
        Some(user.user_id),
    )
    .await?;
    let updated = with_category(&txn, updated).await?;

    txn.commit().await?;

    warn_if_low(product_id, &change, state.config.low_stock_threshold);

    Ok(ApiResponse::ok("Stock updated successfully", updated))
}

/// Apply several absolute stock values atomically.
///
/// Every entry is checked before anything is written. Repeated ids are applied
/// in request order, each one starting from the value the previous one wrote.
pub async fn batch_update_stock(
    state: &AppState,
    user: &AuthUser,
    payload: BatchStockUpdateRequest,
) -> AppResult<ApiResponse<UpdatedProducts>> {
    ensure_admin(user)?;
    if payload.updates.is_empty() {
        return Err(AppError::BadRequest(
            "Updates array is required and must not be empty".into(),
        ));
    }
    if let Some(bad) = payload.first_invalid() {
        return Err(AppError::Validation(format!(
            "Invalid stock value for product {}",
            bad.id
        )));
    }
    let updates = payload.updates;

    let mut ids: Vec<Uuid> = updates.iter().map(|u| u.id).collect();
    ids.sort();
    ids.dedup();

    let txn = state.orm.begin().await?;

    let mut locked: HashMap<Uuid, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(ids))
        .order_by_asc(products::Column::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    if let Some(missing) = updates.iter().find(|u| !locked.contains_key(&u.id)) {
        return Err(AppError::NotFound(format!(
            "Product {} not found",
            missing.id
        )));
    }

    let mut changes = Vec::with_capacity(updates.len());
    let mut items = Vec::with_capacity(updates.len());
    for update in updates {
        let current = locked
            .remove(&update.id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", update.id)))?;
        let change = StockChange::between(current.stock, update.stock);
        let updated = apply_stock_change(
            &txn,
            current,
            change,
            update.reason.as_deref(),
            Some(user.user_id),
        )
        .await?;
        changes.push((update.id, change));
        locked.insert(update.id, updated.clone());
        items.push(with_category(&txn, updated).await?);
    }

    txn.commit().await?;

    for (product_id, change) in &changes {
        warn_if_low(*product_id, change, state.config.low_stock_threshold);
    }
    tracing::info!(count = changes.len(), actor = %user.user_id, "batch stock update applied");

    Ok(ApiResponse::ok(
        "Batch stock update completed successfully",
        UpdatedProducts { items },
    ))
}

/// Audit trail for one product, newest first. Unknown products have no history.
pub async fn get_stock_history(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<StockHistory>> {
    ensure_admin(user)?;

    let items = sqlx::query_as::<_, StockHistoryEntry>(
        r#"
        SELECT sl.id, sl.product_id, p.name AS product_name,
               sl.previous_stock, sl.new_stock, sl.change_amount, sl.change_type,
               sl.reason, sl.updated_by, u.name AS updated_by_name, sl.created_at
        FROM stock_logs sl
        JOIN products p ON p.id = sl.product_id
        LEFT JOIN users u ON u.id = sl.updated_by
        WHERE sl.product_id = $1
        ORDER BY sl.created_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::ok("Stock history", StockHistory { items }))
}
