use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{
    entity::{products, stock_logs},
    error::AppResult,
    inventory::StockChange,
};

/// Write `change` to the locked product row and append its audit entry.
///
/// Must run on the same transaction that locked `product`.
pub async fn apply_stock_change<C: ConnectionTrait>(
    conn: &C,
    product: products::Model,
    change: StockChange,
    reason: Option<&str>,
    actor: Option<Uuid>,
) -> AppResult<products::Model> {
    let product_id = product.id;
    let mut active: products::ActiveModel = product.into();
    active.stock = Set(change.new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(conn).await?;

    log_stock_change(conn, product_id, change, reason, actor).await?;

    tracing::debug!(
        product_id = %product_id,
        previous = change.previous_stock,
        new = change.new_stock,
        change_type = %change.change_type,
        "stock changed"
    );

    Ok(updated)
}

pub async fn log_stock_change<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    change: StockChange,
    reason: Option<&str>,
    actor: Option<Uuid>,
) -> AppResult<stock_logs::Model> {
    let log = stock_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        previous_stock: Set(change.previous_stock),
        new_stock: Set(change.new_stock),
        change_amount: Set(change.change_amount),
        change_type: Set(change.change_type.as_str().to_string()),
        reason: Set(reason.map(str::to_string)),
        updated_by: Set(actor),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(log)
}

pub fn warn_if_low(product_id: Uuid, change: &StockChange, threshold: i32) {
    if change.is_low(threshold) {
        tracing::warn!(
            product_id = %product_id,
            stock = change.new_stock,
            threshold,
            "low stock"
        );
    }
}
