use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::orders::{AdminOrder, AdminOrderDetail, AdminOrderList, UpdateOrderStatusRequest},
    entity::{Addresses, Orders, orders},
    error::{AppError, AppResult},
    inventory::OrderStatus,
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::order_items_for,
    state::AppState,
};

const ADMIN_ORDER_SELECT: &str = r#"
    SELECT o.id, o.user_id, o.total_amount, o.shipping_address_id, o.status,
           o.created_at, o.updated_at, u.name AS user_name, u.email AS user_email
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
"#;

#[derive(FromRow)]
struct AdminOrderRow {
    #[sqlx(flatten)]
    order: Order,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<AdminOrderRow> for AdminOrder {
    fn from(row: AdminOrderRow) -> Self {
        Self {
            order: row.order,
            user_name: row.user_name,
            user_email: row.user_email,
        }
    }
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(|_| {
        let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        AppError::BadRequest(format!(
            "Invalid status. Must be one of: {}",
            allowed.join(", ")
        ))
    })
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_status(raw)?.as_str()),
        None => None,
    };

    let items = sqlx::query_as::<_, AdminOrderRow>(&format!(
        "{ADMIN_ORDER_SELECT} WHERE ($1::text IS NULL OR o.status = $1) \
         ORDER BY o.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(&state.pool)
            .await?;

    Ok(ApiResponse::success(
        "Orders",
        AdminOrderList { items },
        Meta::page(page, limit, total.0),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<AdminOrderDetail>> {
    ensure_admin(user)?;

    let order: AdminOrder = sqlx::query_as::<_, AdminOrderRow>(&format!(
        "{ADMIN_ORDER_SELECT} WHERE o.id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("Order"))?
    .into();

    let shipping_address = match order.order.shipping_address_id {
        Some(address_id) => Addresses::find_by_id(address_id)
            .one(&state.orm)
            .await?
            .map(Into::into),
        None => None,
    };

    let items = order_items_for(&state.pool, id).await?;

    Ok(ApiResponse::ok(
        "Order",
        AdminOrderDetail {
            order,
            shipping_address,
            items,
        },
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = parse_status(&payload.status)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let current: OrderStatus = order
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    let mut active: orders::ActiveModel = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, from = %current, to = %next, "order status updated");

    Ok(ApiResponse::ok("Order status updated", order.into()))
}
