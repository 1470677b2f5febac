use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{apply_stock_change, warn_if_low},
    db::DbPool,
    dto::orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderWithItems},
    entity::{
        Addresses, CartItems, Categories, Orders, Products, addresses, cart_items, categories,
        order_items, orders, products,
    },
    error::{AppError, AppResult},
    inventory::{
        CHECKOUT_REASON, CheckoutLine, OrderStatus, StockChange, find_stock_issues, order_total,
    },
    middleware::auth::AuthUser,
    models::OrderItem,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::address_service::lock_user,
    state::AppState,
};

/// Turn the caller's cart into a pending order.
///
/// Runs in one transaction. The user row is locked first so checkouts of the
/// same cart run one after another, then the product rows are locked in id
/// order and every line is checked against the locked stock. The order, its
/// items, the stock deductions and their log rows are written and exactly the
/// cart lines that were ordered are removed. Any error drops the transaction
/// and nothing is persisted.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<CheckoutResponse> {
    let txn = state.orm.begin().await?;
    lock_user(&txn, user.user_id).await?;

    let cart = CartItems::find()
        .filter(cart_items::Column::UserId.eq(user.user_id))
        .order_by_asc(cart_items::Column::CreatedAt)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::CartEmpty);
    }

    let mut product_ids: Vec<Uuid> = cart.iter().map(|item| item.product_id).collect();
    product_ids.sort();
    product_ids.dedup();

    let mut locked: HashMap<Uuid, products::Model> = Products::find()
        .filter(products::Column::Id.is_in(product_ids))
        .order_by_asc(products::Column::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let lines = cart
        .iter()
        .map(|item| {
            let product = locked
                .get(&item.product_id)
                .ok_or_else(|| AppError::not_found("Product"))?;
            Ok(CheckoutLine {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: item.quantity,
                price: product.price,
                stock: product.stock,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let issues = find_stock_issues(&lines);
    if !issues.is_empty() {
        tracing::info!(user_id = %user.user_id, issues = issues.len(), "checkout rejected: insufficient stock");
        return Err(AppError::StockInsufficient(issues));
    }

    if let Some(address_id) = payload.shipping_address_id {
        let owned = Addresses::find()
            .filter(
                Condition::all()
                    .add(addresses::Column::Id.eq(address_id))
                    .add(addresses::Column::UserId.eq(user.user_id)),
            )
            .count(&txn)
            .await?;
        if owned == 0 {
            return Err(AppError::not_found("Shipping address"));
        }
    }

    let total_amount = order_total(&lines);
    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        shipping_address_id: Set(payload.shipping_address_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let category_ids: Vec<Uuid> = locked.values().filter_map(|p| p.category_id).collect();
    let category_names: HashMap<Uuid, String> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    };

    let mut changes = Vec::with_capacity(lines.len());
    let mut receipt = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = locked
            .remove(&line.product_id)
            .ok_or_else(|| AppError::not_found("Product"))?;
        let image_url = product.image_url.clone();
        let category_name = product
            .category_id
            .and_then(|id| category_names.get(&id).cloned());

        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price_at_time: Set(line.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let change = StockChange::deduct(product.stock, line.quantity);
        let updated = apply_stock_change(
            &txn,
            product,
            change,
            Some(CHECKOUT_REASON),
            Some(user.user_id),
        )
        .await?;
        locked.insert(updated.id, updated);
        changes.push((line.product_id, change));

        receipt.push(OrderItem {
            id: item.id,
            order_id: order.id,
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            image_url,
            category_name,
            quantity: item.quantity,
            price_at_time: item.price_at_time,
        });
    }

    let ordered: Vec<Uuid> = cart.iter().map(|item| item.id).collect();
    CartItems::delete_many()
        .filter(cart_items::Column::Id.is_in(ordered))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    for (product_id, change) in &changes {
        warn_if_low(*product_id, change, state.config.low_stock_threshold);
    }
    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = %total_amount,
        "checkout completed"
    );

    Ok(CheckoutResponse {
        message: "Order placed successfully".into(),
        order_id: order.id,
        total_amount,
        order_items: receipt,
    })
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Orders::find()
        .filter(orders::Column::UserId.eq(user.user_id))
        .order_by_desc(orders::Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Meta::page(page, limit, total),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(orders::Column::UserId.eq(user.user_id))
                .add(orders::Column::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items = order_items_for(&state.pool, order.id).await?;

    Ok(ApiResponse::ok(
        "Order",
        OrderWithItems {
            order: order.into(),
            items,
        },
    ))
}

/// Order lines with the product details shown on receipts.
pub(crate) async fn order_items_for(pool: &DbPool, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, p.image_url,
               c.name AS category_name, oi.quantity, oi.price_at_time
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE oi.order_id = $1
        ORDER BY oi.created_at, p.name
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
