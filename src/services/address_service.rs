//! Shipping addresses. A user with at least one address always has exactly
//! one default; the user row is locked while that invariant is rewritten.

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::addresses::{AddressList, AddressRequest},
    entity::{Addresses, Users, addresses},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::ApiResponse,
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = addresses_for(&state.orm, user.user_id).await?;
    Ok(ApiResponse::ok("Addresses", AddressList { items }))
}

/// Default address first, then newest.
pub(crate) async fn addresses_for<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Vec<Address>> {
    let items = Addresses::find()
        .filter(addresses::Column::UserId.eq(user_id))
        .order_by_desc(addresses::Column::IsDefault)
        .order_by_desc(addresses::Column::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    lock_user(&txn, user.user_id).await?;

    let existing = Addresses::find()
        .filter(addresses::Column::UserId.eq(user.user_id))
        .count(&txn)
        .await?;

    let address = addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        house_name: Set(payload.house_name),
        area_street_sector_village: Set(payload.area_street_sector_village),
        landmark: Set(payload.landmark.filter(|l| !l.trim().is_empty())),
        pincode: Set(payload.pincode),
        town_city: Set(payload.town_city),
        state: Set(payload.state),
        is_default: Set(existing == 0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::ok("Address added successfully", address.into()))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;

    let existing = owned_address(&state.orm, user.user_id, id).await?;

    let mut active: addresses::ActiveModel = existing.into();
    active.house_name = Set(payload.house_name);
    active.area_street_sector_village = Set(payload.area_street_sector_village);
    active.landmark = Set(payload.landmark.filter(|l| !l.trim().is_empty()));
    active.pincode = Set(payload.pincode);
    active.town_city = Set(payload.town_city);
    active.state = Set(payload.state);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Address updated successfully", address.into()))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    lock_user(&txn, user.user_id).await?;

    let target = owned_address(&txn, user.user_id, id).await?;

    Addresses::update_many()
        .col_expr(addresses::Column::IsDefault, Expr::value(false))
        .filter(addresses::Column::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    let mut active: addresses::ActiveModel = target.into();
    active.is_default = Set(true);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::ok("Default address updated", address.into()))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    lock_user(&txn, user.user_id).await?;

    let target = owned_address(&txn, user.user_id, id).await?;
    let was_default = target.is_default;
    target.delete(&txn).await?;

    if was_default {
        let oldest = Addresses::find()
            .filter(addresses::Column::UserId.eq(user.user_id))
            .order_by_asc(addresses::Column::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(oldest) = oldest {
            let promoted = oldest.id;
            let mut active: addresses::ActiveModel = oldest.into();
            active.is_default = Set(true);
            active.updated_at = Set(Utc::now().into());
            active.update(&txn).await?;
            tracing::info!(user_id = %user.user_id, address_id = %promoted, "default address promoted");
        }
    }

    txn.commit().await?;

    Ok(ApiResponse::message_only("Address deleted successfully"))
}

async fn owned_address<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<addresses::Model> {
    Addresses::find()
        .filter(
            Condition::all()
                .add(addresses::Column::Id.eq(id))
                .add(addresses::Column::UserId.eq(user_id)),
        )
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))
}

/// Serializes address writes and checkouts of one user.
pub(crate) async fn lock_user(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<()> {
    Users::find_by_id(user_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(())
}
