use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    dto::{
        saved::SavedProductList,
        users::{AdminUpdateUserRequest, UpdateProfileRequest, UserList, UserWithAddresses},
    },
    entity::{
        Addresses, CartItems, Favorites, OrderItems, Orders, StockLogs, Users, Wishlist,
        addresses, cart_items, favorites, order_items, orders, stock_logs, users, wishlist,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Cart, Role, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{address_service, cart_service, saved_service, saved_service::SavedList},
    state::AppState,
};

/// Field-level changes to a user row.
///
/// `None` leaves a column untouched; `phone_number: Some(None)` clears it.
#[derive(Debug, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<Option<String>>,
    pub is_verified: Option<bool>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn from_profile(req: UpdateProfileRequest) -> AppResult<Self> {
        let changes = Self {
            name: normalize_name(req.name)?,
            phone_number: normalize_phone(req.phone_number)?,
            ..Self::default()
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest(
                "At least one field (name or phone_number) must be provided".into(),
            ));
        }
        Ok(changes)
    }

    pub fn from_admin(req: AdminUpdateUserRequest) -> AppResult<Self> {
        let email = match req.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if !email.validate_email() {
                    return Err(AppError::Validation("Invalid email format.".into()));
                }
                Some(email)
            }
            None => None,
        };
        let changes = Self {
            name: normalize_name(req.name)?,
            email,
            phone_number: normalize_phone(req.phone_number)?,
            is_verified: req.is_verified,
            role: req.role,
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }
        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, active: &mut users::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(email) = self.email {
            active.email = Set(email);
        }
        if let Some(phone_number) = self.phone_number {
            active.phone_number = Set(phone_number);
        }
        if let Some(is_verified) = self.is_verified {
            active.is_verified = Set(is_verified);
        }
        if let Some(role) = self.role {
            active.role = Set(role.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().into());
    }
}

fn normalize_name(name: Option<String>) -> AppResult<Option<String>> {
    match name {
        Some(name) if name.trim().is_empty() => {
            Err(AppError::Validation("Name cannot be empty".into()))
        }
        Some(name) => Ok(Some(name.trim().to_string())),
        None => Ok(None),
    }
}

fn normalize_phone(phone: Option<Option<String>>) -> AppResult<Option<Option<String>>> {
    match phone {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(raw)) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(Some(None));
            }
            let valid = (10..=15).contains(&raw.len()) && raw.chars().all(|c| c.is_ascii_digit());
            if !valid {
                return Err(AppError::Validation(
                    "Phone number must be 10-15 digits".into(),
                ));
            }
            Ok(Some(Some(raw.to_string())))
        }
    }
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let found = find_user(state, user.user_id).await?;
    Ok(ApiResponse::ok("Profile", found.into()))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let changes = UserChanges::from_profile(payload)?;
    let existing = find_user(state, user.user_id).await?;

    let mut active: users::ActiveModel = existing.into();
    changes.apply(&mut active);
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Profile updated successfully", updated.into()))
}

pub async fn list_users(
    state: &AppState,
    admin: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(admin)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(users::Column::CreatedAt);
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
        "Users",
        UserList { items },
        Meta::page(page, limit, total),
    ))
}

pub async fn get_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserWithAddresses>> {
    ensure_admin(admin)?;
    let found = find_user(state, id).await?;
    let addresses = address_service::addresses_for(&state.orm, id).await?;
    Ok(ApiResponse::ok(
        "User",
        UserWithAddresses {
            user: found.into(),
            addresses,
        },
    ))
}

pub async fn get_user_cart(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    ensure_admin(admin)?;
    find_user(state, id).await?;
    let cart = cart_service::cart_for(&state.pool, id).await?;
    Ok(ApiResponse::ok("Cart", cart))
}

pub async fn get_user_saved(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    list: SavedList,
) -> AppResult<ApiResponse<SavedProductList>> {
    ensure_admin(admin)?;
    find_user(state, id).await?;
    let items = saved_service::list_for(&state.pool, list, id).await?;
    Ok(ApiResponse::ok(list.label(), SavedProductList { items }))
}

pub async fn update_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: AdminUpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(admin)?;
    let changes = UserChanges::from_admin(payload)?;
    let existing = find_user(state, id).await?;

    let mut active: users::ActiveModel = existing.into();
    changes.apply(&mut active);
    let updated = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from(e).conflict_on_unique("Email is already in use"))?;

    tracing::info!(user_id = %id, admin_id = %admin.user_id, "user updated by admin");

    Ok(ApiResponse::ok("User updated successfully", updated.into()))
}

/// Delete a user with everything they own. Stock log rows they wrote are kept
/// with the actor cleared.
pub async fn delete_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(admin)?;
    if admin.user_id == id {
        return Err(AppError::Forbidden(
            "You cannot delete your own account".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let target = Users::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    StockLogs::update_many()
        .col_expr(stock_logs::Column::UpdatedBy, Expr::value(Option::<Uuid>::None))
        .filter(stock_logs::Column::UpdatedBy.eq(id))
        .exec(&txn)
        .await?;

    let order_ids: Vec<Uuid> = Orders::find()
        .filter(orders::Column::UserId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();
    if !order_ids.is_empty() {
        OrderItems::delete_many()
            .filter(order_items::Column::OrderId.is_in(order_ids))
            .exec(&txn)
            .await?;
    }
    Orders::delete_many()
        .filter(orders::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    CartItems::delete_many()
        .filter(cart_items::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    Favorites::delete_many()
        .filter(favorites::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    Wishlist::delete_many()
        .filter(wishlist::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    Addresses::delete_many()
        .filter(addresses::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    target.delete(&txn).await?;

    txn.commit().await?;

    tracing::info!(user_id = %id, admin_id = %admin.user_id, "user deleted");

    Ok(ApiResponse::message_only("User deleted successfully"))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<users::Model> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_requires_at_least_one_field() {
        let err = UserChanges::from_profile(UpdateProfileRequest::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn blank_or_null_phone_clears_the_number() {
        for phone in [None, Some(String::new()), Some("   ".to_string())] {
            let changes = UserChanges::from_profile(UpdateProfileRequest {
                name: None,
                phone_number: Some(phone),
            })
            .unwrap();
            assert_eq!(changes.phone_number, Some(None));
        }
    }

    #[test]
    fn phone_must_be_ten_to_fifteen_digits() {
        for bad in ["12345", "12345678901234567", "98765-43210"] {
            let err = UserChanges::from_profile(UpdateProfileRequest {
                name: None,
                phone_number: Some(Some(bad.to_string())),
            })
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{bad}");
        }

        let ok = UserChanges::from_profile(UpdateProfileRequest {
            name: None,
            phone_number: Some(Some("9876543210".into())),
        })
        .unwrap();
        assert_eq!(ok.phone_number, Some(Some("9876543210".into())));
    }

    #[test]
    fn name_is_trimmed_and_must_not_be_blank() {
        let changes = UserChanges::from_profile(UpdateProfileRequest {
            name: Some("  Ravi  ".into()),
            phone_number: None,
        })
        .unwrap();
        assert_eq!(changes.name.as_deref(), Some("Ravi"));
        assert_eq!(changes.phone_number, None);

        let err = UserChanges::from_profile(UpdateProfileRequest {
            name: Some("   ".into()),
            phone_number: None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn admin_changes_validate_email_and_keep_role() {
        let changes = UserChanges::from_admin(AdminUpdateUserRequest {
            email: Some(" Farmer@Example.com ".into()),
            role: Some(Role::Admin),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.email.as_deref(), Some("farmer@example.com"));
        assert_eq!(changes.role, Some(Role::Admin));

        let err = UserChanges::from_admin(AdminUpdateUserRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = UserChanges::from_admin(AdminUpdateUserRequest::default()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
