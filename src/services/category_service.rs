use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::categories::{
        CategoryList, CategoryWithProducts, CreateCategoryRequest, UpdateCategoryRequest,
    },
    entity::{Categories, Products, categories, products},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product},
    response::ApiResponse,
    state::AppState,
};

const DUPLICATE_NAME: &str = "A category with this name already exists";

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(categories::Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok("Categories", CategoryList { items }))
}

pub async fn get_category(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<CategoryWithProducts>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let products = category
        .find_related(Products)
        .order_by_desc(products::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| Product::from_entity(p, Some(category.name.clone())))
        .collect();

    Ok(ApiResponse::ok(
        "Category",
        CategoryWithProducts {
            category: category.into(),
            products,
        },
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from(e).conflict_on_unique(DUPLICATE_NAME))?;

    Ok(ApiResponse::ok("Category created", category.into()))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let mut active: categories::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }

    let category = active
        .update(&state.orm)
        .await
        .map_err(|e| AppError::from(e).conflict_on_unique(DUPLICATE_NAME))?;

    Ok(ApiResponse::ok("Category updated", category.into()))
}

/// Products of a deleted category stay in the catalogue without a category.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = Categories::delete_many()
        .filter(categories::Column::Id.eq(id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Category"));
    }

    Ok(ApiResponse::message_only("Category deleted successfully"))
}
