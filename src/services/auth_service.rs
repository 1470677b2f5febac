use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, SetPasswordRequest},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::{Role, User},
    response::ApiResponse,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Create a password account. E-mail ownership is confirmed out of band, so
/// accounts are stored as verified.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let exists = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".into(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(Some(password_hash)),
        google_id: Set(None),
        otp: Set(None),
        otp_expiry: Set(None),
        is_verified: Set(true),
        role: Set(Role::User.as_str().to_string()),
        phone_number: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| AppError::from(e).conflict_on_unique("User already exists with this email"))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::ok("User registered successfully", user.into()))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    let user = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    // accounts created through Google have no password until one is set
    let stored = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::BadRequest(INVALID_CREDENTIALS.into()))?;

    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest(INVALID_CREDENTIALS.into()));
    }

    if !user.is_verified {
        return Err(AppError::Forbidden(
            "Please verify your email before logging in".into(),
        ));
    }

    let token = issue_token(
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
        &user,
    )?;

    tracing::debug!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            user: user.into(),
        },
    ))
}

pub async fn set_password(
    state: &AppState,
    user: &AuthUser,
    payload: SetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;

    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: users::ActiveModel = existing.into();
    active.password_hash = Set(Some(hash_password(&payload.password)?));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(ApiResponse::message_only("Password set successfully"))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
