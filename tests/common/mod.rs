#![allow(dead_code)]

use agri_ecommerce_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    entity::{products, users},
    middleware::auth::AuthUser,
    services::cart_service,
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies migrations.
///
/// Returns `None` when no database is configured so the caller can skip.
/// Tests never truncate: every fixture is uniquely named.
pub async fn test_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let config = AppConfig::for_tests(database_url);
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool, config)))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique("tester")),
        email: Set(format!("{}@example.com", unique(role))),
        password_hash: Set(None),
        google_id: Set(None),
        otp: Set(None),
        otp_expiry: Set(None),
        is_verified: Set(true),
        role: Set(role.to_string()),
        phone_number: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        description: Set(None),
        price: Set(price),
        category_id: Set(None),
        stock: Set(stock),
        image_url: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        &state.pool,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(stock)
}

pub async fn log_count(state: &AppState, product_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock_logs WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

pub async fn cart_len(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

pub async fn order_count(state: &AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}
