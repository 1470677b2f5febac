use agri_ecommerce_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    inventory::{INITIAL_STOCK_REASON, StockChange},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

const CATEGORIES: &[(&str, &str)] = &[
    ("Seeds", "Certified seeds for field and kitchen gardens"),
    ("Fertilizers", "Organic and mineral plant nutrition"),
    ("Tools", "Hand tools and small equipment"),
];

// (name, description, price in paise, stock, category)
const PRODUCTS: &[(&str, &str, i64, i32, &str)] = &[
    ("Hybrid Tomato Seeds", "High-yield hybrid, 10 g pack", 14900, 120, "Seeds"),
    ("Basmati Paddy Seeds", "Aromatic long grain, 5 kg bag", 89900, 40, "Seeds"),
    ("Vermicompost", "Organic compost, 25 kg bag", 52000, 60, "Fertilizers"),
    ("NPK 19-19-19", "Water-soluble fertilizer, 1 kg", 18500, 8, "Fertilizers"),
    ("Pruning Shears", "Carbon steel blades", 45000, 25, "Tools"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Store Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "Demo Farmer", "user@example.com", "user123", "user").await?;
    seed_categories(&pool).await?;
    seed_products(&pool, admin_id).await?;

    pool.close().await;
    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, is_verified)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (name, description) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }
    println!("Seeded categories");
    Ok(())
}

/// Products are created once, each with the initial stock log row.
async fn seed_products(pool: &sqlx::PgPool, admin_id: Uuid) -> anyhow::Result<()> {
    for (name, description, paise, stock, category) in PRODUCTS {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        let mut tx = pool.begin().await?;
        let product_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, category_id)
            VALUES ($1, $2, $3, $4, $5, (SELECT id FROM categories WHERE name = $6))
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(description)
        .bind(Decimal::new(*paise, 2))
        .bind(stock)
        .bind(category)
        .execute(&mut *tx)
        .await?;

        let change = StockChange::between(0, *stock);
        sqlx::query(
            r#"
            INSERT INTO stock_logs
                (id, product_id, previous_stock, new_stock, change_amount, change_type, reason, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(change.previous_stock)
        .bind(change.new_stock)
        .bind(change.change_amount)
        .bind(change.change_type.as_str())
        .bind(INITIAL_STOCK_REASON)
        .bind(admin_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    }

    println!("Seeded products");
    Ok(())
}
