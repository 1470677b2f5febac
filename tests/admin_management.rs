mod common;

use agri_ecommerce_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        categories::CreateCategoryRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        users::UpdateProfileRequest,
    },
    error::AppError,
    middleware::auth::verify_token,
    routes::params::OrderListQuery,
    services::{
        admin_service, auth_service, category_service, order_service, product_service,
        user_service,
    },
};
use rust_decimal::Decimal;

use common::{add_to_cart, create_product, create_user, test_state, unique};

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.to_string(),
    }
}

#[tokio::test]
async fn order_status_follows_the_lifecycle() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let product = create_product(&state, "Cabbage", Decimal::new(2200, 2), 6).await?;
    add_to_cart(&state, &user, product.id, 1).await?;
    let order_id = order_service::checkout(&state, &user, CheckoutRequest::default())
        .await?
        .order_id;

    let err = admin_service::update_order_status(&state, &admin, order_id, status("paid"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let shipped = admin_service::update_order_status(&state, &admin, order_id, status("shipped"))
        .await?
        .data
        .expect("order");
    assert_eq!(shipped.status, "shipped");

    let err = admin_service::update_order_status(&state, &admin, order_id, status("pending"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    admin_service::update_order_status(&state, &admin, order_id, status("delivered")).await?;

    let err = admin_service::update_order_status(&state, &user, order_id, status("cancelled"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let detail = admin_service::get_order_admin(&state, &admin, order_id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.order.order.status, "delivered");
    assert_eq!(detail.items.len(), 1);
    assert!(detail.order.user_email.is_some());

    let delivered = admin_service::list_all_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some("delivered".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    assert!(delivered.items.iter().any(|o| o.order.id == order_id));
    assert!(delivered.items.iter().all(|o| o.order.status == "delivered"));
    Ok(())
}

#[tokio::test]
async fn ordered_products_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let ordered = create_product(&state, "Spinach", Decimal::new(400, 2), 3).await?;
    let unsold = create_product(&state, "Kale", Decimal::new(450, 2), 3).await?;
    add_to_cart(&state, &user, ordered.id, 1).await?;
    order_service::checkout(&state, &user, CheckoutRequest::default()).await?;
    add_to_cart(&state, &user, unsold.id, 1).await?;

    let err = product_service::delete_product(&state, &admin, ordered.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    product_service::delete_product(&state, &admin, unsold.id).await?;
    let err = product_service::get_product(&state, unsold.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_category_names_conflict() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let name = unique("Pulses");
    let request = || CreateCategoryRequest {
        name: name.clone(),
        description: None,
        image_url: None,
    };

    category_service::create_category(&state, &admin, request()).await?;
    let err = category_service::create_category(&state, &admin, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_data_but_keeps_stock_history() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;
    let product = create_product(&state, "Carrot", Decimal::new(350, 2), 10).await?;
    add_to_cart(&state, &user, product.id, 2).await?;
    order_service::checkout(&state, &user, CheckoutRequest::default()).await?;

    let err = user_service::delete_user(&state, &admin, admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    user_service::delete_user(&state, &admin, user.user_id).await?;

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(orders, 0);

    let (logs, anonymous): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE updated_by IS NULL) FROM stock_logs WHERE product_id = $1",
    )
    .bind(product.id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!((logs, anonymous), (1, 1));
    Ok(())
}

#[tokio::test]
async fn register_login_and_profile_round_trip() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let email = format!("{}@example.com", unique("farmer"));

    let user = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Lakshmi".into(),
            email: email.clone(),
            password: "paddy-field".into(),
        },
    )
    .await?
    .data
    .expect("user");
    assert!(user.has_password);

    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Lakshmi".into(),
            email: email.clone(),
            password: "paddy-field".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email,
            password: "paddy-field".into(),
        },
    )
    .await?
    .data
    .expect("login");
    let auth = verify_token(&state.config.jwt_secret, &login.token)?;
    assert_eq!(auth.user_id, user.id);

    let profile = user_service::update_profile(
        &state,
        &auth,
        UpdateProfileRequest {
            name: None,
            phone_number: Some(Some("9876543210".into())),
        },
    )
    .await?
    .data
    .expect("profile");
    assert_eq!(profile.phone_number.as_deref(), Some("9876543210"));
    assert_eq!(profile.name, "Lakshmi");

    let cleared = user_service::update_profile(
        &state,
        &auth,
        UpdateProfileRequest {
            name: None,
            phone_number: Some(None),
        },
    )
    .await?
    .data
    .expect("profile");
    assert_eq!(cleared.phone_number, None);
    Ok(())
}
