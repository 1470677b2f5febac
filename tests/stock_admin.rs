mod common;

use agri_ecommerce_api::{
    dto::{
        products::CreateProductRequest,
        stock::{BatchStockEntry, BatchStockUpdateRequest, StockUpdateRequest},
    },
    error::AppError,
    inventory::{ChangeType, INITIAL_STOCK_REASON},
    services::{product_service, stock_service},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{create_product, create_user, log_count, stock_of, test_state, unique};

#[tokio::test]
async fn single_update_is_logged_with_actor_and_reason() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let product = create_product(&state, "Wheat", Decimal::new(3000, 2), 20).await?;

    let updated = stock_service::update_stock(
        &state,
        &admin,
        product.id,
        StockUpdateRequest {
            stock: 5,
            reason: Some("Spoilage".into()),
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(updated.stock, 5);

    let history = stock_service::get_stock_history(&state, &admin, product.id)
        .await?
        .data
        .expect("history")
        .items;
    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(entry.previous_stock, 20);
    assert_eq!(entry.new_stock, 5);
    assert_eq!(entry.change_amount, 15);
    assert_eq!(entry.change_type, ChangeType::Decrease);
    assert_eq!(entry.reason.as_deref(), Some("Spoilage"));
    assert_eq!(entry.updated_by, Some(admin.user_id));
    assert!(entry.updated_by_name.is_some());
    Ok(())
}

#[tokio::test]
async fn unchanged_stock_is_logged_as_increase_of_zero() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let product = create_product(&state, "Barley", Decimal::new(2000, 2), 8).await?;

    stock_service::update_stock(
        &state,
        &admin,
        product.id,
        StockUpdateRequest {
            stock: 8,
            reason: None,
        },
    )
    .await?;

    let history = stock_service::get_stock_history(&state, &admin, product.id)
        .await?
        .data
        .expect("history")
        .items;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_type, ChangeType::Increase);
    assert_eq!(history[0].change_amount, 0);
    Ok(())
}

#[tokio::test]
async fn negative_or_unknown_single_updates_are_rejected() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let product = create_product(&state, "Millet", Decimal::new(1800, 2), 3).await?;

    let err = stock_service::update_stock(
        &state,
        &admin,
        product.id,
        StockUpdateRequest {
            stock: -1,
            reason: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = stock_service::update_stock(
        &state,
        &admin,
        Uuid::new_v4(),
        StockUpdateRequest {
            stock: 1,
            reason: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(stock_of(&state, product.id).await?, 3);
    assert_eq!(log_count(&state, product.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn batch_with_a_negative_entry_changes_nothing() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let first = create_product(&state, "Lentil", Decimal::new(1100, 2), 10).await?;
    let second = create_product(&state, "Chickpea", Decimal::new(1200, 2), 10).await?;

    let err = stock_service::batch_update_stock(
        &state,
        &admin,
        BatchStockUpdateRequest {
            updates: vec![
                BatchStockEntry {
                    id: first.id,
                    stock: 15,
                    reason: None,
                },
                BatchStockEntry {
                    id: second.id,
                    stock: -3,
                    reason: None,
                },
            ],
        },
    )
    .await
    .unwrap_err();
    let AppError::Validation(message) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(message.contains(&second.id.to_string()));

    assert_eq!(stock_of(&state, first.id).await?, 10);
    assert_eq!(stock_of(&state, second.id).await?, 10);
    assert_eq!(log_count(&state, first.id).await?, 0);
    assert_eq!(log_count(&state, second.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn batch_with_an_unknown_product_changes_nothing() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let known = create_product(&state, "Maize", Decimal::new(900, 2), 4).await?;
    let missing = Uuid::new_v4();

    let err = stock_service::batch_update_stock(
        &state,
        &admin,
        BatchStockUpdateRequest {
            updates: vec![
                BatchStockEntry {
                    id: known.id,
                    stock: 40,
                    reason: None,
                },
                BatchStockEntry {
                    id: missing,
                    stock: 1,
                    reason: None,
                },
            ],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref m) if m.contains(&missing.to_string())));

    assert_eq!(stock_of(&state, known.id).await?, 4);
    assert_eq!(log_count(&state, known.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_bad_request() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let err = stock_service::batch_update_stock(
        &state,
        &admin,
        BatchStockUpdateRequest { updates: vec![] },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn repeated_ids_in_a_batch_chain_and_history_is_newest_first() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let product = create_product(&state, "Soybean", Decimal::new(1400, 2), 10).await?;

    let updated = stock_service::batch_update_stock(
        &state,
        &admin,
        BatchStockUpdateRequest {
            updates: vec![
                BatchStockEntry {
                    id: product.id,
                    stock: 30,
                    reason: Some("Delivery".into()),
                },
                BatchStockEntry {
                    id: product.id,
                    stock: 25,
                    reason: Some("Damaged sacks".into()),
                },
            ],
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    assert_eq!(updated.len(), 2);
    assert_eq!(stock_of(&state, product.id).await?, 25);

    let history = stock_service::get_stock_history(&state, &admin, product.id)
        .await?
        .data
        .expect("history")
        .items;
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].previous_stock, history[0].new_stock), (30, 25));
    assert_eq!(history[0].change_type, ChangeType::Decrease);
    assert_eq!((history[1].previous_stock, history[1].new_stock), (10, 30));
    assert_eq!(history[1].change_type, ChangeType::Increase);
    Ok(())
}

#[tokio::test]
async fn created_products_log_their_initial_stock() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: unique("Turmeric"),
            description: Some("Sun-dried fingers".into()),
            price: Decimal::new(7500, 2),
            category_id: None,
            stock: 12,
            image_url: None,
        },
    )
    .await?
    .data
    .expect("product");

    let history = stock_service::get_stock_history(&state, &admin, product.id)
        .await?
        .data
        .expect("history")
        .items;
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].previous_stock, history[0].new_stock), (0, 12));
    assert_eq!(history[0].reason.as_deref(), Some(INITIAL_STOCK_REASON));

    let level = product_service::get_stock_level(&state, product.id)
        .await?
        .data
        .expect("level");
    assert_eq!(level.stock, 12);
    Ok(())
}

#[tokio::test]
async fn unknown_product_has_empty_history() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let history = stock_service::get_stock_history(&state, &admin, Uuid::new_v4())
        .await?
        .data
        .expect("history")
        .items;
    assert!(history.is_empty());
    Ok(())
}
