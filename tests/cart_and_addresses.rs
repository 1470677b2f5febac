mod common;

use agri_ecommerce_api::{
    dto::{
        addresses::AddressRequest,
        cart::{AddToCartRequest, MAX_CART_QUANTITY, UpdateCartItemRequest},
        saved::SaveProductRequest,
    },
    error::AppError,
    services::{
        address_service, cart_service,
        saved_service::{self, SavedList},
    },
};
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{create_product, create_user, test_state};

fn address(house: &str) -> AddressRequest {
    AddressRequest {
        house_name: house.to_string(),
        area_street_sector_village: "Main Road".into(),
        landmark: Some("Near the mandi".into()),
        pincode: "411001".into(),
        town_city: "Pune".into(),
        state: "Maharashtra".into(),
    }
}

#[tokio::test]
async fn adding_the_same_product_twice_sums_into_one_line() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;
    let product = create_product(&state, "Okra", Decimal::new(600, 2), 50).await?;

    let first = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 2,
        },
    )
    .await?;
    assert!(first.inserted);
    assert_eq!(first.item.quantity, 2);

    let second = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;
    assert!(!second.inserted);
    assert_eq!(second.item.cart_item_id, first.item.cart_item_id);
    assert_eq!(second.item.quantity, 5);

    let cart = cart_service::get_cart(&state.pool, &user)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, Decimal::new(3000, 2));
    Ok(())
}

#[tokio::test]
async fn cart_rejects_unknown_products_and_zero_quantity() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;

    let err = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let product = create_product(&state, "Peas", Decimal::new(700, 2), 5).await?;
    let err = cart_service::add_to_cart(
        &state.pool,
        &user,
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn quantity_updates_are_bounded_by_stock_and_ownership() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, "user").await?;
    let stranger = create_user(&state, "user").await?;
    let product = create_product(&state, "Beans", Decimal::new(800, 2), 4).await?;
    let line = cart_service::add_to_cart(
        &state.pool,
        &owner,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?
    .item;

    let err = cart_service::update_quantity(
        &state.pool,
        &owner,
        line.cart_item_id,
        UpdateCartItemRequest { quantity: 5 },
    )
    .await
    .unwrap_err();
    let AppError::StockInsufficient(issues) = err else {
        panic!("expected stock error, got {err:?}");
    };
    assert_eq!(issues[0].available_stock, 4);

    let err = cart_service::update_quantity(
        &state.pool,
        &stranger,
        line.cart_item_id,
        UpdateCartItemRequest { quantity: 2 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let updated = cart_service::update_quantity(
        &state.pool,
        &owner,
        line.cart_item_id,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await?
    .data
    .expect("item");
    assert_eq!(updated.quantity, 4);

    cart_service::remove_item(&state.pool, &owner, line.cart_item_id).await?;
    let err = cart_service::remove_item(&state.pool, &owner, line.cart_item_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn exactly_one_default_address_is_maintained() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;

    let first = address_service::create_address(&state, &user, address("A-1"))
        .await?
        .data
        .expect("address");
    let second = address_service::create_address(&state, &user, address("B-2"))
        .await?
        .data
        .expect("address");
    let third = address_service::create_address(&state, &user, address("C-3"))
        .await?
        .data
        .expect("address");
    assert!(first.is_default);
    assert!(!second.is_default);

    address_service::set_default_address(&state, &user, third.id).await?;
    let listed = address_service::list_addresses(&state, &user)
        .await?
        .data
        .expect("addresses")
        .items;
    assert_eq!(listed.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(listed[0].id, third.id);

    address_service::delete_address(&state, &user, third.id).await?;
    let listed = address_service::list_addresses(&state, &user)
        .await?
        .data
        .expect("addresses")
        .items;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed.iter().filter(|a| a.is_default).count(), 1);
    assert_eq!(listed[0].id, first.id);
    Ok(())
}

#[tokio::test]
async fn setting_a_foreign_address_as_default_changes_nothing() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, "user").await?;
    let intruder = create_user(&state, "user").await?;
    let home = address_service::create_address(&state, &owner, address("Farmhouse"))
        .await?
        .data
        .expect("address");
    let own = address_service::create_address(&state, &intruder, address("Flat 9"))
        .await?
        .data
        .expect("address");

    let err = address_service::set_default_address(&state, &intruder, home.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let listed = address_service::list_addresses(&state, &intruder)
        .await?
        .data
        .expect("addresses")
        .items;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, own.id);
    assert!(listed[0].is_default);
    Ok(())
}

#[tokio::test]
async fn favorites_reject_duplicates_and_unknown_products() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;
    let product = create_product(&state, "Ginger", Decimal::new(1300, 2), 9).await?;

    saved_service::add(
        &state.pool,
        SavedList::Favorites,
        &user,
        SaveProductRequest {
            product_id: product.id,
        },
    )
    .await?;

    let err = saved_service::add(
        &state.pool,
        SavedList::Favorites,
        &user,
        SaveProductRequest {
            product_id: product.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = saved_service::add(
        &state.pool,
        SavedList::Wishlist,
        &user,
        SaveProductRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let favorites = saved_service::list(&state.pool, SavedList::Favorites, &user)
        .await?
        .data
        .expect("favorites")
        .items;
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].product.id, product.id);

    saved_service::remove(&state.pool, SavedList::Favorites, &user, product.id).await?;
    let err = saved_service::remove(&state.pool, SavedList::Favorites, &user, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn oversized_cart_quantities_are_validation_errors() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;
    let product = create_product(&state, "Maize", Decimal::new(150, 2), 10).await?;
    let add = |quantity| AddToCartRequest {
        product_id: product.id,
        quantity,
    };

    let err = cart_service::add_to_cart(&state.pool, &user, add(i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let line = cart_service::add_to_cart(&state.pool, &user, add(MAX_CART_QUANTITY - 1)).await?;
    let err = cart_service::add_to_cart(&state.pool, &user, add(2))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // a line that is already huge must not overflow the column either
    sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
        .bind(i32::MAX - 1)
        .bind(line.item.cart_item_id)
        .execute(&state.pool)
        .await?;
    let err = cart_service::add_to_cart(&state.pool, &user, add(MAX_CART_QUANTITY))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let (quantity,): (i32,) = sqlx::query_as("SELECT quantity FROM cart_items WHERE id = $1")
        .bind(line.item.cart_item_id)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(quantity, i32::MAX - 1);
    Ok(())
}
