mod common;

use assert_matches::assert_matches;
use common::TestApp;
use liquorstore_api::errors::ServiceError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn adding_the_same_product_accumulates_quantity() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ana", "ana@example.com").await;
    let product = app.seed_product("Malbec Reserva", dec!(10.00), 10, true).await;
    let carts = &app.state.services.carts;

    carts
        .add_item(user.id, product.id, 2)
        .await
        .expect("first add should succeed");
    let merged = carts
        .add_item(user.id, product.id, 3)
        .await
        .expect("second add should succeed");

    assert_eq!(merged.quantity, 5);

    let view = carts.get_cart(user.id).await.expect("cart should load");
    assert_eq!(view.items_count, 1);
    assert_eq!(view.items[0].quantity, 5);
    assert_eq!(view.total, dec!(50.00));
}

#[tokio::test]
async fn accumulated_quantity_is_gated_by_stock() {
    let app = TestApp::new().await;
    let user = app.seed_user("Bruno", "bruno@example.com").await;
    let product = app.seed_product("Gin Andino", dec!(15.50), 4, true).await;
    let carts = &app.state.services.carts;

    carts
        .add_item(user.id, product.id, 3)
        .await
        .expect("first add should succeed");

    // 3 already in the cart + 2 more exceeds the 4 in stock
    let err = carts
        .add_item(user.id, product.id, 2)
        .await
        .expect_err("overflowing add should fail");

    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 4,
            requested: 5,
            ..
        }
    );
}

#[tokio::test]
async fn inactive_and_unknown_products_cannot_be_added() {
    let app = TestApp::new().await;
    let user = app.seed_user("Carla", "carla@example.com").await;
    let retired = app.seed_product("Licor Retirado", dec!(5.00), 10, false).await;
    let carts = &app.state.services.carts;

    let err = carts
        .add_item(user.id, retired.id, 1)
        .await
        .expect_err("inactive product should be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = carts
        .add_item(user.id, 9999, 1)
        .await
        .expect_err("unknown product should be rejected");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = carts
        .add_item(user.id, retired.id, 0)
        .await
        .expect_err("zero quantity should be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn update_quantity_replaces_and_respects_stock() {
    let app = TestApp::new().await;
    let user = app.seed_user("Diego", "diego@example.com").await;
    let product = app.seed_product("Vermut Rosso", dec!(8.00), 5, true).await;
    let carts = &app.state.services.carts;

    carts
        .add_item(user.id, product.id, 1)
        .await
        .expect("add should succeed");

    let updated = carts
        .update_quantity(user.id, product.id, 4)
        .await
        .expect("update should succeed");
    assert_eq!(updated.quantity, 4);

    let err = carts
        .update_quantity(user.id, product.id, 6)
        .await
        .expect_err("over-stock update should fail");
    assert_matches!(err, ServiceError::InsufficientStock { available: 5, .. });

    let err = carts
        .update_quantity(user.id, 9999, 1)
        .await
        .expect_err("unknown product should fail");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn remove_and_clear() {
    let app = TestApp::new().await;
    let user = app.seed_user("Elena", "elena@example.com").await;
    let one = app.seed_product("Ron Añejo", dec!(12.00), 5, true).await;
    let two = app.seed_product("Sidra Brut", dec!(6.00), 5, true).await;
    let carts = &app.state.services.carts;

    carts.add_item(user.id, one.id, 1).await.expect("add");
    carts.add_item(user.id, two.id, 2).await.expect("add");

    carts
        .remove_item(user.id, one.id)
        .await
        .expect("remove should succeed");

    let err = carts
        .remove_item(user.id, one.id)
        .await
        .expect_err("removing twice should fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let removed = carts.clear_cart(user.id).await.expect("clear should succeed");
    assert_eq!(removed, 1);

    let view = carts.get_cart(user.id).await.expect("cart should load");
    assert_eq!(view.items_count, 0);
    assert_eq!(view.total, dec!(0));
}
