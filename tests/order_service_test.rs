mod common;

use assert_matches::assert_matches;
use chrono::Datelike;
use common::TestApp;
use liquorstore_api::{
    entities::{
        cart_item, invoice, order::OrderStatus, order_detail, CartItem, Invoice, Order,
        OrderDetail, Product,
    },
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

async fn product_stock(app: &TestApp, product_id: i32) -> i32 {
    Product::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .expect("query failed")
        .expect("product missing")
        .stock
}

async fn cart_rows(app: &TestApp, user_id: i32) -> usize {
    CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(&*app.state.db)
        .await
        .expect("query failed")
        .len()
}

async fn order_count(app: &TestApp) -> usize {
    Order::find()
        .all(&*app.state.db)
        .await
        .expect("query failed")
        .len()
}

async fn invoice_count(app: &TestApp) -> usize {
    Invoice::find()
        .all(&*app.state.db)
        .await
        .expect("query failed")
        .len()
}

#[tokio::test]
async fn order_from_cart_decrements_stock_and_issues_invoice() {
    let app = TestApp::new().await;
    let user = app.seed_user("Ana", "ana@example.com").await;
    let product = app.seed_product("Malbec Reserva", dec!(10.00), 5, true).await;
    app.seed_cart_item(user.id, product.id, 2).await;

    let created = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect("order creation should succeed");

    assert_eq!(created.order.total, dec!(20.00));
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.order.user_id, user.id);

    assert_eq!(created.details.len(), 1);
    let line = &created.details[0];
    assert_eq!(line.order_id, created.order.id);
    assert_eq!(line.product_id, product.id);
    assert_eq!(line.product_name, "Malbec Reserva");
    assert_eq!(line.quantity, 2);
    assert_eq!(line.unit_price, dec!(10.00));
    assert_eq!(line.subtotal, dec!(20.00));

    // Stock decremented by exactly the ordered quantity, cart emptied
    assert_eq!(product_stock(&app, product.id).await, 3);
    assert_eq!(cart_rows(&app, user.id).await, 0);

    // Invoice references the order, carries its total and the customer
    // snapshot
    assert_eq!(created.invoice.order_id, created.order.id);
    assert_eq!(created.invoice.total, dec!(20.00));
    assert_eq!(created.invoice.customer_name, "Ana");
    assert_eq!(created.invoice.customer_email, "ana@example.com");
    assert_eq!(
        created.invoice.invoice_number,
        format!(
            "INV-{}-{:06}",
            created.order.created_at.year(),
            created.order.id
        )
    );
}

#[tokio::test]
async fn insufficient_stock_aborts_without_side_effects() {
    let app = TestApp::new().await;
    let user = app.seed_user("Bruno", "bruno@example.com").await;
    let product = app.seed_product("Gin Andino", dec!(15.50), 1, true).await;
    app.seed_cart_item(user.id, product.id, 2).await;

    let err = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect_err("order creation should fail");

    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    );

    // Nothing written, nothing decremented, cart untouched
    assert_eq!(product_stock(&app, product.id).await, 1);
    assert_eq!(order_count(&app).await, 0);
    assert_eq!(invoice_count(&app).await, 0);
    assert_eq!(cart_rows(&app, user.id).await, 1);
}

#[tokio::test]
async fn multi_item_cart_is_all_or_nothing() {
    let app = TestApp::new().await;
    let user = app.seed_user("Carla", "carla@example.com").await;
    let plentiful = app.seed_product("Vermut Rosso", dec!(8.00), 10, true).await;
    let scarce = app.seed_product("Whisky Turba", dec!(60.00), 1, true).await;
    app.seed_cart_item(user.id, plentiful.id, 1).await;
    app.seed_cart_item(user.id, scarce.id, 5).await;

    let err = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect_err("order creation should fail");

    assert_matches!(err, ServiceError::InsufficientStock { .. });

    // The shortage on one line left every other line's stock alone
    assert_eq!(product_stock(&app, plentiful.id).await, 10);
    assert_eq!(product_stock(&app, scarce.id).await, 1);
    assert_eq!(order_count(&app).await, 0);
    assert_eq!(invoice_count(&app).await, 0);
    assert_eq!(cart_rows(&app, user.id).await, 2);
}

#[tokio::test]
async fn empty_cart_fails_the_same_way_twice() {
    let app = TestApp::new().await;
    let user = app.seed_user("Diego", "diego@example.com").await;

    for _ in 0..2 {
        let err = app
            .state
            .services
            .orders
            .create_order_from_cart(user.id)
            .await
            .expect_err("empty cart should fail");
        assert_matches!(err, ServiceError::EmptyCart);
    }

    assert_eq!(order_count(&app).await, 0);
}

#[tokio::test]
async fn inactive_products_are_excluded_from_the_order() {
    let app = TestApp::new().await;
    let user = app.seed_user("Elena", "elena@example.com").await;
    let retired = app.seed_product("Licor Retirado", dec!(5.00), 10, false).await;
    app.seed_cart_item(user.id, retired.id, 1).await;

    // A cart holding only inactive products prices as empty
    let err = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect_err("inactive-only cart should fail");
    assert_matches!(err, ServiceError::EmptyCart);

    // Mixed cart: the inactive line is skipped, the rest is ordered, and the
    // cart clear removes both rows
    let active = app.seed_product("Ron Añejo", dec!(12.00), 4, true).await;
    app.seed_cart_item(user.id, active.id, 2).await;

    let created = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect("order creation should succeed");

    assert_eq!(created.order.total, dec!(24.00));
    assert_eq!(created.details.len(), 1);
    assert_eq!(created.details[0].product_id, active.id);
    assert_eq!(product_stock(&app, retired.id).await, 10);
    assert_eq!(cart_rows(&app, user.id).await, 0);
}

#[tokio::test]
async fn concurrent_orders_for_the_last_unit_admit_exactly_one() {
    let app = TestApp::new().await;
    let first = app.seed_user("Fran", "fran@example.com").await;
    let second = app.seed_user("Gabi", "gabi@example.com").await;
    let product = app.seed_product("Botella Final", dec!(99.90), 1, true).await;
    app.seed_cart_item(first.id, product.id, 1).await;
    app.seed_cart_item(second.id, product.id, 1).await;

    let orders = app.state.services.orders.clone();
    let (r1, r2) = tokio::join!(
        orders.create_order_from_cart(first.id),
        orders.create_order_from_cart(second.id)
    );

    let oks = r1.is_ok() as usize + r2.is_ok() as usize;
    assert_eq!(oks, 1, "exactly one order should win the last unit");

    let loser = if r1.is_err() {
        r1.unwrap_err()
    } else {
        r2.unwrap_err()
    };
    assert_matches!(loser, ServiceError::InsufficientStock { requested: 1, .. });

    // Never negative
    assert_eq!(product_stock(&app, product.id).await, 0);
    assert_eq!(order_count(&app).await, 1);
    assert_eq!(invoice_count(&app).await, 1);
}

#[tokio::test]
async fn deleting_an_order_restores_stock_and_cascades() {
    let app = TestApp::new().await;
    let user = app.seed_user("Hugo", "hugo@example.com").await;
    let d = app.seed_product("Cerveza Negra", dec!(3.50), 10, true).await;
    let e = app.seed_product("Sidra Brut", dec!(6.00), 5, true).await;
    app.seed_cart_item(user.id, d.id, 3).await;
    app.seed_cart_item(user.id, e.id, 1).await;

    let created = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect("order creation should succeed");

    assert_eq!(product_stock(&app, d.id).await, 7);
    assert_eq!(product_stock(&app, e.id).await, 4);

    let deleted = app
        .state
        .services
        .orders
        .delete_order(created.order.id)
        .await
        .expect("deletion should succeed");
    assert_eq!(deleted, created.order.id);

    // Stock back to its pre-order values
    assert_eq!(product_stock(&app, d.id).await, 10);
    assert_eq!(product_stock(&app, e.id).await, 5);

    // Order, details and invoice all gone
    assert!(Order::find_by_id(created.order.id)
        .one(&*app.state.db)
        .await
        .expect("query failed")
        .is_none());
    assert_eq!(
        OrderDetail::find()
            .filter(order_detail::Column::OrderId.eq(created.order.id))
            .all(&*app.state.db)
            .await
            .expect("query failed")
            .len(),
        0
    );
    assert_eq!(
        Invoice::find()
            .filter(invoice::Column::OrderId.eq(created.order.id))
            .all(&*app.state.db)
            .await
            .expect("query failed")
            .len(),
        0
    );
}

#[tokio::test]
async fn deleting_an_order_skips_vanished_products() {
    let app = TestApp::new().await;
    let user = app.seed_user("Inés", "ines@example.com").await;
    let product = app.seed_product("Edición Limitada", dec!(20.00), 5, true).await;
    app.seed_cart_item(user.id, product.id, 2).await;

    let created = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect("order creation should succeed");

    // The product disappears from the catalog after the sale
    Product::delete_by_id(product.id)
        .exec(&*app.state.db)
        .await
        .expect("product deletion should succeed");

    // Deletion still goes through; the restoration line is skipped
    app.state
        .services
        .orders
        .delete_order(created.order.id)
        .await
        .expect("deletion should succeed despite missing product");

    assert_eq!(order_count(&app).await, 0);
    assert_eq!(invoice_count(&app).await, 0);
}

#[tokio::test]
async fn invoice_numbers_are_unique_and_well_formed() {
    let app = TestApp::new().await;
    let first = app.seed_user("Juan", "juan@example.com").await;
    let second = app.seed_user("Karla", "karla@example.com").await;
    let product = app.seed_product("Vino de Mesa", dec!(4.00), 10, true).await;
    app.seed_cart_item(first.id, product.id, 1).await;
    app.seed_cart_item(second.id, product.id, 1).await;

    let a = app
        .state
        .services
        .orders
        .create_order_from_cart(first.id)
        .await
        .expect("first order should succeed");
    let b = app
        .state
        .services
        .orders
        .create_order_from_cart(second.id)
        .await
        .expect("second order should succeed");

    assert_ne!(a.invoice.invoice_number, b.invoice.invoice_number);
    for created in [&a, &b] {
        assert_eq!(
            created.invoice.invoice_number,
            format!(
                "INV-{}-{:06}",
                created.order.created_at.year(),
                created.order.id
            )
        );
    }
}

#[tokio::test]
async fn status_updates_are_permissive_and_stockless() {
    let app = TestApp::new().await;
    let user = app.seed_user("Lucía", "lucia@example.com").await;
    let product = app.seed_product("Aperitivo Rojo", dec!(7.25), 8, true).await;
    app.seed_cart_item(user.id, product.id, 2).await;

    let created = app
        .state
        .services
        .orders
        .create_order_from_cart(user.id)
        .await
        .expect("order creation should succeed");
    let order_id = created.order.id;
    let orders = &app.state.services.orders;

    // Any transition is accepted, including leaving delivered
    let delivered = orders
        .update_order_status(order_id, OrderStatus::Delivered)
        .await
        .expect("update should succeed");
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let reopened = orders
        .update_order_status(order_id, OrderStatus::Pending)
        .await
        .expect("update should succeed");
    assert_eq!(reopened.status, OrderStatus::Pending);

    // Total untouched, stock untouched
    assert_eq!(reopened.total, created.order.total);
    assert_eq!(product_stock(&app, product.id).await, 6);

    let missing = orders
        .update_order_status(order_id + 999, OrderStatus::Shipped)
        .await
        .expect_err("unknown order should fail");
    assert_matches!(missing, ServiceError::NotFound(_));
}

#[tokio::test]
async fn deleting_an_unknown_order_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .orders
        .delete_order(424242)
        .await
        .expect_err("unknown order should fail");
    assert_matches!(err, ServiceError::NotFound(_));
}
