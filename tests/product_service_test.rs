mod common;

use assert_matches::assert_matches;
use common::TestApp;
use liquorstore_api::{
    errors::ServiceError,
    services::products::{CreateProductInput, ProductPatch},
};
use rust_decimal_macros::dec;

fn sample_input(name: &str) -> CreateProductInput {
    CreateProductInput {
        category_id: None,
        name: name.to_string(),
        description: Some("A bottle for testing".to_string()),
        price: dec!(19.99),
        stock: 10,
        image_url: None,
        active: true,
    }
}

#[tokio::test]
async fn create_and_get() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Pisco Reservado"))
        .await
        .expect("create should succeed");

    let fetched = products.get(created.id).await.expect("get should succeed");
    assert_eq!(fetched.name, "Pisco Reservado");
    assert_eq!(fetched.price, dec!(19.99));
    assert_eq!(fetched.stock, 10);
    assert!(fetched.active);
}

#[tokio::test]
async fn patch_applies_only_provided_fields() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Grappa Blanca"))
        .await
        .expect("create should succeed");

    let patch = ProductPatch {
        price: Some(dec!(24.50)),
        active: Some(false),
        ..Default::default()
    };
    let updated = products
        .update(created.id, patch)
        .await
        .expect("update should succeed");

    // Patched fields changed, everything else kept
    assert_eq!(updated.price, dec!(24.50));
    assert!(!updated.active);
    assert_eq!(updated.name, "Grappa Blanca");
    assert_eq!(updated.stock, 10);
    assert_eq!(updated.description.as_deref(), Some("A bottle for testing"));
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Amargo Serrano"))
        .await
        .expect("create should succeed");

    let err = products
        .update(created.id, ProductPatch::default())
        .await
        .expect_err("empty patch should fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn negative_values_are_rejected() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Fernet Clásico"))
        .await
        .expect("create should succeed");

    let err = products
        .update(
            created.id,
            ProductPatch {
                price: Some(dec!(-1.00)),
                ..Default::default()
            },
        )
        .await
        .expect_err("negative price should fail");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = products
        .set_stock(created.id, -5)
        .await
        .expect_err("negative stock should fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn set_stock_overrides_absolutely() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Cava Brut"))
        .await
        .expect("create should succeed");

    let updated = products
        .set_stock(created.id, 42)
        .await
        .expect("set_stock should succeed");
    assert_eq!(updated.stock, 42);
}

#[tokio::test]
async fn search_matches_name_and_skips_inactive() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    products
        .create(sample_input("Tempranillo Crianza"))
        .await
        .expect("create should succeed");
    let mut hidden = sample_input("Tempranillo Viejo");
    hidden.active = false;
    products.create(hidden).await.expect("create should succeed");

    let hits = products
        .search("Tempranillo")
        .await
        .expect("search should succeed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Tempranillo Crianza");

    let err = products
        .search("   ")
        .await
        .expect_err("blank search should fail");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn list_honors_the_active_filter() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    products
        .create(sample_input("Vodka Austral"))
        .await
        .expect("create should succeed");
    let mut retired = sample_input("Vodka Retirado");
    retired.active = false;
    products.create(retired).await.expect("create should succeed");

    assert_eq!(products.list(None).await.expect("list").len(), 2);
    assert_eq!(products.list(Some(true)).await.expect("list").len(), 1);
    assert_eq!(products.list(Some(false)).await.expect("list").len(), 1);
}

#[tokio::test]
async fn delete_removes_and_errors_on_missing() {
    let app = TestApp::new().await;
    let products = &app.state.services.products;

    let created = products
        .create(sample_input("Licor de Hierbas"))
        .await
        .expect("create should succeed");

    products
        .delete(created.id)
        .await
        .expect("delete should succeed");

    let err = products
        .delete(created.id)
        .await
        .expect_err("second delete should fail");
    assert_matches!(err, ServiceError::NotFound(_));
}
