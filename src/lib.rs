//! Liquor store commerce API
//!
//! Catalog, cart and order placement backend. Order creation is the core:
//! it converts a cart into an order, decrements stock and issues an invoice
//! inside one database transaction.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: auth::AuthService,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

async fn health(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    db::check_connection(&state.db).await?;
    Ok(Json(ApiResponse::success(json!({ "status": "ok" }))))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn api_v1_routes() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me));

    let user_routes = Router::new()
        .route("/users", get(handlers::auth::list_users))
        .route("/users/:id", delete(handlers::auth::delete_user));

    let product_routes = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/products/search", get(handlers::products::search_products))
        .route(
            "/products/category/:category_id",
            get(handlers::products::list_by_category),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/products/:id/stock", put(handlers::products::set_stock));

    let category_routes = Router::new()
        .route(
            "/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/categories/:id",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        );

    let cart_routes = Router::new()
        .route(
            "/cart",
            get(handlers::carts::get_cart).delete(handlers::carts::clear_cart),
        )
        .route("/cart/items", post(handlers::carts::add_item))
        .route(
            "/cart/items/:product_id",
            put(handlers::carts::update_quantity).delete(handlers::carts::remove_item),
        );

    let order_routes = Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/mine", get(handlers::orders::my_orders))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/status", put(handlers::orders::update_status));

    let invoice_routes = Router::new()
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/mine", get(handlers::invoices::my_invoices))
        .route("/invoices/:id", get(handlers::invoices::get_invoice))
        .route(
            "/invoices/order/:order_id",
            get(handlers::invoices::get_invoice_by_order),
        );

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(product_routes)
        .merge(category_routes)
        .merge(cart_routes)
        .merge(order_routes)
        .merge(invoice_routes)
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_wraps_data() {
        let response = ApiResponse::success(41 + 1);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
    }
}
