use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::entities::cart_item;
use crate::services::carts::CartView;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: i32,
}

pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> ApiResult<CartView> {
    let cart = state.services.carts.get_cart(user.id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<AddItemBody>,
) -> ApiResult<cart_item::Model> {
    let saved = state
        .services
        .carts
        .add_item(user.id, body.product_id, body.quantity)
        .await?;
    Ok(Json(ApiResponse::success(saved)))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
    Json(body): Json<UpdateQuantityBody>,
) -> ApiResult<cart_item::Model> {
    let updated = state
        .services
        .carts
        .update_quantity(user.id, product_id, body.quantity)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
) -> ApiResult<i32> {
    state.services.carts.remove_item(user.id, product_id).await?;
    Ok(Json(ApiResponse::success(product_id)))
}

pub async fn clear_cart(State(state): State<AppState>, user: AuthUser) -> ApiResult<u64> {
    let removed = state.services.carts.clear_cart(user.id).await?;
    Ok(Json(ApiResponse::success(removed)))
}
