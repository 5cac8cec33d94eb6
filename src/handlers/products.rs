use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::entities::product;
use crate::services::products::{CreateProductInput, ProductPatch};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStockBody {
    pub stock: i32,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.list(query.active).await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.search(&query.q).await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> ApiResult<Vec<product::Model>> {
    let products = state.services.products.list_by_category(category_id).await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> ApiResult<product::Model> {
    let found = state.services.products.get(product_id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateProductInput>,
) -> ApiResult<product::Model> {
    user.require_admin()?;
    let created = state.services.products.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<product::Model> {
    user.require_admin()?;
    let updated = state.services.products.update(product_id, patch).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn set_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
    Json(body): Json<SetStockBody>,
) -> ApiResult<product::Model> {
    user.require_admin()?;
    let updated = state
        .services
        .products
        .set_stock(product_id, body.stock)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i32>,
) -> ApiResult<i32> {
    user.require_admin()?;
    state.services.products.delete(product_id).await?;
    Ok(Json(ApiResponse::success(product_id)))
}
