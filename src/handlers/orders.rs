use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::AuthUser;
use crate::entities::order::{self, OrderStatus};
use crate::errors::ServiceError;
use crate::services::orders::{OrderWithDetails, OrderWithInvoice};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim())
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status: {raw}")))
}

/// Converts the caller's cart into an order plus invoice.
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<OrderWithInvoice> {
    let created = state.services.orders.create_order_from_cart(user.id).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<OrderWithDetails>> {
    let orders = state.services.orders.list_user_orders(user.id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// One order. Customers only see their own; a foreign id reads as missing.
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i32>,
) -> ApiResult<OrderWithDetails> {
    let found = state.services.orders.get_order(order_id).await?;

    if !user.is_admin() && found.order.user_id != user.id {
        return Err(ServiceError::NotFound(format!(
            "Order {} not found",
            order_id
        )));
    }

    Ok(Json(ApiResponse::success(found)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Vec<order::Model>> {
    user.require_admin()?;

    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = state.services.orders.list_orders(status).await?;
    Ok(Json(ApiResponse::success(orders)))
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i32>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<order::Model> {
    user.require_admin()?;

    let status = parse_status(&body.status)?;
    let updated = state
        .services
        .orders
        .update_order_status(order_id, status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i32>,
) -> ApiResult<i32> {
    user.require_admin()?;

    let deleted = state.services.orders.delete_order(order_id).await?;
    Ok(Json(ApiResponse::success(deleted)))
}
