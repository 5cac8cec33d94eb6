use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::invoices::InvoiceWithOrder;
use crate::{ApiResponse, ApiResult, AppState};

pub async fn my_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<InvoiceWithOrder>> {
    let invoices = state.services.invoices.list_for_user(user.id).await?;
    Ok(Json(ApiResponse::success(invoices)))
}

/// One invoice. Customers only see invoices from their own orders.
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<i32>,
) -> ApiResult<InvoiceWithOrder> {
    let found = state.services.invoices.get(invoice_id).await?;

    if !user.is_admin() && found.order_user_id != user.id {
        return Err(ServiceError::NotFound(format!(
            "Invoice {} not found",
            invoice_id
        )));
    }

    Ok(Json(ApiResponse::success(found)))
}

pub async fn get_invoice_by_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<i32>,
) -> ApiResult<InvoiceWithOrder> {
    let found = state.services.invoices.get_by_order(order_id).await?;

    if !user.is_admin() && found.order_user_id != user.id {
        return Err(ServiceError::NotFound(format!(
            "No invoice found for order {}",
            order_id
        )));
    }

    Ok(Json(ApiResponse::success(found)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<InvoiceWithOrder>> {
    user.require_admin()?;
    let invoices = state.services.invoices.list_all().await?;
    Ok(Json(ApiResponse::success(invoices)))
}
