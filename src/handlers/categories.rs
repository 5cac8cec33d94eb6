use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::AuthUser;
use crate::entities::category;
use crate::services::categories::{CategoryPatch, CreateCategoryInput};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<category::Model>> {
    let categories = state.services.categories.list().await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> ApiResult<category::Model> {
    let found = state.services.categories.get(category_id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateCategoryInput>,
) -> ApiResult<category::Model> {
    user.require_admin()?;
    let created = state.services.categories.create(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i32>,
    Json(patch): Json<CategoryPatch>,
) -> ApiResult<category::Model> {
    user.require_admin()?;
    let updated = state.services.categories.update(category_id, patch).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(category_id): Path<i32>,
) -> ApiResult<i32> {
    user.require_admin()?;
    state.services.categories.delete(category_id).await?;
    Ok(Json(ApiResponse::success(category_id)))
}
