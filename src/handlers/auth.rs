use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::AuthUser;
use crate::services::users::{AuthenticatedUser, LoginInput, RegisterInput, UserProfile};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<AuthenticatedUser> {
    let created = state.services.users.register(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<AuthenticatedUser> {
    let authenticated = state.services.users.login(input).await?;
    Ok(Json(ApiResponse::success(authenticated)))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    let profile = state.services.users.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<UserProfile>> {
    user.require_admin()?;
    let users = state.services.users.list().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i32>,
) -> ApiResult<i32> {
    user.require_admin()?;
    state.services.users.delete(user_id).await?;
    Ok(Json(ApiResponse::success(user_id)))
}
