use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::validation::{validate_email, validate_id};
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, ListResponse, MessageResponse,
    UpdateProfileRequest,
};
use crate::db::{ProfileUpdate, User};
use crate::domain::Principal;

/// GET /users (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<ApiResponse<ListResponse<User>>>, ApiError> {
    let users = state.user_service().list(&principal).await?;
    Ok(Json(ApiResponse::success(users.into())))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id, "user")?;
    let user = state.user_service().get(&principal, id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id, "user")?;

    let email = match payload.email.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(email) => Some(validate_email(email)?.to_string()),
    };

    let update = ProfileUpdate {
        email,
        fullname: payload.fullname,
        phone: payload.phone,
        address: payload.address,
    };

    let user = state
        .user_service()
        .update_profile(&principal, id, update)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /users/{id}/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "user")?;

    state
        .user_service()
        .change_password(
            &principal,
            id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "user")?;
    state.user_service().delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "User deleted",
    ))))
}

/// PATCH /users/{id}/activate (admin)
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id, "user")?;
    let user = state.user_service().set_active(&principal, id, true).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PATCH /users/{id}/deactivate (admin)
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id(id, "user")?;
    let user = state
        .user_service()
        .set_active(&principal, id, false)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
