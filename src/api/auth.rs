use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, LoginRequest};
use crate::db::User;
use crate::domain::Principal;
use crate::services::{LoginResult, Registration, TokenError, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidCredentials => Self::unauthorized("Invalid email or password"),
            UserError::AccountDisabled => Self::unauthorized("Account is deactivated"),
            UserError::NotFound => Self::not_found("User"),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Forbidden => Self::forbidden("Not allowed to manage this account"),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Resolves the caller from `Authorization: Bearer <jwt>`.
///
/// Handlers that take a [`Principal`] are authenticated; a missing, expired or
/// forged token is rejected with 401 before the handler runs.
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let principal = state.tokens().verify(token).map_err(|e| match e {
            TokenError::Expired => ApiError::unauthorized("Token expired"),
            _ => ApiError::unauthorized("Invalid token"),
        })?;

        tracing::Span::current().record("user_id", principal.user_id);
        Ok(principal)
    }
}

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<Registration>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    payload.username = validate_username(&payload.username)?.to_string();
    payload.email = validate_email(&payload.email)?.to_string();
    validate_password(&payload.password)?;

    let user = state.user_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// POST /users/login
/// Authenticate with email and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .user_service()
        .login(&payload.email, &payload.password)
        .await?;

    tracing::Span::current().record("user_id", result.user.id);
    Ok(Json(ApiResponse::success(result)))
}
