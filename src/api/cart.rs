use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{
    AddToCartRequest, ApiError, ApiResponse, AppState, ClearCartResponse, MessageResponse,
    UpdateCartRequest,
};
use crate::db::CartLine;
use crate::domain::Principal;
use crate::services::{CartError, CartSummary, CartView};

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidInput(msg) => Self::validation(msg),
            CartError::NotFound(what) => Self::not_found(what),
            CartError::InsufficientStock {
                requested,
                available,
            } => Self::InsufficientStock(format!(
                "Insufficient stock: requested {requested}, available {available}"
            )),
            CartError::Forbidden => Self::forbidden("Not allowed to access this cart"),
            CartError::Conflict => {
                Self::Conflict("Cart changed concurrently, retry the request".to_string())
            }
            CartError::Database(msg) => Self::DatabaseError(msg),
            CartError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Adds a product to the caller's cart.
///
/// Responds `201 Created` when a new line was inserted and `200 OK` when the
/// quantity was merged into an existing line for the same product.
///
/// # Endpoint
/// `POST /api/cart`
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(payload): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartLine>>), ApiError> {
    let product_id = validate_id(payload.product_id, "product")?;

    let result = state
        .cart_service()
        .add_to_cart(&principal, product_id, payload.quantity)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(result.line))))
}

/// # Endpoint
/// `GET /api/cart/{user_id}`
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let user_id = validate_id(user_id, "user")?;
    let cart = state.cart_service().get_cart(&principal, user_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// # Endpoint
/// `GET /api/cart/{user_id}/summary`
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<CartSummary>>, ApiError> {
    let user_id = validate_id(user_id, "user")?;
    let summary = state
        .cart_service()
        .get_summary(&principal, user_id)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// # Endpoint
/// `GET /api/cart/item/{id}`
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CartLine>>, ApiError> {
    let id = validate_id(id, "cart item")?;
    let line = state.cart_service().get_item(&principal, id).await?;
    Ok(Json(ApiResponse::success(line)))
}

/// # Endpoint
/// `PUT /api/cart/{id}`
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCartRequest>,
) -> Result<Json<ApiResponse<CartLine>>, ApiError> {
    let id = validate_id(id, "cart item")?;
    let line = state
        .cart_service()
        .update_quantity(&principal, id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(line)))
}

/// # Endpoint
/// `DELETE /api/cart/{id}`
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "cart item")?;
    state.cart_service().remove(&principal, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Item removed from cart",
    ))))
}

/// # Endpoint
/// `DELETE /api/cart/user/{user_id}`
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<ClearCartResponse>>, ApiError> {
    let user_id = validate_id(user_id, "user")?;
    let deleted_items = state.cart_service().clear(&principal, user_id).await?;
    Ok(Json(ApiResponse::success(ClearCartResponse { deleted_items })))
}
