use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{
    ApiError, ApiResponse, AppState, CheckoutBody, ListResponse, MessageResponse, StatusRequest,
};
use crate::db::OrderWithTransactions;
use crate::domain::Principal;
use crate::entities::orders;
use crate::services::{CheckoutRequest, OrderError, OrderStats};

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidInput(msg) => Self::validation(msg),
            OrderError::NotFound(what) => Self::not_found(what),
            OrderError::EmptyCart => Self::EmptyCart,
            OrderError::Forbidden => Self::forbidden("Not allowed to access this order"),
            OrderError::Conflict(msg) => Self::Conflict(msg),
            OrderError::Database(msg) => Self::DatabaseError(msg),
            OrderError::Internal(msg) => Self::internal(msg),
        }
    }
}

type OrderList = Json<ApiResponse<ListResponse<OrderWithTransactions>>>;

/// Converts the cart into an order and empties it in the same transaction.
///
/// # Endpoint
/// `POST /api/orders/from-cart`
pub async fn create_from_cart(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(payload): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<ApiResponse<OrderWithTransactions>>), ApiError> {
    let user_id = payload.user_id.unwrap_or(principal.user_id);
    let request = CheckoutRequest {
        shipping_address: payload.shipping_address,
        shipping_phone: payload.shipping_phone,
        notes: payload.notes,
    };

    let order = state
        .order_service()
        .create_from_cart(&principal, user_id, request)
        .await?;

    tracing::info!(
        order_id = order.order.id,
        order_number = %order.order.order_number,
        total = order.order.total_price,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// # Endpoint
/// `GET /api/orders`
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<OrderList, ApiError> {
    let orders = state.order_service().list_all(&principal).await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

/// # Endpoint
/// `GET /api/orders/stats`
pub async fn order_stats(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<ApiResponse<OrderStats>>, ApiError> {
    let stats = state.order_service().stats(&principal).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// # Endpoint
/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<OrderWithTransactions>>, ApiError> {
    let id = validate_id(id, "order")?;
    let order = state.order_service().get(&principal, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// # Endpoint
/// `GET /api/orders/user/{user_id}`
pub async fn list_user_orders(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<i32>,
) -> Result<OrderList, ApiError> {
    let user_id = validate_id(user_id, "user")?;
    let orders = state
        .order_service()
        .list_for_user(&principal, user_id)
        .await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

/// # Endpoint
/// `GET /api/orders/number/{order_number}`
pub async fn get_order_by_number(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderWithTransactions>>, ApiError> {
    let order = state
        .order_service()
        .get_by_number(&principal, order_number.trim())
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// # Endpoint
/// `PUT /api/orders/status/{id}`
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<ApiResponse<orders::Model>>, ApiError> {
    let id = validate_id(id, "order")?;
    let order = state
        .order_service()
        .update_status(&principal, id, &payload.status)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// # Endpoint
/// `PATCH /api/orders/cancel/{id}`
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<orders::Model>>, ApiError> {
    let id = validate_id(id, "order")?;
    let order = state.order_service().cancel(&principal, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// # Endpoint
/// `DELETE /api/orders/{id}`
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "order")?;
    state.order_service().delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Order deleted",
    ))))
}
