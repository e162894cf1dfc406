use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{
    ApiError, ApiResponse, AppState, ListResponse, MessageResponse, StatusRequest,
    UpdateTransactionRequest,
};
use crate::db::{PaymentStats, PaymentUpdate};
use crate::domain::Principal;
use crate::entities::payment_transactions;
use crate::services::{CreatePayment, PaymentError};

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidInput(msg) => Self::validation(msg),
            PaymentError::NotFound(what) => Self::not_found(what),
            PaymentError::Forbidden => Self::forbidden("Not allowed to access this transaction"),
            PaymentError::Conflict(msg) => Self::Conflict(msg),
            PaymentError::Database(msg) => Self::DatabaseError(msg),
            PaymentError::Internal(msg) => Self::internal(msg),
        }
    }
}

type Payment = Json<ApiResponse<payment_transactions::Model>>;
type PaymentList = Json<ApiResponse<ListResponse<payment_transactions::Model>>>;

/// Records a payment against one of the caller's orders.
///
/// # Endpoint
/// `POST /api/transactions`
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(payload): Json<CreatePayment>,
) -> Result<(StatusCode, Payment), ApiError> {
    validate_id(payload.order_id, "order")?;
    let payment = state
        .payment_service()
        .create(&principal, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payment))))
}

/// # Endpoint
/// `GET /api/transactions`
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<PaymentList, ApiError> {
    let payments = state.payment_service().list_all(&principal).await?;
    Ok(Json(ApiResponse::success(payments.into())))
}

/// # Endpoint
/// `GET /api/transactions/stats`
pub async fn transaction_stats(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<ApiResponse<PaymentStats>>, ApiError> {
    let stats = state.payment_service().stats(&principal).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// # Endpoint
/// `GET /api/transactions/{id}`
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Payment, ApiError> {
    let id = validate_id(id, "transaction")?;
    let payment = state.payment_service().get(&principal, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// # Endpoint
/// `GET /api/transactions/user/{user_id}`
pub async fn list_user_transactions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(user_id): Path<i32>,
) -> Result<PaymentList, ApiError> {
    let user_id = validate_id(user_id, "user")?;
    let payments = state
        .payment_service()
        .list_for_user(&principal, user_id)
        .await?;
    Ok(Json(ApiResponse::success(payments.into())))
}

/// # Endpoint
/// `GET /api/transactions/number/{transaction_number}`
pub async fn get_transaction_by_number(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(number): Path<String>,
) -> Result<Payment, ApiError> {
    let payment = state
        .payment_service()
        .get_by_number(&principal, number.trim())
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// # Endpoint
/// `PUT /api/transactions/status/{id}`
pub async fn update_transaction_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<StatusRequest>,
) -> Result<Payment, ApiError> {
    let id = validate_id(id, "transaction")?;
    let payment = state
        .payment_service()
        .update_status(&principal, id, &payload.status)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// # Endpoint
/// `PUT /api/transactions/{id}`
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Payment, ApiError> {
    let id = validate_id(id, "transaction")?;
    let update = PaymentUpdate {
        amount: payload.amount,
        payment_method: payload.payment_method,
        notes: payload.notes,
    };
    let payment = state
        .payment_service()
        .update(&principal, id, update)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// # Endpoint
/// `DELETE /api/transactions/{id}`
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "transaction")?;
    state.payment_service().delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Transaction deleted",
    ))))
}
