//! Domain service for orders.
//!
//! Converts carts into orders and tracks the order lifecycle afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::OrderWithTransactions;
use crate::domain::Principal;
use crate::entities::orders;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Not allowed to access this order")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for OrderError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for OrderError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
}

#[async_trait::async_trait]
pub trait OrderService: Send + Sync {
    /// Turns `user_id`'s cart into an order, atomically emptying the cart.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] if there is nothing to order and
    /// [`OrderError::Conflict`] if the cart changed while the order was being
    /// written. Nothing is persisted in either case.
    async fn create_from_cart(
        &self,
        principal: &Principal,
        user_id: i32,
        request: CheckoutRequest,
    ) -> Result<OrderWithTransactions, OrderError>;

    async fn list_all(&self, principal: &Principal)
    -> Result<Vec<OrderWithTransactions>, OrderError>;

    async fn get(&self, principal: &Principal, id: i32)
    -> Result<OrderWithTransactions, OrderError>;

    async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<Vec<OrderWithTransactions>, OrderError>;

    async fn get_by_number(
        &self,
        principal: &Principal,
        order_number: &str,
    ) -> Result<OrderWithTransactions, OrderError>;

    async fn update_status(
        &self,
        principal: &Principal,
        id: i32,
        status: &str,
    ) -> Result<orders::Model, OrderError>;

    /// Cancels a pending or processing order.
    async fn cancel(&self, principal: &Principal, id: i32) -> Result<orders::Model, OrderError>;

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), OrderError>;

    async fn stats(&self, principal: &Principal) -> Result<OrderStats, OrderError>;
}
