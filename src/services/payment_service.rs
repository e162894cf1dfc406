//! Domain service for payment transactions.
//!
//! Payments only record a declared status against an order; there is no
//! gateway behind them.

use serde::Deserialize;
use thiserror::Error;

use crate::db::{PaymentStats, PaymentUpdate};
use crate::domain::Principal;
use crate::entities::payment_transactions;

pub const DEFAULT_PAYMENT_METHOD: &str = "bank_transfer";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not allowed to access this transaction")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PaymentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    /// Defaults to the caller
    pub user_id: Option<i32>,
    pub order_id: i32,
    pub amount: i64,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[async_trait::async_trait]
pub trait PaymentService: Send + Sync {
    async fn create(
        &self,
        principal: &Principal,
        request: CreatePayment,
    ) -> Result<payment_transactions::Model, PaymentError>;

    async fn list_all(
        &self,
        principal: &Principal,
    ) -> Result<Vec<payment_transactions::Model>, PaymentError>;

    async fn get(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<payment_transactions::Model, PaymentError>;

    async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<Vec<payment_transactions::Model>, PaymentError>;

    async fn get_by_number(
        &self,
        principal: &Principal,
        number: &str,
    ) -> Result<payment_transactions::Model, PaymentError>;

    /// Moves a payment through its status workflow.
    ///
    /// Re-applying the current status is a no-op. `paid_at` is stamped the
    /// first time the payment reaches `success` and never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Conflict`] when leaving a terminal status.
    async fn update_status(
        &self,
        principal: &Principal,
        id: i32,
        status: &str,
    ) -> Result<payment_transactions::Model, PaymentError>;

    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        update: PaymentUpdate,
    ) -> Result<payment_transactions::Model, PaymentError>;

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), PaymentError>;

    async fn stats(&self, principal: &Principal) -> Result<PaymentStats, PaymentError>;
}
