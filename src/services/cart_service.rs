//! Domain service for shopping carts.
//!
//! Owns stock validation on add and update, and keeps the cached line
//! subtotal equal to `price * quantity` on every write.

use serde::Serialize;
use thiserror::Error;

use crate::db::CartLine;
use crate::domain::Principal;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i32 },

    #[error("Not allowed to access this cart")]
    Forbidden,

    #[error("Cart changed concurrently, retry the request")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CartError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CartError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddToCartResult {
    pub line: CartLine,
    /// False when the quantity was merged into an existing line
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub user_id: i32,
    pub items: Vec<CartLine>,
    /// Number of distinct lines
    pub total_items: usize,
    /// Sum of line quantities
    pub total_quantity: i64,
    pub total_price: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartSummary {
    pub user_id: i32,
    /// Number of distinct lines
    pub total_items: usize,
    /// Sum of line quantities
    pub total_quantity: i64,
    pub total_price: i64,
}

#[async_trait::async_trait]
pub trait CartService: Send + Sync {
    /// Adds `quantity` of a product to the principal's own cart, merging into
    /// an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if the resulting line quantity
    /// exceeds the product's stock; the existing line is left untouched.
    async fn add_to_cart(
        &self,
        principal: &Principal,
        product_id: i32,
        quantity: i32,
    ) -> Result<AddToCartResult, CartError>;

    async fn update_quantity(
        &self,
        principal: &Principal,
        item_id: i32,
        quantity: i32,
    ) -> Result<CartLine, CartError>;

    async fn remove(&self, principal: &Principal, item_id: i32) -> Result<(), CartError>;

    /// Deletes every line of `user_id`'s cart and returns how many went.
    async fn clear(&self, principal: &Principal, user_id: i32) -> Result<u64, CartError>;

    async fn get_cart(&self, principal: &Principal, user_id: i32) -> Result<CartView, CartError>;

    async fn get_summary(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<CartSummary, CartError>;

    async fn get_item(&self, principal: &Principal, item_id: i32) -> Result<CartLine, CartError>;
}
