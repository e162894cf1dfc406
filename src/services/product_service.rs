//! Domain service for product listings.

use serde::Deserialize;
use thiserror::Error;

use crate::db::{ProductStats, ProductUpdate};
use crate::domain::Principal;
use crate::entities::products;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not allowed to modify this product")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProductError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProductError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

#[async_trait::async_trait]
pub trait ProductService: Send + Sync {
    /// Lists a new product owned by the calling seller.
    async fn create(
        &self,
        principal: &Principal,
        request: CreateProduct,
    ) -> Result<products::Model, ProductError>;

    async fn list_active(&self) -> Result<Vec<products::Model>, ProductError>;

    async fn search(&self, keyword: &str) -> Result<Vec<products::Model>, ProductError>;

    async fn list_by_category(&self, category: &str)
    -> Result<Vec<products::Model>, ProductError>;

    async fn list_by_seller(&self, seller_id: i32) -> Result<Vec<products::Model>, ProductError>;

    async fn list_mine(&self, principal: &Principal)
    -> Result<Vec<products::Model>, ProductError>;

    async fn get(&self, id: i32) -> Result<products::Model, ProductError>;

    /// Partial update by the owning seller or an admin. A price change
    /// refreshes the cached subtotal of every cart line holding the product.
    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        update: ProductUpdate,
    ) -> Result<products::Model, ProductError>;

    async fn set_active(
        &self,
        principal: &Principal,
        id: i32,
        is_active: bool,
    ) -> Result<products::Model, ProductError>;

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), ProductError>;

    async fn stats(&self) -> Result<ProductStats, ProductError>;
}
