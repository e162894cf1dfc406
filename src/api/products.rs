use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::validation::{validate_id, validate_search_query};
use super::{
    ApiError, ApiResponse, AppState, ListResponse, MessageResponse, UpdateProductRequest,
};
use crate::db::{ProductStats, ProductUpdate};
use crate::domain::Principal;
use crate::entities::products;
use crate::services::{CreateProduct, ProductError};

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::InvalidInput(msg) => Self::validation(msg),
            ProductError::NotFound(what) => Self::not_found(what),
            ProductError::Forbidden => Self::forbidden("Not allowed to modify this product"),
            ProductError::Database(msg) => Self::DatabaseError(msg),
            ProductError::Internal(msg) => Self::internal(msg),
        }
    }
}

type ProductList = Json<ApiResponse<ListResponse<products::Model>>>;

/// Active products, newest first.
///
/// # Endpoint
/// `GET /api/products`
pub async fn list_products(State(state): State<Arc<AppState>>) -> Result<ProductList, ApiError> {
    let items = state.product_service().list_active().await?;
    Ok(Json(ApiResponse::success(items.into())))
}

/// Case-insensitive keyword match over name and description.
///
/// # Endpoint
/// `GET /api/products/search/{keyword}`
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Path(keyword): Path<String>,
) -> Result<ProductList, ApiError> {
    let keyword = validate_search_query(&keyword)?;
    let items = state.product_service().search(keyword).await?;
    Ok(Json(ApiResponse::success(items.into())))
}

/// # Endpoint
/// `GET /api/products/category/{category}`
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<ProductList, ApiError> {
    let items = state.product_service().list_by_category(&category).await?;
    Ok(Json(ApiResponse::success(items.into())))
}

/// # Endpoint
/// `GET /api/products/seller/{seller_id}`
pub async fn list_by_seller(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<i32>,
) -> Result<ProductList, ApiError> {
    let seller_id = validate_id(seller_id, "seller")?;
    let items = state.product_service().list_by_seller(seller_id).await?;
    Ok(Json(ApiResponse::success(items.into())))
}

/// Every product of the caller, inactive ones included.
///
/// # Endpoint
/// `GET /api/products/mine`
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<ProductList, ApiError> {
    let items = state.product_service().list_mine(&principal).await?;
    Ok(Json(ApiResponse::success(items.into())))
}

/// # Endpoint
/// `GET /api/products/stats`
pub async fn product_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ProductStats>>, ApiError> {
    let stats = state.product_service().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// # Endpoint
/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validate_id(id, "product")?;
    let product = state.product_service().get(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// # Endpoint
/// `POST /api/products`
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<ApiResponse<products::Model>>), ApiError> {
    let product = state.product_service().create(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// # Endpoint
/// `PUT /api/products/{id}`
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validate_id(id, "product")?;
    let update = ProductUpdate {
        name: payload.name,
        price: payload.price,
        stock: payload.stock,
        description: payload.description,
        category: payload.category,
        image: payload.image,
    };

    let product = state
        .product_service()
        .update(&principal, id, update)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

/// # Endpoint
/// `PATCH /api/products/{id}/activate`
pub async fn activate_product(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validate_id(id, "product")?;
    let product = state
        .product_service()
        .set_active(&principal, id, true)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Hides the product from the catalogue without deleting it.
///
/// # Endpoint
/// `PATCH /api/products/{id}/deactivate`
pub async fn deactivate_product(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<products::Model>>, ApiError> {
    let id = validate_id(id, "product")?;
    let product = state
        .product_service()
        .set_active(&principal, id, false)
        .await?;
    Ok(Json(ApiResponse::success(product)))
}

/// # Endpoint
/// `DELETE /api/products/{id}`
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id(id, "product")?;
    state.product_service().delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Product deleted",
    ))))
}
