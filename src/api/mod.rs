use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod cart;
mod error;
mod observability;
mod orders;
mod products;
mod transactions;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use crate::services::{
    CartService, OrderService, PaymentService, ProductService, TokenService, UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.shared.tokens
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn product_service(&self) -> &Arc<dyn ProductService> {
        &self.shared.product_service
    }

    #[must_use]
    pub fn cart_service(&self) -> &Arc<dyn CartService> {
        &self.shared.cart_service
    }

    #[must_use]
    pub fn order_service(&self) -> &Arc<dyn OrderService> {
        &self.shared.order_service
    }

    #[must_use]
    pub fn payment_service(&self) -> &Arc<dyn PaymentService> {
        &self.shared.payment_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/health", get(observability::health))
        .merge(user_routes())
        .merge(product_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(transaction_routes())
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route(
            "/metrics",
            get(observability::get_metrics).with_state(state),
        )
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/{id}/change-password",
            post(users::change_password),
        )
        .route("/users/{id}/activate", patch(users::activate_user))
        .route("/users/{id}/deactivate", patch(users::deactivate_user))
}

fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/stats", get(products::product_stats))
        .route("/products/mine", get(products::list_mine))
        .route("/products/search/{keyword}", get(products::search_products))
        .route(
            "/products/category/{category}",
            get(products::list_by_category),
        )
        .route("/products/seller/{seller_id}", get(products::list_by_seller))
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/{id}/activate", patch(products::activate_product))
        .route(
            "/products/{id}/deactivate",
            patch(products::deactivate_product),
        )
}

fn cart_routes() -> Router<Arc<AppState>> {
    // `{id}` is a user id for GET and a cart item id for PUT/DELETE
    Router::new()
        .route("/cart", post(cart::add_to_cart))
        .route("/cart/item/{id}", get(cart::get_item))
        .route("/cart/user/{user_id}", delete(cart::clear_cart))
        .route(
            "/cart/{id}",
            get(cart::get_cart)
                .put(cart::update_item)
                .delete(cart::remove_item),
        )
        .route("/cart/{id}/summary", get(cart::get_summary))
}

fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/from-cart", post(orders::create_from_cart))
        .route("/orders", get(orders::list_orders))
        .route("/orders/stats", get(orders::order_stats))
        .route("/orders/user/{user_id}", get(orders::list_user_orders))
        .route(
            "/orders/number/{order_number}",
            get(orders::get_order_by_number),
        )
        .route("/orders/status/{id}", put(orders::update_order_status))
        .route("/orders/cancel/{id}", patch(orders::cancel_order))
        .route(
            "/orders/{id}",
            get(orders::get_order).delete(orders::delete_order),
        )
}

fn transaction_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/stats", get(transactions::transaction_stats))
        .route(
            "/transactions/user/{user_id}",
            get(transactions::list_user_transactions),
        )
        .route(
            "/transactions/number/{number}",
            get(transactions::get_transaction_by_number),
        )
        .route(
            "/transactions/status/{id}",
            put(transactions::update_transaction_status),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
}
