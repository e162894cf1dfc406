use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    CartService, OrderService, PaymentService, ProductService, SeaOrmCartService,
    SeaOrmOrderService, SeaOrmPaymentService, SeaOrmProductService, SeaOrmUserService,
    TokenService, UserService,
};

/// Services shared by the HTTP layer and the CLI.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub user_service: Arc<dyn UserService>,

    pub product_service: Arc<dyn ProductService>,

    pub cart_service: Arc<dyn CartService>,

    pub order_service: Arc<dyn OrderService>,

    pub payment_service: Arc<dyn PaymentService>,
}

impl SharedState {
    /// Connects to the configured database, applies migrations and wires
    /// every service on top of it.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires services over an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let tokens = Arc::new(TokenService::new(&config.auth));

        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
            tokens.clone(),
        ));
        let product_service: Arc<dyn ProductService> =
            Arc::new(SeaOrmProductService::new(store.clone()));
        let cart_service: Arc<dyn CartService> = Arc::new(SeaOrmCartService::new(store.clone()));
        let order_service: Arc<dyn OrderService> =
            Arc::new(SeaOrmOrderService::new(store.clone()));
        let payment_service: Arc<dyn PaymentService> =
            Arc::new(SeaOrmPaymentService::new(store.clone()));

        Self {
            config: Arc::new(config),
            store,
            tokens,
            user_service,
            product_service,
            cart_service,
            order_service,
            payment_service,
        }
    }
}
