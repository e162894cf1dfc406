use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{OrderStatus, PaymentStatus};
use crate::entities::{cart_items, orders, payment_transactions, products};

pub mod migrator;
pub mod repositories;

pub use repositories::cart::CartLine;
pub use repositories::order::{CheckoutOutcome, NewOrder, OrderWithTransactions};
pub use repositories::payment::{NewPayment, PaymentStats, PaymentUpdate};
pub use repositories::product::{NewProduct, ProductStats, ProductUpdate};
pub use repositories::user::{NewUser, ProfileUpdate, User};

/// True when the error chain bottoms out in a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DbErr>().and_then(DbErr::sql_err),
        Some(SqlErr::UniqueConstraintViolation(_))
    )
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn cart_repo(&self) -> repositories::cart::CartRepository {
        repositories::cart::CartRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    fn payment_repo(&self) -> repositories::payment::PaymentRepository {
        repositories::payment::PaymentRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, security).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn user_exists(&self, id: i32) -> Result<bool> {
        self.user_repo().exists(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_with_password_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn update_user_profile(&self, id: i32, update: ProfileUpdate) -> Result<Option<User>> {
        self.user_repo().update_profile(id, update).await
    }

    pub async fn set_user_active(&self, id: i32, is_active: bool) -> Result<Option<User>> {
        self.user_repo().set_active(id, is_active).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<bool> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // Products

    pub async fn create_product(&self, product: NewProduct) -> Result<products::Model> {
        self.product_repo().create(product).await
    }

    pub async fn get_product(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().get(id).await
    }

    pub async fn list_active_products(&self) -> Result<Vec<products::Model>> {
        self.product_repo().list_active().await
    }

    pub async fn search_products(&self, keyword: &str) -> Result<Vec<products::Model>> {
        self.product_repo().search(keyword).await
    }

    pub async fn list_products_by_category(&self, category: &str) -> Result<Vec<products::Model>> {
        self.product_repo().list_by_category(category).await
    }

    pub async fn list_products_by_seller(&self, seller_id: i32) -> Result<Vec<products::Model>> {
        self.product_repo().list_by_seller(seller_id).await
    }

    pub async fn update_product(
        &self,
        id: i32,
        update: ProductUpdate,
    ) -> Result<Option<products::Model>> {
        self.product_repo().update(id, update).await
    }

    pub async fn set_product_active(
        &self,
        id: i32,
        is_active: bool,
    ) -> Result<Option<products::Model>> {
        self.product_repo().set_active(id, is_active).await
    }

    pub async fn delete_product(&self, id: i32) -> Result<bool> {
        self.product_repo().delete(id).await
    }

    pub async fn product_stats(&self) -> Result<ProductStats> {
        self.product_repo().stats().await
    }

    // Cart

    pub async fn get_cart_item(&self, id: i32) -> Result<Option<cart_items::Model>> {
        self.cart_repo().get_item(id).await
    }

    pub async fn get_cart_line(&self, id: i32) -> Result<Option<CartLine>> {
        self.cart_repo().get_line(id).await
    }

    pub async fn find_cart_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<cart_items::Model>> {
        self.cart_repo().find_for_product(user_id, product_id).await
    }

    pub async fn cart_lines(&self, user_id: i32) -> Result<Vec<CartLine>> {
        self.cart_repo().lines_for_user(user_id).await
    }

    pub async fn insert_cart_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<cart_items::Model> {
        self.cart_repo().insert(user_id, product_id, quantity).await
    }

    pub async fn compare_and_set_cart_quantity(
        &self,
        id: i32,
        expected_quantity: i32,
        quantity: i32,
    ) -> Result<bool> {
        self.cart_repo()
            .compare_and_set_quantity(id, expected_quantity, quantity)
            .await
    }

    pub async fn delete_cart_item(&self, id: i32) -> Result<bool> {
        self.cart_repo().delete(id).await
    }

    pub async fn clear_cart(&self, user_id: i32) -> Result<u64> {
        self.cart_repo().clear_user(user_id).await
    }

    // Orders

    pub async fn create_order_from_cart(&self, order: NewOrder) -> Result<CheckoutOutcome> {
        self.order_repo().create_from_cart(order).await
    }

    pub async fn get_order(&self, id: i32) -> Result<Option<OrderWithTransactions>> {
        self.order_repo().get(id).await
    }

    pub async fn get_order_model(&self, id: i32) -> Result<Option<orders::Model>> {
        self.order_repo().get_model(id).await
    }

    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderWithTransactions>> {
        self.order_repo().get_by_number(order_number).await
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderWithTransactions>> {
        self.order_repo().list_all().await
    }

    pub async fn list_orders_for_user(&self, user_id: i32) -> Result<Vec<OrderWithTransactions>> {
        self.order_repo().list_for_user(user_id).await
    }

    pub async fn compare_and_set_order_status(
        &self,
        id: i32,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        self.order_repo()
            .compare_and_set_status(id, expected, next)
            .await
    }

    pub async fn delete_order(&self, id: i32) -> Result<bool> {
        self.order_repo().delete(id).await
    }

    pub async fn count_orders(&self) -> Result<u64> {
        self.order_repo().count().await
    }

    // Payments

    pub async fn create_payment(
        &self,
        payment: NewPayment,
    ) -> Result<payment_transactions::Model> {
        self.payment_repo().create(payment).await
    }

    pub async fn get_payment(&self, id: i32) -> Result<Option<payment_transactions::Model>> {
        self.payment_repo().get(id).await
    }

    pub async fn get_payment_by_number(
        &self,
        number: &str,
    ) -> Result<Option<payment_transactions::Model>> {
        self.payment_repo().get_by_number(number).await
    }

    pub async fn list_payments(&self) -> Result<Vec<payment_transactions::Model>> {
        self.payment_repo().list_all().await
    }

    pub async fn list_payments_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<payment_transactions::Model>> {
        self.payment_repo().list_for_user(user_id).await
    }

    pub async fn compare_and_set_payment_status(
        &self,
        id: i32,
        expected: PaymentStatus,
        next: PaymentStatus,
        paid_at: Option<String>,
    ) -> Result<bool> {
        self.payment_repo()
            .compare_and_set_status(id, expected, next, paid_at)
            .await
    }

    pub async fn update_open_payment(
        &self,
        id: i32,
        update: PaymentUpdate,
    ) -> Result<bool> {
        self.payment_repo().update_details(id, update).await
    }

    pub async fn delete_payment(&self, id: i32) -> Result<bool> {
        self.payment_repo().delete(id).await
    }

    pub async fn payment_stats(&self) -> Result<PaymentStats> {
        self.payment_repo().stats().await
    }
}
