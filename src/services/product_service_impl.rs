//! `SeaORM` implementation of the `ProductService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{NewProduct, ProductStats, ProductUpdate, Store};
use crate::domain::Principal;
use crate::entities::products;
use crate::services::product_service::{CreateProduct, ProductError, ProductService};

pub struct SeaOrmProductService {
    store: Store,
}

impl SeaOrmProductService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn load_owned(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<products::Model, ProductError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or(ProductError::NotFound("Product"))?;

        if !principal.can_act_for(product.seller_id) {
            return Err(ProductError::Forbidden);
        }
        Ok(product)
    }
}

fn validate_price(price: i64) -> Result<(), ProductError> {
    if price < 0 {
        return Err(ProductError::InvalidInput(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ProductError> {
    if stock < 0 {
        return Err(ProductError::InvalidInput(
            "Stock cannot be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<String, ProductError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProductError::InvalidInput(
            "Product name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

#[async_trait]
impl ProductService for SeaOrmProductService {
    async fn create(
        &self,
        principal: &Principal,
        request: CreateProduct,
    ) -> Result<products::Model, ProductError> {
        if !principal.role.can_sell() {
            return Err(ProductError::Forbidden);
        }
        let name = validate_name(&request.name)?;
        validate_price(request.price)?;
        validate_stock(request.stock)?;

        let product = self
            .store
            .create_product(NewProduct {
                seller_id: principal.user_id,
                name,
                price: request.price,
                stock: request.stock,
                description: request.description,
                category: request.category,
                image: request.image,
            })
            .await?;

        info!(product_id = product.id, seller_id = product.seller_id, "Product created");
        Ok(product)
    }

    async fn list_active(&self) -> Result<Vec<products::Model>, ProductError> {
        Ok(self.store.list_active_products().await?)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<products::Model>, ProductError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ProductError::InvalidInput(
                "Search keyword is required".to_string(),
            ));
        }
        Ok(self.store.search_products(keyword).await?)
    }

    async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<products::Model>, ProductError> {
        Ok(self.store.list_products_by_category(category.trim()).await?)
    }

    async fn list_by_seller(&self, seller_id: i32) -> Result<Vec<products::Model>, ProductError> {
        if !self.store.user_exists(seller_id).await? {
            return Err(ProductError::NotFound("Seller"));
        }
        Ok(self.store.list_products_by_seller(seller_id).await?)
    }

    async fn list_mine(
        &self,
        principal: &Principal,
    ) -> Result<Vec<products::Model>, ProductError> {
        Ok(self.store.list_products_by_seller(principal.user_id).await?)
    }

    async fn get(&self, id: i32) -> Result<products::Model, ProductError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(ProductError::NotFound("Product"))
    }

    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        mut update: ProductUpdate,
    ) -> Result<products::Model, ProductError> {
        if let Some(name) = update.name.as_deref() {
            update.name = Some(validate_name(name)?);
        }
        if let Some(price) = update.price {
            validate_price(price)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }

        self.load_owned(principal, id).await?;

        let product = self
            .store
            .update_product(id, update)
            .await?
            .ok_or(ProductError::NotFound("Product"))?;

        info!(product_id = id, "Product updated");
        Ok(product)
    }

    async fn set_active(
        &self,
        principal: &Principal,
        id: i32,
        is_active: bool,
    ) -> Result<products::Model, ProductError> {
        self.load_owned(principal, id).await?;

        let product = self
            .store
            .set_product_active(id, is_active)
            .await?
            .ok_or(ProductError::NotFound("Product"))?;

        info!(product_id = id, is_active, "Product activation changed");
        Ok(product)
    }

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), ProductError> {
        self.load_owned(principal, id).await?;

        if !self.store.delete_product(id).await? {
            return Err(ProductError::NotFound("Product"));
        }

        info!(product_id = id, "Product deleted");
        Ok(())
    }

    async fn stats(&self) -> Result<ProductStats, ProductError> {
        Ok(self.store.product_stats().await?)
    }
}
