use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{cart_items, products};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i32,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// Partial product update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProductStats {
    pub total_products: u64,
    pub total_active: u64,
    pub total_stock: i64,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, product: NewProduct) -> Result<products::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        products::ActiveModel {
            seller_id: Set(product.seller_id),
            name: Set(product.name),
            price: Set(product.price),
            stock: Set(product.stock),
            description: Set(product.description),
            category: Set(product.category),
            image: Set(product.image),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert product")
    }

    pub async fn get(&self, id: i32) -> Result<Option<products::Model>> {
        products::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query product")
    }

    pub async fn list_active(&self) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .order_by_desc(products::Column::CreatedAt)
            .order_by_desc(products::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list active products")
    }

    /// Raw substring match on name or description, active products only.
    pub async fn search(&self, keyword: &str) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(products::Column::Name.contains(keyword))
                    .add(products::Column::Description.contains(keyword)),
            )
            .order_by_desc(products::Column::CreatedAt)
            .order_by_desc(products::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to search products")
    }

    pub async fn list_by_category(&self, category: &str) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::Category.eq(category))
            .order_by_desc(products::Column::CreatedAt)
            .order_by_desc(products::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list products by category")
    }

    /// Every listing of a seller, inactive ones included.
    pub async fn list_by_seller(&self, seller_id: i32) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::SellerId.eq(seller_id))
            .order_by_desc(products::Column::CreatedAt)
            .order_by_desc(products::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list products by seller")
    }

    /// Applies the update and, when the price changes, rewrites the cached
    /// subtotal of every cart line that references the product in the same
    /// transaction.
    pub async fn update(
        &self,
        id: i32,
        update: ProductUpdate,
    ) -> Result<Option<products::Model>> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        // Write before reading so the transaction holds the write lock for
        // its whole snapshot.
        let touched = products::Entity::update_many()
            .col_expr(products::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(products::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("Failed to lock product")?;
        if touched.rows_affected == 0 {
            return Ok(None);
        }

        let Some(product) = products::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let price_changed = update.price.is_some_and(|price| price != product.price);

        let mut active: products::ActiveModel = product.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(price) = update.price {
            active.price = Set(price);
        }
        if let Some(stock) = update.stock {
            active.stock = Set(stock);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(category) = update.category {
            active.category = Set(Some(category));
        }
        if let Some(image) = update.image {
            active.image = Set(Some(image));
        }
        active.updated_at = Set(now);

        let model = active
            .update(&txn)
            .await
            .context("Failed to update product")?;

        if price_changed {
            cart_items::Entity::update_many()
                .col_expr(
                    cart_items::Column::Subtotal,
                    Expr::col(cart_items::Column::Quantity).mul(model.price),
                )
                .filter(cart_items::Column::ProductId.eq(id))
                .exec(&txn)
                .await
                .context("Failed to refresh cart subtotals")?;
        }

        txn.commit().await?;
        Ok(Some(model))
    }

    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<products::Model>> {
        let Some(product) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = product.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to change product activation")?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = products::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete product")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn stats(&self) -> Result<ProductStats> {
        let total_products = products::Entity::find().count(&self.conn).await?;

        let total_active = products::Entity::find()
            .filter(products::Column::IsActive.eq(true))
            .count(&self.conn)
            .await?;

        let total_stock: Option<i64> = products::Entity::find()
            .select_only()
            .column_as(products::Column::Stock.sum(), "total_stock")
            .into_tuple::<Option<i64>>()
            .one(&self.conn)
            .await
            .context("Failed to sum product stock")?
            .flatten();

        Ok(ProductStats {
            total_products,
            total_active,
            total_stock: total_stock.unwrap_or(0),
        })
    }
}
