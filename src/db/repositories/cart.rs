use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Query, SimpleExpr, SubQueryStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::entities::{cart_items, products};

/// A cart line joined with the product it references.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub unit_price: i64,
    pub stock: i32,
    pub quantity: i32,
    pub subtotal: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CartLine {
    /// Uses the cached subtotal when present, otherwise the live product price.
    #[must_use]
    pub fn from_parts(item: cart_items::Model, product: &products::Model) -> Self {
        let subtotal = item
            .subtotal
            .unwrap_or_else(|| product.price.saturating_mul(i64::from(item.quantity)));

        Self {
            id: item.id,
            user_id: item.user_id,
            product_id: item.product_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            stock: product.stock,
            quantity: item.quantity,
            subtotal,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// The current price of the line's product, read inside the write statement.
fn live_price() -> SimpleExpr {
    SimpleExpr::SubQuery(
        None,
        Box::new(SubQueryStatement::SelectStatement(
            Query::select()
                .column(products::Column::Price)
                .from(products::Entity)
                .and_where(
                    Expr::col((products::Entity, products::Column::Id))
                        .equals((cart_items::Entity, cart_items::Column::ProductId)),
                )
                .to_owned(),
        )),
    )
}

pub struct CartRepository {
    conn: DatabaseConnection,
}

impl CartRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_item(&self, id: i32) -> Result<Option<cart_items::Model>> {
        cart_items::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query cart item")
    }

    pub async fn get_line(&self, id: i32) -> Result<Option<CartLine>> {
        let row = cart_items::Entity::find_by_id(id)
            .find_also_related(products::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query cart line")?;

        Ok(row.and_then(|(item, product)| {
            product.map(|product| CartLine::from_parts(item, &product))
        }))
    }

    pub async fn find_for_product(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<cart_items::Model>> {
        cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .one(&self.conn)
            .await
            .context("Failed to query cart line by product")
    }

    pub async fn lines_for_user(&self, user_id: i32) -> Result<Vec<CartLine>> {
        let rows = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .find_also_related(products::Entity)
            .order_by_desc(cart_items::Column::CreatedAt)
            .order_by_desc(cart_items::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list cart lines")?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|product| CartLine::from_parts(item, &product))
            })
            .collect())
    }

    /// Inserts a new line. A concurrent insert for the same (user, product)
    /// loses on the unique index and surfaces as a constraint violation.
    ///
    /// The subtotal is priced in the same transaction as the insert, so a
    /// concurrent reprice either sees the new line or is seen by it.
    pub async fn insert(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<cart_items::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let item = cart_items::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            subtotal: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert cart item")?;

        cart_items::Entity::update_many()
            .col_expr(
                cart_items::Column::Subtotal,
                Expr::col(cart_items::Column::Quantity).mul(live_price()),
            )
            .filter(cart_items::Column::Id.eq(item.id))
            .exec(&txn)
            .await
            .context("Failed to price cart item")?;

        let item = cart_items::Entity::find_by_id(item.id)
            .one(&txn)
            .await?
            .context("Inserted cart item vanished")?;

        txn.commit().await?;
        Ok(item)
    }

    /// Rewrites the quantity only if the line still holds `expected_quantity`,
    /// pricing the subtotal from the product row at write time. Returns false
    /// when another writer got there first.
    pub async fn compare_and_set_quantity(
        &self,
        id: i32,
        expected_quantity: i32,
        quantity: i32,
    ) -> Result<bool> {
        let result = cart_items::Entity::update_many()
            .col_expr(cart_items::Column::Quantity, Expr::value(quantity))
            .col_expr(
                cart_items::Column::Subtotal,
                Expr::val(quantity).mul(live_price()),
            )
            .col_expr(
                cart_items::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(cart_items::Column::Id.eq(id))
            .filter(cart_items::Column::Quantity.eq(expected_quantity))
            .exec(&self.conn)
            .await
            .context("Failed to update cart item quantity")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = cart_items::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete cart item")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear_user(&self, user_id: i32) -> Result<u64> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to clear cart")?;

        Ok(result.rows_affected)
    }
}
