use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::domain::{OrderStatus, line_subtotal, sum_subtotals};
use crate::entities::{cart_items, order_transactions, orders, products};

/// An order together with its purchased lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithTransactions {
    #[serde(flatten)]
    pub order: orders::Model,
    pub transactions: Vec<order_transactions::Model>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i32,
    pub order_number: String,
    pub shipping_address: String,
    pub shipping_phone: Option<String>,
    pub notes: Option<String>,
}

/// Result of converting a cart into an order.
#[derive(Debug)]
pub enum CheckoutOutcome {
    Placed(OrderWithTransactions),
    EmptyCart,
    /// The cart changed between read and purge; nothing was written.
    CartChanged,
    TotalOverflow,
}

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Reads the user's cart, writes the order and one line per cart item at
    /// live product prices, then purges exactly the lines that were read. All
    /// of it happens in one database transaction.
    pub async fn create_from_cart(&self, new_order: NewOrder) -> Result<CheckoutOutcome> {
        let txn = self.conn.begin().await?;

        let lines = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(new_order.user_id))
            .find_also_related(products::Entity)
            .order_by_asc(cart_items::Column::Id)
            .all(&txn)
            .await
            .context("Failed to read cart for checkout")?;

        let lines: Vec<(cart_items::Model, products::Model)> = lines
            .into_iter()
            .filter_map(|(item, product)| product.map(|p| (item, p)))
            .collect();

        if lines.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let subtotals: Option<Vec<i64>> = lines
            .iter()
            .map(|(item, product)| line_subtotal(product.price, item.quantity))
            .collect();
        let Some(subtotals) = subtotals else {
            return Ok(CheckoutOutcome::TotalOverflow);
        };
        let Some(total_price) = sum_subtotals(subtotals.iter().copied()) else {
            return Ok(CheckoutOutcome::TotalOverflow);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let order = orders::ActiveModel {
            user_id: Set(new_order.user_id),
            order_number: Set(new_order.order_number),
            total_price: Set(total_price),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            shipping_address: Set(new_order.shipping_address),
            shipping_phone: Set(new_order.shipping_phone),
            notes: Set(new_order.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert order")?;

        let mut transactions = Vec::with_capacity(lines.len());
        for ((item, product), subtotal) in lines.iter().zip(subtotals) {
            let line = order_transactions::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(Some(product.id)),
                product_name: Set(product.name.clone()),
                quantity: Set(item.quantity),
                price: Set(product.price),
                subtotal: Set(subtotal),
                created_at: Set(now.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert order line")?;
            transactions.push(line);
        }

        let read_ids: Vec<i32> = lines.iter().map(|(item, _)| item.id).collect();
        let purged = cart_items::Entity::delete_many()
            .filter(cart_items::Column::Id.is_in(read_ids.clone()))
            .exec(&txn)
            .await
            .context("Failed to purge cart")?;

        if usize::try_from(purged.rows_affected).ok() != Some(read_ids.len()) {
            txn.rollback().await?;
            return Ok(CheckoutOutcome::CartChanged);
        }

        txn.commit().await?;

        Ok(CheckoutOutcome::Placed(OrderWithTransactions {
            order,
            transactions,
        }))
    }

    pub async fn get(&self, id: i32) -> Result<Option<OrderWithTransactions>> {
        let Some(order) = orders::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query order")?
        else {
            return Ok(None);
        };

        Ok(Some(self.attach_lines(order).await?))
    }

    pub async fn get_model(&self, id: i32) -> Result<Option<orders::Model>> {
        orders::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query order")
    }

    pub async fn get_by_number(&self, order_number: &str) -> Result<Option<OrderWithTransactions>> {
        let Some(order) = orders::Entity::find()
            .filter(orders::Column::OrderNumber.eq(order_number))
            .one(&self.conn)
            .await
            .context("Failed to query order by number")?
        else {
            return Ok(None);
        };

        Ok(Some(self.attach_lines(order).await?))
    }

    pub async fn list_all(&self) -> Result<Vec<OrderWithTransactions>> {
        let orders = orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list orders")?;

        self.attach_many(orders).await
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<OrderWithTransactions>> {
        let orders = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id))
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list orders for user")?;

        self.attach_many(orders).await
    }

    /// Moves the order to `next` only if it still holds `expected`. Returns
    /// false when the order is gone or another writer changed it first.
    pub async fn compare_and_set_status(
        &self,
        id: i32,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        let result = orders::Entity::update_many()
            .set(orders::ActiveModel {
                status: Set(next.as_str().to_string()),
                updated_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            })
            .filter(orders::Column::Id.eq(id))
            .filter(orders::Column::Status.eq(expected.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to update order status")?;

        Ok(result.rows_affected == 1)
    }

    /// Removes an order and its lines in one transaction.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        order_transactions::Entity::delete_many()
            .filter(order_transactions::Column::OrderId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete order lines")?;

        let result = orders::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete order")?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await?;
        Ok(true)
    }

    pub async fn count(&self) -> Result<u64> {
        orders::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count orders")
    }

    async fn attach_lines(&self, order: orders::Model) -> Result<OrderWithTransactions> {
        let transactions = order_transactions::Entity::find()
            .filter(order_transactions::Column::OrderId.eq(order.id))
            .order_by_asc(order_transactions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to load order lines")?;

        Ok(OrderWithTransactions {
            order,
            transactions,
        })
    }

    async fn attach_many(&self, orders: Vec<orders::Model>) -> Result<Vec<OrderWithTransactions>> {
        let lines = orders
            .load_many(order_transactions::Entity, &self.conn)
            .await
            .context("Failed to load order lines")?;

        Ok(orders
            .into_iter()
            .zip(lines)
            .map(|(order, transactions)| OrderWithTransactions {
                order,
                transactions,
            })
            .collect())
    }
}
