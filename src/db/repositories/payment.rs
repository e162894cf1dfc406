use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

use crate::domain::PaymentStatus;
use crate::entities::payment_transactions;

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i32,
    pub order_id: i32,
    pub transaction_number: String,
    pub amount: i64,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Partial update of the descriptive fields; status has its own path.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub amount: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PaymentStats {
    pub total_transactions: u64,
    /// Sum of amounts over successful payments
    pub total_amount: i64,
    pub pending_count: u64,
    pub success_count: u64,
    pub failed_count: u64,
}

pub struct PaymentRepository {
    conn: DatabaseConnection,
}

impl PaymentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, payment: NewPayment) -> Result<payment_transactions::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        payment_transactions::ActiveModel {
            user_id: Set(payment.user_id),
            order_id: Set(payment.order_id),
            transaction_number: Set(payment.transaction_number),
            amount: Set(payment.amount),
            payment_method: Set(payment.payment_method),
            status: Set(PaymentStatus::Pending.as_str().to_string()),
            notes: Set(payment.notes),
            paid_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert payment transaction")
    }

    pub async fn get(&self, id: i32) -> Result<Option<payment_transactions::Model>> {
        payment_transactions::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query payment transaction")
    }

    pub async fn get_by_number(&self, number: &str) -> Result<Option<payment_transactions::Model>> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::TransactionNumber.eq(number))
            .one(&self.conn)
            .await
            .context("Failed to query payment transaction by number")
    }

    pub async fn list_all(&self) -> Result<Vec<payment_transactions::Model>> {
        payment_transactions::Entity::find()
            .order_by_desc(payment_transactions::Column::CreatedAt)
            .order_by_desc(payment_transactions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list payment transactions")
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<payment_transactions::Model>> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::UserId.eq(user_id))
            .order_by_desc(payment_transactions::Column::CreatedAt)
            .order_by_desc(payment_transactions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list payment transactions for user")
    }

    /// Moves the status only if the row still holds `expected`. `paid_at` is
    /// written as given; the caller decides whether it changes.
    pub async fn compare_and_set_status(
        &self,
        id: i32,
        expected: PaymentStatus,
        next: PaymentStatus,
        paid_at: Option<String>,
    ) -> Result<bool> {
        let result = payment_transactions::Entity::update_many()
            .set(payment_transactions::ActiveModel {
                status: Set(next.as_str().to_string()),
                paid_at: Set(paid_at),
                updated_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            })
            .filter(payment_transactions::Column::Id.eq(id))
            .filter(payment_transactions::Column::Status.eq(expected.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to update payment status")?;

        Ok(result.rows_affected == 1)
    }

    /// Edits amount, method and notes while the payment is still pending or
    /// processing. Returns false when it is gone or already terminal.
    pub async fn update_details(&self, id: i32, update: PaymentUpdate) -> Result<bool> {
        let mut active = payment_transactions::ActiveModel {
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        if let Some(amount) = update.amount {
            active.amount = Set(amount);
        }
        if let Some(method) = update.payment_method {
            active.payment_method = Set(method);
        }
        if let Some(notes) = update.notes {
            active.notes = Set(Some(notes));
        }

        let result = payment_transactions::Entity::update_many()
            .set(active)
            .filter(payment_transactions::Column::Id.eq(id))
            .filter(payment_transactions::Column::Status.is_in([
                PaymentStatus::Pending.as_str(),
                PaymentStatus::Processing.as_str(),
            ]))
            .exec(&self.conn)
            .await
            .context("Failed to update payment transaction")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = payment_transactions::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete payment transaction")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn stats(&self) -> Result<PaymentStats> {
        let total_transactions = payment_transactions::Entity::find()
            .count(&self.conn)
            .await?;

        let total_amount: Option<i64> = payment_transactions::Entity::find()
            .select_only()
            .column_as(payment_transactions::Column::Amount.sum(), "total_amount")
            .filter(payment_transactions::Column::Status.eq(PaymentStatus::Success.as_str()))
            .into_tuple::<Option<i64>>()
            .one(&self.conn)
            .await
            .context("Failed to sum successful payments")?
            .flatten();

        Ok(PaymentStats {
            total_transactions,
            total_amount: total_amount.unwrap_or(0),
            pending_count: self.count_with_status(PaymentStatus::Pending).await?,
            success_count: self.count_with_status(PaymentStatus::Success).await?,
            failed_count: self.count_with_status(PaymentStatus::Failed).await?,
        })
    }

    async fn count_with_status(&self, status: PaymentStatus) -> Result<u64> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::Status.eq(status.as_str()))
            .count(&self.conn)
            .await
            .context("Failed to count payment transactions")
    }
}
