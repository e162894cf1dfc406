//! `SeaORM` implementation of the `PaymentService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{NewPayment, PaymentStats, PaymentUpdate, Store, is_unique_violation};
use crate::domain::{PaymentStatus, Principal, reference};
use crate::entities::payment_transactions;
use crate::services::payment_service::{
    CreatePayment, DEFAULT_PAYMENT_METHOD, PaymentError, PaymentService,
};

pub struct SeaOrmPaymentService {
    store: Store,
}

impl SeaOrmPaymentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    const fn authorize(principal: &Principal, owner_id: i32) -> Result<(), PaymentError> {
        if principal.can_act_for(owner_id) {
            Ok(())
        } else {
            Err(PaymentError::Forbidden)
        }
    }

    const fn require_admin(principal: &Principal) -> Result<(), PaymentError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(PaymentError::Forbidden)
        }
    }

    async fn load(&self, id: i32) -> Result<payment_transactions::Model, PaymentError> {
        self.store
            .get_payment(id)
            .await?
            .ok_or(PaymentError::NotFound("Transaction"))
    }
}

fn stored_status(payment: &payment_transactions::Model) -> Result<PaymentStatus, PaymentError> {
    payment.status.parse().map_err(PaymentError::Internal)
}

fn validate_amount(amount: i64) -> Result<(), PaymentError> {
    if amount <= 0 {
        return Err(PaymentError::InvalidInput(
            "Amount must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl PaymentService for SeaOrmPaymentService {
    async fn create(
        &self,
        principal: &Principal,
        request: CreatePayment,
    ) -> Result<payment_transactions::Model, PaymentError> {
        let user_id = request.user_id.unwrap_or(principal.user_id);
        Self::authorize(principal, user_id)?;
        validate_amount(request.amount)?;

        if !self.store.user_exists(user_id).await? {
            return Err(PaymentError::NotFound("User"));
        }

        let order = self
            .store
            .get_order_model(request.order_id)
            .await?
            .ok_or(PaymentError::NotFound("Order"))?;
        if order.user_id != user_id {
            return Err(PaymentError::InvalidInput(
                "Order does not belong to this user".to_string(),
            ));
        }

        let payment_method = request
            .payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

        let new_payment = NewPayment {
            user_id,
            order_id: order.id,
            transaction_number: reference::transaction_number(),
            amount: request.amount,
            payment_method,
            notes: request.notes,
        };

        let payment = match self.store.create_payment(new_payment).await {
            Ok(payment) => payment,
            Err(e) if is_unique_violation(&e) => {
                return Err(PaymentError::Conflict(
                    "Transaction number already in use, retry the request".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            payment_id = payment.id,
            transaction_number = %payment.transaction_number,
            order_id = order.id,
            amount = payment.amount,
            "Payment transaction recorded"
        );
        Ok(payment)
    }

    async fn list_all(
        &self,
        principal: &Principal,
    ) -> Result<Vec<payment_transactions::Model>, PaymentError> {
        Self::require_admin(principal)?;
        Ok(self.store.list_payments().await?)
    }

    async fn get(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<payment_transactions::Model, PaymentError> {
        let payment = self.load(id).await?;
        Self::authorize(principal, payment.user_id)?;
        Ok(payment)
    }

    async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<Vec<payment_transactions::Model>, PaymentError> {
        Self::authorize(principal, user_id)?;
        if !self.store.user_exists(user_id).await? {
            return Err(PaymentError::NotFound("User"));
        }
        Ok(self.store.list_payments_for_user(user_id).await?)
    }

    async fn get_by_number(
        &self,
        principal: &Principal,
        number: &str,
    ) -> Result<payment_transactions::Model, PaymentError> {
        let payment = self
            .store
            .get_payment_by_number(number.trim())
            .await?
            .ok_or(PaymentError::NotFound("Transaction"))?;
        Self::authorize(principal, payment.user_id)?;
        Ok(payment)
    }

    async fn update_status(
        &self,
        principal: &Principal,
        id: i32,
        status: &str,
    ) -> Result<payment_transactions::Model, PaymentError> {
        Self::require_admin(principal)?;
        let next: PaymentStatus = status.parse().map_err(PaymentError::InvalidInput)?;

        let payment = self.load(id).await?;
        let current = stored_status(&payment)?;

        if current == next {
            return Ok(payment);
        }
        if !current.can_transition_to(next) {
            return Err(PaymentError::Conflict(format!(
                "Cannot move transaction from {current} to {next}"
            )));
        }

        let paid_at = match (&payment.paid_at, next) {
            (None, PaymentStatus::Success) => Some(chrono::Utc::now().to_rfc3339()),
            (existing, _) => existing.clone(),
        };

        let swapped = self
            .store
            .compare_and_set_payment_status(id, current, next, paid_at)
            .await?;
        if !swapped {
            return Err(PaymentError::Conflict(
                "Transaction status changed concurrently, retry the request".to_string(),
            ));
        }

        info!(payment_id = id, from = %current, to = %next, "Payment status changed");
        self.load(id).await
    }

    async fn update(
        &self,
        principal: &Principal,
        id: i32,
        update: PaymentUpdate,
    ) -> Result<payment_transactions::Model, PaymentError> {
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }

        let payment = self.load(id).await?;
        Self::authorize(principal, payment.user_id)?;

        let current = stored_status(&payment)?;
        if current.is_terminal() {
            return Err(PaymentError::Conflict(format!(
                "Transaction is already {current}"
            )));
        }

        if !self.store.update_open_payment(id, update).await? {
            let payment = self.load(id).await?;
            return Err(PaymentError::Conflict(format!(
                "Transaction is already {}",
                payment.status
            )));
        }

        self.load(id).await
    }

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), PaymentError> {
        Self::require_admin(principal)?;

        if !self.store.delete_payment(id).await? {
            return Err(PaymentError::NotFound("Transaction"));
        }

        info!(payment_id = id, "Payment transaction deleted");
        Ok(())
    }

    async fn stats(&self, principal: &Principal) -> Result<PaymentStats, PaymentError> {
        Self::require_admin(principal)?;
        Ok(self.store.payment_stats().await?)
    }
}
