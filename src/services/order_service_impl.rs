//! `SeaORM` implementation of the `OrderService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{CheckoutOutcome, NewOrder, OrderWithTransactions, Store, is_unique_violation};
use crate::domain::{OrderStatus, Principal, reference};
use crate::entities::orders;
use crate::services::locks::KeyedLocks;
use crate::services::order_service::{CheckoutRequest, OrderError, OrderService, OrderStats};

pub struct SeaOrmOrderService {
    store: Store,
    checkout_locks: KeyedLocks<i32>,
}

impl SeaOrmOrderService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            checkout_locks: KeyedLocks::new(),
        }
    }

    const fn authorize(principal: &Principal, owner_id: i32) -> Result<(), OrderError> {
        if principal.can_act_for(owner_id) {
            Ok(())
        } else {
            Err(OrderError::Forbidden)
        }
    }

    const fn require_admin(principal: &Principal) -> Result<(), OrderError> {
        if principal.is_admin() {
            Ok(())
        } else {
            Err(OrderError::Forbidden)
        }
    }

    async fn load_model(&self, id: i32) -> Result<orders::Model, OrderError> {
        self.store
            .get_order_model(id)
            .await?
            .ok_or(OrderError::NotFound("Order"))
    }

    /// Moves the order from `current` to `next`, failing with `Conflict` if
    /// another writer changed the status after it was read.
    async fn swap_status(
        &self,
        id: i32,
        current: OrderStatus,
        next: OrderStatus,
    ) -> Result<(), OrderError> {
        if self
            .store
            .compare_and_set_order_status(id, current, next)
            .await?
        {
            return Ok(());
        }

        // Distinguish a concurrent delete from a concurrent status change.
        self.load_model(id).await?;
        Err(OrderError::Conflict(
            "Order status changed concurrently, retry the request".to_string(),
        ))
    }
}

fn parse_status(value: &str) -> Result<OrderStatus, OrderError> {
    value.parse().map_err(OrderError::InvalidInput)
}

fn stored_status(order: &orders::Model) -> Result<OrderStatus, OrderError> {
    order.status.parse().map_err(OrderError::Internal)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl OrderService for SeaOrmOrderService {
    async fn create_from_cart(
        &self,
        principal: &Principal,
        user_id: i32,
        request: CheckoutRequest,
    ) -> Result<OrderWithTransactions, OrderError> {
        if user_id <= 0 {
            return Err(OrderError::InvalidInput("user_id is required".to_string()));
        }
        let shipping_address = request.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(OrderError::InvalidInput(
                "shipping_address is required".to_string(),
            ));
        }
        Self::authorize(principal, user_id)?;

        if !self.store.user_exists(user_id).await? {
            return Err(OrderError::NotFound("User"));
        }

        let _guard = self.checkout_locks.lock(user_id).await;

        let new_order = NewOrder {
            user_id,
            order_number: reference::order_number(),
            shipping_address,
            shipping_phone: non_blank(request.shipping_phone),
            notes: non_blank(request.notes),
        };

        let outcome = match self.store.create_order_from_cart(new_order).await {
            Ok(outcome) => outcome,
            Err(e) if is_unique_violation(&e) => {
                warn!(user_id, "Order number collision");
                return Err(OrderError::Conflict(
                    "Order number already in use, retry the request".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            CheckoutOutcome::Placed(order) => {
                metrics::counter!("orders_created_total").increment(1);
                info!(
                    order_id = order.order.id,
                    order_number = %order.order.order_number,
                    user_id,
                    lines = order.transactions.len(),
                    total_price = order.order.total_price,
                    "Order created from cart"
                );
                Ok(order)
            }
            CheckoutOutcome::EmptyCart => Err(OrderError::EmptyCart),
            CheckoutOutcome::CartChanged => {
                warn!(user_id, "Cart changed during checkout, rolled back");
                Err(OrderError::Conflict(
                    "Cart changed during checkout, retry the request".to_string(),
                ))
            }
            CheckoutOutcome::TotalOverflow => Err(OrderError::InvalidInput(
                "Order total is too large".to_string(),
            )),
        }
    }

    async fn list_all(
        &self,
        principal: &Principal,
    ) -> Result<Vec<OrderWithTransactions>, OrderError> {
        Self::require_admin(principal)?;
        Ok(self.store.list_orders().await?)
    }

    async fn get(
        &self,
        principal: &Principal,
        id: i32,
    ) -> Result<OrderWithTransactions, OrderError> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound("Order"))?;
        Self::authorize(principal, order.order.user_id)?;
        Ok(order)
    }

    async fn list_for_user(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<Vec<OrderWithTransactions>, OrderError> {
        Self::authorize(principal, user_id)?;
        if !self.store.user_exists(user_id).await? {
            return Err(OrderError::NotFound("User"));
        }
        Ok(self.store.list_orders_for_user(user_id).await?)
    }

    async fn get_by_number(
        &self,
        principal: &Principal,
        order_number: &str,
    ) -> Result<OrderWithTransactions, OrderError> {
        let order = self
            .store
            .get_order_by_number(order_number.trim())
            .await?
            .ok_or(OrderError::NotFound("Order"))?;
        Self::authorize(principal, order.order.user_id)?;
        Ok(order)
    }

    async fn update_status(
        &self,
        principal: &Principal,
        id: i32,
        status: &str,
    ) -> Result<orders::Model, OrderError> {
        Self::require_admin(principal)?;
        let next = parse_status(status)?;

        let order = self.load_model(id).await?;
        let current = stored_status(&order)?;

        if current == next {
            return Ok(order);
        }
        if current.is_final() {
            return Err(OrderError::Conflict(format!(
                "Order is already {current}"
            )));
        }

        self.swap_status(id, current, next).await?;

        info!(order_id = id, from = %current, to = %next, "Order status changed");
        self.load_model(id).await
    }

    async fn cancel(&self, principal: &Principal, id: i32) -> Result<orders::Model, OrderError> {
        let order = self.load_model(id).await?;
        Self::authorize(principal, order.user_id)?;

        let current = stored_status(&order)?;
        if !current.is_cancellable() {
            return Err(OrderError::Conflict(format!(
                "Order cannot be cancelled while {current}"
            )));
        }

        self.swap_status(id, current, OrderStatus::Cancelled).await?;

        info!(order_id = id, "Order cancelled");
        self.load_model(id).await
    }

    async fn delete(&self, principal: &Principal, id: i32) -> Result<(), OrderError> {
        Self::require_admin(principal)?;

        if !self.store.delete_order(id).await? {
            return Err(OrderError::NotFound("Order"));
        }

        info!(order_id = id, "Order deleted");
        Ok(())
    }

    async fn stats(&self, principal: &Principal) -> Result<OrderStats, OrderError> {
        Self::require_admin(principal)?;
        Ok(OrderStats {
            total_orders: self.store.count_orders().await?,
        })
    }
}
