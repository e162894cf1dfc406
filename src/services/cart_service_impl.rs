//! `SeaORM` implementation of the `CartService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::{CartLine, Store, is_unique_violation};
use crate::domain::{Principal, line_subtotal, sum_subtotals};
use crate::services::cart_service::{
    AddToCartResult, CartError, CartService, CartSummary, CartView,
};
use crate::services::locks::KeyedLocks;

pub struct SeaOrmCartService {
    store: Store,
    line_locks: Arc<KeyedLocks<(i32, i32)>>,
}

impl SeaOrmCartService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            line_locks: Arc::new(KeyedLocks::new()),
        }
    }

    const fn authorize(principal: &Principal, owner_id: i32) -> Result<(), CartError> {
        if principal.can_act_for(owner_id) {
            Ok(())
        } else {
            Err(CartError::Forbidden)
        }
    }

    fn validate_quantity(quantity: i32) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_user(&self, user_id: i32) -> Result<(), CartError> {
        if self.store.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(CartError::NotFound("User"))
        }
    }

    async fn load_line(&self, item_id: i32) -> Result<CartLine, CartError> {
        self.store
            .get_cart_line(item_id)
            .await?
            .ok_or(CartError::NotFound("Cart item"))
    }

    async fn lines_with_totals(
        &self,
        user_id: i32,
    ) -> Result<(Vec<CartLine>, i64, i64), CartError> {
        let lines = self.store.cart_lines(user_id).await?;

        let total_quantity = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let total_price = sum_subtotals(lines.iter().map(|l| l.subtotal))
            .ok_or_else(|| CartError::Internal("Cart total overflows".to_string()))?;

        Ok((lines, total_quantity, total_price))
    }

    /// The stored subtotal is priced by the database at write time; this only
    /// rejects quantities whose subtotal cannot be represented.
    fn check_subtotal(price: i64, quantity: i32) -> Result<(), CartError> {
        line_subtotal(price, quantity)
            .map(|_| ())
            .ok_or_else(|| CartError::InvalidInput("Line subtotal overflows".to_string()))
    }
}

#[async_trait]
impl CartService for SeaOrmCartService {
    async fn add_to_cart(
        &self,
        principal: &Principal,
        product_id: i32,
        quantity: i32,
    ) -> Result<AddToCartResult, CartError> {
        Self::validate_quantity(quantity)?;

        let user_id = principal.user_id;
        self.ensure_user(user_id).await?;

        let _guard = self.line_locks.lock((user_id, product_id)).await;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(CartError::NotFound("Product"))?;

        let existing = self.store.find_cart_item(user_id, product_id).await?;

        let (item_id, created) = if let Some(item) = existing {
            let merged = i64::from(item.quantity) + i64::from(quantity);
            if merged > i64::from(product.stock) {
                return Err(CartError::InsufficientStock {
                    requested: merged,
                    available: product.stock,
                });
            }
            // Bounded by stock, which is an i32.
            let merged = i32::try_from(merged)
                .map_err(|_| CartError::InvalidInput("Quantity too large".to_string()))?;
            Self::check_subtotal(product.price, merged)?;

            let swapped = self
                .store
                .compare_and_set_cart_quantity(item.id, item.quantity, merged)
                .await?;
            if !swapped {
                return Err(CartError::Conflict);
            }

            debug!(item_id = item.id, quantity = merged, "Merged cart line");
            (item.id, false)
        } else {
            if quantity > product.stock {
                return Err(CartError::InsufficientStock {
                    requested: i64::from(quantity),
                    available: product.stock,
                });
            }
            Self::check_subtotal(product.price, quantity)?;

            let item = match self
                .store
                .insert_cart_item(user_id, product_id, quantity)
                .await
            {
                Ok(item) => item,
                Err(e) if is_unique_violation(&e) => return Err(CartError::Conflict),
                Err(e) => return Err(e.into()),
            };

            info!(item_id = item.id, user_id, product_id, "Created cart line");
            (item.id, true)
        };

        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);

        let line = self.load_line(item_id).await?;
        Ok(AddToCartResult { line, created })
    }

    async fn update_quantity(
        &self,
        principal: &Principal,
        item_id: i32,
        quantity: i32,
    ) -> Result<CartLine, CartError> {
        Self::validate_quantity(quantity)?;

        let item = self
            .store
            .get_cart_item(item_id)
            .await?
            .ok_or(CartError::NotFound("Cart item"))?;
        Self::authorize(principal, item.user_id)?;

        let _guard = self.line_locks.lock((item.user_id, item.product_id)).await;

        // Re-read under the lock; the line may have been merged or removed.
        let item = self
            .store
            .get_cart_item(item_id)
            .await?
            .ok_or(CartError::NotFound("Cart item"))?;

        let product = self
            .store
            .get_product(item.product_id)
            .await?
            .ok_or(CartError::NotFound("Product"))?;

        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                requested: i64::from(quantity),
                available: product.stock,
            });
        }
        Self::check_subtotal(product.price, quantity)?;

        let swapped = self
            .store
            .compare_and_set_cart_quantity(item.id, item.quantity, quantity)
            .await?;
        if !swapped {
            return Err(CartError::Conflict);
        }

        metrics::counter!("cart_mutations_total", "op" => "update").increment(1);
        self.load_line(item_id).await
    }

    async fn remove(&self, principal: &Principal, item_id: i32) -> Result<(), CartError> {
        let item = self
            .store
            .get_cart_item(item_id)
            .await?
            .ok_or(CartError::NotFound("Cart item"))?;
        Self::authorize(principal, item.user_id)?;

        let _guard = self.line_locks.lock((item.user_id, item.product_id)).await;

        if !self.store.delete_cart_item(item_id).await? {
            return Err(CartError::NotFound("Cart item"));
        }

        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        Ok(())
    }

    async fn clear(&self, principal: &Principal, user_id: i32) -> Result<u64, CartError> {
        Self::authorize(principal, user_id)?;
        self.ensure_user(user_id).await?;

        let deleted = self.store.clear_cart(user_id).await?;

        metrics::counter!("cart_mutations_total", "op" => "clear").increment(1);
        info!(user_id, deleted, "Cleared cart");
        Ok(deleted)
    }

    async fn get_cart(&self, principal: &Principal, user_id: i32) -> Result<CartView, CartError> {
        Self::authorize(principal, user_id)?;
        self.ensure_user(user_id).await?;

        let (items, total_quantity, total_price) = self.lines_with_totals(user_id).await?;

        Ok(CartView {
            user_id,
            total_items: items.len(),
            total_quantity,
            items,
            total_price,
        })
    }

    async fn get_summary(
        &self,
        principal: &Principal,
        user_id: i32,
    ) -> Result<CartSummary, CartError> {
        Self::authorize(principal, user_id)?;
        self.ensure_user(user_id).await?;

        let (items, total_quantity, total_price) = self.lines_with_totals(user_id).await?;

        Ok(CartSummary {
            user_id,
            total_items: items.len(),
            total_quantity,
            total_price,
        })
    }

    async fn get_item(&self, principal: &Principal, item_id: i32) -> Result<CartLine, CartError> {
        let line = self.load_line(item_id).await?;
        Self::authorize(principal, line.user_id)?;
        Ok(line)
    }
}
