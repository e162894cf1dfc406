//! Domain primitives for the marketplace.
//!
//! Roles, order and payment status values with their transition rules,
//! the authenticated principal, and the money arithmetic every cart and
//! order write path shares.

pub mod reference;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    /// Sellers and admins may list products.
    #[must_use]
    pub const fn can_sell(&self) -> bool {
        matches!(self, Self::Seller | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// The authenticated caller of a request.
///
/// Handlers receive this as an explicit value; nothing reads identity from
/// ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// True when the principal owns `user_id`'s resources or is an admin.
    #[must_use]
    pub const fn can_act_for(&self, user_id: i32) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

/// Payment transaction status.
///
/// `pending` and `processing` are open; `success`, `failed` and `cancelled`
/// are terminal and admit no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed. Staying put is not a
    /// transition and is handled by the caller as a no-op.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Pending => !matches!(next, Self::Pending),
            Self::Processing => next.is_terminal(),
            Self::Success | Self::Failed | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown payment status: {other}")),
        }
    }
}

/// `price * quantity`, or `None` on overflow or a negative factor.
#[must_use]
pub fn line_subtotal(price: i64, quantity: i32) -> Option<i64> {
    if price < 0 || quantity < 0 {
        return None;
    }
    price.checked_mul(i64::from(quantity))
}

/// Sums line subtotals, failing on overflow.
pub fn sum_subtotals<I>(subtotals: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    subtotals
        .into_iter()
        .try_fold(0_i64, |acc, value| acc.checked_add(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(" Seller ".parse::<Role>().unwrap(), Role::Seller);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn principal_ownership() {
        let buyer = Principal::new(7, Role::Buyer);
        assert!(buyer.can_act_for(7));
        assert!(!buyer.can_act_for(8));

        let admin = Principal::new(1, Role::Admin);
        assert!(admin.can_act_for(8));
    }

    #[test]
    fn payment_terminal_states_are_closed() {
        for terminal in [
            PaymentStatus::Success,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
        ] {
            for next in [
                PaymentStatus::Pending,
                PaymentStatus::Processing,
                PaymentStatus::Success,
                PaymentStatus::Failed,
                PaymentStatus::Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn payment_open_states_progress() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Success));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Processing));
        assert!(PaymentStatus::Processing.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Processing.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn order_status_cancellation() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    }

    #[test]
    fn subtotal_arithmetic() {
        assert_eq!(line_subtotal(10_000, 2), Some(20_000));
        assert_eq!(line_subtotal(0, 5), Some(0));
        assert_eq!(line_subtotal(-1, 5), None);
        assert_eq!(line_subtotal(i64::MAX, 2), None);
        assert_eq!(sum_subtotals([20_000, 5_000]), Some(25_000));
        assert_eq!(sum_subtotals([i64::MAX, 1]), None);
        assert_eq!(sum_subtotals(Vec::new()), Some(0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Property: within range, a line subtotal is exactly price times quantity.
        #[test]
        fn subtotal_is_price_times_quantity() {
            proptest!(|(price in 0_i64..=10_000_000_000, quantity in 0_i32..=100_000)| {
                let expected = i128::from(price) * i128::from(quantity);
                prop_assert_eq!(line_subtotal(price, quantity).map(i128::from), Some(expected));
            });
        }

        /// Property: the cart total equals the sum of its lines, in any order.
        #[test]
        fn total_is_order_independent() {
            let lines = prop::collection::vec((0_i64..=1_000_000, 1_i32..=1_000), 0..20);
            proptest!(|(lines in lines)| {
                let subtotals: Vec<i64> = lines
                    .iter()
                    .map(|&(price, qty)| line_subtotal(price, qty).unwrap())
                    .collect();
                let forward = sum_subtotals(subtotals.iter().copied());
                let backward = sum_subtotals(subtotals.iter().rev().copied());
                let expected: i64 = subtotals.iter().sum();
                prop_assert_eq!(forward, Some(expected));
                prop_assert_eq!(backward, forward);
            });
        }

        /// Property: negative factors never produce a subtotal.
        #[test]
        fn negative_factors_are_rejected() {
            proptest!(|(price in i64::MIN..0, quantity in i32::MIN..0)| {
                prop_assert_eq!(line_subtotal(price, 1), None);
                prop_assert_eq!(line_subtotal(1, quantity), None);
            });
        }
    }
}
