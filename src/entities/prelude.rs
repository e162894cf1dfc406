pub use super::cart_items::Entity as CartItems;
pub use super::order_transactions::Entity as OrderTransactions;
pub use super::orders::Entity as Orders;
pub use super::payment_transactions::Entity as PaymentTransactions;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
