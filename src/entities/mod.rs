pub mod prelude;

pub mod cart_items;
pub mod order_transactions;
pub mod orders;
pub mod payment_transactions;
pub mod products;
pub mod users;
