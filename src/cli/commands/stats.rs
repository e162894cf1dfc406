//! Store-wide counters

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_stats(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let users = store.count_users().await?;
    let products = store.product_stats().await?;
    let orders = store.count_orders().await?;
    let payments = store.payment_stats().await?;

    println!("Storefront statistics");
    println!("{:-<40}", "");
    println!("Users:          {users}");
    println!(
        "Products:       {} ({} active, {} units in stock)",
        products.total_products, products.total_active, products.total_stock
    );
    println!("Orders:         {orders}");
    println!(
        "Transactions:   {} ({} pending, {} success, {} failed)",
        payments.total_transactions,
        payments.pending_count,
        payments.success_count,
        payments.failed_count
    );
    println!("Collected:      {} (minor units)", payments.total_amount);

    Ok(())
}
