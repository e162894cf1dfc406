use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One line per (user, product); concurrent first-adds collide here.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_cart_items_user_product")
                    .table(CartItems::Table)
                    .col(CartItems::UserId)
                    .col(CartItems::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_products_seller")
                    .table(Products::Table)
                    .col(Products::SellerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_user")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_transactions_order")
                    .table(OrderTransactions::Table)
                    .col(OrderTransactions::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payment_transactions_user")
                    .table(PaymentTransactions::Table)
                    .col(PaymentTransactions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_payment_transactions_user")
                    .table(PaymentTransactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_order_transactions_order")
                    .table(OrderTransactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_user")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_products_seller")
                    .table(Products::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_cart_items_user_product")
                    .table(CartItems::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CartItems {
    Table,
    UserId,
    ProductId,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    SellerId,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    UserId,
}

#[derive(DeriveIden)]
enum OrderTransactions {
    Table,
    OrderId,
}

#[derive(DeriveIden)]
enum PaymentTransactions {
    Table,
    UserId,
}
