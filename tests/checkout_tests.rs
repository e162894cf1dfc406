//! Service-level tests for cart maintenance and cart-to-order conversion.

use std::sync::Arc;

use storefront::config::Config;
use storefront::db::{ProductUpdate, Store};
use storefront::domain::{OrderStatus, Principal, Role};
use storefront::services::{
    CartError, CheckoutRequest, CreateProduct, OrderError, Registration,
};
use storefront::state::SharedState;

async fn shared_state() -> Arc<SharedState> {
    let db_path = std::env::temp_dir().join(format!(
        "storefront-checkout-test-{}.db",
        uuid::Uuid::new_v4()
    ));
    let url = format!("sqlite:{}", db_path.display());

    let store = Store::new(&url).await.expect("Failed to open store");
    Arc::new(SharedState::with_store(Config::default(), store))
}

async fn account(state: &SharedState, username: &str, role: Role) -> Principal {
    let user = state
        .user_service
        .create_account(Registration {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "correct-horse".to_string(),
            role: Some(role),
            fullname: None,
            phone: None,
            address: None,
        })
        .await
        .expect("Failed to create account");
    Principal::new(user.id, user.role)
}

async fn product(state: &SharedState, seller: &Principal, name: &str, price: i64, stock: i32) -> i32 {
    state
        .product_service
        .create(
            seller,
            CreateProduct {
                name: name.to_string(),
                price,
                stock,
                description: None,
                category: None,
                image: None,
            },
        )
        .await
        .expect("Failed to create product")
        .id
}

fn checkout() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "1 Main Street".to_string(),
        shipping_phone: Some("555-0100".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn checkout_totals_lines_and_empties_cart() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;

    let book = product(&state, &seller, "Book", 10_000, 10).await;
    let pen = product(&state, &seller, "Pen", 5_000, 10).await;

    state.cart_service.add_to_cart(&buyer, book, 2).await.unwrap();
    state.cart_service.add_to_cart(&buyer, pen, 1).await.unwrap();

    let order = state
        .order_service
        .create_from_cart(&buyer, buyer.user_id, checkout())
        .await
        .unwrap();

    assert_eq!(order.order.total_price, 25_000);
    assert_eq!(order.order.status, "pending");
    assert_eq!(order.order.shipping_phone.as_deref(), Some("555-0100"));
    assert_eq!(order.transactions.len(), 2);

    let line_sum: i64 = order.transactions.iter().map(|t| t.subtotal).sum();
    assert_eq!(line_sum, order.order.total_price);

    let book_line = order
        .transactions
        .iter()
        .find(|t| t.product_id == Some(book))
        .unwrap();
    assert_eq!(book_line.product_name, "Book");
    assert_eq!(book_line.quantity, 2);
    assert_eq!(book_line.price, 10_000);

    let cart = state
        .cart_service
        .get_cart(&buyer, buyer.user_id)
        .await
        .unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, 0);

    // Stock is not reserved or decremented by checkout
    let book_after = state.product_service.get(book).await.unwrap();
    assert_eq!(book_after.stock, 10);
}

#[tokio::test]
async fn empty_cart_checkout_persists_nothing() {
    let state = shared_state().await;
    let buyer = account(&state, "buyer", Role::Buyer).await;

    let result = state
        .order_service
        .create_from_cart(&buyer, buyer.user_id, checkout())
        .await;
    assert!(matches!(result, Err(OrderError::EmptyCart)));

    let orders = state
        .order_service
        .list_for_user(&buyer, buyer.user_id)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn checkout_requires_shipping_address() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let book = product(&state, &seller, "Book", 1_000, 1).await;
    state.cart_service.add_to_cart(&buyer, book, 1).await.unwrap();

    let result = state
        .order_service
        .create_from_cart(
            &buyer,
            buyer.user_id,
            CheckoutRequest {
                shipping_address: "   ".to_string(),
                ..CheckoutRequest::default()
            },
        )
        .await;
    assert!(matches!(result, Err(OrderError::InvalidInput(_))));

    let cart = state
        .cart_service
        .get_summary(&buyer, buyer.user_id)
        .await
        .unwrap();
    assert_eq!(cart.total_items, 1);
}

#[tokio::test]
async fn merge_beyond_stock_leaves_line_untouched() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let lamp = product(&state, &seller, "Lamp", 2_500, 3).await;

    let first = state.cart_service.add_to_cart(&buyer, lamp, 2).await.unwrap();
    assert!(first.created);

    let err = state
        .cart_service
        .add_to_cart(&buyer, lamp, 2)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 4,
            available: 3
        }
    ));

    let line = state
        .cart_service
        .get_item(&buyer, first.line.id)
        .await
        .unwrap();
    assert_eq!(line.quantity, 2);
    assert_eq!(line.subtotal, 5_000);

    let merged = state.cart_service.add_to_cart(&buyer, lamp, 1).await.unwrap();
    assert!(!merged.created);
    assert_eq!(merged.line.id, first.line.id);
    assert_eq!(merged.line.quantity, 3);
    assert_eq!(merged.line.subtotal, 7_500);
}

#[tokio::test]
async fn price_change_refreshes_cart_subtotals() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let mug = product(&state, &seller, "Mug", 1_200, 10).await;

    let added = state.cart_service.add_to_cart(&buyer, mug, 3).await.unwrap();
    assert_eq!(added.line.subtotal, 3_600);

    state
        .product_service
        .update(
            &seller,
            mug,
            ProductUpdate {
                price: Some(1_500),
                ..ProductUpdate::default()
            },
        )
        .await
        .unwrap();

    let line = state
        .cart_service
        .get_item(&buyer, added.line.id)
        .await
        .unwrap();
    assert_eq!(line.unit_price, 1_500);
    assert_eq!(line.subtotal, 4_500);
}

#[tokio::test]
async fn update_quantity_checks_stock_and_ownership() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let other = account(&state, "other", Role::Buyer).await;
    let admin = account(&state, "admin", Role::Admin).await;
    let cup = product(&state, &seller, "Cup", 300, 5).await;

    let added = state.cart_service.add_to_cart(&buyer, cup, 1).await.unwrap();
    let item_id = added.line.id;

    let too_many = state
        .cart_service
        .update_quantity(&buyer, item_id, 6)
        .await;
    assert!(matches!(too_many, Err(CartError::InsufficientStock { .. })));

    let zero = state.cart_service.update_quantity(&buyer, item_id, 0).await;
    assert!(matches!(zero, Err(CartError::InvalidInput(_))));

    let foreign = state.cart_service.update_quantity(&other, item_id, 2).await;
    assert!(matches!(foreign, Err(CartError::Forbidden)));

    let line = state
        .cart_service
        .update_quantity(&admin, item_id, 5)
        .await
        .unwrap();
    assert_eq!(line.quantity, 5);
    assert_eq!(line.subtotal, 1_500);
}

#[tokio::test]
async fn inactive_products_cannot_be_added() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let hat = product(&state, &seller, "Hat", 900, 5).await;

    state
        .product_service
        .set_active(&seller, hat, false)
        .await
        .unwrap();

    let result = state.cart_service.add_to_cart(&buyer, hat, 1).await;
    assert!(matches!(result, Err(CartError::NotFound("Product"))));
}

#[tokio::test]
async fn concurrent_adds_keep_a_single_line() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let sock = product(&state, &seller, "Sock", 100, 100).await;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.cart_service.add_to_cart(&buyer, sock, 1).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let cart = state
        .cart_service
        .get_cart(&buyer, buyer.user_id)
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 8);
    assert_eq!(cart.items[0].subtotal, 800);
}

#[tokio::test]
async fn concurrent_checkouts_place_one_order() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let book = product(&state, &seller, "Book", 4_000, 10).await;
    state.cart_service.add_to_cart(&buyer, book, 2).await.unwrap();

    let first = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .order_service
                .create_from_cart(&buyer, buyer.user_id, checkout())
                .await
        })
    };
    let second = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .order_service
                .create_from_cart(&buyer, buyer.user_id, checkout())
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let placed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(OrderError::EmptyCart | OrderError::Conflict(_))
    )));

    let orders = state
        .order_service
        .list_for_user(&buyer, buyer.user_id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.total_price, 8_000);
}

#[tokio::test]
async fn order_status_rules() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let admin = account(&state, "admin", Role::Admin).await;
    let book = product(&state, &seller, "Book", 1_000, 10).await;

    state.cart_service.add_to_cart(&buyer, book, 1).await.unwrap();
    let order = state
        .order_service
        .create_from_cart(&buyer, buyer.user_id, checkout())
        .await
        .unwrap();
    let id = order.order.id;

    let by_buyer = state.order_service.update_status(&buyer, id, "shipped").await;
    assert!(matches!(by_buyer, Err(OrderError::Forbidden)));

    let bogus = state.order_service.update_status(&admin, id, "lost").await;
    assert!(matches!(bogus, Err(OrderError::InvalidInput(_))));

    let shipped = state
        .order_service
        .update_status(&admin, id, "shipped")
        .await
        .unwrap();
    assert_eq!(shipped.status, "shipped");

    let cancel = state.order_service.cancel(&buyer, id).await;
    assert!(matches!(cancel, Err(OrderError::Conflict(_))));

    state
        .order_service
        .update_status(&admin, id, "completed")
        .await
        .unwrap();
    let reopen = state.order_service.update_status(&admin, id, "pending").await;
    assert!(matches!(reopen, Err(OrderError::Conflict(_))));

    let fetched = state
        .order_service
        .get_by_number(&buyer, &order.order.order_number)
        .await
        .unwrap();
    assert_eq!(fetched.order.status, "completed");
}

#[tokio::test]
async fn concurrent_reprice_keeps_subtotals_priced() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let tea = product(&state, &seller, "Tea", 100, 1_000).await;

    for i in 0..30_i64 {
        let add = {
            let state = state.clone();
            tokio::spawn(async move { state.cart_service.add_to_cart(&buyer, tea, 1).await })
        };
        let reprice = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .product_service
                    .update(
                        &seller,
                        tea,
                        ProductUpdate {
                            price: Some(200 + i),
                            ..ProductUpdate::default()
                        },
                    )
                    .await
            })
        };

        add.await.unwrap().unwrap();
        reprice.await.unwrap().unwrap();

        let cart = state
            .cart_service
            .get_cart(&buyer, buyer.user_id)
            .await
            .unwrap();
        let line = &cart.items[0];
        assert_eq!(line.unit_price, 200 + i);
        assert_eq!(
            line.subtotal,
            line.unit_price * i64::from(line.quantity),
            "stale subtotal after round {i}"
        );
    }
}

#[tokio::test]
async fn racing_complete_and_cancel_leave_one_winner() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let admin = account(&state, "admin", Role::Admin).await;
    let book = product(&state, &seller, "Book", 1_000, 1_000).await;

    for _ in 0..20 {
        state.cart_service.add_to_cart(&buyer, book, 1).await.unwrap();
        let id = state
            .order_service
            .create_from_cart(&buyer, buyer.user_id, checkout())
            .await
            .unwrap()
            .order
            .id;

        let complete = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .order_service
                    .update_status(&admin, id, "completed")
                    .await
            })
        };
        let cancel = {
            let state = state.clone();
            tokio::spawn(async move { state.order_service.cancel(&buyer, id).await })
        };

        let completed = complete.await.unwrap();
        let cancelled = cancel.await.unwrap();
        assert!(
            completed.is_ok() != cancelled.is_ok(),
            "exactly one status change may win"
        );

        let winner = if completed.is_ok() { "completed" } else { "cancelled" };
        let loser_conflicted = matches!(
            if completed.is_ok() { &cancelled } else { &completed },
            Err(OrderError::Conflict(_))
        );
        assert!(loser_conflicted);

        let stored = state.order_service.get(&admin, id).await.unwrap();
        assert_eq!(stored.order.status, winner);
    }
}

#[tokio::test]
async fn stale_order_status_write_is_rejected() {
    let state = shared_state().await;
    let seller = account(&state, "seller", Role::Seller).await;
    let buyer = account(&state, "buyer", Role::Buyer).await;
    let admin = account(&state, "admin", Role::Admin).await;
    let book = product(&state, &seller, "Book", 1_000, 10).await;

    state.cart_service.add_to_cart(&buyer, book, 1).await.unwrap();
    let id = state
        .order_service
        .create_from_cart(&buyer, buyer.user_id, checkout())
        .await
        .unwrap()
        .order
        .id;

    state
        .order_service
        .update_status(&admin, id, "completed")
        .await
        .unwrap();

    // A writer that still believes the order is pending must not reopen it
    let swapped = state
        .store
        .compare_and_set_order_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(!swapped);

    let stored = state.order_service.get(&buyer, id).await.unwrap();
    assert_eq!(stored.order.status, "completed");
}
